//! Gotobot - OAuth setup and posting tools for GoToSocial bots
//!
//! This library backs the goto-setup, goto-grant, and goto-post binaries:
//! OAuth2 application registration and token acquisition against
//! Mastodon-API-compatible instances, plus a thin typed client over the
//! REST API for bot operations.

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod oauth;
pub mod types;

// Re-export commonly used types
pub use client::{BotClient, StatusParams};
pub use credentials::Credentials;
pub use error::{GotobotError, Result};
pub use types::{Account, Status, Timeline, Visibility};
