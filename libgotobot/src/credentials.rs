//! The persisted credentials record
//!
//! One JSON file per bot identity, written once after a successful setup
//! run and read whole by every subsequent invocation. Never partially
//! updated: re-running setup produces a fresh record.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CredentialsError, Result};
use crate::types::Account;

/// Everything a bot needs to talk to its instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub instance_url: String,
    pub app_name: String,
    pub client_id: String,
    pub client_secret: String,
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub scope: Option<String>,
    /// Unix timestamp the token was issued at, as reported by the server
    #[serde(default)]
    pub created_at: Option<i64>,
    /// Account profile from the verify step, kept for display purposes
    #[serde(default)]
    pub account: Option<Account>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl Credentials {
    /// Load a credentials record from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(CredentialsError::Io)?;
        let creds: Credentials =
            serde_json::from_str(&content).map_err(CredentialsError::Parse)?;
        Ok(creds)
    }

    /// Save the record as pretty-printed JSON, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(CredentialsError::Io)?;
            }
        }
        let json = serde_json::to_string_pretty(self).map_err(CredentialsError::Parse)?;
        std::fs::write(path, json).map_err(CredentialsError::Io)?;
        Ok(())
    }

    /// Username for display, falling back when the verify step was skipped
    pub fn username(&self) -> &str {
        self.account
            .as_ref()
            .map(|a| a.username.as_str())
            .unwrap_or("unknown")
    }
}
