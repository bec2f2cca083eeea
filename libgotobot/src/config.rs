//! Environment and path resolution for Gotobot
//!
//! There is no config file: the tools are driven by flags, the credentials
//! JSON record, and a handful of environment variables for ad hoc use.

use std::path::PathBuf;

use crate::error::{CredentialsError, Result};

/// Instance URL override for one-off invocations without a credentials file
pub const INSTANCE_ENV: &str = "GOTOBOT_INSTANCE";
/// Access token override, paired with [`INSTANCE_ENV`]
pub const TOKEN_ENV: &str = "GOTOBOT_TOKEN";
/// Overrides the default credentials file path
pub const CREDENTIALS_ENV: &str = "GOTOBOT_CREDENTIALS";

/// Instance URL and token from the environment, if both are set
///
/// Lets `goto-post` run without a credentials file:
/// `GOTOBOT_INSTANCE=https://gts.example GOTOBOT_TOKEN=... goto-post "hi"`
pub fn env_override() -> Option<(String, String)> {
    let instance = std::env::var(INSTANCE_ENV).ok()?;
    let token = std::env::var(TOKEN_ENV).ok()?;
    if instance.trim().is_empty() || token.trim().is_empty() {
        return None;
    }
    Some((normalize_instance_url(&instance), token.trim().to_string()))
}

/// Resolve the credentials file path following XDG Base Directory spec
pub fn resolve_credentials_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CREDENTIALS_ENV) {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| CredentialsError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("gotobot").join("credentials.json"))
}

/// Normalize an instance URL: default to https:// and strip trailing slashes
///
/// A credentials record is only valid for the instance it was issued
/// against, so every entry point funnels through this before the URL is
/// used or persisted.
pub fn normalize_instance_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}
