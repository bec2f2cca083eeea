//! Authorization-code exchange and token verification

use serde::Deserialize;
use tracing::info;

use crate::error::{AuthError, Result};
use crate::types::Account;

/// Response from the `/oauth/token` endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// Exchange an authorization code for an access token
///
/// `redirect_uri` must match the one used during authorization exactly;
/// the server rejects the exchange otherwise and that rejection is final
/// (codes are single-use).
pub async fn exchange_code(
    client: &reqwest::Client,
    instance_url: &str,
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
    scopes: &str,
) -> Result<TokenResponse> {
    let url = format!("{}/oauth/token", instance_url);
    info!("exchanging authorization code for access token");

    let response = client
        .post(&url)
        .form(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("scope", scopes),
        ])
        .send()
        .await
        .map_err(|e| AuthError::Network(format!("token request: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::CodeExchange(format!(
            "HTTP {}: {}. The code may be spent or expired, or the redirect URI \
             does not match the one used during authorization.",
            status, body
        ))
        .into());
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| AuthError::CodeExchange(format!("unexpected response: {}", e)).into())
}

/// Verify a fresh token against the account-info endpoint
///
/// Returns the account profile used to enrich the credentials record. Any
/// failure here means the token is unusable.
pub async fn verify_token(
    client: &reqwest::Client,
    instance_url: &str,
    access_token: &str,
) -> Result<Account> {
    let url = format!("{}/api/v1/accounts/verify_credentials", instance_url);
    info!("verifying access token");

    let response = client
        .get(&url)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| AuthError::Network(format!("verify request: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Verification(format!("HTTP {}: {}", status, body)).into());
    }

    response
        .json::<Account>()
        .await
        .map_err(|e| AuthError::Verification(format!("unexpected response: {}", e)).into())
}
