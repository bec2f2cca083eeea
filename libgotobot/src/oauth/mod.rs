//! OAuth2 setup flows for Mastodon-compatible instances
//!
//! Two paths produce the same [`Credentials`](crate::credentials::Credentials)
//! record: the interactive flow (print an authorization URL, let the
//! operator paste the code back) and the automated flow
//! ([`automated::AutomatedAuthorizer`]), which replays the browser legs
//! itself. Both converge on [`token::exchange_code`] and
//! [`token::verify_token`].

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::config::normalize_instance_url;
use crate::credentials::Credentials;
use crate::error::{AuthError, Result};

pub mod automated;
pub mod forms;
pub mod token;

/// Fixed out-of-band redirect target; no callback server is ever run
pub const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Sent on every request the setup flows make
pub const USER_AGENT: &str = concat!("gotobot/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Plain HTTP client for the cookie-less legs (registration, token, verify)
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| AuthError::Network(format!("failed to build HTTP client: {}", e)).into())
}

/// What the instance hands back for a newly registered application
#[derive(Debug, Clone, Deserialize)]
pub struct AppRegistration {
    pub client_id: String,
    pub client_secret: String,
}

/// Register an application on the instance
///
/// One POST to `/api/v1/apps`; any non-success status is a fatal
/// registration error, no retry.
pub async fn register_app(
    client: &reqwest::Client,
    instance_url: &str,
    app_name: &str,
    scopes: &str,
) -> Result<AppRegistration> {
    let url = format!("{}/api/v1/apps", instance_url);
    info!(instance = instance_url, app_name, "registering application");

    let response = client
        .post(&url)
        .form(&[
            ("client_name", app_name),
            ("redirect_uris", OOB_REDIRECT_URI),
            ("scopes", scopes),
            ("website", ""),
        ])
        .send()
        .await
        .map_err(|e| AuthError::Network(format!("app registration request: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Registration(format!("HTTP {}: {}", status, body)).into());
    }

    let registration = response
        .json::<AppRegistration>()
        .await
        .map_err(|e| AuthError::Registration(format!("unexpected response: {}", e)))?;

    debug!(client_id = %registration.client_id, "application registered");
    Ok(registration)
}

/// Build the authorization URL the operator (or the automated flow) visits
pub fn authorize_url(instance_url: &str, client_id: &str, scopes: &str) -> String {
    let base = format!("{}/oauth/authorize", instance_url);
    // The instance URL was normalized at the entry point; parsing cannot
    // fail for an http(s) base plus a fixed path.
    let url = Url::parse_with_params(
        &base,
        &[
            ("client_id", client_id),
            ("redirect_uri", OOB_REDIRECT_URI),
            ("response_type", "code"),
            ("scope", scopes),
        ],
    )
    .expect("authorize URL from normalized instance URL");
    url.to_string()
}

/// The complete automated setup: register, authorize without a browser,
/// exchange, verify
///
/// This is the whole `goto-grant` pipeline; `goto-setup` runs the same
/// steps but sources the authorization code from the operator instead.
pub async fn automated_setup(
    instance_url: &str,
    app_name: &str,
    scopes: &str,
    username: &str,
    password: &str,
) -> Result<Credentials> {
    let instance_url = normalize_instance_url(instance_url);
    let client = http_client()?;

    let registration = register_app(&client, &instance_url, app_name, scopes).await?;

    let authorizer =
        automated::AutomatedAuthorizer::new(&instance_url, &registration.client_id, scopes)?;
    let code = authorizer.obtain_code(username, password).await?;
    info!("obtained authorization code");

    let token = token::exchange_code(
        &client,
        &instance_url,
        &registration.client_id,
        &registration.client_secret,
        &code,
        OOB_REDIRECT_URI,
        scopes,
    )
    .await?;

    let account = token::verify_token(&client, &instance_url, &token.access_token).await?;
    info!(username = %account.username, "token verified");

    Ok(Credentials {
        instance_url,
        app_name: app_name.to_string(),
        client_id: registration.client_id,
        client_secret: registration.client_secret,
        access_token: token.access_token,
        token_type: token.token_type.unwrap_or_else(|| "Bearer".to_string()),
        scope: token.scope.or_else(|| Some(scopes.to_string())),
        created_at: token.created_at,
        account: Some(account),
    })
}
