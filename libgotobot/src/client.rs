//! Thin client over the Mastodon-compatible REST API
//!
//! Stateless facade over an instance URL and a bearer token: one
//! authenticated HTTP request per operation, parameters translated
//! directly to form fields. No retry, backoff, caching, or pagination;
//! HTTP errors surface as [`ApiError::Status`] with the response body.

use std::path::Path;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::normalize_instance_url;
use crate::credentials::Credentials;
use crate::error::{ApiError, GotobotError, Result};
use crate::oauth::USER_AGENT;
use crate::types::{
    Account, MediaAttachment, Notification, Relationship, SearchResults, Status, Timeline,
    Visibility,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Servers cap timeline pages at 40 statuses
const TIMELINE_LIMIT_MAX: u32 = 40;
/// Notification pages cap at 30
const NOTIFICATION_LIMIT_MAX: u32 = 30;

/// Parameters for posting a status
#[derive(Debug, Clone, Default)]
pub struct StatusParams {
    pub text: String,
    pub visibility: Visibility,
    pub sensitive: bool,
    /// Content-warning text; shown collapsed above the status
    pub spoiler_text: Option<String>,
    pub in_reply_to_id: Option<String>,
    pub media_ids: Vec<String>,
}

impl StatusParams {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Authenticated client for one instance
pub struct BotClient {
    http: reqwest::Client,
    instance_url: String,
}

impl BotClient {
    /// Create a client from an instance URL and access token
    ///
    /// The bearer token goes into a default header so every request is
    /// authenticated without further plumbing.
    pub fn new(instance_url: &str, access_token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", access_token))
            .map_err(|_| GotobotError::InvalidInput("access token is not valid ASCII".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            instance_url: normalize_instance_url(instance_url),
        })
    }

    pub fn from_credentials(creds: &Credentials) -> Result<Self> {
        Self::new(&creds.instance_url, &creds.access_token)
    }

    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.instance_url, path)
    }

    /// Reject content no server would accept, before any network call
    pub fn validate_content(content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(GotobotError::InvalidInput(
                "status content cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Post a new status
    pub async fn post_status(&self, params: &StatusParams) -> Result<Status> {
        Self::validate_content(&params.text)?;

        let mut form: Vec<(&str, String)> = vec![
            ("status", params.text.clone()),
            ("visibility", params.visibility.as_str().to_string()),
            ("sensitive", params.sensitive.to_string()),
        ];
        if let Some(spoiler) = &params.spoiler_text {
            if !spoiler.is_empty() {
                form.push(("spoiler_text", spoiler.clone()));
            }
        }
        if let Some(reply_to) = &params.in_reply_to_id {
            form.push(("in_reply_to_id", reply_to.clone()));
        }
        for media_id in &params.media_ids {
            form.push(("media_ids[]", media_id.clone()));
        }

        debug!(visibility = %params.visibility, "posting status");
        let response = self
            .http
            .post(self.api_url("/api/v1/statuses"))
            .form(&form)
            .send()
            .await
            .map_err(network)?;
        decode(response).await
    }

    /// Upload a media file, returning the attachment whose id can be fed
    /// into [`StatusParams::media_ids`]
    pub async fn upload_media(
        &self,
        file_path: impl AsRef<Path>,
        description: Option<&str>,
    ) -> Result<MediaAttachment> {
        let file_path = file_path.as_ref();
        let bytes = tokio::fs::read(file_path).await.map_err(|e| {
            GotobotError::InvalidInput(format!(
                "cannot read media file {}: {}",
                file_path.display(),
                e
            ))
        })?;

        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime_for_path(file_path))
            .map_err(|e| ApiError::Network(format!("invalid MIME type: {}", e)))?;

        let mut form = multipart::Form::new().part("file", part);
        if let Some(description) = description {
            if !description.is_empty() {
                form = form.text("description", description.to_string());
            }
        }

        debug!(path = %file_path.display(), "uploading media");
        let response = self
            .http
            .post(self.api_url("/api/v1/media"))
            .multipart(form)
            .send()
            .await
            .map_err(network)?;
        decode(response).await
    }

    /// Account profile for the authenticated user
    pub async fn verify_credentials(&self) -> Result<Account> {
        let response = self
            .http
            .get(self.api_url("/api/v1/accounts/verify_credentials"))
            .send()
            .await
            .map_err(network)?;
        decode(response).await
    }

    /// Fetch a timeline page; `limit` is clamped to the server maximum
    pub async fn timeline(&self, timeline: &Timeline, limit: u32) -> Result<Vec<Status>> {
        let limit = limit.min(TIMELINE_LIMIT_MAX);
        let url = self.api_url(&format!("/api/v1/timelines/{}", timeline.path_segment()));
        let response = self
            .http
            .get(url)
            .query(&[("limit", limit.to_string())])
            .send()
            .await
            .map_err(network)?;
        decode(response).await
    }

    /// Favourite (like) a status
    pub async fn favourite(&self, status_id: &str) -> Result<Status> {
        let url = self.api_url(&format!("/api/v1/statuses/{}/favourite", status_id));
        let response = self.http.post(url).send().await.map_err(network)?;
        decode(response).await
    }

    /// Boost (reblog) a status
    pub async fn boost(&self, status_id: &str) -> Result<Status> {
        let url = self.api_url(&format!("/api/v1/statuses/{}/reblog", status_id));
        let response = self.http.post(url).send().await.map_err(network)?;
        decode(response).await
    }

    /// Delete one of the account's own statuses
    pub async fn delete_status(&self, status_id: &str) -> Result<Status> {
        let url = self.api_url(&format!("/api/v1/statuses/{}", status_id));
        let response = self.http.delete(url).send().await.map_err(network)?;
        decode(response).await
    }

    /// Follow an account by id
    pub async fn follow(&self, account_id: &str) -> Result<Relationship> {
        let url = self.api_url(&format!("/api/v1/accounts/{}/follow", account_id));
        let response = self.http.post(url).send().await.map_err(network)?;
        decode(response).await
    }

    /// Search for accounts matching a query
    pub async fn search_accounts(&self, query: &str, limit: u32) -> Result<Vec<Account>> {
        let response = self
            .http
            .get(self.api_url("/api/v2/search"))
            .query(&[
                ("q", query),
                ("type", "accounts"),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await
            .map_err(network)?;
        let results: SearchResults = decode(response).await?;
        Ok(results.accounts)
    }

    /// Fetch notifications; `limit` is clamped to the server maximum
    pub async fn notifications(&self, limit: u32) -> Result<Vec<Notification>> {
        let limit = limit.min(NOTIFICATION_LIMIT_MAX);
        let response = self
            .http
            .get(self.api_url("/api/v1/notifications"))
            .query(&[("limit", limit.to_string())])
            .send()
            .await
            .map_err(network)?;
        decode(response).await
    }
}

fn network(e: reqwest::Error) -> GotobotError {
    ApiError::Network(e.to_string()).into()
}

/// Turn a non-success response into [`ApiError::Status`], otherwise decode
/// the JSON body
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            body,
        }
        .into());
    }
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()).into())
}

/// MIME type from the file extension; servers sniff the content anyway
fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_normalizes_instance_url() {
        let client = BotClient::new("gts.example.org/", "tok").unwrap();
        assert_eq!(client.instance_url(), "https://gts.example.org");
    }

    #[test]
    fn test_validate_content_rejects_empty() {
        assert!(BotClient::validate_content("").is_err());
        assert!(BotClient::validate_content("   ").is_err());
        assert!(BotClient::validate_content("\t\n").is_err());
    }

    #[test]
    fn test_validate_content_accepts_text() {
        assert!(BotClient::validate_content("hello fediverse").is_ok());
        assert!(BotClient::validate_content("  padded  ").is_ok());
    }

    #[test]
    fn test_validate_error_is_invalid_input() {
        let err = BotClient::validate_content("  ").unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(matches!(err, GotobotError::InvalidInput(_)));
    }

    #[test]
    fn test_invalid_token_rejected() {
        let result = BotClient::new("https://gts.example.org", "bad\ntoken");
        assert!(result.is_err());
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("sunset.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("cat.png")), "image/png");
        assert_eq!(mime_for_path(Path::new("clip.mp4")), "video/mp4");
        assert_eq!(
            mime_for_path(Path::new("mystery.bin")),
            "application/octet-stream"
        );
        assert_eq!(mime_for_path(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_status_params_defaults() {
        let params = StatusParams::new("hi");
        assert_eq!(params.visibility, Visibility::Public);
        assert!(!params.sensitive);
        assert!(params.media_ids.is_empty());
    }
}
