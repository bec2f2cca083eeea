//! Typed objects for the Mastodon-compatible API
//!
//! Only the fields the tools actually consume are modeled; everything else
//! the server sends is ignored on deserialization.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An account profile, as returned by verify_credentials and embedded in
/// statuses and notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A status (toot) as returned by the statuses and timelines endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub id: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub account: Option<Account>,
}

/// An uploaded media attachment; `id` is what gets attached to a status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub id: String,
    #[serde(rename = "type", default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A notification (mention, follow, favourite, reblog, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub account: Account,
    #[serde(default)]
    pub status: Option<Status>,
}

/// Relationship between the authenticated account and another, as returned
/// by the follow endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    #[serde(default)]
    pub following: bool,
    #[serde(default)]
    pub requested: bool,
}

/// Subset of the `/api/v2/search` response the tools care about
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub accounts: Vec<Account>,
}

/// Status visibility, mirroring the API's string values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Unlisted,
    Private,
    Direct,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Unlisted => "unlisted",
            Visibility::Private => "private",
            Visibility::Direct => "direct",
        }
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "unlisted" => Ok(Visibility::Unlisted),
            "private" => Ok(Visibility::Private),
            "direct" => Ok(Visibility::Direct),
            _ => Err(format!(
                "Invalid visibility: '{}'. Valid options: public, unlisted, private, direct",
                s
            )),
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which timeline to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timeline {
    Home,
    Local,
    Public,
    /// Hashtag timeline, without the leading `#`
    Tag(String),
}

impl Timeline {
    /// Path segment appended to `/api/v1/timelines/`
    pub fn path_segment(&self) -> String {
        match self {
            Timeline::Home => "home".to_string(),
            Timeline::Local => "local".to_string(),
            Timeline::Public => "public".to_string(),
            Timeline::Tag(tag) => format!("tag/{}", tag),
        }
    }
}

impl FromStr for Timeline {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "home" => Ok(Timeline::Home),
            "local" => Ok(Timeline::Local),
            "public" => Ok(Timeline::Public),
            other => {
                if let Some(tag) = other.strip_prefix("tag/") {
                    if !tag.is_empty() {
                        return Ok(Timeline::Tag(tag.to_string()));
                    }
                }
                Err(format!(
                    "Invalid timeline: '{}'. Valid options: home, local, public, tag/<hashtag>",
                    s
                ))
            }
        }
    }
}

impl std::fmt::Display for Timeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}
