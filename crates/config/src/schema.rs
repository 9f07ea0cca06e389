/// Config schema types (server, GitHub access, feed output, persistence).
use std::{path::PathBuf, time::Duration};

use {
    notifeed_feed::{FeedMeta, GuidMode},
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 9999;
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_PER_PAGE: u32 = 50;
/// GitHub caps `per_page` at 100.
pub const MAX_PER_PAGE: u32 = 100;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifeedConfig {
    pub server: ServerConfig,
    pub github: GitHubConfig,
    pub feed: FeedConfig,
    pub persistence: PersistenceConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "127.0.0.1".
    pub bind: String,
    /// Port to listen on. Defaults to 9999.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.into(),
            port: DEFAULT_PORT,
        }
    }
}

/// Access to the GitHub REST API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Personal access token with the `notifications` scope. Usually supplied
    /// as `${GITHUB_TOKEN}` or through the environment.
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub token: Option<Secret<String>>,
    /// API base URL. Change for GitHub Enterprise (`https://host/api/v3`).
    pub api_url: String,
    /// Page size for notification listing, 1..=100.
    pub per_page: u32,
    pub user_agent: String,
    /// Per-request timeout. A poll holds its channel until the request ends.
    pub timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: DEFAULT_API_URL.into(),
            per_page: DEFAULT_PER_PAGE,
            user_agent: concat!("notifeed/", env!("CARGO_PKG_VERSION")).into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl GitHubConfig {
    /// `per_page` clamped to what GitHub accepts.
    pub fn page_size(&self) -> u32 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Shape of the generated RSS.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    #[serde(flatten)]
    pub meta: FeedMeta,
    pub guid: GuidMode,
    /// Cap on cached entries per channel. Unlimited when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<usize>,
}

/// Watermark persistence across restarts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub enabled: bool,
    /// Directory holding one watermark file per channel. Defaults to
    /// `<data_dir>/watermarks`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

pub fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}
