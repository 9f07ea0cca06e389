//! Core data types: notification records as fetched, and the cache-ready
//! entries derived from them.

use std::fmt;

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

/// Landing page used as the item link when nothing better is known.
pub const NOTIFICATIONS_URL: &str = "https://github.com/notifications";

/// Which notifications the source is asked for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// Read and unread notifications.
    All,
    /// Unread only. GitHub does not reliably honor this, so channels using it
    /// usually also filter on [`NotificationRecord::unread`].
    UnreadOnly,
    /// Only threads the user is directly participating in.
    Participating,
}

/// Kind of thing a notification is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectType {
    PullRequest,
    Issue,
    Other(String),
}

impl SubjectType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "PullRequest" => Self::PullRequest,
            "Issue" => Self::Issue,
            other => Self::Other(other.to_string()),
        }
    }

    /// Subjects with a human-facing page reachable through a detail lookup.
    pub fn has_detail_page(&self) -> bool {
        matches!(self, Self::PullRequest | Self::Issue)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::PullRequest => "PullRequest",
            Self::Issue => "Issue",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SubjectType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SubjectType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// One notification thread as returned by the source. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub thread_id: String,
    pub title: String,
    pub subject_type: SubjectType,
    pub repo_full_name: String,
    pub reason: String,
    /// API URL of the notification thread.
    pub api_url: String,
    /// API URL of the subject (issue, pull request, ...), if any.
    pub subject_url: Option<String>,
    /// Human-facing URL, when the source already knows it.
    pub detail_url: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub unread: bool,
}

/// Where an item links to when no human-facing URL was resolved.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LinkFallback {
    /// The fixed notifications landing page.
    #[default]
    Landing,
    /// The record's API URL.
    Api,
}

impl LinkFallback {
    pub fn link_for(self, record: &NotificationRecord) -> String {
        match self {
            Self::Landing => NOTIFICATIONS_URL.to_string(),
            Self::Api => record.api_url.clone(),
        }
    }
}

/// How item GUIDs are built.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GuidMode {
    /// `url ++ pubDate ++ title`, each escaped. Compatible with older feeds.
    #[default]
    Synthesized,
    /// Thread id plus update time; does not change when the link does.
    Thread,
}

/// A record normalized for caching and rendering: the link is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub record: NotificationRecord,
    pub link: String,
}

impl FeedEntry {
    pub fn new(record: NotificationRecord, link: String) -> Self {
        Self { record, link }
    }
}
