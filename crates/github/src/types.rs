//! Wire types of the GitHub notifications API.

use {
    chrono::{DateTime, Utc},
    notifeed_feed::{NotificationRecord, SubjectType},
    serde::Deserialize,
};

/// One entry of `GET /notifications`.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationThread {
    pub id: String,
    pub repository: Repository,
    pub subject: Subject,
    pub reason: String,
    pub unread: bool,
    pub updated_at: DateTime<Utc>,
    /// API URL of the thread itself.
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subject {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Null for subjects without an API resource (e.g. some check suites).
    #[serde(default)]
    pub url: Option<String>,
}

/// The part of an issue or pull request we need for detail lookups.
#[derive(Debug, Clone, Deserialize)]
pub struct SubjectDetail {
    #[serde(default)]
    pub html_url: Option<String>,
}

impl From<NotificationThread> for NotificationRecord {
    fn from(thread: NotificationThread) -> Self {
        Self {
            thread_id: thread.id,
            title: thread.subject.title,
            subject_type: SubjectType::parse(&thread.subject.kind),
            repo_full_name: thread.repository.full_name,
            reason: thread.reason,
            api_url: thread.url,
            subject_url: thread.subject.url,
            detail_url: None,
            updated_at: thread.updated_at,
            unread: thread.unread,
        }
    }
}
