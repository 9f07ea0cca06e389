//! The upstream notification feed, as seen by the engine.

use std::pin::Pin;

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    futures::Stream,
};

use crate::{
    Result,
    types::{FetchMode, NotificationRecord},
};

/// Lazily produced records. Paging, if any, happens behind this stream.
pub type RecordStream<'a> = Pin<Box<dyn Stream<Item = Result<NotificationRecord>> + Send + 'a>>;

/// Source of notification records.
#[async_trait]
pub trait NotificationSource: Send + Sync {
    /// Records updated at or after `since` (everything when `None`), newest
    /// first.
    fn notifications(&self, mode: FetchMode, since: Option<DateTime<Utc>>) -> RecordStream<'_>;

    /// Resolve the human-facing URL of a record's subject.
    async fn detail_url(&self, record: &NotificationRecord) -> Result<String>;
}
