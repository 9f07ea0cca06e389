//! Persistence trait for per-channel watermarks.

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
};

use crate::Result;

/// Key-value store holding one timestamp per channel name.
#[async_trait]
pub trait WatermarkStore: Send + Sync {
    /// `Ok(None)` when nothing was stored for `channel` yet.
    async fn load(&self, channel: &str) -> Result<Option<DateTime<Utc>>>;
    async fn save(&self, channel: &str, since: DateTime<Utc>) -> Result<()>;
}
