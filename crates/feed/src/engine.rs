//! Incremental fetch-merge engine.
//!
//! A poll pulls records newer than the channel's watermark, advances and
//! persists the watermark as soon as the first record shows up, streams each
//! kept record downstream, then streams the cached entries of earlier polls.
//! The new entries end up prepended to the cache.

use std::{mem, pin::Pin, sync::Arc};

use {
    chrono::{DateTime, TimeDelta, Utc},
    futures::{Stream, StreamExt},
    tokio::sync::OwnedMutexGuard,
    tracing::{debug, info, trace, warn},
};

use crate::{
    Result,
    channel::{ChannelRegistry, ChannelSpec, ChannelState},
    source::NotificationSource,
    types::{FeedEntry, NotificationRecord},
    watermark::WatermarkStore,
};

/// Entries of one poll: new ones first, then the cache.
pub type EntryStream = Pin<Box<dyn Stream<Item = Result<FeedEntry>> + Send>>;

/// Watermark to store after seeing a record updated at `updated_at`.
///
/// GitHub's `since` has one-second resolution and is inclusive.
pub fn next_watermark(updated_at: DateTime<Utc>) -> DateTime<Utc> {
    updated_at + TimeDelta::seconds(1)
}

/// Owns the channel lock for the duration of a poll and merges whatever was
/// emitted into the cache, even if the consumer goes away half-way.
struct PendingMerge {
    channel: &'static str,
    state: OwnedMutexGuard<ChannelState>,
    fresh: Vec<FeedEntry>,
    cap: Option<usize>,
}

impl PendingMerge {
    fn new(channel: &'static str, state: OwnedMutexGuard<ChannelState>, cap: Option<usize>) -> Self {
        Self {
            channel,
            state,
            fresh: Vec::new(),
            cap,
        }
    }

    fn commit(&mut self) -> usize {
        let fresh = mem::take(&mut self.fresh);
        let count = fresh.len();
        self.state.merge(fresh, self.cap);
        count
    }
}

impl Drop for PendingMerge {
    fn drop(&mut self) {
        if !self.fresh.is_empty() {
            let kept = self.commit();
            debug!(channel = self.channel, kept, "poll interrupted, cached emitted entries");
        }
    }
}

/// Ties channels, the notification source and watermark persistence
/// together.
pub struct FeedEngine {
    registry: ChannelRegistry,
    source: Arc<dyn NotificationSource>,
    store: Arc<dyn WatermarkStore>,
    max_entries: Option<usize>,
}

impl FeedEngine {
    pub fn new(
        registry: ChannelRegistry,
        source: Arc<dyn NotificationSource>,
        store: Arc<dyn WatermarkStore>,
    ) -> Self {
        Self {
            registry,
            source,
            store,
            max_entries: None,
        }
    }

    /// Keep at most `cap` cached entries per channel. `None` keeps everything.
    #[must_use]
    pub fn with_max_entries(mut self, cap: Option<usize>) -> Self {
        self.max_entries = cap;
        self
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// Poll `channel`, yielding new entries as they are fetched and then the
    /// cached ones.
    ///
    /// Unknown channels fail here, before anything is fetched. Polls of the
    /// same channel run one after another; the returned stream holds the
    /// channel until it is exhausted or dropped.
    pub fn poll(&self, channel: &str, detail: bool) -> Result<EntryStream> {
        let channel = self.registry.resolve(channel)?.clone();
        let source = Arc::clone(&self.source);
        let store = Arc::clone(&self.store);
        let cap = self.max_entries;

        Ok(Box::pin(async_stream::stream! {
            let spec = *channel.spec();
            let mut pending = PendingMerge::new(spec.name, channel.lock().await, cap);
            let since = pending.state.watermark;
            debug!(channel = spec.name, mode = ?spec.mode, since = ?since, detail, "polling");

            let mut records = source.notifications(spec.mode, since);
            let mut fetched = 0usize;
            while let Some(record) = records.next().await {
                let record = match record {
                    Ok(record) => record,
                    Err(e) => {
                        warn!(channel = spec.name, error = %e, "notification fetch failed");
                        yield Err(e);
                        return;
                    },
                };

                fetched += 1;
                if fetched == 1 {
                    let next = next_watermark(record.updated_at);
                    if pending.state.advance_watermark(next) {
                        if let Err(e) = store.save(spec.name, next).await {
                            warn!(channel = spec.name, error = %e, "failed to persist watermark");
                        }
                        debug!(channel = spec.name, since = %next, "watermark advanced");
                    }
                }

                if !spec.keeps(&record) {
                    trace!(channel = spec.name, thread = %record.thread_id, "filtered out");
                    continue;
                }

                let link = resolve_link(source.as_ref(), &spec, &record, detail).await;
                let entry = FeedEntry::new(record, link);
                pending.fresh.push(entry.clone());
                yield Ok(entry);
            }

            for entry in &pending.state.entries {
                yield Ok(entry.clone());
            }

            let fresh = pending.commit();
            info!(
                channel = spec.name,
                fetched,
                new = fresh,
                cached = pending.state.entries.len(),
                "poll complete"
            );
        }))
    }

    /// Forget a channel's cache and watermark. The next poll fetches the
    /// full history again.
    pub async fn reset(&self, channel: &str) -> Result<()> {
        let channel = self.registry.resolve(channel)?;
        channel.lock().await.reset();
        info!(channel = channel.name(), "channel reset");
        Ok(())
    }
}

/// Pick the item link: a known human-facing URL, the detail lookup when
/// asked for, or the channel fallback. Detail failures only cost the link.
async fn resolve_link(
    source: &dyn NotificationSource,
    spec: &ChannelSpec,
    record: &NotificationRecord,
    detail: bool,
) -> String {
    if let Some(url) = &record.detail_url {
        return url.clone();
    }
    if detail && record.subject_type.has_detail_page() {
        match source.detail_url(record).await {
            Ok(url) => return url,
            Err(e) => {
                warn!(
                    channel = spec.name,
                    thread = %record.thread_id,
                    error = %e,
                    "detail lookup failed, using fallback link"
                );
            },
        }
    }
    spec.link_fallback.link_for(record)
}
