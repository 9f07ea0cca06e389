//! Named channels: a fixed table of fetch policies plus per-channel state.

use std::sync::Arc;

use {
    chrono::{DateTime, Utc},
    tokio::sync::{Mutex, OwnedMutexGuard},
    tracing::{debug, info, warn},
};

use crate::{
    Error, Result,
    types::{FeedEntry, FetchMode, LinkFallback, NotificationRecord},
    watermark::WatermarkStore,
};

/// Post-fetch predicate. Returns `false` to drop the record.
pub type RecordFilter = fn(&NotificationRecord) -> bool;

/// Static configuration of one channel.
#[derive(Debug, Clone, Copy)]
pub struct ChannelSpec {
    pub name: &'static str,
    pub mode: FetchMode,
    pub filter: Option<RecordFilter>,
    pub link_fallback: LinkFallback,
}

impl ChannelSpec {
    pub const fn new(name: &'static str, mode: FetchMode) -> Self {
        Self {
            name,
            mode,
            filter: None,
            link_fallback: LinkFallback::Landing,
        }
    }

    #[must_use]
    pub const fn with_filter(mut self, filter: RecordFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub const fn with_link_fallback(mut self, link_fallback: LinkFallback) -> Self {
        self.link_fallback = link_fallback;
        self
    }

    pub fn keeps(&self, record: &NotificationRecord) -> bool {
        self.filter.is_none_or(|keep| keep(record))
    }
}

fn is_unread(record: &NotificationRecord) -> bool {
    record.unread
}

/// The channels served by default: `all`, `unread` and `participating`.
pub fn default_channels() -> Vec<ChannelSpec> {
    vec![
        ChannelSpec::new("all", FetchMode::All),
        ChannelSpec::new("unread", FetchMode::UnreadOnly).with_filter(is_unread),
        ChannelSpec::new("participating", FetchMode::Participating),
    ]
}

/// Mutable state of a channel, only touched by the engine.
#[derive(Debug, Clone, Default)]
pub struct ChannelState {
    pub watermark: Option<DateTime<Utc>>,
    /// Newest first. Grows without bound unless a cap is configured.
    pub entries: Vec<FeedEntry>,
}

impl ChannelState {
    pub fn with_watermark(watermark: Option<DateTime<Utc>>) -> Self {
        Self {
            watermark,
            entries: Vec::new(),
        }
    }

    /// Move the watermark forward to `candidate`. Returns `false` and leaves
    /// the state alone if that would not move it forward.
    pub fn advance_watermark(&mut self, candidate: DateTime<Utc>) -> bool {
        match self.watermark {
            Some(current) if candidate <= current => false,
            _ => {
                self.watermark = Some(candidate);
                true
            },
        }
    }

    /// Prepend one poll's entries, then drop the oldest beyond `cap`.
    pub fn merge(&mut self, mut fresh: Vec<FeedEntry>, cap: Option<usize>) {
        fresh.append(&mut self.entries);
        self.entries = fresh;
        if let Some(cap) = cap {
            self.entries.truncate(cap);
        }
    }

    pub fn reset(&mut self) {
        self.watermark = None;
        self.entries.clear();
    }
}

/// A configured channel and its shared state.
#[derive(Debug, Clone)]
pub struct Channel {
    spec: ChannelSpec,
    state: Arc<Mutex<ChannelState>>,
}

impl Channel {
    fn new(spec: ChannelSpec, state: ChannelState) -> Self {
        Self {
            spec,
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn spec(&self) -> &ChannelSpec {
        &self.spec
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    /// Exclusive access to the state for the lifetime of the guard.
    pub async fn lock(&self) -> OwnedMutexGuard<ChannelState> {
        Arc::clone(&self.state).lock_owned().await
    }

    pub async fn watermark(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.watermark
    }

    pub async fn entries(&self) -> Vec<FeedEntry> {
        self.state.lock().await.entries.clone()
    }
}

/// Fixed mapping from channel name to channel, built once at startup.
#[derive(Debug, Clone)]
pub struct ChannelRegistry {
    channels: Vec<Channel>,
}

impl ChannelRegistry {
    /// Channels with empty state: the first poll of each fetches everything.
    pub fn new(specs: Vec<ChannelSpec>) -> Self {
        let channels = specs
            .into_iter()
            .map(|spec| Channel::new(spec, ChannelState::default()))
            .collect();
        Self { channels }
    }

    /// Channels with watermarks restored from `store`. A failed load is
    /// treated as no watermark.
    pub async fn restore(specs: Vec<ChannelSpec>, store: &dyn WatermarkStore) -> Self {
        let mut channels = Vec::with_capacity(specs.len());
        for spec in specs {
            let watermark = match store.load(spec.name).await {
                Ok(Some(since)) => {
                    info!(channel = spec.name, since = %since, "restored watermark");
                    Some(since)
                },
                Ok(None) => {
                    debug!(channel = spec.name, "no stored watermark");
                    None
                },
                Err(e) => {
                    warn!(channel = spec.name, error = %e, "failed to load watermark, fetching full history");
                    None
                },
            };
            channels.push(Channel::new(spec, ChannelState::with_watermark(watermark)));
        }
        Self { channels }
    }

    pub fn resolve(&self, name: &str) -> Result<&Channel> {
        self.channels
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| Error::channel_not_found(name))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.channels.iter().map(Channel::name).collect()
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new(default_channels())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{types::SubjectType, watermark_memory::MemoryWatermarkStore},
        chrono::TimeZone,
    };

    fn record(unread: bool) -> NotificationRecord {
        NotificationRecord {
            thread_id: "1".into(),
            title: "t".into(),
            subject_type: SubjectType::Issue,
            repo_full_name: "o/r".into(),
            reason: "mention".into(),
            api_url: "https://api.github.com/notifications/threads/1".into(),
            subject_url: None,
            detail_url: None,
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            unread,
        }
    }

    fn entry(id: &str) -> FeedEntry {
        let mut r = record(true);
        r.thread_id = id.into();
        FeedEntry::new(r, "l".into())
    }

    fn ids(entries: &[FeedEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.record.thread_id.as_str()).collect()
    }

    #[test]
    fn unread_channel_drops_read_records() {
        let registry = ChannelRegistry::default();
        let unread = registry.resolve("unread").unwrap().spec();
        assert!(unread.keeps(&record(true)));
        assert!(!unread.keeps(&record(false)));

        let all = registry.resolve("all").unwrap().spec();
        assert!(all.keeps(&record(false)));
    }

    #[test]
    fn resolve_unknown_channel() {
        let registry = ChannelRegistry::default();
        let err = registry.resolve("nope").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "unknown channel: nope");
    }

    #[test]
    fn names_keep_table_order() {
        let registry = ChannelRegistry::default();
        assert_eq!(registry.names(), vec!["all", "unread", "participating"]);
    }

    #[test]
    fn watermark_never_moves_back() {
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let mut state = ChannelState::default();
        assert!(state.advance_watermark(t2));
        assert!(!state.advance_watermark(t1));
        assert!(!state.advance_watermark(t2));
        assert_eq!(state.watermark, Some(t2));
    }

    #[test]
    fn merge_prepends_and_caps() {
        let mut state = ChannelState::default();
        state.merge(vec![entry("a"), entry("b")], None);
        state.merge(vec![entry("c")], None);
        assert_eq!(ids(&state.entries), vec!["c", "a", "b"]);

        state.merge(vec![entry("d")], Some(2));
        assert_eq!(ids(&state.entries), vec!["d", "c"]);
    }

    #[tokio::test]
    async fn restore_loads_stored_watermarks() {
        let since = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let store = MemoryWatermarkStore::new();
        store.save("unread", since).await.unwrap();

        let registry = ChannelRegistry::restore(default_channels(), &store).await;
        assert_eq!(
            registry.resolve("unread").unwrap().watermark().await,
            Some(since)
        );
        assert_eq!(registry.resolve("all").unwrap().watermark().await, None);
    }
}
