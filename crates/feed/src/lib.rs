//! Incremental GitHub-notification feed: per-channel watermarks, the
//! fetch-merge engine and the streaming RSS renderer.
//!
//! The notification source and watermark persistence are traits
//! ([`NotificationSource`], [`WatermarkStore`]); the HTTP layer and the
//! GitHub client live in their own crates.

pub mod channel;
pub mod engine;
pub mod error;
pub mod rss;
pub mod source;
pub mod types;
pub mod watermark;
pub mod watermark_file;
pub mod watermark_memory;

pub use {
    channel::{Channel, ChannelRegistry, ChannelSpec, ChannelState, default_channels},
    engine::{EntryStream, FeedEngine},
    error::{Error, Result},
    rss::{FeedMeta, Renderer},
    source::{NotificationSource, RecordStream},
    types::{FeedEntry, FetchMode, GuidMode, LinkFallback, NotificationRecord, SubjectType},
    watermark::WatermarkStore,
    watermark_file::FileWatermarkStore,
    watermark_memory::MemoryWatermarkStore,
};
