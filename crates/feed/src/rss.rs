//! RSS 2.0 rendering, one chunk at a time.
//!
//! The document is emitted as a head chunk (prologue and channel metadata),
//! one chunk per item as entries arrive, and a tail chunk. Nothing is
//! buffered, so a reader sees the head before the upstream fetch finishes.

use std::pin::Pin;

use {
    chrono::{DateTime, SecondsFormat, Utc},
    futures::{Stream, StreamExt},
    serde::{Deserialize, Serialize},
};

use crate::{
    Result,
    types::{FeedEntry, GuidMode, NOTIFICATIONS_URL},
};

/// Rendered document, chunk by chunk.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

const CHANNEL_TAIL: &str = "</channel></rss>";

/// Separator between description lines. Already escaped: readers decode it
/// back into an HTML line break.
const LINE_BREAK: &str = "&lt;br&gt;";

/// Replace the five XML special characters with entity references, and
/// characters XML 1.0 does not allow at all (C0 controls other than tab, LF
/// and CR, U+FFFE, U+FFFF) with U+FFFD.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if is_xml_char(c) => out.push(c),
            _ => out.push(char::REPLACEMENT_CHARACTER),
        }
    }
    out
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..)
}

/// Channel-level metadata of the generated feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedMeta {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
}

impl Default for FeedMeta {
    fn default() -> Self {
        Self {
            title: "GitHub Notifications".into(),
            link: NOTIFICATIONS_URL.into(),
            description: "GitHub Notifications".into(),
            language: "en-us".into(),
        }
    }
}

/// Turns feed entries into RSS text.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    meta: FeedMeta,
    guid_mode: GuidMode,
}

impl Renderer {
    pub fn new(meta: FeedMeta, guid_mode: GuidMode) -> Self {
        Self { meta, guid_mode }
    }

    /// XML prologue, `<rss>` and `<channel>` openers and channel metadata.
    pub fn head(&self, build_date: DateTime<Utc>) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
             <rss version=\"2.0\">\
             <channel>\
             <title>{}</title>\
             <link>{}</link>\
             <description>{}</description>\
             <lastBuildDate>{}</lastBuildDate>\
             <language>{}</language>",
            escape(&self.meta.title),
            escape(&self.meta.link),
            escape(&self.meta.description),
            escape(&build_date.to_rfc2822()),
            escape(&self.meta.language),
        )
    }

    pub fn tail(&self) -> &'static str {
        CHANNEL_TAIL
    }

    /// One `<item>` element. Every field is escaped on its own; composite
    /// fields escape each part before joining.
    pub fn item(&self, entry: &FeedEntry) -> String {
        let record = &entry.record;

        let title = escape(&format!(
            "{}: {} ({})",
            record.reason, record.title, record.repo_full_name
        ));
        let link = escape(&entry.link);
        let pub_date = escape(&record.updated_at.to_rfc2822());

        let guid = match self.guid_mode {
            GuidMode::Synthesized => {
                format!("<guid>{}{pub_date}{title}</guid>", escape(&record.api_url))
            },
            GuidMode::Thread => format!(
                "<guid isPermaLink=\"false\">{}:{}</guid>",
                escape(&record.thread_id),
                escape(
                    &record
                        .updated_at
                        .to_rfc3339_opts(SecondsFormat::Secs, true)
                ),
            ),
        };

        let description = [
            format!("unread: {}", record.unread),
            format!("reason: {}", record.reason),
            format!("type: {}", record.subject_type),
            format!("repo: {}", record.repo_full_name),
            format!("url: {}", record.api_url),
        ]
        .iter()
        .map(|line| escape(line))
        .collect::<Vec<_>>()
        .join(LINE_BREAK);

        format!(
            "<item><title>{title}</title><link>{link}</link>{guid}<pubDate>{pub_date}</pubDate><description>{description}</description></item>"
        )
    }

    /// Render `entries` as a chunked RSS document.
    ///
    /// An error from `entries` is passed through and ends the document
    /// without its closing tags.
    pub fn render<S>(&self, build_date: DateTime<Utc>, entries: S) -> ChunkStream
    where
        S: Stream<Item = Result<FeedEntry>> + Send + 'static,
    {
        let renderer = self.clone();
        Box::pin(async_stream::stream! {
            yield Ok(renderer.head(build_date));

            let mut entries = Box::pin(entries);
            while let Some(entry) = entries.next().await {
                match entry {
                    Ok(entry) => yield Ok(renderer.item(&entry)),
                    Err(e) => {
                        yield Err(e);
                        return;
                    },
                }
            }

            yield Ok(renderer.tail().to_string());
        })
    }
}
