#![allow(clippy::unwrap_used, clippy::expect_used)]
//! HTTP routes against a real bound server.

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use {
    async_trait::async_trait,
    chrono::{DateTime, TimeZone, Utc},
    futures::stream,
    notifeed_feed::{
        ChannelRegistry, Error, FeedEngine, FeedMeta, FetchMode, GuidMode, MemoryWatermarkStore,
        NotificationRecord, NotificationSource, RecordStream, Renderer, Result, SubjectType,
        default_channels,
    },
    notifeed_gateway::{AppState, build_app},
    quick_xml::{Reader, events::Event},
    tokio::net::TcpListener,
};

#[derive(Default)]
struct FakeSource {
    records: Mutex<Vec<NotificationRecord>>,
}

impl FakeSource {
    fn push(&self, record: NotificationRecord) {
        self.records.lock().unwrap().push(record);
    }
}

#[async_trait]
impl NotificationSource for FakeSource {
    fn notifications(&self, mode: FetchMode, since: Option<DateTime<Utc>>) -> RecordStream<'_> {
        let mut records: Vec<_> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| since.is_none_or(|s| r.updated_at >= s))
            .filter(|r| mode != FetchMode::UnreadOnly || r.unread)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Box::pin(stream::iter(records.into_iter().map(Ok)))
    }

    async fn detail_url(&self, record: &NotificationRecord) -> Result<String> {
        if record.thread_id == "broken" {
            return Err(Error::message("subject lookup failed"));
        }
        Ok(format!(
            "https://github.com/{}/issues/{}",
            record.repo_full_name, record.thread_id
        ))
    }
}

fn record(id: &str, title: &str, minute: u32, unread: bool) -> NotificationRecord {
    NotificationRecord {
        thread_id: id.into(),
        title: title.into(),
        subject_type: SubjectType::Issue,
        repo_full_name: "octo/repo".into(),
        reason: "mention".into(),
        api_url: format!("https://api.github.com/notifications/threads/{id}"),
        subject_url: Some(format!("https://api.github.com/repos/octo/repo/issues/{id}")),
        detail_url: None,
        updated_at: Utc.with_ymd_and_hms(2024, 2, 13, 10, minute, 0).unwrap(),
        unread,
    }
}

async fn start_server(source: Arc<FakeSource>) -> SocketAddr {
    let registry = ChannelRegistry::new(default_channels());
    let engine = FeedEngine::new(registry, source, Arc::new(MemoryWatermarkStore::new()));
    let renderer = Renderer::new(FeedMeta::default(), GuidMode::Thread);
    let app = build_app(AppState::new(engine, renderer));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

/// Item titles and links of an RSS document, in document order.
fn items(xml: &str) -> Vec<(String, String)> {
    let mut reader = Reader::from_str(xml);
    let mut out = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut title = String::new();
    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) => {
                path.push(String::from_utf8(e.name().as_ref().to_vec()).unwrap());
            },
            Event::End(_) => {
                path.pop();
            },
            Event::Text(t) => {
                let text = t.unescape().unwrap().into_owned();
                match path.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
                    [.., "item", "title"] => title = text,
                    [.., "item", "link"] => out.push((std::mem::take(&mut title), text)),
                    _ => {},
                }
            },
            Event::Eof => break,
            _ => {},
        }
    }
    out
}

async fn get_feed(addr: SocketAddr, path: &str) -> Vec<(String, String)> {
    let resp = reqwest::get(format!("http://{addr}{path}")).await.unwrap();
    assert_eq!(resp.status(), 200);
    items(&resp.text().await.unwrap())
}

#[tokio::test]
async fn default_route_serves_all_channel_as_rss() {
    let source = Arc::new(FakeSource::default());
    source.push(record("1", "Older & wiser", 1, false));
    source.push(record("2", "Newer <b>", 2, true));
    let addr = start_server(Arc::clone(&source)).await;

    let resp = reqwest::get(format!("http://{addr}/notifications"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()["content-type"],
        "application/rss+xml; charset=utf-8"
    );
    let body = resp.text().await.unwrap();
    assert!(body.starts_with("<?xml"));
    assert!(body.ends_with("</channel></rss>"));

    let titles: Vec<_> = items(&body).into_iter().map(|(t, _)| t).collect();
    assert_eq!(titles, vec![
        "mention: Newer <b> (octo/repo)",
        "mention: Older & wiser (octo/repo)",
    ]);
}

#[tokio::test]
async fn repeated_polls_keep_each_entry_once() {
    let source = Arc::new(FakeSource::default());
    source.push(record("1", "First", 1, true));
    let addr = start_server(Arc::clone(&source)).await;

    assert_eq!(get_feed(addr, "/notifications/all").await.len(), 1);
    assert_eq!(get_feed(addr, "/notifications/all").await.len(), 1);

    source.push(record("2", "Second", 5, true));
    let titles: Vec<_> = get_feed(addr, "/notifications/all")
        .await
        .into_iter()
        .map(|(t, _)| t)
        .collect();
    assert_eq!(titles, vec![
        "mention: Second (octo/repo)",
        "mention: First (octo/repo)",
    ]);
}

#[tokio::test]
async fn unread_channel_skips_read_notifications() {
    let source = Arc::new(FakeSource::default());
    source.push(record("1", "Read", 1, false));
    source.push(record("2", "Unread", 2, true));
    let addr = start_server(source).await;

    let feed = get_feed(addr, "/notifications/unread").await;
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].0, "mention: Unread (octo/repo)");
}

#[tokio::test]
async fn unknown_channel_is_not_found() {
    let addr = start_server(Arc::new(FakeSource::default())).await;

    for path in ["/notifications/nope", "/notifications/nope/detail"] {
        let resp = reqwest::get(format!("http://{addr}{path}")).await.unwrap();
        assert_eq!(resp.status(), 404);
        assert_eq!(resp.text().await.unwrap(), "unknown channel: nope");
    }

    let resp = reqwest::Client::new()
        .delete(format!("http://{addr}/notifications/nope"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn detail_route_resolves_links_with_fallback() {
    let source = Arc::new(FakeSource::default());
    source.push(record("broken", "Flaky", 1, true));
    source.push(record("7", "Solid", 2, true));
    let addr = start_server(source).await;

    let feed = get_feed(addr, "/notifications/all/detail").await;
    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0].1, "https://github.com/octo/repo/issues/7");
    assert_eq!(feed[1].1, "https://github.com/notifications");
}

#[tokio::test]
async fn plain_route_uses_default_link() {
    let source = Arc::new(FakeSource::default());
    source.push(record("7", "Solid", 2, true));
    let addr = start_server(source).await;

    let feed = get_feed(addr, "/notifications/all").await;
    assert_eq!(feed[0].1, "https://github.com/notifications");
}

#[tokio::test]
async fn reset_refetches_history() {
    let source = Arc::new(FakeSource::default());
    source.push(record("1", "First", 1, true));
    source.push(record("2", "Second", 2, true));
    let addr = start_server(source).await;

    assert_eq!(get_feed(addr, "/notifications/all").await.len(), 2);

    let resp = reqwest::Client::new()
        .delete(format!("http://{addr}/notifications/all"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    assert_eq!(get_feed(addr, "/notifications/all").await.len(), 2);
}

#[tokio::test]
async fn health_lists_channels() {
    let addr = start_server(Arc::new(FakeSource::default())).await;

    let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(
        body["channels"],
        serde_json::json!(["all", "unread", "participating"])
    );
}
