//! REST client for `GET /notifications` and subject lookups.

use {
    async_trait::async_trait,
    chrono::{DateTime, SecondsFormat, Utc},
    notifeed_config::GitHubConfig,
    notifeed_feed::{FetchMode, NotificationRecord, NotificationSource, RecordStream},
    reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, info},
    url::Url,
};

use crate::{
    Error, Result,
    types::{NotificationThread, SubjectDetail},
};

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const API_VERSION: &str = "2022-11-28";

/// Authenticated GitHub client.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    per_page: u32,
}

impl GitHubClient {
    pub fn new(token: &Secret<String>, config: &GitHubConfig) -> Result<Self> {
        let base = Url::parse(&config.api_url)?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));
        headers.insert(USER_AGENT, HeaderValue::from_str(&config.user_agent)?);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(config.timeout())
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            api_url: base.as_str().trim_end_matches('/').to_string(),
            per_page: config.page_size(),
        })
    }

    /// Fetch one page of notification threads.
    pub async fn fetch_page(
        &self,
        mode: FetchMode,
        since: Option<DateTime<Utc>>,
        page: u32,
    ) -> Result<Vec<NotificationThread>> {
        let url = format!("{}/notifications", self.api_url);
        debug!(url = %url, ?mode, ?since, page, "fetching notifications page");

        let resp = self
            .http
            .get(&url)
            .query(&page_query(mode, since, self.per_page, page))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Status { status, body });
        }

        Ok(resp.json().await?)
    }

    /// Look up the `html_url` of an issue or pull request.
    pub async fn subject_html_url(&self, subject_url: &str) -> Result<String> {
        let resp = self.http.get(subject_url).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Status { status, body });
        }

        let detail: SubjectDetail = resp.json().await?;
        detail
            .html_url
            .ok_or_else(|| Error::message(format!("{subject_url} has no html_url")))
    }
}

/// Query parameters for one page of `GET /notifications`.
fn page_query(
    mode: FetchMode,
    since: Option<DateTime<Utc>>,
    per_page: u32,
    page: u32,
) -> Vec<(&'static str, String)> {
    let mut query = match mode {
        FetchMode::All => vec![("all", "true".to_string())],
        FetchMode::UnreadOnly => vec![("all", "false".to_string())],
        FetchMode::Participating => vec![
            ("all", "true".to_string()),
            ("participating", "true".to_string()),
        ],
    };
    if let Some(since) = since {
        query.push(("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)));
    }
    query.push(("per_page", per_page.to_string()));
    query.push(("page", page.to_string()));
    query
}

#[async_trait]
impl NotificationSource for GitHubClient {
    fn notifications(&self, mode: FetchMode, since: Option<DateTime<Utc>>) -> RecordStream<'_> {
        Box::pin(async_stream::stream! {
            let mut page = 1u32;
            let mut total = 0usize;
            loop {
                let batch = match self.fetch_page(mode, since, page).await {
                    Ok(batch) => batch,
                    Err(e) => {
                        yield Err(notifeed_feed::Error::source_failed(e));
                        return;
                    },
                };
                let last = batch.len() < self.per_page as usize;
                total += batch.len();
                for thread in batch {
                    yield Ok(NotificationRecord::from(thread));
                }
                if last {
                    break;
                }
                page += 1;
            }
            info!(?mode, pages = page, total, "fetched notifications");
        })
    }

    async fn detail_url(&self, record: &NotificationRecord) -> notifeed_feed::Result<String> {
        let subject_url = record.subject_url.as_deref().ok_or_else(|| {
            notifeed_feed::Error::message(format!(
                "notification {} has no subject url",
                record.thread_id
            ))
        })?;
        self.subject_html_url(subject_url)
            .await
            .map_err(|e| notifeed_feed::Error::external("subject lookup failed", e))
    }
}
