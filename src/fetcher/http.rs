// src/fetcher/http.rs
// =============================================================================
// The real fetch adapter: downloads a page over HTTP(S) and extracts links.
//
// Key functionality:
// - One shared reqwest Client (connection pooling across workers)
// - Per-request timeout owned here, not by the crawl core
// - Only text/html responses are accepted
// - Failures are categorized (timeout, connect, status, content type)
// =============================================================================

use super::{extract_links, FetchError, Fetcher, Page};
use futures::future::{BoxFuture, FutureExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Per-request timeout used when the caller does not pick one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

const USER_AGENT: &str = concat!("link-crawler/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    // Builds a fetcher whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }

    async fn fetch_page(&self, url: &Url) -> Result<Page, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(categorize_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .ok_or(FetchError::MissingContentType)?
            .to_str()
            .unwrap_or_default()
            .to_string();

        if !is_html(&content_type) {
            return Err(FetchError::NotHtml(content_type));
        }

        let content = response.text().await.map_err(categorize_error)?;

        // Redirects may have moved us; links are still resolved against the
        // identifier we were asked for, so the frontier sees stable bases.
        let links = extract_links(url, &content);
        debug!(%url, links = links.len(), "fetched page");

        Ok(Page::new(content, links))
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Page, FetchError>> {
        self.fetch_page(url).boxed()
    }
}

fn is_html(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("text/html")
}

// Maps reqwest errors onto the failure kinds we report
fn categorize_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_connect() {
        FetchError::Connect(error.to_string())
    } else {
        FetchError::Http(error)
    }
}
