// src/fetcher/mod.rs
// =============================================================================
// This module is the crawler's window onto the outside world.
//
// The crawl core never talks to the network directly. It asks a `Fetcher`
// for one URL at a time and gets back either a `Page` (the body plus the
// links found in it) or a `FetchError`.
//
// Submodules:
// - http: The real adapter, built on reqwest
// - html: Pulls links out of an HTML body and normalizes URLs
//
// Rust concepts:
// - Traits: The seam between the crawl core and the network
// - BoxFuture: An async method that is still object safe and Send
// - thiserror: Derives std::error::Error for our error enum
// =============================================================================

mod html;
mod http;

use futures::future::BoxFuture;
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

pub use html::{extract_links, normalize_seed, resolve_link};
pub use http::{HttpFetcher, DEFAULT_TIMEOUT};

// What a successful fetch hands back to a worker
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Raw body of the page. The crawl core never looks inside it.
    pub content: String,
    /// References found in the body, possibly relative to the page URL
    pub links: HashSet<String>,
}

impl Page {
    pub fn new(content: impl Into<String>, links: impl IntoIterator<Item = String>) -> Self {
        Self {
            content: content.into(),
            links: links.into_iter().collect(),
        }
    }
}

// Everything that can go wrong while fetching a single page.
//
// None of these stop the crawl: the URL is counted as failed and dropped.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("HTTP response does not contain a Content-Type header")]
    MissingContentType,

    #[error("Content-Type of response is not html: {0}")]
    NotHtml(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

// Fetches one page and extracts the links it contains.
//
// The returned future must be Send because workers run on the multi-thread
// runtime. Timeouts are the implementation's job, not the caller's.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Page, FetchError>>;
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why BoxFuture instead of `async fn` in the trait?
//    - tokio::spawn needs to know the future is Send
//    - BoxFuture<'a, T> is Pin<Box<dyn Future<Output = T> + Send + 'a>>
//    - Implementations write `async move { ... }.boxed()`
//
// 2. Why is Page.links a HashSet<String>?
//    - A page often links to the same target many times
//    - The set collapses those duplicates before the crawler sees them
//    - Strings (not Url) so test doubles can return relative links too
//
// 3. What does #[from] do?
//    - It generates `impl From<reqwest::Error> for FetchError`
//    - That lets `?` convert reqwest errors automatically
// -----------------------------------------------------------------------------
