// src/crawl/mod.rs
// =============================================================================
// This module handles the crawl itself.
//
// Features:
// - Breadth-first crawling starting from a seed URL
// - A fixed pool of workers running in parallel
// - Each URL is visited at most once, and at most `max_urls` are visited
// - The crawl ends on its own once the limit is hit or nothing is left
//
// Submodules:
// - frontier: Shared queue + visited set with race-free deduplication
// - worker: The loop each worker task runs
// - coordinator: Starts the workers, decides when to stop, builds the report
// =============================================================================

mod coordinator;
mod frontier;
mod worker;

use crate::storage::StoreError;
use thiserror::Error;

pub use coordinator::{Coordinator, CrawlConfig, CrawlReport, DEFAULT_MAX_URLS, DEFAULT_WORKERS};
pub use frontier::StopReason;

// Errors that stop a crawl before it starts.
//
// Individual page failures never show up here; they are counted in the
// report's statistics.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid seed URL '{url}': {source}")]
    InvalidSeed {
        url: String,
        source: url::ParseError,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("crawl has already been started")]
    AlreadyStarted,

    #[error(transparent)]
    Store(#[from] StoreError),
}
