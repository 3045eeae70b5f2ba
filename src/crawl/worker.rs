// src/crawl/worker.rs
// =============================================================================
// One worker = one tokio task running `run_worker` until the frontier says
// the crawl is done.
//
// Each iteration:
// 1. Claim the next URL (sleeps if there is nothing to do yet)
// 2. Fetch it and extract its links through the Fetcher
// 3. Queue every new link (the frontier drops duplicates)
// 4. Complete the URL, and store the page if it was recorded as visited
//
// A failed fetch is counted and the URL is dropped. Workers never retry.
// A fetch that panics counts as a failed fetch.
// =============================================================================

use super::frontier::{Claim, Frontier};
use crate::fetcher::{resolve_link, Fetcher};
use crate::storage::PageStore;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error, warn};

// Counters shared by all workers; read once every worker has exited
#[derive(Debug, Default)]
pub struct CrawlCounters {
    discovered: AtomicUsize,
    failed: AtomicUsize,
    store_failures: AtomicUsize,
}

impl CrawlCounters {
    pub fn discovered(&self) -> usize {
        self.discovered.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn store_failures(&self) -> usize {
        self.store_failures.load(Ordering::Relaxed)
    }
}

// Everything a worker needs, cloned once per spawned task
pub struct WorkerContext<F, S> {
    pub frontier: Arc<Frontier>,
    pub fetcher: Arc<F>,
    pub store: Arc<S>,
    pub counters: Arc<CrawlCounters>,
}

impl<F, S> Clone for WorkerContext<F, S> {
    fn clone(&self) -> Self {
        Self {
            frontier: Arc::clone(&self.frontier),
            fetcher: Arc::clone(&self.fetcher),
            store: Arc::clone(&self.store),
            counters: Arc::clone(&self.counters),
        }
    }
}

// Runs one worker until shutdown; returns how many pages it recorded
pub async fn run_worker<F, S>(id: usize, ctx: WorkerContext<F, S>) -> usize
where
    F: Fetcher,
    S: PageStore,
{
    let mut recorded = 0;

    loop {
        let url = match ctx.frontier.claim_next().await {
            Claim::Next(url) => url,
            Claim::Done => break,
        };

        debug!(worker = id, %url, "crawling");

        // A panicking fetcher must still release its claim, otherwise the
        // URL stays in flight and the crawl never looks exhausted.
        let fetched = AssertUnwindSafe(async { ctx.fetcher.fetch(&url).await })
            .catch_unwind()
            .await;

        let page = match fetched {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => {
                ctx.counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(worker = id, %url, error = %e, "failed to crawl url");
                ctx.frontier.complete(&url, false);
                continue;
            }
            Err(_) => {
                ctx.counters.failed.fetch_add(1, Ordering::Relaxed);
                error!(worker = id, %url, "fetcher panicked");
                ctx.frontier.complete(&url, false);
                continue;
            }
        };

        // Links go in before the page completes, so the frontier never looks
        // exhausted while this page's children are still unknown.
        for link in &page.links {
            let Some(next) = resolve_link(&url, link) else {
                continue;
            };
            if ctx.frontier.try_enqueue(next) {
                ctx.counters.discovered.fetch_add(1, Ordering::Relaxed);
            }
        }

        if !ctx.frontier.complete(&url, true) {
            debug!(worker = id, %url, "visit limit reached, page not recorded");
            continue;
        }
        recorded += 1;

        let stored = AssertUnwindSafe(async { ctx.store.store(&url, &page.content).await })
            .catch_unwind()
            .await;

        match stored {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                ctx.counters.store_failures.fetch_add(1, Ordering::Relaxed);
                warn!(worker = id, %url, error = %e, "failed to save page");
            }
            Err(_) => {
                ctx.counters.store_failures.fetch_add(1, Ordering::Relaxed);
                error!(worker = id, %url, "page store panicked");
            }
        }
    }

    debug!(worker = id, recorded, "worker exiting");
    recorded
}
