// src/crawl/coordinator.rs
// =============================================================================
// The coordinator runs one crawl from start to finish.
//
// Lifecycle (one way only):
//
//   Idle ──seed──> Seeded ──spawn workers──> Running
//        ──limit reached or frontier exhausted──> Draining
//        ──all workers exited──> Terminated
//
// It never polls: it sleeps on the same frontier notification the workers
// use, and re-checks the stop condition each time something changes.
// Once the stop condition holds it shuts the frontier down, waits for every
// worker to finish the page it is on, and builds the final report.
// =============================================================================

use super::frontier::{Frontier, StopReason};
use super::worker::{run_worker, CrawlCounters, WorkerContext};
use super::CrawlError;
use crate::fetcher::Fetcher;
use crate::storage::PageStore;
use futures::future::join_all;
use serde::{Serialize, Serializer};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use url::Url;

pub const DEFAULT_MAX_URLS: usize = 100;
pub const DEFAULT_WORKERS: usize = 8;

// What to crawl and how hard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    pub seed: Url,
    pub max_urls: usize,
    pub workers: usize,
}

impl CrawlConfig {
    pub fn new(seed: Url) -> Self {
        Self {
            seed,
            max_urls: DEFAULT_MAX_URLS,
            workers: DEFAULT_WORKERS,
        }
    }

    pub fn with_max_urls(mut self, max_urls: usize) -> Self {
        self.max_urls = max_urls;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    fn validate(&self) -> Result<(), CrawlError> {
        if self.workers == 0 {
            return Err(CrawlError::InvalidConfig(
                "worker count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    Seeded,
    Running,
    Draining,
    Terminated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statistics {
    /// Pages recorded as visited
    pub visited: usize,
    /// Distinct URLs the workers added to the frontier (the seed is not counted)
    pub discovered: usize,
    /// Fetches that failed
    pub failed: usize,
    /// Visited pages that could not be saved
    pub store_failures: usize,
    #[serde(rename = "elapsed_secs", serialize_with = "as_secs_f64")]
    pub elapsed: Duration,
    pub workers: usize,
}

impl Statistics {
    pub fn average_per_page(&self) -> Option<Duration> {
        let visited = u32::try_from(self.visited).ok().filter(|v| *v > 0)?;
        Some(self.elapsed / visited)
    }
}

fn as_secs_f64<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

// The final, immutable outcome of a crawl
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub seed: Url,
    pub stop_reason: StopReason,
    pub statistics: Statistics,
    /// Visited URLs in the order they were recorded
    pub visited: Vec<Url>,
}

pub struct Coordinator<F, S> {
    config: CrawlConfig,
    fetcher: Arc<F>,
    store: Arc<S>,
    state: CoordinatorState,
}

impl<F, S> Coordinator<F, S>
where
    F: Fetcher,
    S: PageStore,
{
    pub fn new(config: CrawlConfig, fetcher: Arc<F>, store: Arc<S>) -> Self {
        Self {
            config,
            fetcher,
            store,
            state: CoordinatorState::Idle,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    fn transition(&mut self, next: CoordinatorState) {
        debug!(from = ?self.state, to = ?next, "coordinator state change");
        self.state = next;
    }

    /// Runs the crawl to completion.
    ///
    /// Only configuration problems are returned as errors; failed fetches and
    /// failed page writes end up in the report's statistics instead.
    pub async fn run(&mut self) -> Result<CrawlReport, CrawlError> {
        if self.state != CoordinatorState::Idle {
            return Err(CrawlError::AlreadyStarted);
        }
        self.config.validate()?;

        let frontier = Arc::new(Frontier::new(self.config.max_urls));
        frontier.seed(self.config.seed.clone());
        self.transition(CoordinatorState::Seeded);

        let counters = Arc::new(CrawlCounters::default());
        let ctx = WorkerContext {
            frontier: Arc::clone(&frontier),
            fetcher: Arc::clone(&self.fetcher),
            store: Arc::clone(&self.store),
            counters: Arc::clone(&counters),
        };

        let started = Instant::now();
        let handles: Vec<_> = (0..self.config.workers)
            .map(|id| tokio::spawn(run_worker(id, ctx.clone())))
            .collect();
        drop(ctx);
        self.transition(CoordinatorState::Running);
        info!(
            seed = %self.config.seed,
            max_urls = self.config.max_urls,
            workers = self.config.workers,
            "crawl started"
        );

        let stop_reason = wait_for_stop(&frontier).await;
        self.transition(CoordinatorState::Draining);

        let dropped = frontier.shutdown();
        info!(?stop_reason, dropped, "crawling terminated, draining workers");

        for (id, joined) in join_all(handles).await.into_iter().enumerate() {
            match joined {
                Ok(recorded) => debug!(worker = id, recorded, "worker joined"),
                Err(e) => error!(worker = id, error = %e, "worker task failed"),
            }
        }
        let elapsed = started.elapsed();
        debug!(exhausted = frontier.is_exhausted(), "workers drained");
        self.transition(CoordinatorState::Terminated);

        let visited = frontier.visited();
        let statistics = Statistics {
            visited: visited.len(),
            discovered: counters.discovered(),
            failed: counters.failed(),
            store_failures: counters.store_failures(),
            elapsed,
            workers: self.config.workers,
        };

        Ok(CrawlReport {
            seed: self.config.seed.clone(),
            stop_reason,
            statistics,
            visited,
        })
    }
}

// Sleeps until the frontier reports a stop reason
async fn wait_for_stop(frontier: &Frontier) -> StopReason {
    loop {
        let notified = frontier.changed();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if let Some(reason) = frontier.stop_reason() {
            return reason;
        }

        notified.await;
    }
}
