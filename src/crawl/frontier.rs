// src/crawl/frontier.rs
// =============================================================================
// The frontier: the shared state every worker reads from and writes to.
//
// It tracks four collections behind ONE lock:
// - pending:  URLs waiting for a worker (FIFO, so roughly breadth-first)
// - claimed:  URLs a worker is fetching right now (in-flight)
// - visited:  URLs whose fetch succeeded, in the order they were recorded
// - seen:     every URL ever accepted, so a URL is queued at most once
//
// pending, claimed and visited never overlap. `seen` also remembers URLs
// that failed or were dropped, which keeps deduplication permanent.
//
// Waiting is done with tokio's Notify: every change that could unblock
// someone (new URL, completion, shutdown) wakes all waiters, who then
// re-check the state under the lock.
// =============================================================================

use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use url::Url;

// What `claim_next` hands a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// A URL that now belongs to the calling worker until it calls `complete`
    Next(Url),
    /// The crawl is over; the worker should exit
    Done,
}

/// Why a crawl stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// `max_urls` pages were recorded as visited
    LimitReached,
    /// Nothing pending and nothing in flight
    Exhausted,
}

/// A point-in-time copy of the frontier, taken under the lock.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct FrontierSnapshot {
    pub pending: Vec<Url>,
    pub claimed: HashSet<Url>,
    pub visited: Vec<Url>,
    pub seen: HashSet<Url>,
    pub shutdown: bool,
}

#[derive(Debug, Default)]
struct FrontierState {
    pending: VecDeque<Url>,
    claimed: HashSet<Url>,
    visited: Vec<Url>,
    seen: HashSet<Url>,
    shutdown: bool,
}

impl FrontierState {
    fn is_exhausted(&self) -> bool {
        self.pending.is_empty() && self.claimed.is_empty()
    }
}

#[derive(Debug)]
pub struct Frontier {
    max_urls: usize,
    state: Mutex<FrontierState>,
    changed: Notify,
}

impl Frontier {
    pub fn new(max_urls: usize) -> Self {
        Self {
            max_urls,
            state: Mutex::new(FrontierState::default()),
            changed: Notify::new(),
        }
    }

    // The lock is never held across an .await, and no code path panics while
    // holding it, so a poisoned lock still guards consistent state.
    fn state(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts the starting URL. Same semantics as `try_enqueue`.
    pub fn seed(&self, url: Url) -> bool {
        self.try_enqueue(url)
    }

    /// Queues `url` unless it has been seen before.
    ///
    /// Returns true only for the first call with a given URL. The check and
    /// the insert happen under one lock, so two workers discovering the same
    /// link at the same moment produce exactly one queue entry. After
    /// `shutdown` this is a no-op that returns false.
    pub fn try_enqueue(&self, url: Url) -> bool {
        let inserted = {
            let mut state = self.state();
            if state.shutdown || state.seen.contains(&url) {
                false
            } else {
                state.seen.insert(url.clone());
                state.pending.push_back(url);
                true
            }
        };

        if inserted {
            self.changed.notify_waiters();
        }
        inserted
    }

    /// Waits for the next URL to crawl, or for shutdown.
    ///
    /// A URL is only handed out while `visited + claimed < max_urls`, so no
    /// worker starts a fetch that could never be recorded. When nothing is
    /// claimable the caller sleeps until the frontier changes.
    pub async fn claim_next(&self) -> Claim {
        loop {
            // Register interest BEFORE checking, so a change that lands
            // between the check and the await still wakes us.
            let notified = self.changed();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(claim) = self.try_claim() {
                return claim;
            }

            notified.await;
        }
    }

    /// Non-blocking version of `claim_next`; None means "nothing right now".
    pub fn try_claim(&self) -> Option<Claim> {
        let mut state = self.state();
        if state.shutdown {
            return Some(Claim::Done);
        }
        if state.visited.len() + state.claimed.len() >= self.max_urls {
            return None;
        }

        let url = state.pending.pop_front()?;
        state.claimed.insert(url.clone());
        Some(Claim::Next(url))
    }

    /// Finishes a claimed URL.
    ///
    /// On success the URL is recorded as visited, unless `max_urls` pages are
    /// already recorded (the first completions win). Failed or late URLs are
    /// just released; they are never re-queued. Returns whether the URL was
    /// recorded as visited.
    pub fn complete(&self, url: &Url, success: bool) -> bool {
        let recorded = {
            let mut state = self.state();
            if !state.claimed.remove(url) {
                return false;
            }

            let recorded = success && state.visited.len() < self.max_urls;
            if recorded {
                state.visited.push(url.clone());
            }
            recorded
        };

        self.changed.notify_waiters();
        recorded
    }

    /// True when nothing is pending and nothing is in flight.
    pub fn is_exhausted(&self) -> bool {
        self.state().is_exhausted()
    }

    // Limit first: a graph of exactly max_urls pages stops on the limit.
    pub fn stop_reason(&self) -> Option<StopReason> {
        let state = self.state();
        if state.visited.len() >= self.max_urls {
            Some(StopReason::LimitReached)
        } else if state.is_exhausted() {
            Some(StopReason::Exhausted)
        } else {
            None
        }
    }

    /// Stops the frontier and wakes everyone waiting on it.
    ///
    /// Pending URLs are dropped (their count is returned); in-flight URLs can
    /// still be completed. Later `try_enqueue` calls are ignored.
    pub fn shutdown(&self) -> usize {
        let dropped = {
            let mut state = self.state();
            state.shutdown = true;
            let dropped = state.pending.len();
            state.pending.clear();
            dropped
        };

        self.changed.notify_waiters();
        dropped
    }

    /// A future that resolves on the next change to the frontier.
    ///
    /// Call `enable()` on the pinned future before checking the state you are
    /// waiting for, the same way `claim_next` does.
    pub fn changed(&self) -> Notified<'_> {
        self.changed.notified()
    }

    #[cfg(test)]
    pub fn visited_count(&self) -> usize {
        self.state().visited.len()
    }

    pub fn visited(&self) -> Vec<Url> {
        self.state().visited.clone()
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> FrontierSnapshot {
        let state = self.state();
        FrontierSnapshot {
            pending: state.pending.iter().cloned().collect(),
            claimed: state.claimed.clone(),
            visited: state.visited.clone(),
            seen: state.seen.clone(),
            shutdown: state.shutdown,
        }
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why one Mutex instead of one per collection?
//    - Moving a URL from pending to claimed touches two collections
//    - With separate locks another thread could observe it in neither
//    - One lock means every reader sees a consistent picture
//
// 2. Why std::sync::Mutex in async code?
//    - We never .await while holding it, so it can't stall the runtime
//    - It's cheaper than tokio::sync::Mutex for short critical sections
//
// 3. What is Notify and why enable() first?
//    - Notify is a wake-up bell; notify_waiters() rings it for everyone
//      currently listening
//    - enable() starts listening BEFORE we look at the state
//    - Without it, a URL enqueued between our check and our await would
//      ring the bell while nobody was listening, and we'd sleep forever
//
// 4. Why does exhaustion look at `claimed` too?
//    - A worker that is still fetching may be about to discover new URLs
//    - An empty queue alone doesn't mean the crawl is finished
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://site.test/{path}")).unwrap()
    }

    #[test]
    fn test_enqueue_is_idempotent() {
        let frontier = Frontier::new(10);
        assert!(frontier.seed(url("s")));
        assert!(frontier.try_enqueue(url("a")));
        assert!(!frontier.try_enqueue(url("a")));
        assert!(!frontier.try_enqueue(url("s")));

        let snapshot = frontier.snapshot();
        assert_eq!(snapshot.pending, vec![url("s"), url("a")]);
        assert_eq!(snapshot.seen.len(), 2);
    }

    #[test]
    fn test_dedup_is_permanent() {
        let frontier = Frontier::new(10);
        frontier.seed(url("s"));

        let Some(Claim::Next(claimed)) = frontier.try_claim() else {
            panic!("seed should be claimable");
        };
        assert!(frontier.complete(&claimed, true));

        // Visited URLs are never queued again
        assert!(!frontier.try_enqueue(url("s")));

        // Neither are failed ones
        frontier.try_enqueue(url("x"));
        let Some(Claim::Next(failed)) = frontier.try_claim() else {
            panic!("x should be claimable");
        };
        assert!(!frontier.complete(&failed, false));
        assert!(!frontier.try_enqueue(url("x")));
        assert!(frontier.is_exhausted());
    }

    #[test]
    fn test_claim_is_fifo_and_disjoint() {
        let frontier = Frontier::new(10);
        for name in ["a", "b", "c"] {
            frontier.try_enqueue(url(name));
        }

        assert_eq!(frontier.try_claim(), Some(Claim::Next(url("a"))));
        assert_eq!(frontier.try_claim(), Some(Claim::Next(url("b"))));

        let snapshot = frontier.snapshot();
        assert_eq!(snapshot.pending, vec![url("c")]);
        assert!(snapshot.claimed.contains(&url("a")));
        assert!(snapshot.claimed.contains(&url("b")));
        assert!(snapshot.visited.is_empty());
        assert!(!frontier.is_exhausted());
    }

    #[test]
    fn test_claim_respects_limit_headroom() {
        let frontier = Frontier::new(1);
        frontier.try_enqueue(url("a"));
        frontier.try_enqueue(url("b"));

        assert_eq!(frontier.try_claim(), Some(Claim::Next(url("a"))));
        // One in flight already fills the only slot
        assert_eq!(frontier.try_claim(), None);

        // A failure frees the slot again
        frontier.complete(&url("a"), false);
        assert_eq!(frontier.try_claim(), Some(Claim::Next(url("b"))));
    }

    #[test]
    fn test_complete_never_exceeds_limit() {
        let frontier = Frontier::new(5);
        // Force more in-flight URLs than the limit by bypassing try_claim
        {
            let mut state = frontier.state();
            for i in 0..8 {
                let u = url(&i.to_string());
                state.seen.insert(u.clone());
                state.claimed.insert(u);
            }
        }

        let recorded = (0..8)
            .filter(|i| frontier.complete(&url(&i.to_string()), true))
            .count();

        assert_eq!(recorded, 5);
        assert_eq!(frontier.visited_count(), 5);
        assert_eq!(frontier.stop_reason(), Some(StopReason::LimitReached));
        assert!(frontier.is_exhausted());
    }

    #[test]
    fn test_complete_unknown_url_is_ignored() {
        let frontier = Frontier::new(5);
        assert!(!frontier.complete(&url("nope"), true));
        assert_eq!(frontier.visited_count(), 0);
    }

    #[test]
    fn test_stop_reason() {
        let frontier = Frontier::new(2);
        assert_eq!(frontier.stop_reason(), Some(StopReason::Exhausted));

        frontier.seed(url("s"));
        assert_eq!(frontier.stop_reason(), None);

        frontier.try_claim();
        // Queue is empty, but the seed is still in flight
        assert_eq!(frontier.stop_reason(), None);

        frontier.complete(&url("s"), true);
        assert_eq!(frontier.stop_reason(), Some(StopReason::Exhausted));
    }

    #[test]
    fn test_stop_reason_agrees_with_is_exhausted() {
        let frontier = Frontier::new(3);
        frontier.seed(url("s"));
        assert!(!frontier.is_exhausted());
        assert_eq!(frontier.stop_reason(), None);

        frontier.try_claim();
        frontier.complete(&url("s"), false);
        assert!(frontier.is_exhausted());
        assert_eq!(frontier.stop_reason(), Some(StopReason::Exhausted));
        assert_eq!(frontier.visited_count(), 0);
    }

    #[test]
    fn test_shutdown_drops_pending_and_ignores_new_urls() {
        let frontier = Frontier::new(10);
        frontier.try_enqueue(url("a"));
        frontier.try_enqueue(url("b"));

        assert_eq!(frontier.shutdown(), 2);
        assert!(!frontier.try_enqueue(url("c")));
        assert_eq!(frontier.try_claim(), Some(Claim::Done));

        let snapshot = frontier.snapshot();
        assert!(snapshot.pending.is_empty());
        assert!(snapshot.shutdown);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_claim_next_wakes_on_enqueue() {
        let frontier = Arc::new(Frontier::new(10));

        let waiter = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.claim_next().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        frontier.try_enqueue(url("late"));

        let claim = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("waiter woke up")
            .unwrap();
        assert_eq!(claim, Claim::Next(url("late")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shutdown_wakes_every_waiter() {
        let frontier = Arc::new(Frontier::new(10));

        let waiters: Vec<_> = (0..6)
            .map(|_| {
                let frontier = Arc::clone(&frontier);
                tokio::spawn(async move { frontier.claim_next().await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(20)).await;
        frontier.shutdown();

        for waiter in waiters {
            let claim = tokio::time::timeout(Duration::from_secs(5), waiter)
                .await
                .expect("waiter woke up")
                .unwrap();
            assert_eq!(claim, Claim::Done);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_duplicate_discovery_inserts_once() {
        let frontier = Arc::new(Frontier::new(1000));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let frontier = Arc::clone(&frontier);
                tokio::spawn(async move {
                    (0..100)
                        .filter(|i| frontier.try_enqueue(url(&format!("p{i}"))))
                        .count()
                })
            })
            .collect();

        let mut inserted = 0;
        for task in tasks {
            inserted += task.await.unwrap();
        }

        assert_eq!(inserted, 100);
        let snapshot = frontier.snapshot();
        assert_eq!(snapshot.pending.len(), 100);
        assert_eq!(snapshot.seen.len(), 100);
    }
}
