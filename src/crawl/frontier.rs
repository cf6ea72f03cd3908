// src/crawl/frontier.rs
// =============================================================================
// The shared crawl frontier: a FIFO of URLs still to fetch plus the set of
// every URL ever queued.
//
// All crawl workers share one Frontier. Each mutation (dequeue, seen-check,
// budget-check, enqueue) happens inside a single lock acquisition, so two
// workers can never both pass the budget check and overshoot it.
//
// Termination: a worker asking for work while the queue is empty waits as
// long as some other worker still has a page in flight (that page may yield
// new links). Once the queue is empty and nothing is in flight, every worker
// gets None and the crawl is over.
//
// Rust concepts:
// - tokio::sync::Mutex: a lock that can be held by async code
// - tokio::sync::Notify: wakes waiting workers when new work (or the end) arrives
// =============================================================================

use std::collections::{HashSet, VecDeque};
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;
use url::Url;

use super::normalize::same_origin;

#[derive(Debug, Default)]
struct FrontierState {
    queue: VecDeque<String>,
    seen: HashSet<String>,
    /// Pages handed out by `next` and not yet passed back to `complete`
    in_flight: usize,
}

#[derive(Debug)]
pub struct Frontier {
    origin: Url,
    page_budget: usize,
    state: Mutex<FrontierState>,
    changed: Notify,
}

impl Frontier {
    // Creates a frontier holding only the seed
    //
    // The seed must already be normalized; the budget is expected to be >= 1.
    pub fn new(seed: Url, page_budget: usize) -> Self {
        let mut state = FrontierState::default();
        let key = seed.to_string();
        state.seen.insert(key.clone());
        state.queue.push_back(key);

        Self {
            origin: seed,
            page_budget,
            state: Mutex::new(state),
            changed: Notify::new(),
        }
    }

    // Hands out the next URL to fetch
    //
    // Returns None when the crawl is finished (queue empty, nothing in flight)
    // or has been cancelled. Every Some(url) must be followed by exactly one
    // call to `complete`.
    pub async fn next(&self, cancel: &CancellationToken) -> Option<String> {
        loop {
            let changed = {
                let mut state = self.state.lock().await;

                if cancel.is_cancelled() {
                    return None;
                }
                if let Some(url) = state.queue.pop_front() {
                    state.in_flight += 1;
                    return Some(url);
                }
                if state.in_flight == 0 {
                    return None;
                }

                // Registered before the lock is released, so a `complete` that
                // runs right after cannot be missed
                self.changed.notified()
            };

            tokio::select! {
                _ = changed => {}
                _ = cancel.cancelled() => return None,
            }
        }
    }

    // Reports one fetched page back, together with the links found on it
    //
    // Links outside the seed's origin are ignored, links already seen are
    // skipped, and nothing more is queued once the budget is reached.
    // Returns how many new URLs were queued.
    pub async fn complete(&self, discovered: Vec<Url>) -> usize {
        let mut queued = 0;
        {
            let mut state = self.state.lock().await;

            for link in discovered {
                if !same_origin(&link, &self.origin) {
                    continue;
                }
                if state.seen.len() >= self.page_budget {
                    break;
                }

                let key = link.to_string();
                if state.seen.insert(key.clone()) {
                    state.queue.push_back(key);
                    queued += 1;
                }
            }

            state.in_flight = state.in_flight.saturating_sub(1);
        }

        self.changed.notify_waiters();
        queued
    }

    /// Number of URLs ever queued, the seed included
    pub async fn seen_count(&self) -> usize {
        self.state.lock().await.seen.len()
    }
}
