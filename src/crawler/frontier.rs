//! Shared crawl frontier
//!
//! The frontier owns every piece of state workers must agree on: the work
//! queue, the visited and queued sets, the content-hash set and the count of
//! outstanding work items. All of it lives behind a single mutex so that each
//! decision (enqueue, claim, dedupe) is one atomic test-and-set.
//!
//! # Termination
//!
//! `outstanding` counts entries that were pushed but not yet marked done. It
//! rises on `push`/`seed` and falls on `mark_done`; since a worker only pushes
//! while holding an unfinished entry, the count can reach zero only once no
//! worker can produce more work.

use crate::state::CrawlStats;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use url::Url;

/// A URL waiting to be crawled, with its link distance from the seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: Url,
    pub depth: u32,
}

impl FrontierEntry {
    pub fn new(url: Url, depth: u32) -> Self {
        Self { url, depth }
    }
}

/// Outcome of a worker trying to take ownership of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// The caller won the URL and must fetch it
    Claimed,
    /// Another worker already attempted this URL
    AlreadyVisited,
    /// The entry is deeper than the configured maximum
    DepthExceeded,
    /// The page budget is used up
    BudgetExhausted,
}

#[derive(Debug, Default)]
struct FrontierState {
    queue: VecDeque<FrontierEntry>,
    visited: HashSet<Url>,
    queued: HashSet<Url>,
    content_hashes: HashSet<String>,
    outstanding: usize,
}

/// Work queue plus deduplication state shared by all workers
pub struct Frontier {
    max_pages: usize,
    max_depth: u32,
    state: Mutex<FrontierState>,
    stats: Arc<CrawlStats>,
    work: Notify,
    drained: Notify,
}

impl Frontier {
    pub fn new(max_pages: u32, max_depth: u32, stats: Arc<CrawlStats>) -> Self {
        Self {
            max_pages: max_pages as usize,
            max_depth,
            state: Mutex::new(FrontierState::default()),
            stats,
            work: Notify::new(),
            drained: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds the seed URL at depth 0
    ///
    /// The seed is recorded as queued but does not count as a discovered URL.
    pub fn seed(&self, url: Url) {
        {
            let mut state = self.lock();
            state.queued.insert(url.clone());
            state.queue.push_back(FrontierEntry::new(url, 0));
            state.outstanding += 1;
        }
        self.work.notify_one();
    }

    /// Enqueues a discovered link that already passed the crawl filter
    ///
    /// Returns false if the URL was visited or queued before, or if the pending
    /// queue already holds `2 * max_pages` entries.
    pub fn push(&self, url: Url, depth: u32) -> bool {
        {
            let mut state = self.lock();
            if state.visited.contains(&url) || state.queued.contains(&url) {
                return false;
            }
            if state.queue.len() >= self.max_pages.saturating_mul(2) {
                return false;
            }

            state.queued.insert(url.clone());
            state.queue.push_back(FrontierEntry::new(url, depth));
            state.outstanding += 1;
            self.stats.record_discovered();
        }
        self.work.notify_one();
        true
    }

    /// Takes the next entry, waiting up to `poll` for one to arrive
    ///
    /// `None` only means the queue stayed empty for the poll interval; other
    /// workers may still be producing links.
    pub async fn pop(&self, poll: Duration) -> Option<FrontierEntry> {
        let next = self.lock().queue.pop_front();
        if next.is_some() {
            return next;
        }

        let _ = tokio::time::timeout(poll, self.work.notified()).await;
        self.lock().queue.pop_front()
    }

    /// Atomically checks the budgets and marks the entry's URL as visited
    pub fn claim(&self, entry: &FrontierEntry) -> Claim {
        let mut state = self.lock();
        if state.visited.contains(&entry.url) {
            return Claim::AlreadyVisited;
        }
        if entry.depth > self.max_depth {
            return Claim::DepthExceeded;
        }
        if state.visited.len() >= self.max_pages {
            return Claim::BudgetExhausted;
        }

        state.visited.insert(entry.url.clone());
        Claim::Claimed
    }

    /// Records a content hash; returns false if it was already present
    pub fn record_content_hash(&self, hash: &str) -> bool {
        let mut state = self.lock();
        if state.content_hashes.contains(hash) {
            return false;
        }
        state.content_hashes.insert(hash.to_string());
        true
    }

    /// Marks one popped entry as fully processed
    pub fn mark_done(&self) {
        let remaining = {
            let mut state = self.lock();
            state.outstanding = state.outstanding.saturating_sub(1);
            state.outstanding
        };

        if remaining == 0 {
            self.drained.notify_waiters();
        }
    }

    /// Resolves once no pushed entry remains unfinished
    pub async fn wait_drained(&self) {
        loop {
            // Registered before the check so a concurrent notify is not lost
            let notified = self.drained.notified();
            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }

    pub fn outstanding(&self) -> usize {
        self.lock().outstanding
    }

    #[cfg(test)]
    pub fn visited_count(&self) -> usize {
        self.lock().visited.len()
    }

    pub fn queue_len(&self) -> usize {
        self.lock().queue.len()
    }

    #[cfg(test)]
    pub fn is_visited(&self, url: &Url) -> bool {
        self.lock().visited.contains(url)
    }

    #[cfg(test)]
    pub fn is_queued(&self, url: &Url) -> bool {
        self.lock().queued.contains(url)
    }
}
