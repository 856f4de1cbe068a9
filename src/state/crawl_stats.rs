use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Live crawl counters shared by all workers
///
/// Counters only ever increase. Relaxed ordering is sufficient because no
/// other memory is published through them.
#[derive(Debug, Default)]
pub struct CrawlStats {
    pages_crawled: AtomicU64,
    urls_discovered: AtomicU64,
    duplicates_skipped: AtomicU64,
    errors: AtomicU64,
    robots_blocked: AtomicU64,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments `pages_crawled` and returns the new value
    pub fn record_page(&self) -> u64 {
        self.pages_crawled.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_discovered(&self) {
        self.urls_discovered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.duplicates_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_robots_blocked(&self) {
        self.robots_blocked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pages_crawled(&self) -> u64 {
        self.pages_crawled.load(Ordering::Relaxed)
    }

    /// Takes a point-in-time copy of the counters
    pub fn snapshot(&self, total_time: Duration) -> CrawlStatistics {
        CrawlStatistics {
            pages_crawled: self.pages_crawled.load(Ordering::Relaxed),
            urls_discovered: self.urls_discovered.load(Ordering::Relaxed),
            duplicates_skipped: self.duplicates_skipped.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            robots_blocked: self.robots_blocked.load(Ordering::Relaxed),
            total_time,
        }
    }
}

/// Final statistics of a crawl run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlStatistics {
    pub pages_crawled: u64,
    pub urls_discovered: u64,
    pub duplicates_skipped: u64,
    pub errors: u64,
    pub robots_blocked: u64,
    pub total_time: Duration,
}

impl CrawlStatistics {
    /// Average crawl throughput; zero when no time has elapsed
    pub fn pages_per_second(&self) -> f64 {
        let secs = self.total_time.as_secs_f64();
        if secs > 0.0 {
            self.pages_crawled as f64 / secs
        } else {
            0.0
        }
    }
}
