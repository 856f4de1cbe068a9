//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the worker pool that drains the frontier, including:
//! - Building the shared crawl context (frontier, limiter, robots cache, fetcher)
//! - Spawning `max_concurrent` workers and running the per-URL pipeline
//! - Detecting completion and handling external cancellation
//! - Collecting page results and final statistics

use crate::config::Config;
use crate::crawler::extractor::{Extractor, HtmlExtractor};
use crate::crawler::fetcher::{build_http_client, build_robots_client, Fetcher};
use crate::crawler::frontier::{Claim, Frontier, FrontierEntry};
use crate::crawler::RateLimiter;
use crate::robots::RobotsCache;
use crate::state::{CrawlPhase, CrawlStatistics, CrawlStats};
use crate::url::{normalize_url, CrawlFilter};
use crate::SumiError;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

/// How long an idle worker waits on an empty queue before re-checking
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Progress is logged every this many crawled pages
const PROGRESS_INTERVAL: u64 = 10;

/// A successfully crawled page
#[derive(Debug, Clone)]
pub struct PageResult {
    pub url: Url,
    pub depth: u32,
    pub status_code: u16,
    pub html: String,
    pub text: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub links: Vec<Url>,
    pub images: Vec<Url>,
    pub headers: HashMap<String, String>,
    /// SHA-256 hex digest of `text`
    pub content_hash: String,
    pub word_count: usize,
    pub load_time: Duration,
    pub crawled_at: DateTime<Utc>,
}

/// Everything a finished (or cancelled) crawl produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub pages: Vec<PageResult>,
    pub stats: CrawlStatistics,
    /// True if the run was stopped by external cancellation
    pub cancelled: bool,
}

/// State shared by every worker
struct CrawlContext {
    frontier: Frontier,
    filter: CrawlFilter,
    limiter: Arc<RateLimiter>,
    robots: RobotsCache,
    fetcher: Fetcher,
    extractor: Arc<dyn Extractor>,
    stats: Arc<CrawlStats>,
    results: Mutex<Vec<PageResult>>,
    user_agent: String,
    max_depth: u32,
    respect_robots: bool,
    deduplicate: bool,
    extract_links: bool,
    started: OnceLock<Instant>,
}

/// Marks a popped entry as done however its processing ends
struct DoneGuard<'a>(&'a Frontier);

impl Drop for DoneGuard<'_> {
    fn drop(&mut self) {
        self.0.mark_done();
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    seed: Url,
    max_concurrent: usize,
    ctx: Arc<CrawlContext>,
    phase: Mutex<CrawlPhase>,
}

impl Coordinator {
    /// Creates a new coordinator using the default HTML extractor
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run, in the `Idle` phase
    /// * `Err(SumiError)` - Invalid configuration or HTTP client setup failure
    pub fn new(config: Config) -> Result<Self, SumiError> {
        let extractor = Arc::new(HtmlExtractor::new(config.crawler.extract_images));
        Self::with_extractor(config, extractor)
    }

    /// Creates a new coordinator with a custom extraction collaborator
    pub fn with_extractor(config: Config, extractor: Arc<dyn Extractor>) -> Result<Self, SumiError> {
        config.validate()?;

        let seed = normalize_url(&config.crawler.start_url)?;
        let stats = Arc::new(CrawlStats::new());
        let limiter = Arc::new(RateLimiter::new(
            config.politeness.base_delay(),
            config.politeness.max_delay(),
        ));

        let client = build_http_client(&config.http)?;
        let robots = RobotsCache::new(build_robots_client(&config.http)?);
        let fetcher = Fetcher::new(client, limiter.clone(), &config.http);

        let ctx = CrawlContext {
            frontier: Frontier::new(
                config.crawler.max_pages,
                config.crawler.max_depth,
                stats.clone(),
            ),
            filter: CrawlFilter::new(&seed, config.crawler.same_domain),
            limiter,
            robots,
            fetcher,
            extractor,
            stats,
            results: Mutex::new(Vec::new()),
            user_agent: config.http.user_agent.clone(),
            max_depth: config.crawler.max_depth,
            respect_robots: config.politeness.respect_robots,
            deduplicate: config.crawler.deduplicate,
            extract_links: config.crawler.extract_links,
            started: OnceLock::new(),
        };

        Ok(Self {
            seed,
            max_concurrent: config.crawler.max_concurrent as usize,
            ctx: Arc::new(ctx),
            phase: Mutex::new(CrawlPhase::Idle),
        })
    }

    /// Returns the normalized seed URL
    pub fn seed(&self) -> &Url {
        &self.seed
    }

    /// Returns the current crawl phase
    pub fn phase(&self) -> CrawlPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, next: CrawlPhase) -> Result<(), SumiError> {
        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        if !phase.can_transition_to(next) {
            return Err(SumiError::InvalidTransition {
                from: *phase,
                to: next,
            });
        }
        tracing::debug!("Crawl phase {} -> {}", *phase, next);
        *phase = next;
        Ok(())
    }

    /// Runs the crawl until the frontier drains or `cancel` fires
    ///
    /// A coordinator runs once; calling `run` again fails with
    /// `SumiError::InvalidTransition`. Statistics are returned even when the
    /// run is cancelled or crawls zero pages.
    pub async fn run(&self, cancel: CancellationToken) -> Result<CrawlReport, SumiError> {
        self.transition(CrawlPhase::Running)?;

        let started = *self.ctx.started.get_or_init(Instant::now);
        tracing::info!(
            "Starting crawl of {} with {} workers",
            self.seed,
            self.max_concurrent
        );

        self.ctx.frontier.seed(self.seed.clone());

        let workers_token = cancel.child_token();
        let workers: Vec<_> = (0..self.max_concurrent)
            .map(|id| {
                let ctx = self.ctx.clone();
                let token = workers_token.clone();
                tokio::spawn(async move { worker(id, ctx, token).await })
            })
            .collect();

        let cancelled = tokio::select! {
            _ = self.ctx.frontier.wait_drained() => false,
            _ = cancel.cancelled() => true,
        };

        if cancelled {
            tracing::warn!("Crawl cancelled; stopping workers");
        } else {
            tracing::info!("Frontier drained; stopping workers");
            self.transition(CrawlPhase::Draining)?;
        }

        workers_token.cancel();
        for handle in workers {
            if let Err(e) = handle.await {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        self.transition(CrawlPhase::Terminated)?;

        let stats = self.ctx.stats.snapshot(started.elapsed());
        let pages = std::mem::take(
            &mut *self
                .ctx
                .results
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );

        tracing::info!(
            "Crawl finished: {} pages, {} discovered, {} duplicates, {} errors, {} blocked by robots.txt in {:?}",
            stats.pages_crawled,
            stats.urls_discovered,
            stats.duplicates_skipped,
            stats.errors,
            stats.robots_blocked,
            stats.total_time
        );

        Ok(CrawlReport {
            pages,
            stats,
            cancelled,
        })
    }
}

/// Worker loop: pop, process, mark done, until the token fires
async fn worker(id: usize, ctx: Arc<CrawlContext>, token: CancellationToken) {
    tracing::trace!("Worker {} started", id);

    loop {
        let entry = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            entry = ctx.frontier.pop(POLL_INTERVAL) => entry,
        };

        let Some(entry) = entry else {
            continue;
        };

        let _done = DoneGuard(&ctx.frontier);

        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!("Worker {} abandoning {}", id, entry.url);
                break;
            }
            _ = ctx.process(&entry) => {}
        }
    }

    tracing::trace!("Worker {} stopped", id);
}

impl CrawlContext {
    /// Runs the full pipeline for one frontier entry
    async fn process(&self, entry: &FrontierEntry) {
        let url = &entry.url;

        match self.frontier.claim(entry) {
            Claim::Claimed => {}
            skipped => {
                tracing::debug!("Skipping {} at depth {}: {:?}", url, entry.depth, skipped);
                return;
            }
        }

        if self.respect_robots && !self.robots.can_fetch(url, &self.user_agent).await {
            tracing::warn!("URL {} disallowed by robots.txt", url);
            self.stats.record_robots_blocked();
            return;
        }

        self.limiter.wait(url).await;

        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) if e.counts_as_error() => {
                tracing::warn!("Failed to fetch {}: {}", url, e);
                self.stats.record_error();
                return;
            }
            Err(e) => {
                tracing::debug!("Skipping {}: {}", url, e);
                return;
            }
        };

        let extracted = self.extractor.extract(&page.html, url);
        let content_hash = content_hash(&extracted.text);

        if self.deduplicate && !self.frontier.record_content_hash(&content_hash) {
            tracing::debug!("Duplicate content at {}", url);
            self.stats.record_duplicate();
            return;
        }

        let follow_links = self.extract_links && entry.depth < self.max_depth;
        let discovered: Vec<Url> = if follow_links {
            extracted
                .links
                .iter()
                .filter_map(|link| normalize_url(link.as_str()).ok())
                .filter(|link| self.filter.should_crawl(link))
                .collect()
        } else {
            Vec::new()
        };

        let headers = page
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let result = PageResult {
            url: url.clone(),
            depth: entry.depth,
            status_code: page.status,
            word_count: extracted.text.split_whitespace().count(),
            html: page.html,
            text: extracted.text,
            title: extracted.title,
            description: extracted.description,
            keywords: extracted.keywords,
            links: extracted.links,
            images: extracted.images,
            headers,
            content_hash,
            load_time: page.elapsed,
            crawled_at: Utc::now(),
        };

        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(result);

        let crawled = self.stats.record_page();
        tracing::debug!("Crawled {} (depth {})", url, entry.depth);

        if crawled % PROGRESS_INTERVAL == 0 {
            let elapsed = self
                .started
                .get()
                .map_or(0.0, |started| started.elapsed().as_secs_f64());
            let rate = if elapsed > 0.0 {
                crawled as f64 / elapsed
            } else {
                0.0
            };
            tracing::info!(
                "Progress: {} pages crawled, {} in frontier, {:.2} pages/sec",
                crawled,
                self.frontier.queue_len(),
                rate
            );
        }

        for link in discovered {
            self.frontier.push(link, entry.depth + 1);
        }

        self.limiter.decrease_delay(url).await;
    }
}

/// SHA-256 hex digest of extracted page text
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
