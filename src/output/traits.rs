//! Output handler traits and types
//!
//! This module defines the trait interface for result sinks and the
//! summary structure used by the report writers.

use crate::crawler::{CrawlReport, PageResult};
use crate::state::CrawlStatistics;
use crate::storage::{RunStatus, StorageError};
use crate::url::extract_domain;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use url::Url;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// One row of the page index in a summary
#[derive(Debug, Clone, PartialEq)]
pub struct PageSummary {
    pub url: String,
    pub depth: u32,
    pub status_code: u16,
    pub title: Option<String>,
    pub word_count: usize,
}

impl From<&PageResult> for PageSummary {
    fn from(page: &PageResult) -> Self {
        Self {
            url: page.url.to_string(),
            depth: page.depth,
            status_code: page.status_code,
            title: page.title.clone(),
            word_count: page.word_count,
        }
    }
}

/// Summary of a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    // Run metadata
    pub run_id: Option<i64>,
    pub seed_url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: RunStatus,
    pub config_hash: String,

    pub stats: CrawlStatistics,
    pub total_links: u64,

    // Depth breakdown (depth -> count)
    pub depth_breakdown: BTreeMap<u32, u64>,

    // Domains of crawled pages, sorted
    pub domains: Vec<String>,

    // Crawled pages in crawl order
    pub pages: Vec<PageSummary>,
}

impl CrawlSummary {
    /// Builds a summary from a crawl report
    ///
    /// The start time is derived from `finished_at` and the report's total time.
    pub fn from_report(
        report: &CrawlReport,
        seed: &Url,
        config_hash: &str,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let elapsed = chrono::Duration::from_std(report.stats.total_time)
            .unwrap_or_else(|_| chrono::Duration::zero());

        let mut depth_breakdown = BTreeMap::new();
        let mut domains = BTreeSet::new();
        for page in &report.pages {
            *depth_breakdown.entry(page.depth).or_insert(0) += 1;
            if let Some(domain) = extract_domain(&page.url) {
                domains.insert(domain);
            }
        }

        Self {
            run_id: None,
            seed_url: seed.to_string(),
            started_at: finished_at - elapsed,
            finished_at,
            status: if report.cancelled {
                RunStatus::Cancelled
            } else {
                RunStatus::Completed
            },
            config_hash: config_hash.to_string(),
            stats: report.stats.clone(),
            total_links: report.pages.iter().map(|p| p.links.len() as u64).sum(),
            depth_breakdown,
            domains: domains.into_iter().collect(),
            pages: report.pages.iter().map(PageSummary::from).collect(),
        }
    }

    /// Attaches the database run ID
    pub fn with_run_id(mut self, run_id: i64) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Returns the share of attempted fetches that produced a page, as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempted = self.stats.pages_crawled + self.stats.errors;
        if attempted == 0 {
            return 0.0;
        }
        (self.stats.pages_crawled as f64 / attempted as f64) * 100.0
    }
}

/// Destination for crawl results
///
/// Sinks are fed after a run finishes: every page of the report, then the
/// final statistics.
pub trait ResultSink {
    /// Records one crawled page
    fn record_page(&self, page: &PageResult) -> OutputResult<()>;

    /// Stores the run's final status and statistics
    fn finalize(&self, status: RunStatus, stats: &CrawlStatistics) -> OutputResult<()>;

    /// Records every page of a report, then finalizes
    ///
    /// If a page cannot be recorded the run is finalized as `Failed` and the
    /// page error is returned.
    fn record_report(&self, report: &CrawlReport) -> OutputResult<()> {
        for page in &report.pages {
            if let Err(e) = self.record_page(page) {
                if let Err(finalize_err) = self.finalize(RunStatus::Failed, &report.stats) {
                    tracing::error!("Could not mark run as failed: {}", finalize_err);
                }
                return Err(e);
            }
        }
        let status = if report.cancelled {
            RunStatus::Cancelled
        } else {
            RunStatus::Completed
        };
        self.finalize(status, &report.stats)
    }
}
