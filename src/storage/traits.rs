//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::crawler::PageResult;
use crate::state::CrawlStatistics;
use crate::storage::{PageRecord, RunRecord, RunStatus};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Backends persist crawl runs, the pages each run produced and the links
/// found on those pages.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run in the `Running` status
    ///
    /// # Arguments
    ///
    /// * `seed_url` - The normalized seed URL
    /// * `config_hash` - Hash of the configuration in effect
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, seed_url: &str, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Stores final statistics and status, and sets the finish timestamp
    fn complete_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        stats: &CrawlStatistics,
    ) -> StorageResult<()>;

    // ===== Page Management =====

    /// Inserts a crawled page together with its outgoing links
    ///
    /// The page and its links are written in one transaction. Returns the new
    /// page ID.
    fn record_page(&mut self, run_id: i64, page: &PageResult) -> StorageResult<i64>;

    /// Lists the pages of a run in crawl order
    fn list_pages(&self, run_id: i64) -> StorageResult<Vec<PageRecord>>;

    // ===== Statistics =====

    /// Counts pages stored for a run
    fn count_pages(&self, run_id: i64) -> StorageResult<u64>;

    /// Counts links stored for a run
    fn count_links(&self, run_id: i64) -> StorageResult<u64>;

    /// Number of pages at each depth for a run
    fn get_depth_breakdown(&self, run_id: i64) -> StorageResult<BTreeMap<u32, u64>>;
}
