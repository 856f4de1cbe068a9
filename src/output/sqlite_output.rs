//! SQLite-based result sink
//!
//! This module provides a sink that writes crawl results directly to the
//! SQLite storage backend.

use crate::crawler::PageResult;
use crate::output::traits::{OutputResult, ResultSink};
use crate::state::CrawlStatistics;
use crate::storage::{RunStatus, Storage};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared handle to a storage backend
pub type SharedStorage = Arc<Mutex<dyn Storage + Send>>;

/// SQLite-based result sink
///
/// Each sink writes into a single run row.
pub struct SqliteSink {
    storage: SharedStorage,
    run_id: i64,
}

impl SqliteSink {
    /// Creates a sink writing into an existing run
    pub fn new(storage: SharedStorage, run_id: i64) -> Self {
        Self { storage, run_id }
    }

    /// Creates a new run and returns a sink writing into it
    ///
    /// # Arguments
    ///
    /// * `storage` - The storage backend to use
    /// * `seed_url` - The crawl's normalized seed URL
    /// * `config_hash` - Hash of the configuration in effect
    pub fn start_run(
        storage: SharedStorage,
        seed_url: &str,
        config_hash: &str,
    ) -> OutputResult<Self> {
        let run_id = storage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .create_run(seed_url, config_hash)?;
        tracing::debug!("Created run {} for {}", run_id, seed_url);
        Ok(Self::new(storage, run_id))
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    fn lock(&self) -> MutexGuard<'_, dyn Storage + Send + 'static> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResultSink for SqliteSink {
    fn record_page(&self, page: &PageResult) -> OutputResult<()> {
        self.lock().record_page(self.run_id, page)?;
        Ok(())
    }

    fn finalize(&self, status: RunStatus, stats: &CrawlStatistics) -> OutputResult<()> {
        self.lock().complete_run(self.run_id, status, stats)?;
        tracing::info!("Run {} finalized as {}", self.run_id, status.to_db_string());
        Ok(())
    }
}
