//! Output module for persisting crawl results and writing summaries
//!
//! This module handles:
//! - Writing page results and run statistics to SQLite
//! - Generating markdown summaries of crawl results

mod markdown;
mod sqlite_output;
mod traits;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use sqlite_output::{SharedStorage, SqliteSink};
pub use traits::{CrawlSummary, OutputError, OutputResult, PageSummary, ResultSink};

use crate::config::OutputConfig;
use crate::crawler::CrawlReport;
use crate::storage::open_storage;
use chrono::Utc;
use std::path::Path;
use std::sync::{Arc, Mutex};
use url::Url;

/// Writes a finished crawl to every output the configuration enables
///
/// The database (if configured) is written first so the summary can carry the
/// run ID.
///
/// # Returns
///
/// * `Ok(Some(run_id))` - Results were stored in the database
/// * `Ok(None)` - No database was configured
/// * `Err(OutputError)` - Writing an output failed
pub fn write_outputs(
    output: &OutputConfig,
    report: &CrawlReport,
    seed: &Url,
    config_hash: &str,
) -> OutputResult<Option<i64>> {
    let run_id = match &output.database_path {
        Some(path) => {
            let storage: SharedStorage = Arc::new(Mutex::new(open_storage(Path::new(path))?));
            let sink = SqliteSink::start_run(storage, seed.as_str(), config_hash)?;
            sink.record_report(report)?;
            tracing::info!(
                "Stored {} pages in {} (run {})",
                report.pages.len(),
                path,
                sink.run_id()
            );
            Some(sink.run_id())
        }
        None => None,
    };

    if let Some(path) = &output.summary_path {
        let mut summary = CrawlSummary::from_report(report, seed, config_hash, Utc::now());
        if let Some(run_id) = run_id {
            summary = summary.with_run_id(run_id);
        }
        generate_markdown_summary(&summary, Path::new(path))?;
        tracing::info!("Summary written to {}", path);
    }

    Ok(run_id)
}
