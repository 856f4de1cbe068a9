//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of crawl results,
//! including final statistics, a depth breakdown and the page index.

use crate::output::traits::{CrawlSummary, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Generates a markdown summary from crawl statistics
///
/// # Arguments
///
/// * `summary` - The crawl summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let mut md = String::new();

    md.push_str("# Sumi-Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    if let Some(run_id) = summary.run_id {
        md.push_str(&format!("- **Run ID**: {}\n", run_id));
    }
    md.push_str(&format!("- **Seed URL**: {}\n", summary.seed_url));
    md.push_str(&format!(
        "- **Started**: {}\n",
        summary.started_at.format(TIMESTAMP_FORMAT)
    ));
    md.push_str(&format!(
        "- **Finished**: {}\n",
        summary.finished_at.format(TIMESTAMP_FORMAT)
    ));
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n",
        summary.stats.total_time.as_secs_f64()
    ));
    md.push_str(&format!("- **Status**: {}\n", summary.status.to_db_string()));
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    // Overall statistics
    let stats = &summary.stats;
    md.push_str("## Statistics\n\n");
    md.push_str(&format!("- **Pages Crawled**: {}\n", stats.pages_crawled));
    md.push_str(&format!("- **URLs Discovered**: {}\n", stats.urls_discovered));
    md.push_str(&format!(
        "- **Duplicates Skipped**: {}\n",
        stats.duplicates_skipped
    ));
    md.push_str(&format!("- **Errors**: {}\n", stats.errors));
    md.push_str(&format!(
        "- **Blocked by robots.txt**: {}\n",
        stats.robots_blocked
    ));
    md.push_str(&format!("- **Total Links**: {}\n", summary.total_links));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n",
        summary.success_rate()
    ));
    md.push_str(&format!(
        "- **Pages per Second**: {:.2}\n\n",
        stats.pages_per_second()
    ));

    if !summary.depth_breakdown.is_empty() {
        md.push_str("## Depth Breakdown\n\n");
        md.push_str("| Depth | Pages |\n");
        md.push_str("|-------|-------|\n");
        for (depth, count) in &summary.depth_breakdown {
            md.push_str(&format!("| {} | {} |\n", depth, count));
        }
        md.push('\n');
    }

    if !summary.domains.is_empty() {
        md.push_str("## Domains\n\n");
        for domain in &summary.domains {
            md.push_str(&format!("- {}\n", domain));
        }
        md.push('\n');
    }

    if !summary.pages.is_empty() {
        md.push_str("## Pages\n\n");
        md.push_str("| URL | Depth | Status | Words | Title |\n");
        md.push_str("|-----|-------|--------|-------|-------|\n");
        for page in &summary.pages {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                page.url,
                page.depth,
                page.status_code,
                page.word_count,
                escape_cell(page.title.as_deref().unwrap_or("")),
            ));
        }
        md.push('\n');
    }

    md
}

/// Keeps a value inside a single table cell
fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace(['\n', '\r'], " ")
}
