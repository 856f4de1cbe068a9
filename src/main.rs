//! Sumi-Crawl main entry point
//!
//! This is the command-line interface for the Sumi-Crawl web crawler.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::{Path, PathBuf};
use sumi_crawl::config::{load_config_with_hash, Config};
use sumi_crawl::output::write_outputs;
use sumi_crawl::storage::{SqliteStorage, Storage};
use sumi_crawl::{Coordinator, CrawlStatistics};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Sumi-Crawl: A polite concurrent web crawler
///
/// Sumi-Crawl crawls the pages reachable from a seed URL while respecting
/// robots.txt and per-domain rate limits, skipping duplicate URLs and
/// duplicate content. Results can be stored in SQLite and summarized as
/// markdown.
#[derive(Parser, Debug)]
#[command(name = "sumi-crawl")]
#[command(version = "1.0.0")]
#[command(about = "A polite concurrent web crawler", long_about = None)]
struct Cli {
    /// Seed URL (overrides `start-url` from the config file)
    #[arg(value_name = "URL")]
    start_url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of pages to crawl
    #[arg(long)]
    max_pages: Option<u32>,

    /// Maximum link depth from the seed
    #[arg(long)]
    max_depth: Option<u32>,

    /// Follow links outside the seed's domain
    #[arg(long)]
    allow_external: bool,

    /// Base delay between requests to the same domain, in seconds
    #[arg(long, value_name = "SECONDS")]
    delay: Option<f64>,

    /// Number of concurrent workers
    #[arg(long)]
    concurrency: Option<u32>,

    /// Attempts per URL before giving up
    #[arg(long)]
    retries: Option<u32>,

    /// Per-request timeout, in seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// User-Agent header to send
    #[arg(long)]
    user_agent: Option<String>,

    /// Collect image URLs from crawled pages
    #[arg(long)]
    images: bool,

    /// Keep pages whose content duplicates an earlier page
    #[arg(long)]
    no_dedupe: bool,

    /// Do not follow links found on pages
    #[arg(long)]
    no_links: bool,

    /// Ignore robots.txt
    #[arg(long)]
    no_robots: bool,

    /// SQLite database receiving the results
    #[arg(long, value_name = "FILE")]
    database: Option<String>,

    /// Markdown summary output path
    #[arg(long, value_name = "FILE")]
    summary: Option<String>,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show the latest run stored in the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = build_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config, &config_hash);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_crawl=info,warn"),
            1 => EnvFilter::new("sumi_crawl=debug,info"),
            2 => EnvFilter::new("sumi_crawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file (if any), applies command-line overrides and validates
///
/// The returned hash is the config file's hash when no flag changed it, and the
/// effective configuration's fingerprint otherwise.
fn build_config(cli: &Cli) -> anyhow::Result<(Config, String)> {
    let (mut config, file_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            (config, Some(hash))
        }
        None => match &cli.start_url {
            Some(url) => (Config::for_seed(url.clone()), None),
            None => bail!("a start URL or --config file is required"),
        },
    };

    let overridden = apply_overrides(&mut config, cli)?;
    config.validate().context("invalid configuration")?;

    let hash = match file_hash {
        Some(hash) if !overridden => hash,
        _ => config.fingerprint()?,
    };
    tracing::debug!("Configuration hash: {}", hash);

    Ok((config, hash))
}

/// Applies command-line flags; returns true if any flag changed the config
fn apply_overrides(config: &mut Config, cli: &Cli) -> anyhow::Result<bool> {
    let before = config.fingerprint()?;

    if let Some(url) = &cli.start_url {
        config.crawler.start_url = url.clone();
    }
    if let Some(n) = cli.max_pages {
        config.crawler.max_pages = n;
    }
    if let Some(n) = cli.max_depth {
        config.crawler.max_depth = n;
    }
    if cli.allow_external {
        config.crawler.same_domain = false;
    }
    if let Some(secs) = cli.delay {
        if !secs.is_finite() || secs < 0.0 {
            bail!("--delay must be a non-negative number of seconds");
        }
        config.politeness.delay_ms = (secs * 1000.0).round() as u64;
    }
    if let Some(n) = cli.concurrency {
        config.crawler.max_concurrent = n;
    }
    if let Some(n) = cli.retries {
        config.http.max_retries = n;
    }
    if let Some(secs) = cli.timeout {
        config.http.timeout_secs = secs;
    }
    if let Some(ua) = &cli.user_agent {
        config.http.user_agent = ua.clone();
    }
    if cli.images {
        config.crawler.extract_images = true;
    }
    if cli.no_dedupe {
        config.crawler.deduplicate = false;
    }
    if cli.no_links {
        config.crawler.extract_links = false;
    }
    if cli.no_robots {
        config.politeness.respect_robots = false;
    }
    if let Some(path) = &cli.database {
        config.output.database_path = Some(path.clone());
    }
    if let Some(path) = &cli.summary {
        config.output.summary_path = Some(path.clone());
    }

    Ok(config.fingerprint()? != before)
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config, config_hash: &str) {
    println!("=== Sumi-Crawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Start URL: {}", config.crawler.start_url);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Concurrency: {}", config.crawler.max_concurrent);
    println!("  Same domain only: {}", config.crawler.same_domain);
    println!("  Deduplicate content: {}", config.crawler.deduplicate);
    println!("  Follow links: {}", config.crawler.extract_links);
    println!("  Extract images: {}", config.crawler.extract_images);

    println!("\nPoliteness:");
    println!("  Base delay: {}ms", config.politeness.delay_ms);
    println!("  Max delay: {}ms", config.politeness.max_delay_ms);
    println!("  Respect robots.txt: {}", config.politeness.respect_robots);

    println!("\nHTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Timeout: {}s", config.http.timeout_secs);
    println!("  Max retries: {}", config.http.max_retries);
    for (name, value) in &config.http.headers {
        println!("  Header: {}: {}", name, value);
    }

    println!("\nOutput:");
    println!(
        "  Database: {}",
        config.output.database_path.as_deref().unwrap_or("(none)")
    );
    println!(
        "  Summary: {}",
        config.output.summary_path.as_deref().unwrap_or("(none)")
    );

    println!("\n✓ Configuration is valid (hash: {})", config_hash);
}

/// Handles the --stats mode: shows the latest run from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let Some(path) = config.output.database_path.as_deref() else {
        bail!("--stats requires a database (--database or [output] database-path)");
    };

    println!("Database: {}\n", path);
    let storage = SqliteStorage::new(Path::new(path))
        .with_context(|| format!("failed to open {}", path))?;

    let Some(run) = storage.get_latest_run()? else {
        println!("No crawl runs found");
        return Ok(());
    };

    println!("=== Run {} ===", run.id);
    println!("  Seed: {}", run.seed_url);
    println!("  Status: {}", run.status.to_db_string());
    println!("  Started: {}", run.started_at);
    if let Some(finished) = &run.finished_at {
        println!("  Finished: {}", finished);
    }
    println!("  Pages crawled: {}", run.pages_crawled);
    println!("  URLs discovered: {}", run.urls_discovered);
    println!("  Duplicates skipped: {}", run.duplicates_skipped);
    println!("  Errors: {}", run.errors);
    println!("  Blocked by robots.txt: {}", run.robots_blocked);
    println!("  Total time: {:.2}s", run.total_time_ms as f64 / 1000.0);
    println!("  Links stored: {}", storage.count_links(run.id)?);

    let breakdown = storage.get_depth_breakdown(run.id)?;
    if !breakdown.is_empty() {
        println!("\nPages by depth:");
        for (depth, count) in breakdown {
            println!("  {}: {}", depth, count);
        }
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: &str) -> anyhow::Result<()> {
    let coordinator = Coordinator::new(config.clone()).context("failed to set up crawler")?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received; stopping workers");
                cancel.cancel();
            }
        });
    }

    let report = coordinator.run(cancel).await?;

    let run_id = write_outputs(&config.output, &report, coordinator.seed(), config_hash)
        .context("failed to write crawl results")?;

    print_statistics(&report.stats, report.cancelled, run_id);
    Ok(())
}

fn print_statistics(stats: &CrawlStatistics, cancelled: bool, run_id: Option<i64>) {
    println!("\n=== Crawl {} ===", if cancelled { "Cancelled" } else { "Complete" });
    if let Some(run_id) = run_id {
        println!("  Run ID: {}", run_id);
    }
    println!("  Pages crawled: {}", stats.pages_crawled);
    println!("  URLs discovered: {}", stats.urls_discovered);
    println!("  Duplicates skipped: {}", stats.duplicates_skipped);
    println!("  Errors: {}", stats.errors);
    println!("  Blocked by robots.txt: {}", stats.robots_blocked);
    println!("  Total time: {:.2}s", stats.total_time.as_secs_f64());
    println!("  Pages/sec: {:.2}", stats.pages_per_second());
}
