//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: Lifecycle of a crawl run (idle, running, draining, terminated)
//! - `DomainRateState`: Per-domain pacing state used by the rate limiter
//! - `CrawlStats` / `CrawlStatistics`: Live counters and their final snapshot

mod crawl_phase;
mod crawl_stats;
mod domain_state;

// Re-export main types
pub use crawl_phase::CrawlPhase;
pub use crawl_stats::{CrawlStatistics, CrawlStats};
pub use domain_state::DomainRateState;
