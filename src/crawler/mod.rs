//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The shared frontier and its enqueue/claim protocol
//! - Per-domain rate limiting with adaptive backoff
//! - HTTP fetching with retry logic
//! - HTML content and link extraction
//! - Worker pool coordination and termination

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod rate_limiter;

pub use coordinator::{content_hash, Coordinator, CrawlReport, PageResult};
pub use extractor::{Extracted, Extractor, HtmlExtractor};
pub use fetcher::{
    build_http_client, build_robots_client, is_html_content_type, FetchError, FetchedPage,
    Fetcher,
};
pub use frontier::{Claim, Frontier, FrontierEntry};
pub use rate_limiter::RateLimiter;
