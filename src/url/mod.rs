//! URL handling module for Sumi-Crawl
//!
//! This module provides URL normalization, domain extraction, registrable
//! domain scoping and the crawl filter that decides which discovered links
//! may enter the frontier.

mod domain;
mod normalize;

use ::url::Url;

// Re-export main functions
pub use domain::{domain_key, extract_domain, origin, registrable_domain};
pub use normalize::normalize_url;

/// Path extensions that never lead to HTML pages
const EXCLUDED_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".zip", ".tar", ".gz", ".rar",
    ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".mp3", ".mp4", ".avi", ".mov", ".wmv",
];

/// Decides whether a discovered URL is worth enqueueing
///
/// A URL is rejected when it is structurally invalid (not HTTP(S), no host),
/// when same-domain mode is on and its registrable domain differs from the
/// seed's, or when its path ends in a known non-HTML extension.
#[derive(Debug, Clone)]
pub struct CrawlFilter {
    seed_domain: String,
    same_domain: bool,
}

impl CrawlFilter {
    /// Creates a filter scoped to the seed URL
    pub fn new(seed: &Url, same_domain: bool) -> Self {
        Self {
            seed_domain: registrable_domain(seed.host_str().unwrap_or_default()),
            same_domain,
        }
    }

    /// Returns the registrable domain of the seed
    pub fn seed_domain(&self) -> &str {
        &self.seed_domain
    }

    /// Returns true if the URL passes every filter rule
    pub fn should_crawl(&self, url: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }

        let host = match url.host_str() {
            Some(h) if !h.is_empty() => h,
            _ => return false,
        };

        if self.same_domain && registrable_domain(host) != self.seed_domain {
            return false;
        }

        !has_excluded_extension(url)
    }
}

/// Returns true if the URL path ends in a non-HTML file extension
pub fn has_excluded_extension(url: &Url) -> bool {
    let path = url.path().to_lowercase();
    EXCLUDED_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
