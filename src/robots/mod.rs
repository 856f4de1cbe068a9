//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching robots.txt files.
//! It respects robots.txt directives when crawling websites.

mod cache;
mod parser;

pub use cache::RobotsCache;
pub use parser::{robots_token, ParsedRobots};

use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Timeout for a single robots.txt request
pub const ROBOTS_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches robots.txt for an origin
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `origin` - The origin (`scheme://host[:port]`) to fetch robots.txt from
///
/// # Returns
///
/// The parsed rules on HTTP 200. Any other status, a network error or an
/// unreadable body yields `ParsedRobots::allow_all()`.
pub async fn fetch_robots(client: &Client, origin: &str) -> ParsedRobots {
    let robots_url = format!("{}/robots.txt", origin);

    let response = match client.get(&robots_url).timeout(ROBOTS_TIMEOUT).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("Could not fetch {}: {}; allowing all", robots_url, e);
            return ParsedRobots::allow_all();
        }
    };

    if response.status() != StatusCode::OK {
        tracing::debug!(
            "{} returned HTTP {}; allowing all",
            robots_url,
            response.status()
        );
        return ParsedRobots::allow_all();
    }

    match response.text().await {
        Ok(body) => {
            tracing::debug!("Loaded robots.txt for {}", origin);
            ParsedRobots::from_content(&body)
        }
        Err(e) => {
            tracing::debug!("Could not read {}: {}; allowing all", robots_url, e);
            ParsedRobots::allow_all()
        }
    }
}
