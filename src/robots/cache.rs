//! Per-origin robots.txt cache
//!
//! Each origin (`scheme://host[:port]`) maps to a `OnceCell` that is filled by
//! the first caller. Concurrent first queries for the same origin wait on that
//! cell instead of fetching again; distinct origins never share a lock beyond
//! the brief map lookup. Entries live for the rest of the crawl.

use crate::robots::{fetch_robots, ParsedRobots};
use crate::url::origin;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;
use url::Url;

type RobotsCell = Arc<OnceCell<ParsedRobots>>;

/// Answers robots.txt permission queries, fetching each origin's file once
pub struct RobotsCache {
    client: Client,
    entries: Mutex<HashMap<String, RobotsCell>>,
}

impl RobotsCache {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn cell(&self, origin: &str) -> RobotsCell {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.entry(origin.to_string()).or_default().clone()
    }

    /// Returns true if `user_agent` may fetch `url`
    ///
    /// Missing or unreachable robots.txt files allow everything.
    pub async fn can_fetch(&self, url: &Url, user_agent: &str) -> bool {
        let origin = origin(url);
        let cell = self.cell(&origin);
        let robots = cell
            .get_or_init(|| fetch_robots(&self.client, &origin))
            .await;

        robots.is_allowed(url.as_str(), user_agent)
    }
}
