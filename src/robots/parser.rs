//! Robots.txt parser implementation
//!
//! This module provides functionality for parsing robots.txt content using the robotstxt crate.

use robotstxt::DefaultMatcher;

/// Parsed robots.txt data
///
/// This is a wrapper around the robotstxt crate's types, providing a simplified
/// interface for checking if URLs are allowed.
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    /// Whether to allow all (true = allow all, false = parse content)
    allow_all: bool,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// This is used when robots.txt is missing or cannot be fetched.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL (or path) to check
    /// * `user_agent` - The full User-Agent header; its product token is matched
    ///
    /// # Returns
    ///
    /// * `true` - If the URL is allowed
    /// * `false` - If the URL is disallowed
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.allow_all || self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, robots_token(user_agent), url)
    }
}

/// Extracts the product token robots.txt groups are matched against
///
/// `Mozilla/5.0 (compatible; SumiCrawl/1.0)` → `SumiCrawl`,
/// `TestBot/1.0` → `TestBot`.
pub fn robots_token(user_agent: &str) -> &str {
    let candidate = match user_agent.find("compatible;") {
        Some(idx) => user_agent[idx + "compatible;".len()..].trim_start(),
        None => user_agent.trim(),
    };

    let end = candidate
        .find(|c: char| c == '/' || c == ';' || c == ')' || c.is_whitespace())
        .unwrap_or(candidate.len());

    if end == 0 {
        user_agent
    } else {
        &candidate[..end]
    }
}
