//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients from the `[http]` configuration
//! - GET requests with a per-request timeout
//! - Retry with exponential backoff for transient failures
//! - Escalating the domain's rate limit on timeouts and HTTP 429
//! - Content-Type classification

use crate::config::HttpConfig;
use crate::crawler::RateLimiter;
use crate::ConfigError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client, ClientBuilder, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

/// Maximum redirect hops followed when redirects are enabled
const MAX_REDIRECTS: usize = 10;

/// A successfully fetched HTML page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Page body
    pub html: String,
    /// Time spent on the successful attempt
    pub elapsed: Duration,
}

/// Reasons a fetch did not produce an HTML page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timed out after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Server error: HTTP {status}")]
    ServerError { status: u16 },

    #[error("HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Not HTML (HTTP {status}, Content-Type '{content_type}')")]
    NotHtml { status: u16, content_type: String },
}

impl FetchError {
    /// Returns true if this failure should increment the crawl error counter
    ///
    /// Non-HTML responses are successful fetches of content the crawler does
    /// not process, so they are skipped silently.
    pub fn counts_as_error(&self) -> bool {
        !matches!(self, Self::NotHtml { .. })
    }
}

/// Outcome of a single attempt, before the retry policy is applied
enum Attempt {
    Done(Result<FetchedPage, FetchError>),
    Retry { error: FetchError, escalate: bool },
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The HTTP configuration (user agent, timeout, headers, redirects)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(SumiError)` - An extra header is invalid or the client could not be built
///
/// # Example
///
/// ```no_run
/// use sumi_crawl::config::HttpConfig;
/// use sumi_crawl::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> crate::Result<Client> {
    let redirect = if config.follow_redirects {
        Policy::limited(MAX_REDIRECTS)
    } else {
        Policy::none()
    };

    Ok(client_builder(config)?.redirect(redirect).build()?)
}

/// Builds the client used for robots.txt requests
///
/// Identical to [`build_http_client`] except that redirects are always
/// followed: a moved robots.txt still governs the origin even when page
/// redirects are disabled.
pub fn build_robots_client(config: &HttpConfig) -> crate::Result<Client> {
    Ok(client_builder(config)?
        .redirect(Policy::limited(MAX_REDIRECTS))
        .build()?)
}

fn client_builder(config: &HttpConfig) -> crate::Result<ClientBuilder> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ConfigError::Validation(format!("Invalid header name '{}'", name)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| ConfigError::Validation(format!("Invalid value for header '{}'", name)))?;
        headers.insert(name, value);
    }

    Ok(Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(config.timeout())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true))
}

/// Returns true for `text/html` and `application/xhtml*` content types
pub fn is_html_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("text/html") || content_type.contains("application/xhtml")
}

/// Fetches pages with retry and exponential backoff
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Timeout | Escalate domain delay, retry; `Timeout` after the last attempt |
/// | Connection / transport error | Retry; `Connection` / `Request` after the last attempt |
/// | HTTP 5xx | Retry; `ServerError` after the last attempt |
/// | HTTP 429 | Escalate domain delay, retry; `ServerError` after the last attempt |
/// | Other HTTP 4xx | Immediate `HttpStatus` |
/// | Non-HTML Content-Type | Immediate `NotHtml` |
///
/// Attempt `n` (zero-based) sleeps `retry_base_delay * 2^n` before the next
/// attempt. No sleep follows the final attempt.
pub struct Fetcher {
    client: Client,
    limiter: Arc<RateLimiter>,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl Fetcher {
    pub fn new(client: Client, limiter: Arc<RateLimiter>, config: &HttpConfig) -> Self {
        Self {
            client,
            limiter,
            max_retries: config.max_retries.max(1),
            retry_base_delay: config.retry_base_delay(),
        }
    }

    /// Backoff sleep after the given zero-based attempt
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.retry_base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Fetches a URL, retrying transient failures
    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let mut attempt = 0;
        loop {
            let (error, escalate) = match self.attempt(url).await {
                Attempt::Done(result) => return result,
                Attempt::Retry { error, escalate } => (error, escalate),
            };

            if escalate {
                self.limiter.increase_delay(url).await;
            }

            if attempt + 1 >= self.max_retries {
                tracing::error!(
                    "Giving up on {} after {} attempts: {}",
                    url,
                    self.max_retries,
                    error
                );
                return Err(error);
            }

            let delay = self.backoff_delay(attempt);
            tracing::warn!(
                "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                attempt + 1,
                self.max_retries,
                url,
                error,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn attempt(&self, url: &Url) -> Attempt {
        let started = Instant::now();

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return self.classify_transport_error(e),
        };

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Attempt::Retry {
                error: FetchError::ServerError {
                    status: status.as_u16(),
                },
                escalate: true,
            };
        }

        if status.is_server_error() {
            return Attempt::Retry {
                error: FetchError::ServerError {
                    status: status.as_u16(),
                },
                escalate: false,
            };
        }

        if status.is_client_error() {
            return Attempt::Done(Err(FetchError::HttpStatus {
                status: status.as_u16(),
            }));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_html_content_type(&content_type) {
            return Attempt::Done(Err(FetchError::NotHtml {
                status: status.as_u16(),
                content_type,
            }));
        }

        let headers = response.headers().clone();
        match response.text().await {
            Ok(html) => Attempt::Done(Ok(FetchedPage {
                status: status.as_u16(),
                headers,
                html,
                elapsed: started.elapsed(),
            })),
            Err(e) => self.classify_transport_error(e),
        }
    }

    fn classify_transport_error(&self, e: reqwest::Error) -> Attempt {
        if e.is_timeout() {
            Attempt::Retry {
                error: FetchError::Timeout {
                    attempts: self.max_retries,
                },
                escalate: true,
            }
        } else if e.is_connect() {
            Attempt::Retry {
                error: FetchError::Connection(e.to_string()),
                escalate: false,
            }
        } else {
            Attempt::Retry {
                error: FetchError::Request(e.to_string()),
                escalate: false,
            }
        }
    }
}
