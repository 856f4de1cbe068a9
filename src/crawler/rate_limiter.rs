//! Per-domain rate limiting with adaptive backoff
//!
//! Each domain (host plus explicit port) gets its own pacing state behind its
//! own async mutex. The outer map lock is held only long enough to look up or
//! create that handle, so workers on different domains never wait on each other.

use crate::state::DomainRateState;
use crate::url::domain_key;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::Mutex as AsyncMutex;
use url::Url;

type DomainHandle = Arc<AsyncMutex<DomainRateState>>;

/// Enforces a minimum interval between requests to the same domain
pub struct RateLimiter {
    base_delay: Duration,
    max_delay: Duration,
    domains: Mutex<HashMap<String, DomainHandle>>,
}

impl RateLimiter {
    /// Creates a limiter with the given base interval and backoff ceiling
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay: max_delay.max(base_delay),
            domains: Mutex::new(HashMap::new()),
        }
    }

    /// Looks up (or creates) the pacing handle for a URL's domain
    fn handle(&self, url: &Url) -> DomainHandle {
        let key = domain_key(url);
        let mut domains = self.domains.lock().unwrap_or_else(PoisonError::into_inner);
        domains
            .entry(key)
            .or_insert_with(|| Arc::new(AsyncMutex::new(DomainRateState::new(self.base_delay))))
            .clone()
    }

    /// Waits until the domain's current delay has elapsed since its last
    /// permitted request, then records this request
    ///
    /// The domain lock is held across the sleep, so two workers targeting the
    /// same domain are released one interval apart.
    pub async fn wait(&self, url: &Url) {
        let handle = self.handle(url);
        let mut state = handle.lock().await;

        if let Some(remaining) = state.time_until_next_request(Instant::now()) {
            tracing::trace!("Rate limiting {} for {:?}", domain_key(url), remaining);
            tokio::time::sleep(remaining).await;
        }

        state.record_request(Instant::now());
    }

    /// Doubles the domain's delay, capped at the maximum delay
    pub async fn increase_delay(&self, url: &Url) {
        let handle = self.handle(url);
        let mut state = handle.lock().await;
        state.back_off(self.max_delay);
        tracing::debug!(
            "Increased delay for {} to {:?}",
            domain_key(url),
            state.current_delay
        );
    }

    /// Halves the domain's delay, floored at the base delay
    pub async fn decrease_delay(&self, url: &Url) {
        let handle = self.handle(url);
        let mut state = handle.lock().await;
        state.recover(self.base_delay);
    }

    /// Returns the delay currently enforced for a URL's domain
    pub async fn current_delay(&self, url: &Url) -> Duration {
        let existing = {
            let domains = self.domains.lock().unwrap_or_else(PoisonError::into_inner);
            domains.get(&domain_key(url)).cloned()
        };

        match existing {
            Some(handle) => handle.lock().await.current_delay,
            None => self.base_delay,
        }
    }
}
