use std::time::{Duration, Instant};

/// Tracks the pacing state of a single domain
///
/// `base_delay <= current_delay <= max_delay` holds after every operation.
#[derive(Debug, Clone)]
pub struct DomainRateState {
    /// Minimum interval currently enforced between requests
    pub current_delay: Duration,

    /// When the last request to this domain was permitted
    pub last_request_at: Option<Instant>,
}

impl DomainRateState {
    /// Creates a state for a domain that has not been contacted yet
    pub fn new(base_delay: Duration) -> Self {
        Self {
            current_delay: base_delay,
            last_request_at: None,
        }
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        let last = self.last_request_at?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.current_delay {
            Some(self.current_delay - elapsed)
        } else {
            None
        }
    }

    /// Records that a request was permitted at `now`
    pub fn record_request(&mut self, now: Instant) {
        self.last_request_at = Some(now);
    }

    /// Doubles the delay, capped at `max_delay`
    pub fn back_off(&mut self, max_delay: Duration) {
        self.current_delay = self.current_delay.saturating_mul(2).min(max_delay);
    }

    /// Halves the delay, floored at `base_delay`
    pub fn recover(&mut self, base_delay: Duration) {
        self.current_delay = (self.current_delay / 2).max(base_delay);
    }
}
