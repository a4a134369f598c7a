//! Per-connection token bucket.

use crate::Timestamp;

/// Token bucket parameters.
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    /// Maximum tokens held, i.e. the burst size.
    pub burst: u32,

    /// One token is credited per full interval elapsed.
    pub interval: std::time::Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            burst: 3,
            interval: std::time::Duration::from_millis(1500),
        }
    }
}

/// A single connection's token bucket.
#[derive(Debug, Clone)]
pub struct RateBucket {
    tokens: u32,
    last_refill: Timestamp,
}

impl RateBucket {
    /// A full bucket.
    pub fn new(limit: &RateLimit, now: Timestamp) -> Self {
        Self {
            tokens: limit.burst,
            last_refill: now,
        }
    }

    /// Current token count.
    pub fn tokens(&self) -> u32 {
        self.tokens
    }

    /// Attempt to take a token at time `now`.
    ///
    /// Whole elapsed intervals are credited and `last_refill` jumps to
    /// `now`, discarding any partial interval. When no whole interval
    /// has elapsed, `last_refill` stays put so partial progress keeps
    /// accumulating across attempts.
    pub fn try_take(&mut self, limit: &RateLimit, now: Timestamp) -> bool {
        let interval = (limit.interval.as_millis() as i64).max(1);
        let elapsed = now.millis_since(self.last_refill);
        let whole = if elapsed > 0 { elapsed / interval } else { 0 };

        if whole > 0 {
            let credit = u32::try_from(whole).unwrap_or(u32::MAX);
            self.tokens = self.tokens.saturating_add(credit).min(limit.burst);
            self.last_refill = now;
        }

        if self.tokens == 0 {
            return false;
        }

        self.tokens -= 1;
        true
    }
}
