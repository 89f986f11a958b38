//! Retry policy for LogicMonitor API requests
//!
//! Response statuses fall into five classes:
//! - 200 is success
//! - 401/403 fail at once (credentials will not fix themselves)
//! - 429 waits for the server's `Retry-After` hint (or a default) and retries
//! - 406, 408, 500, 502, 503, 504 back off exponentially and retry
//! - anything else fails at once
//!
//! Network failures use the same backoff as transient statuses. All waits go
//! through [`sleep_or_cancel`] so a cancelled run stops mid-backoff.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use tokio_util::sync::CancellationToken;

/// Statuses worth retrying with exponential backoff.
pub const TRANSIENT_STATUSES: [u16; 6] = [406, 408, 500, 502, 503, 504];

/// Upper bound of the random jitter added to each backoff.
pub const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(250);

/// Backoff delays are capped at this value before jitter.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Longest `Retry-After` hint that is honored as sent.
pub const DEFAULT_MAX_RETRY_AFTER: Duration = Duration::from_secs(15 * 60);

/// How a response status should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    Auth,
    RateLimited,
    Transient,
    Fatal,
}

impl StatusClass {
    pub fn of(status: u16) -> Self {
        match status {
            200 => StatusClass::Success,
            401 | 403 => StatusClass::Auth,
            429 => StatusClass::RateLimited,
            s if TRANSIENT_STATUSES.contains(&s) => StatusClass::Transient,
            _ => StatusClass::Fatal,
        }
    }
}

/// Retry budget and delays for a single request.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each attempt after that
    pub backoff_base: Duration,
    /// Wait after a 429 when the server gives no usable hint
    pub rate_limit_sleep: Duration,
    /// Cap applied to the exponential part of the backoff
    pub max_backoff: Duration,
    /// Exclusive upper bound of the random jitter
    pub max_jitter: Duration,
    /// Cap applied to server `Retry-After` hints
    pub max_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
            rate_limit_sleep: Duration::from_secs(30),
            max_backoff: DEFAULT_MAX_BACKOFF,
            max_jitter: DEFAULT_MAX_JITTER,
            max_retry_after: DEFAULT_MAX_RETRY_AFTER,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: Duration, rate_limit_sleep: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
            rate_limit_sleep,
            ..Self::default()
        }
    }

    /// Disable jitter so delays are predictable.
    #[cfg(test)]
    pub fn without_jitter(mut self) -> Self {
        self.max_jitter = Duration::ZERO;
        self
    }

    /// Whether another attempt may follow attempt number `attempt` (1-based).
    pub fn can_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Exponential backoff after failed attempt `attempt` (1-based), without jitter.
    ///
    /// `base * 2^(attempt-1)`, capped at `max_backoff`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let delay = self.backoff_base.saturating_mul(1u32 << exponent);
        delay.min(self.max_backoff)
    }

    /// Backoff after attempt `attempt` plus random jitter.
    pub fn backoff_with_jitter(&self, attempt: u32) -> Duration {
        self.backoff(attempt) + self.jitter()
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..max_ms))
    }

    /// Delay before retrying a 429, honoring a `Retry-After` header when parseable.
    ///
    /// Hints longer than `max_retry_after` are cut down to it.
    pub fn rate_limit_delay(&self, retry_after: Option<&str>) -> Duration {
        retry_after
            .and_then(|value| parse_retry_after(value, Utc::now()))
            .map(|delay| delay.min(self.max_retry_after))
            .unwrap_or(self.rate_limit_sleep)
    }
}

/// Parse a `Retry-After` header value.
///
/// Accepts delta-seconds (integer or decimal) and HTTP-dates. Dates in the past
/// yield a zero delay. Negative, garbage or out-of-range values yield `None`.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(secs) = value.parse::<f64>() {
        return Duration::try_from_secs_f64(secs).ok();
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?;
    let wait = at.with_timezone(&Utc) - now;
    Some(wait.to_std().unwrap_or(Duration::ZERO))
}

/// Sleep for `delay` unless `cancel` fires first.
///
/// Returns `false` if the sleep was interrupted by cancellation.
pub async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    if delay.is_zero() {
        return true;
    }
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
