//! Admission decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one quota check.
///
/// `reset_at` is `None` when the decision was produced without consulting the store
/// (the fail-open path).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RateLimitDecision {
    /// Whether the request may proceed
    pub admitted: bool,
    /// Quota for the caller's tier
    pub limit: u64,
    /// Requests left in the current window
    pub remaining: u64,
    /// When the current window ends
    pub reset_at: Option<DateTime<Utc>>,
}

impl RateLimitDecision {
    /// Admit without store data: full quota reported, reset undefined.
    pub fn fail_open(limit: u64) -> Self {
        Self {
            admitted: true,
            limit,
            remaining: limit,
            reset_at: None,
        }
    }

    /// Reset time as Unix milliseconds, `0` when undefined.
    ///
    /// Suitable for `X-RateLimit-Reset` style headers.
    pub fn reset_at_millis(&self) -> i64 {
        self.reset_at.map(|at| at.timestamp_millis()).unwrap_or(0)
    }

    /// Seconds until the window resets, measured from `now`.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> Option<u64> {
        self.reset_at
            .map(|at| (at - now).num_seconds().max(0) as u64)
    }
}
