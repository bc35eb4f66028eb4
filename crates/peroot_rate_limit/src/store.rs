//! Shared counter store contract.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use peroot_error::{RateLimitError, StoreResult};

/// Remaining lifetime of a counter key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ttl {
    /// Key expires after this many seconds.
    Expires(u64),
    /// Key exists but has no expiry (a fresh window).
    NoExpiry,
    /// Key does not exist.
    Missing,
}

/// Atomic counter with expiry, shared by every instance of the service.
///
/// Correctness of the limiter depends only on `increment` being atomic across concurrent
/// callers. Every operation may fail; the limiter treats failures as "admit".
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically increment the counter, creating it at 1 if absent.
    async fn increment(&self, key: &str) -> StoreResult<u64>;

    /// Read the key's remaining lifetime.
    async fn ttl(&self, key: &str) -> StoreResult<Ttl>;

    /// Set the key to expire after `seconds`.
    async fn expire(&self, key: &str, seconds: u64) -> StoreResult<()>;

    /// Increment and read the TTL in one round trip.
    ///
    /// The provided implementation issues two calls. Stores with a batch or scripting
    /// primitive should override it.
    async fn increment_with_ttl(&self, key: &str) -> StoreResult<(u64, Ttl)> {
        let count = self.increment(key).await?;
        let ttl = self.ttl(key).await?;
        Ok((count, ttl))
    }
}

/// The instant `secs` seconds after `now`.
///
/// Lifetimes that do not fit a timestamp are a store failure, not a panic.
pub(crate) fn expiry_after(now: DateTime<Utc>, secs: u64) -> StoreResult<DateTime<Utc>> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| RateLimitError::store(format!("lifetime of {}s is out of range", secs)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_after_in_range() {
        let now = Utc::now();
        assert_eq!(expiry_after(now, 60).unwrap(), now + Duration::seconds(60));
    }

    #[test]
    fn test_expiry_after_out_of_range() {
        let now = Utc::now();
        assert!(expiry_after(now, 1 << 62).is_err());
        assert!(expiry_after(now, u64::MAX).is_err());
    }
}
