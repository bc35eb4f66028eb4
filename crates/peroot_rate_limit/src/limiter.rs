//! Fixed window rate limiter.

use crate::store::expiry_after;
use crate::{Clock, CounterStore, RateLimitConfig, RateLimitDecision, SystemClock, Tier, Ttl};
use peroot_error::{RateLimitError, StoreResult};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Opaque rate-limit subject: a user id, or a device fingerprint for anonymous callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallerIdentity(String);

impl CallerIdentity {
    /// Wrap an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallerIdentity {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CallerIdentity {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Gates calls per caller identity and tier.
///
/// Holds no per-caller state of its own; all counters live in the [`CounterStore`].
///
/// When two first requests for the same key race, both may see no expiry and both set it.
/// Setting the same expiry twice is idempotent, so the window boundary moves by at most
/// the width of the race.
///
/// # Example
///
/// ```
/// use peroot_rate_limit::{MemoryCounterStore, RateLimitConfig, RateLimiter, Tier};
///
/// # #[tokio::main]
/// # async fn main() {
/// let limiter = RateLimiter::new(MemoryCounterStore::new(), RateLimitConfig::default());
///
/// let decision = limiter.check(&"user-42".into(), Tier::Guest).await;
/// assert!(decision.admitted);
/// assert_eq!(decision.limit, 5);
/// assert_eq!(decision.remaining, 4);
/// # }
/// ```
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
    config: RateLimitConfig,
}

impl RateLimiter {
    /// Create a limiter over a store, using the system clock.
    pub fn new(store: impl CounterStore + 'static, config: RateLimitConfig) -> Self {
        Self::from_shared(Arc::new(store), config)
    }

    /// Create a limiter over a store that is shared elsewhere.
    pub fn from_shared(store: Arc<dyn CounterStore>, config: RateLimitConfig) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the clock used to compute `reset_at`.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Counter key for an identity.
    pub fn key_for(&self, identity: &CallerIdentity) -> String {
        format!("{}:{}", self.config.key_prefix, identity)
    }

    /// Count this call against the caller's quota.
    ///
    /// Never fails. Any store failure admits the request, including a timeout or a TTL too
    /// large to turn into a timestamp.
    #[instrument(skip_all, fields(identity = %identity, tier = %tier))]
    pub async fn check(&self, identity: &CallerIdentity, tier: Tier) -> RateLimitDecision {
        let limit = self.config.limit_for(tier);
        let key = self.key_for(identity);

        let counted = match tokio::time::timeout(self.config.store_timeout(), self.count(&key)).await
        {
            Ok(result) => result,
            Err(_) => Err(RateLimitError::store(format!(
                "no answer within {}ms",
                self.config.store_timeout_ms
            ))),
        };

        let counted = counted.and_then(|(count, ttl)| {
            expiry_after(self.clock.now(), ttl).map(|reset_at| (count, reset_at))
        });

        let (count, reset_at) = match counted {
            Ok(counted) => counted,
            Err(e) => {
                warn!(error = %e, limit, "Rate limit store failed, failing open");
                return RateLimitDecision::fail_open(limit);
            }
        };

        let admitted = count <= limit;
        let remaining = limit.saturating_sub(count);

        if admitted {
            debug!(count, limit, remaining, "Request admitted");
        } else {
            debug!(count, limit, %reset_at, "Request rejected, quota exhausted");
        }

        RateLimitDecision {
            admitted,
            limit,
            remaining,
            reset_at: Some(reset_at),
        }
    }

    /// Increment the key and make sure its window has an expiry.
    ///
    /// Returns the count and the seconds left in the window.
    async fn count(&self, key: &str) -> StoreResult<(u64, u64)> {
        let (count, ttl) = self.store.increment_with_ttl(key).await?;

        let ttl = match ttl {
            Ttl::Expires(secs) => secs,
            Ttl::NoExpiry | Ttl::Missing => {
                debug!(key, window = self.config.window_secs, "Opening new window");
                self.store.expire(key, self.config.window_secs).await?;
                self.config.window_secs
            }
        };

        // A store that reports 0 after an increment is treated as the first request.
        Ok((count.max(1), ttl))
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
