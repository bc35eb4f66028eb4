//! Per-caller quotas using a fixed window counter.
//!
//! Every call to [`RateLimiter::check`] increments a counter keyed by the caller identity in
//! a shared [`CounterStore`]. The first increment of a window sets the key's expiry to the
//! window length; the count is compared against the caller's [`Tier`] limit.
//!
//! ## Fail open
//!
//! Quota enforcement must never take the service down. Any store failure, including a
//! timeout, produces an admitted decision and a logged warning. `check` has no error path.
//!
//! ## Stores
//!
//! The counter store is external. [`RedisCounterStore`] shares counters between every
//! instance through one Redis server. [`MemoryCounterStore`] implements the same contract in
//! process for tests and single-instance deployments.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod clock;
mod config;
mod decision;
mod limiter;
mod memory;
mod redis_store;
mod store;
mod tier;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{RateLimitConfig, TierLimits};
pub use decision::RateLimitDecision;
pub use limiter::{CallerIdentity, RateLimiter};
pub use memory::{DEFAULT_SWEEP_INTERVAL_SECS, MemoryCounterStore};
pub use redis_store::{REDIS_URL_VAR, RedisCounterStore};
pub use store::{CounterStore, Ttl};
pub use tier::Tier;
