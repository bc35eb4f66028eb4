//! In-process counter store.

use crate::store::expiry_after;
use crate::{Clock, CounterStore, SystemClock, Ttl};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use peroot_error::{RateLimitError, StoreResult};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy)]
struct Entry {
    count: u64,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    fn ttl(&self, now: DateTime<Utc>) -> Ttl {
        match self.expires_at {
            None => Ttl::NoExpiry,
            Some(at) => {
                let millis = (at - now).num_milliseconds().max(0) as u64;
                // Round up like Redis does for partially elapsed seconds.
                Ttl::Expires(millis.div_ceil(1000))
            }
        }
    }
}

/// Minimum time between two sweeps of expired keys.
pub const DEFAULT_SWEEP_INTERVAL_SECS: i64 = 60;

#[derive(Debug)]
struct Counters {
    entries: HashMap<String, Entry>,
    last_sweep: DateTime<Utc>,
}

impl Counters {
    fn live_entry(&mut self, key: &str, now: DateTime<Utc>) -> Option<&mut Entry> {
        if self.entries.get(key).is_some_and(|e| e.is_expired(now)) {
            trace!(key, "Dropping expired counter");
            self.entries.remove(key);
        }
        self.entries.get_mut(key)
    }

    fn sweep(&mut self, now: DateTime<Utc>) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        self.last_sweep = now;
        debug!(
            removed = before - self.entries.len(),
            live = self.entries.len(),
            "Swept expired counters"
        );
    }

    fn increment(&mut self, key: &str, now: DateTime<Utc>, sweep_interval: Duration) -> u64 {
        if let Some(entry) = self.live_entry(key, now) {
            entry.count += 1;
            return entry.count;
        }

        if now - self.last_sweep >= sweep_interval {
            self.sweep(now);
        }
        self.entries.insert(
            key.to_string(),
            Entry {
                count: 1,
                expires_at: None,
            },
        );
        1
    }
}

/// Counter store backed by a mutex-guarded map.
///
/// Expired keys are dropped when they are next touched. Keys that are never touched again
/// are swept out when a new key arrives, at most once per sweep interval, so one-shot callers
/// do not accumulate. Increments are atomic because every operation holds the lock for its
/// whole read-modify-write.
#[derive(Debug)]
pub struct MemoryCounterStore<C: Clock = SystemClock> {
    counters: Mutex<Counters>,
    sweep_interval: Duration,
    clock: C,
}

impl<C: Clock + Default> Default for MemoryCounterStore<C> {
    fn default() -> Self {
        Self::with_clock(C::default())
    }
}

impl MemoryCounterStore<SystemClock> {
    /// Store using the system clock.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Clock> MemoryCounterStore<C> {
    /// Store using the given clock.
    pub fn with_clock(clock: C) -> Self {
        Self {
            counters: Mutex::new(Counters {
                entries: HashMap::new(),
                last_sweep: clock.now(),
            }),
            sweep_interval: Duration::seconds(DEFAULT_SWEEP_INTERVAL_SECS),
            clock,
        }
    }

    /// Change the minimum time between sweeps.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.counters
            .lock()
            .map(|c| c.entries.values().filter(|e| !e.is_expired(now)).count())
            .unwrap_or(0)
    }

    /// Whether no live keys exist.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of stored entries, counting expired ones not yet swept.
    pub fn stored_len(&self) -> usize {
        self.counters.lock().map(|c| c.entries.len()).unwrap_or(0)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Counters>> {
        self.counters
            .lock()
            .map_err(|e| RateLimitError::store(format!("counter map poisoned: {}", e)))
    }
}

#[async_trait]
impl<C: Clock> CounterStore for MemoryCounterStore<C> {
    async fn increment(&self, key: &str) -> StoreResult<u64> {
        let now = self.clock.now();
        let mut counters = self.lock()?;
        Ok(counters.increment(key, now, self.sweep_interval))
    }

    async fn ttl(&self, key: &str) -> StoreResult<Ttl> {
        let now = self.clock.now();
        let mut counters = self.lock()?;
        Ok(counters
            .live_entry(key, now)
            .map(|entry| entry.ttl(now))
            .unwrap_or(Ttl::Missing))
    }

    async fn expire(&self, key: &str, seconds: u64) -> StoreResult<()> {
        let now = self.clock.now();
        let expires_at = expiry_after(now, seconds)?;
        let mut counters = self.lock()?;
        if let Some(entry) = counters.live_entry(key, now) {
            entry.expires_at = Some(expires_at);
        }
        Ok(())
    }

    async fn increment_with_ttl(&self, key: &str) -> StoreResult<(u64, Ttl)> {
        let now = self.clock.now();
        let mut counters = self.lock()?;
        let count = counters.increment(key, now, self.sweep_interval);
        let ttl = counters
            .entries
            .get(key)
            .map(|entry| entry.ttl(now))
            .unwrap_or(Ttl::Missing);
        Ok((count, ttl))
    }
}
