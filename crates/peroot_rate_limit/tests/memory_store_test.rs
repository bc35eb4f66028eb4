//! Tests for the in-process counter store.

use chrono::{Duration, Utc};
use peroot_rate_limit::{CounterStore, ManualClock, MemoryCounterStore, Tier, Ttl};
use std::sync::Arc;

#[tokio::test]
async fn test_increment_creates_key_without_expiry() {
    let store = MemoryCounterStore::new();

    assert_eq!(store.ttl("k").await.unwrap(), Ttl::Missing);
    assert_eq!(store.increment("k").await.unwrap(), 1);
    assert_eq!(store.increment("k").await.unwrap(), 2);
    assert_eq!(store.ttl("k").await.unwrap(), Ttl::NoExpiry);
}

#[tokio::test]
async fn test_expire_and_lazy_eviction() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let store = MemoryCounterStore::with_clock(clock.clone());

    store.increment("k").await.unwrap();
    store.expire("k", 10).await.unwrap();
    assert_eq!(store.ttl("k").await.unwrap(), Ttl::Expires(10));

    clock.advance(Duration::milliseconds(2500));
    assert_eq!(store.ttl("k").await.unwrap(), Ttl::Expires(8));

    clock.advance(Duration::seconds(8));
    assert_eq!(store.ttl("k").await.unwrap(), Ttl::Missing);
    assert!(store.is_empty());
    assert_eq!(store.increment("k").await.unwrap(), 1);
}

#[tokio::test]
async fn test_expire_on_missing_key_is_noop() {
    let store = MemoryCounterStore::new();
    store.expire("ghost", 30).await.unwrap();
    assert_eq!(store.ttl("ghost").await.unwrap(), Ttl::Missing);
}

#[tokio::test]
async fn test_increment_with_ttl_single_round_trip() {
    let store = MemoryCounterStore::new();

    let (count, ttl) = store.increment_with_ttl("k").await.unwrap();
    assert_eq!((count, ttl), (1, Ttl::NoExpiry));

    store.expire("k", 3600).await.unwrap();
    let (count, ttl) = store.increment_with_ttl("k").await.unwrap();
    assert_eq!(count, 2);
    assert_eq!(ttl, Ttl::Expires(3600));
}

#[tokio::test]
async fn test_concurrent_increments_are_atomic() {
    let store = Arc::new(MemoryCounterStore::new());

    let handles: Vec<_> = (0..64)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.increment("shared").await.unwrap() })
        })
        .collect();

    let mut counts = Vec::new();
    for handle in handles {
        counts.push(handle.await.unwrap());
    }
    counts.sort_unstable();

    assert_eq!(counts, (1..=64).collect::<Vec<u64>>());
}

#[tokio::test]
async fn test_stale_keys_are_swept_when_new_keys_arrive() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let store = MemoryCounterStore::with_clock(clock.clone());

    for i in 0..1000 {
        let key = format!("device-{}", i);
        store.increment(&key).await.unwrap();
        store.expire(&key, 3600).await.unwrap();
    }
    assert_eq!(store.stored_len(), 1000);

    clock.advance(Duration::seconds(7200));
    assert_eq!(store.len(), 0);
    assert_eq!(store.stored_len(), 1000);

    store.increment("fresh").await.unwrap();
    assert_eq!(store.stored_len(), 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_sweep_keeps_live_keys() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let store = MemoryCounterStore::with_clock(clock.clone())
        .with_sweep_interval(Duration::seconds(10));

    store.increment("short").await.unwrap();
    store.expire("short", 5).await.unwrap();
    store.increment("long").await.unwrap();
    store.expire("long", 3600).await.unwrap();
    store.increment("open").await.unwrap();

    clock.advance(Duration::seconds(30));
    store.increment("new").await.unwrap();

    assert_eq!(store.stored_len(), 3);
    assert_eq!(store.increment("long").await.unwrap(), 2);
    assert_eq!(store.ttl("long").await.unwrap(), Ttl::Expires(3570));
    assert_eq!(store.ttl("open").await.unwrap(), Ttl::NoExpiry);
}

#[tokio::test]
async fn test_no_sweep_within_interval() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let store = MemoryCounterStore::with_clock(clock.clone());

    store.increment("a").await.unwrap();
    store.expire("a", 1).await.unwrap();
    clock.advance(Duration::seconds(2));
    store.increment("b").await.unwrap();

    assert_eq!(store.stored_len(), 2);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_expire_out_of_range_is_an_error() {
    let store = MemoryCounterStore::new();
    store.increment("k").await.unwrap();

    assert!(store.expire("k", 1 << 62).await.is_err());
    assert_eq!(store.ttl("k").await.unwrap(), Ttl::NoExpiry);
}

#[test]
fn test_tier_parsing() {
    assert_eq!("PRO".parse::<Tier>().unwrap(), Tier::Pro);
    assert_eq!(" guest ".parse::<Tier>().unwrap(), Tier::Guest);
    assert!("enterprise".parse::<Tier>().is_err());
    assert_eq!(Tier::default(), Tier::Guest);
    assert_eq!(Tier::Free.to_string(), "free");
}

#[test]
fn test_decision_serializes() {
    let decision = peroot_rate_limit::RateLimitDecision::fail_open(30);
    let json = serde_json::to_value(decision).unwrap();
    assert_eq!(json["admitted"], true);
    assert_eq!(json["remaining"], 30);
    assert!(json["reset_at"].is_null());
}
