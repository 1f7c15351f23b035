//! Scenario: policy cache TTL and explicit invalidation.
//!
//! # Invariants under test
//!
//! 1. Two async checks within 60 s issue exactly one fetch.
//! 2. Checks more than 60 s apart fetch each time.
//! 3. Invalidation forces a fetch on the next async check even within TTL.
//! 4. A policy change upstream is visible right after invalidation.
//! 5. Sync checks never fetch.
//!
//! All tests are in-process; time is driven by `ManualClock`.

use chrono::Duration;
use hz_gate::{CacheState, PolicyOrigin, TimeRestrictionPolicy};
use hz_testkit::{berlin, Answer, GateFixture, ScriptedSource};

fn wednesday_2pm() -> chrono::DateTime<chrono::Utc> {
    berlin(2025, 6, 4, 14, 0)
}

#[tokio::test]
async fn two_checks_within_ttl_fetch_once() {
    let fx = GateFixture::new(
        ScriptedSource::always(TimeRestrictionPolicy::DISABLED),
        wednesday_2pm(),
    );

    assert!(fx.gate.is_editing_allowed_async().await);
    fx.clock.advance(Duration::seconds(59));
    assert!(fx.gate.is_editing_allowed_async().await);

    assert_eq!(fx.source.fetch_count(), 1);
}

#[tokio::test]
async fn checks_beyond_ttl_fetch_each_time() {
    let fx = GateFixture::new(
        ScriptedSource::always(TimeRestrictionPolicy::DISABLED),
        wednesday_2pm(),
    );

    for _ in 0..3 {
        fx.gate.is_editing_allowed_async().await;
        fx.clock.advance(Duration::seconds(61));
    }

    assert_eq!(fx.source.fetch_count(), 3);
}

#[tokio::test]
async fn expiry_is_exactly_at_ttl() {
    let fx = GateFixture::new(
        ScriptedSource::always(TimeRestrictionPolicy::DISABLED),
        wednesday_2pm(),
    );

    fx.gate.get_policy().await;
    fx.clock.advance(Duration::seconds(60));
    assert_eq!(fx.gate.cache_state(), CacheState::Expired);

    let resolved = fx.gate.get_policy().await;
    assert_eq!(resolved.origin, PolicyOrigin::Fetched);
    assert_eq!(fx.source.fetch_count(), 2);
}

#[tokio::test]
async fn invalidation_forces_refetch_within_ttl() {
    let fx = GateFixture::new(
        ScriptedSource::always(TimeRestrictionPolicy::DISABLED),
        wednesday_2pm(),
    );

    fx.gate.is_editing_allowed_async().await;
    fx.clock.advance(Duration::seconds(1));
    fx.gate.invalidate_cache();
    assert_eq!(fx.gate.cache_state(), CacheState::Cold);

    fx.gate.is_editing_allowed_async().await;
    assert_eq!(fx.source.fetch_count(), 2);
}

#[tokio::test]
async fn admin_change_is_seen_after_invalidation() {
    let fx = GateFixture::new(
        ScriptedSource::always(TimeRestrictionPolicy::DISABLED),
        wednesday_2pm(),
    );

    // Disabled restriction: 14:00 on a Wednesday is open.
    assert!(fx.gate.is_editing_allowed_async().await);

    // Admin enables the 12–17 window upstream.
    fx.source
        .set_default(Answer::Policy(TimeRestrictionPolicy::FALLBACK));

    // Without invalidation the stale cache still answers.
    assert!(fx.gate.is_editing_allowed_async().await);

    fx.gate.invalidate_cache();
    assert!(!fx.gate.is_editing_allowed_async().await);
    assert_eq!(fx.gate.cached_settings(), TimeRestrictionPolicy::FALLBACK);
}

#[tokio::test]
async fn sync_checks_never_fetch() {
    let fx = GateFixture::new(
        ScriptedSource::always(TimeRestrictionPolicy::DISABLED),
        wednesday_2pm(),
    );

    for _ in 0..5 {
        fx.gate.is_editing_allowed();
        fx.gate.try_is_editing_allowed();
        fx.gate.next_editing_time_message();
        fx.gate.cached_settings();
    }
    assert_eq!(fx.source.fetch_count(), 0);
}

#[tokio::test]
async fn sync_check_uses_warm_cache_after_async_check() {
    let fx = GateFixture::new(
        ScriptedSource::always(TimeRestrictionPolicy::DISABLED),
        wednesday_2pm(),
    );

    // Cold: fallback blocks 12–17 on weekdays, so 14:00 Wednesday is blocked.
    assert!(!fx.gate.is_editing_allowed());
    assert_eq!(fx.gate.try_is_editing_allowed(), None);

    fx.gate.is_editing_allowed_async().await;

    assert!(fx.gate.is_editing_allowed());
    assert_eq!(fx.gate.try_is_editing_allowed(), Some(true));
    assert_eq!(fx.gate.resolve_cached().origin, PolicyOrigin::Cached);

    // Expired entries still serve synchronous reads.
    fx.clock.advance(Duration::minutes(5));
    assert_eq!(fx.gate.try_is_editing_allowed(), Some(true));
}

#[tokio::test]
async fn cached_snapshot_is_self_consistent() {
    let fx = GateFixture::new(
        ScriptedSource::always(TimeRestrictionPolicy::DISABLED),
        wednesday_2pm(),
    );

    let cold = fx.gate.snapshot_cached();
    assert_eq!(cold.cache_state, CacheState::Cold);
    assert_eq!(cold.fetched_allowed, None);
    assert_eq!(cold.check.resolved.origin, PolicyOrigin::FallbackNeverFetched);
    assert!(!cold.check.allowed, "fallback blocks Wednesday 14:00");

    fx.gate.get_policy().await;
    let warm = fx.gate.snapshot_cached();
    assert_eq!(warm.cache_state, CacheState::Warm);
    assert_eq!(warm.fetched_allowed, Some(true));
    assert_eq!(warm.check.resolved.origin, PolicyOrigin::Cached);

    fx.clock.advance(Duration::seconds(60));
    let expired = fx.gate.snapshot_cached();
    assert_eq!(expired.cache_state, CacheState::Expired);
    assert_eq!(expired.fetched_allowed, Some(true));

    fx.gate.invalidate_cache();
    let after = fx.gate.snapshot_cached();
    assert_eq!(after.cache_state, CacheState::Cold);
    assert_eq!(after.fetched_allowed, None);
    assert_eq!(fx.source.fetch_count(), 1);
}
