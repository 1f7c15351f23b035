//! The editing-window gate.
//!
//! Combines a [`SettingsSource`], a [`PolicyCache`], a [`Clock`] and the
//! local timezone into the checks the UI consults before enabling
//! "create slip" / "edit slip" actions.
//!
//! # Failure handling
//!
//! A failed fetch is logged at WARN and replaced by the fallback policy for
//! that call only. Nothing is cached, so the next async call retries. The
//! gate never returns an error and never panics on fetch failure.
//!
//! # Concurrency
//!
//! The cache lock is never held across the fetch `.await`. Two callers that
//! both find the cache stale will both fetch; the results converge on the
//! same upstream value. Every invalidation bumps an epoch; a fetch that was
//! already in flight when the epoch moved does not write to the cache.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use chrono_tz::Tz;
use hz_week::{week_of_datetime, WeekId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::{CacheState, PolicyCache, DEFAULT_TTL_SECS};
use crate::clock::{Clock, SystemClock};
use crate::policy::TimeRestrictionPolicy;
use crate::source::{FetchError, SettingsSource};
use crate::window::{is_editing_allowed_at, status_at, EditingStatus};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Construction parameters for [`EditingWindowGate`].
#[derive(Clone, Copy, Debug)]
pub struct GateOptions {
    pub ttl: Duration,
    /// Zone whose wall clock decides weekday and hour.
    pub timezone: Tz,
    /// Policy applied when no fetched policy is available.
    pub fallback_policy: TimeRestrictionPolicy,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            ttl: Duration::seconds(DEFAULT_TTL_SECS),
            timezone: chrono_tz::Europe::Berlin,
            fallback_policy: TimeRestrictionPolicy::FALLBACK,
        }
    }
}

// ---------------------------------------------------------------------------
// ResolvedPolicy
// ---------------------------------------------------------------------------

/// How a policy value was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyOrigin {
    /// Fetched from the settings source on this call.
    Fetched,
    /// Served from cache.
    Cached,
    /// Fallback: no fetch has ever succeeded or been attempted since the
    /// last invalidation.
    FallbackNeverFetched,
    /// Fallback: the most recent fetch failed.
    FallbackAfterFailure,
}

impl PolicyOrigin {
    pub fn is_fallback(&self) -> bool {
        matches!(
            self,
            PolicyOrigin::FallbackNeverFetched | PolicyOrigin::FallbackAfterFailure
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPolicy {
    pub policy: TimeRestrictionPolicy,
    pub origin: PolicyOrigin,
}

/// Cache-only evaluation plus the cache condition it was taken from, all
/// read under one lock at one instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedCheck {
    pub cache_state: CacheState,
    /// Decision against a fetched policy; `None` while nothing is cached.
    pub fetched_allowed: Option<bool>,
    /// Decision against cache-or-fallback.
    pub check: EditingCheck,
}

/// One evaluation: the decision, the status behind it, and the policy used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditingCheck {
    pub allowed: bool,
    pub status: EditingStatus,
    pub resolved: ResolvedPolicy,
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct GateState {
    cache: PolicyCache,
    last_failure_at: Option<DateTime<Utc>>,
    /// Bumped by every invalidation.
    epoch: u64,
}

pub struct EditingWindowGate {
    source: Arc<dyn SettingsSource>,
    clock: Arc<dyn Clock>,
    timezone: Tz,
    fallback_policy: TimeRestrictionPolicy,
    state: Mutex<GateState>,
}

impl EditingWindowGate {
    pub fn new(source: Arc<dyn SettingsSource>, clock: Arc<dyn Clock>, options: GateOptions) -> Self {
        Self {
            source,
            clock,
            timezone: options.timezone,
            fallback_policy: options.fallback_policy,
            state: Mutex::new(GateState {
                cache: PolicyCache::new(options.ttl),
                last_failure_at: None,
                epoch: 0,
            }),
        }
    }

    /// Wall clock, Europe/Berlin, 60 s TTL, fail-safe fallback.
    pub fn with_defaults(source: Arc<dyn SettingsSource>) -> Self {
        Self::new(source, Arc::new(SystemClock), GateOptions::default())
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn source_name(&self) -> &'static str {
        self.source.source_name()
    }

    // -----------------------------------------------------------------------
    // Policy resolution
    // -----------------------------------------------------------------------

    /// Cached policy if fresh, otherwise a fetch; fallback on failure.
    pub async fn get_policy(&self) -> ResolvedPolicy {
        let now = self.clock.now();
        let cached = self.state.lock().cache.lookup(now);
        if let Some(policy) = cached {
            return ResolvedPolicy {
                policy,
                origin: PolicyOrigin::Cached,
            };
        }

        match self.fetch_policy().await {
            Ok(policy) => ResolvedPolicy {
                policy,
                origin: PolicyOrigin::Fetched,
            },
            Err(err) => {
                warn!(
                    source = self.source.source_name(),
                    error = %err,
                    "time restriction fetch failed; using fallback policy"
                );
                ResolvedPolicy {
                    policy: self.fallback_policy,
                    origin: PolicyOrigin::FallbackAfterFailure,
                }
            }
        }
    }

    /// One fetch, bypassing the cache lookup. Success is written to the
    /// cache; failure is recorded but leaves the cache untouched. If the
    /// cache was invalidated while the fetch was in flight, the result is
    /// returned to the caller but not recorded.
    pub async fn fetch_policy(&self) -> Result<TimeRestrictionPolicy, FetchError> {
        let epoch = self.state.lock().epoch;
        let result = self.source.fetch_time_restrictions().await;
        let now = self.clock.now();

        let mut st = self.state.lock();
        if st.epoch != epoch {
            debug!(
                source = self.source.source_name(),
                "cache invalidated during fetch; result not cached"
            );
            return result;
        }
        match &result {
            Ok(policy) => {
                debug!(source = self.source.source_name(), ?policy, "time restrictions fetched");
                st.cache.store(*policy, now);
                st.last_failure_at = None;
            }
            Err(_) => st.last_failure_at = Some(now),
        }
        result
    }

    /// Cache-only view. Never performs IO.
    pub fn resolve_cached(&self) -> ResolvedPolicy {
        self.resolve_locked(&self.state.lock())
    }

    fn resolve_locked(&self, st: &GateState) -> ResolvedPolicy {
        match st.cache.peek() {
            Some(policy) => ResolvedPolicy {
                policy,
                origin: PolicyOrigin::Cached,
            },
            None => ResolvedPolicy {
                policy: self.fallback_policy,
                origin: if st.last_failure_at.is_some() {
                    PolicyOrigin::FallbackAfterFailure
                } else {
                    PolicyOrigin::FallbackNeverFetched
                },
            },
        }
    }

    /// Force the next async check to refetch regardless of TTL. Call after
    /// changing the policy upstream.
    pub fn invalidate_cache(&self) {
        let mut st = self.state.lock();
        st.cache.invalidate();
        st.last_failure_at = None;
        st.epoch = st.epoch.wrapping_add(1);
        debug!("time restriction cache invalidated");
    }

    pub fn cache_state(&self) -> CacheState {
        let now = self.clock.now();
        self.state.lock().cache.state(now)
    }

    /// Cached policy, or the fallback when nothing is cached. For display.
    pub fn cached_settings(&self) -> TimeRestrictionPolicy {
        self.resolve_cached().policy
    }

    // -----------------------------------------------------------------------
    // Decisions
    // -----------------------------------------------------------------------

    /// Refreshes the policy (subject to TTL) and evaluates it now.
    pub async fn check(&self) -> EditingCheck {
        let resolved = self.get_policy().await;
        self.evaluate(resolved, self.clock.now())
    }

    /// Evaluates whatever is cached now, fallback when cold. Never performs
    /// IO.
    pub fn check_cached(&self) -> EditingCheck {
        self.snapshot_cached().check
    }

    /// [`check_cached`](Self::check_cached) together with the cache state
    /// and the fetched-only decision, consistent with each other.
    pub fn snapshot_cached(&self) -> CachedCheck {
        let now = self.clock.now();
        let (resolved, cache_state) = {
            let st = self.state.lock();
            (self.resolve_locked(&st), st.cache.state(now))
        };
        let check = self.evaluate(resolved, now);
        CachedCheck {
            cache_state,
            fetched_allowed: (resolved.origin == PolicyOrigin::Cached).then_some(check.allowed),
            check,
        }
    }

    pub async fn is_editing_allowed_async(&self) -> bool {
        self.check().await.allowed
    }

    /// Synchronous check against whatever is cached, fallback when cold.
    /// Only reflects real settings after at least one async check.
    pub fn is_editing_allowed(&self) -> bool {
        self.check_cached().allowed
    }

    /// Synchronous check that refuses to guess: `None` when no fetched policy
    /// is cached.
    pub fn try_is_editing_allowed(&self) -> Option<bool> {
        self.snapshot_cached().fetched_allowed
    }

    /// Structured status for the current local time, cache-only.
    pub fn editing_status(&self) -> EditingStatus {
        self.check_cached().status
    }

    /// Human-readable line describing when editing is possible next.
    pub fn next_editing_time_message(&self) -> String {
        self.editing_status().to_string()
    }

    /// Current ISO week in the gate's timezone.
    pub fn current_week(&self) -> WeekId {
        week_of_datetime(&self.clock.now().with_timezone(&self.timezone))
    }

    fn evaluate(&self, resolved: ResolvedPolicy, now: DateTime<Utc>) -> EditingCheck {
        let local = now.with_timezone(&self.timezone);
        let (weekday, hour) = (local.weekday(), local.hour());
        EditingCheck {
            allowed: is_editing_allowed_at(&resolved.policy, weekday, hour),
            status: status_at(&resolved.policy, weekday, hour),
            resolved,
        }
    }
}
