//! Process-local policy cache with a fixed TTL.
//!
//! # Invariants
//!
//! - A lookup within `ttl` of the last store returns the stored policy.
//! - A lookup at or after `ttl` returns `None`; the caller refetches.
//! - Failed fetches never write here. Only [`PolicyCache::store`] fills the
//!   cache, so a failure cannot pin the fallback policy.
//! - [`PolicyCache::invalidate`] empties the cache and forgets the timestamp.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::TimeRestrictionPolicy;

/// Default time-to-live of a fetched policy, in seconds.
pub const DEFAULT_TTL_SECS: i64 = 60;

/// Observable cache condition, for callers that need to know whether a
/// synchronous read reflects real settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheState {
    /// Nothing stored (never fetched, or invalidated).
    Cold,
    /// Stored and within TTL.
    Warm,
    /// Stored but older than TTL; the next async read refetches.
    Expired,
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    policy: TimeRestrictionPolicy,
    fetched_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct PolicyCache {
    entry: Option<Entry>,
    ttl: Duration,
}

impl Default for PolicyCache {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_TTL_SECS))
    }
}

impl PolicyCache {
    pub fn new(ttl: Duration) -> Self {
        Self { entry: None, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stored policy if it is still fresh at `now`.
    pub fn lookup(&self, now: DateTime<Utc>) -> Option<TimeRestrictionPolicy> {
        self.entry
            .filter(|e| now - e.fetched_at < self.ttl)
            .map(|e| e.policy)
    }

    /// Stored policy regardless of age.
    pub fn peek(&self) -> Option<TimeRestrictionPolicy> {
        self.entry.map(|e| e.policy)
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.entry.map(|e| e.fetched_at)
    }

    pub fn store(&mut self, policy: TimeRestrictionPolicy, now: DateTime<Utc>) {
        self.entry = Some(Entry {
            policy,
            fetched_at: now,
        });
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn state(&self, now: DateTime<Utc>) -> CacheState {
        match self.entry {
            None => CacheState::Cold,
            Some(e) if now - e.fetched_at < self.ttl => CacheState::Warm,
            Some(_) => CacheState::Expired,
        }
    }
}
