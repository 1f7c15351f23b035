//! Request and response types for all hz-daemon HTTP endpoints.
//!
//! `Serialize + Deserialize` so they can be JSON-encoded by Axum and decoded
//! by tests. No business logic lives here.

use chrono::NaiveDate;
use hz_gate::{CacheState, EditingStatus, PolicyOrigin, TimeRestrictionPolicy};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
    pub config_hash: Option<String>,
}

// ---------------------------------------------------------------------------
// Errors (400 / 409 / 422)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// /v1/week  /v1/weeks/:year/:week
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeekQuery {
    /// `YYYY-MM-DD`; today in the gate's timezone when absent.
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekResponse {
    pub week_number: u32,
    pub year: i32,
    /// `"KW {week}, {year}"`
    pub label: String,
    pub monday: Option<NaiveDate>,
    pub friday: Option<NaiveDate>,
    /// This week or a later one, as seen from the gate's timezone.
    pub current_or_future: bool,
}

// ---------------------------------------------------------------------------
// /v1/editing
// ---------------------------------------------------------------------------

/// Result of the async check (policy refreshed subject to TTL).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditingResponse {
    pub allowed: bool,
    pub message: String,
    pub status: EditingStatus,
    pub origin: PolicyOrigin,
    pub policy: TimeRestrictionPolicy,
}

/// Result of the cache-only check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedEditingResponse {
    pub cache_state: CacheState,
    /// `None` while no fetched policy is cached.
    pub allowed: Option<bool>,
    /// Decision against cache-or-fallback; always present.
    pub allowed_or_fallback: bool,
    pub message: String,
    pub origin: PolicyOrigin,
    pub policy: TimeRestrictionPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidateResponse {
    pub cache_state: CacheState,
}
