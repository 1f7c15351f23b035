//! hz-gate
//!
//! Editing-window gate for weekly pickup slips.
//!
//! Decides whether parents may create or edit a slip right now, based on an
//! administrator-controlled [`TimeRestrictionPolicy`] read through a
//! [`SettingsSource`] and cached for a fixed TTL.
//!
//! Layout:
//! - `policy`  — policy type, validation, fail-safe fallback
//! - `window`  — pure weekday/hour rules and the status message
//! - `cache`   — TTL cache with explicit invalidation
//! - `source`  — settings boundary + REST implementation
//! - `gate`    — [`EditingWindowGate`], the piece callers hold

mod cache;
mod clock;
mod gate;
mod policy;
mod source;
mod window;

pub use cache::{CacheState, PolicyCache, DEFAULT_TTL_SECS};
pub use clock::{Clock, SystemClock};
pub use gate::{CachedCheck, EditingCheck, EditingWindowGate, GateOptions, PolicyOrigin, ResolvedPolicy};
pub use policy::{PolicyError, TimeRestrictionPolicy, MAX_HOUR};
pub use source::{FetchError, HttpSettingsSource, SettingsSource};
pub use window::{is_editing_allowed_at, status_at, EditingStatus};
