//! Editing-window rules.
//!
//! Deterministic, pure logic. No IO, no wall-clock: callers pass the local
//! weekday and hour.
//!
//! Evaluation order, first match wins:
//! 1. policy disabled → allowed
//! 2. weekdays-only and Saturday/Sunday → allowed
//! 3. `block_start_hour <= hour < block_end_hour` → blocked, else allowed

use std::fmt;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::policy::TimeRestrictionPolicy;

fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}

/// `true` if slips may be created or edited at local (`weekday`, `hour`).
pub fn is_editing_allowed_at(policy: &TimeRestrictionPolicy, weekday: Weekday, hour: u32) -> bool {
    if !policy.enabled {
        return true;
    }
    if policy.block_weekdays_only && is_weekend(weekday) {
        return true;
    }
    hour < policy.block_start_hour || hour >= policy.block_end_hour
}

// ---------------------------------------------------------------------------
// EditingStatus
// ---------------------------------------------------------------------------

/// Where the current local time sits relative to the editing window.
///
/// `Display` renders the user-facing status line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EditingStatus {
    /// Restriction disabled.
    AlwaysOpen,
    /// Weekend under a weekdays-only policy.
    WeekendOpen,
    /// Before today's window: open until `block_start_hour`.
    OpenUntil {
        block_start_hour: u32,
        block_end_hour: u32,
    },
    /// Past today's window: open for the rest of the day.
    OpenUntilMidnight,
    /// Inside the window.
    BlockedUntil {
        block_end_hour: u32,
        weekdays_only: bool,
    },
}

impl EditingStatus {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, EditingStatus::BlockedUntil { .. })
    }
}

impl fmt::Display for EditingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditingStatus::AlwaysOpen => write!(f, "Bearbeitung jederzeit möglich"),
            EditingStatus::WeekendOpen => {
                write!(f, "Am Wochenende ist die Bearbeitung jederzeit möglich")
            }
            EditingStatus::OpenUntil {
                block_start_hour,
                block_end_hour,
            } => write!(
                f,
                "Bearbeitung möglich bis {block_start_hour}:00 Uhr, danach gesperrt bis {block_end_hour}:00 Uhr"
            ),
            EditingStatus::OpenUntilMidnight => write!(f, "Bearbeitung möglich bis 24:00 Uhr"),
            EditingStatus::BlockedUntil {
                block_end_hour,
                weekdays_only,
            } => {
                write!(f, "Bearbeitung gesperrt bis {block_end_hour}:00 Uhr")?;
                if *weekdays_only {
                    write!(f, " (Montag–Freitag)")?;
                }
                Ok(())
            }
        }
    }
}

/// Status at local (`weekday`, `hour`). Agrees with [`is_editing_allowed_at`].
pub fn status_at(policy: &TimeRestrictionPolicy, weekday: Weekday, hour: u32) -> EditingStatus {
    if !policy.enabled {
        return EditingStatus::AlwaysOpen;
    }
    if policy.block_weekdays_only && is_weekend(weekday) {
        return EditingStatus::WeekendOpen;
    }
    if hour < policy.block_start_hour {
        return EditingStatus::OpenUntil {
            block_start_hour: policy.block_start_hour,
            block_end_hour: policy.block_end_hour,
        };
    }
    if hour >= policy.block_end_hour {
        return EditingStatus::OpenUntilMidnight;
    }
    EditingStatus::BlockedUntil {
        block_end_hour: policy.block_end_hour,
        weekdays_only: policy.block_weekdays_only,
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
