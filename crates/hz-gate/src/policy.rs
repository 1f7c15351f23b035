//! Time-restriction policy as stored by the administrator settings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest valid local hour.
pub const MAX_HOUR: u32 = 23;

/// Administrator-controlled window during which slips may not be created or
/// edited.
///
/// The gate only ever reads this; the settings store owns it. On the wire the
/// fields are camelCase (`blockStartHour`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRestrictionPolicy {
    /// `false` disables the restriction entirely.
    pub enabled: bool,
    /// Local hour (0–23) at which the blocked window starts, inclusive.
    pub block_start_hour: u32,
    /// Local hour (0–23) at which the blocked window ends, exclusive.
    pub block_end_hour: u32,
    /// Restrict Monday–Friday only; weekends stay open.
    pub block_weekdays_only: bool,
}

impl TimeRestrictionPolicy {
    /// Fail-safe policy used whenever no fetched policy is available:
    /// blocks 12:00–17:00 on weekdays.
    pub const FALLBACK: TimeRestrictionPolicy = TimeRestrictionPolicy {
        enabled: true,
        block_start_hour: 12,
        block_end_hour: 17,
        block_weekdays_only: true,
    };

    /// A policy that never blocks.
    pub const DISABLED: TimeRestrictionPolicy = TimeRestrictionPolicy {
        enabled: false,
        ..Self::FALLBACK
    };

    /// Reject hours outside `0..=23`.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.block_start_hour > MAX_HOUR {
            return Err(PolicyError::HourOutOfRange {
                field: "blockStartHour",
                value: self.block_start_hour,
            });
        }
        if self.block_end_hour > MAX_HOUR {
            return Err(PolicyError::HourOutOfRange {
                field: "blockEndHour",
                value: self.block_end_hour,
            });
        }
        Ok(())
    }
}

impl Default for TimeRestrictionPolicy {
    fn default() -> Self {
        Self::FALLBACK
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("{field} must be within 0..=23, got {value}")]
    HourOutOfRange { field: &'static str, value: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_the_fail_safe_window() {
        let p = TimeRestrictionPolicy::default();
        assert!(p.enabled);
        assert_eq!((p.block_start_hour, p.block_end_hour), (12, 17));
        assert!(p.block_weekdays_only);
    }

    #[test]
    fn decodes_camel_case_wire_shape() {
        let p: TimeRestrictionPolicy = serde_json::from_str(
            r#"{"enabled":true,"blockStartHour":8,"blockEndHour":10,"blockWeekdaysOnly":false}"#,
        )
        .unwrap();
        assert_eq!(p.block_start_hour, 8);
        assert_eq!(p.block_end_hour, 10);
        assert!(!p.block_weekdays_only);
    }

    #[test]
    fn missing_field_is_a_decode_error() {
        let r: Result<TimeRestrictionPolicy, _> =
            serde_json::from_str(r#"{"enabled":true,"blockStartHour":8}"#);
        assert!(r.is_err());
    }

    #[test]
    fn validate_rejects_hour_24() {
        let p = TimeRestrictionPolicy {
            block_end_hour: 24,
            ..TimeRestrictionPolicy::FALLBACK
        };
        let err = p.validate().unwrap_err();
        assert_eq!(err.to_string(), "blockEndHour must be within 0..=23, got 24");
        assert!(TimeRestrictionPolicy::FALLBACK.validate().is_ok());
    }
}
