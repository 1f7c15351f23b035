//! hz-week
//!
//! ISO-8601 week numbering for weekly pickup slips.
//!
//! Pure deterministic logic. The only functions that read the wall clock are
//! the `current_*` helpers; everything else takes its date as an argument.
//!
//! # Rules
//!
//! - Weeks start on Monday.
//! - Week 1 is the week containing the first Thursday of the year.
//! - The week-numbering year can differ from the calendar year: Jan 1–3 may
//!   belong to week 52/53 of the previous year, Dec 29–31 to week 1 of the
//!   next one.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// WeekId
// ---------------------------------------------------------------------------

/// One ISO week: `week_number` in `1..=53` plus the ISO week-numbering year.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeekId {
    // Field order matters: derived `Ord` compares `year` first.
    pub year: i32,
    pub week_number: u32,
}

impl WeekId {
    /// Build a week id, returning `None` if `week_number` does not exist in
    /// `year` (week 0, week 54, or week 53 of a 52-week year).
    pub fn new(week_number: u32, year: i32) -> Option<Self> {
        NaiveDate::from_isoywd_opt(year, week_number, Weekday::Mon)?;
        Some(Self { year, week_number })
    }

    /// Monday of this week. `None` only for an id that was built by hand with
    /// an out-of-range week.
    pub fn monday(&self) -> Option<NaiveDate> {
        NaiveDate::from_isoywd_opt(self.year, self.week_number, Weekday::Mon)
    }

    /// Friday of this week, the last day a slip covers.
    pub fn friday(&self) -> Option<NaiveDate> {
        NaiveDate::from_isoywd_opt(self.year, self.week_number, Weekday::Fri)
    }

    /// The following ISO week (rolls over 52- and 53-week years).
    pub fn next(&self) -> Option<Self> {
        let monday = self.monday()?;
        monday.checked_add_signed(Duration::days(7)).map(week_of)
    }

    /// `"KW {week}, {year}"`.
    pub fn label(&self) -> String {
        format_week_label(self.week_number, self.year)
    }
}

impl fmt::Display for WeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KW {}, {}", self.week_number, self.year)
    }
}

// ---------------------------------------------------------------------------
// Week computation
// ---------------------------------------------------------------------------

/// ISO week of a calendar date.
///
/// The week-numbering year is the year of the Thursday in the date's
/// Monday-based week. Total over the whole `NaiveDate` range: at the edges
/// the week may belong to a year just outside it.
pub fn week_of(date: NaiveDate) -> WeekId {
    let iso = date.iso_week();
    WeekId {
        year: iso.year(),
        week_number: iso.week(),
    }
}

/// ISO week of a zoned instant, using the calendar date in that instant's
/// own timezone. Time of day is ignored.
pub fn week_of_datetime<T: TimeZone>(dt: &DateTime<T>) -> WeekId {
    week_of(dt.date_naive())
}

/// Current ISO week as seen from `tz`.
pub fn current_week_in(tz: Tz) -> WeekId {
    week_of_datetime(&Utc::now().with_timezone(&tz))
}

// ---------------------------------------------------------------------------
// Labels and comparisons
// ---------------------------------------------------------------------------

/// Human-readable week label used on slips and dashboards.
pub fn format_week_label(week_number: u32, year: i32) -> String {
    format!("KW {week_number}, {year}")
}

/// `true` if (`week_number`, `year`) is `today`'s week or any later week.
pub fn is_current_or_future_week_at(week_number: u32, year: i32, today: WeekId) -> bool {
    year > today.year || (year == today.year && week_number >= today.week_number)
}

/// Wall-clock variant of [`is_current_or_future_week_at`].
pub fn is_current_or_future_week(week_number: u32, year: i32, tz: Tz) -> bool {
    is_current_or_future_week_at(week_number, year, current_week_in(tz))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
