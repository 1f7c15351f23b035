//! hz-testkit
//!
//! Deterministic doubles for gate tests: a settable clock and a settings
//! source whose answers are scripted and whose calls are counted.
//! No randomness, no network I/O.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Europe::Berlin;
use hz_gate::{
    Clock, EditingWindowGate, FetchError, GateOptions, SettingsSource, TimeRestrictionPolicy,
};
use parking_lot::Mutex;

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Berlin wall-clock time as a UTC instant.
///
/// Panics on a nonexistent or ambiguous local time (DST switch hours);
/// test fixtures should pick unambiguous times.
pub fn berlin(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Berlin
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .single()
        .unwrap_or_else(|| panic!("ambiguous Berlin time {y}-{m}-{d} {h}:{min}"))
        .with_timezone(&Utc)
}

// ---------------------------------------------------------------------------
// Settings source
// ---------------------------------------------------------------------------

/// Scripted answer for one fetch.
#[derive(Clone, Copy, Debug)]
pub enum Answer {
    Policy(TimeRestrictionPolicy),
    /// Fails with `FetchError::Status { code }`.
    Fail(u16),
}

impl Answer {
    fn to_result(self) -> Result<TimeRestrictionPolicy, FetchError> {
        match self {
            Answer::Policy(p) => Ok(p),
            Answer::Fail(code) => Err(FetchError::Status { code }),
        }
    }
}

/// Settings source that plays back queued answers, then repeats a default.
#[derive(Debug)]
pub struct ScriptedSource {
    queue: Mutex<VecDeque<Answer>>,
    default: Mutex<Answer>,
    fetches: AtomicUsize,
}

impl ScriptedSource {
    /// Always answers with `policy`.
    pub fn always(policy: TimeRestrictionPolicy) -> Self {
        Self::with_default(Answer::Policy(policy))
    }

    /// Always fails with HTTP 503.
    pub fn failing() -> Self {
        Self::with_default(Answer::Fail(503))
    }

    pub fn with_default(answer: Answer) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            default: Mutex::new(answer),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Answer used once, before the default.
    pub fn push(&self, answer: Answer) {
        self.queue.lock().push_back(answer);
    }

    /// Replace the repeating answer (simulates an admin changing settings).
    pub fn set_default(&self, answer: Answer) {
        *self.default.lock() = answer;
    }

    /// Number of fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SettingsSource for ScriptedSource {
    fn source_name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch_time_restrictions(&self) -> Result<TimeRestrictionPolicy, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let next = self.queue.lock().pop_front();
        let answer = next.unwrap_or_else(|| *self.default.lock());
        answer.to_result()
    }
}

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

/// Gate wired to a scripted source and a manual clock, with default options
/// (Berlin, 60 s TTL, fail-safe fallback). Handles are returned so tests can
/// drive time and inspect fetches.
pub struct GateFixture {
    pub gate: EditingWindowGate,
    pub source: Arc<ScriptedSource>,
    pub clock: Arc<ManualClock>,
}

impl GateFixture {
    pub fn new(source: ScriptedSource, start: DateTime<Utc>) -> Self {
        let source = Arc::new(source);
        let clock = Arc::new(ManualClock::new(start));
        let gate = EditingWindowGate::new(
            Arc::clone(&source) as Arc<dyn SettingsSource>,
            Arc::clone(&clock) as Arc<dyn Clock>,
            GateOptions::default(),
        );
        Self {
            gate,
            source,
            clock,
        }
    }
}
