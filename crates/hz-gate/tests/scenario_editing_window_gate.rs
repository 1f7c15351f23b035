//! Scenario: editing-window decisions through the gate, on Berlin wall-clock
//! time.
//!
//! Policy under test: enabled, 12–17, weekdays only (the fallback values,
//! served here as a *fetched* policy).
//!
//!   2025-06-04 Wed — regular weekday (CEST, UTC+2)
//!   2025-06-07 Sat — weekend
//!   2025-01-15 Wed — winter (CET, UTC+1)

use chrono::Duration;
use hz_gate::{EditingStatus, TimeRestrictionPolicy};
use hz_testkit::{berlin, GateFixture, ScriptedSource};
use hz_week::WeekId;

fn window_12_17() -> ScriptedSource {
    ScriptedSource::always(TimeRestrictionPolicy::FALLBACK)
}

async fn allowed_at(h: u32, m: u32) -> bool {
    let fx = GateFixture::new(window_12_17(), berlin(2025, 6, 4, h, m));
    fx.gate.is_editing_allowed_async().await
}

#[tokio::test]
async fn wednesday_boundaries() {
    assert!(allowed_at(11, 59).await, "11:59 is before the window");
    assert!(!allowed_at(12, 0).await, "12:00 starts the window");
    assert!(!allowed_at(16, 59).await, "16:59 is inside the window");
    assert!(allowed_at(17, 0).await, "17:00 ends the window (exclusive)");
}

#[tokio::test]
async fn saturday_afternoon_is_open() {
    let fx = GateFixture::new(window_12_17(), berlin(2025, 6, 7, 14, 0));
    assert!(fx.gate.is_editing_allowed_async().await);
    assert_eq!(fx.gate.editing_status(), EditingStatus::WeekendOpen);
}

#[tokio::test]
async fn disabled_policy_is_open_all_week() {
    let fx = GateFixture::new(
        ScriptedSource::always(TimeRestrictionPolicy::DISABLED),
        berlin(2025, 6, 2, 0, 0),
    );
    // Every hour of Mon 2025-06-02 .. Sun 2025-06-08.
    for _ in 0..(7 * 24) {
        assert!(fx.gate.is_editing_allowed_async().await);
        fx.clock.advance(Duration::hours(1));
    }
}

#[tokio::test]
async fn hour_is_taken_from_berlin_not_utc() {
    // 12:30 Berlin in winter = 11:30 UTC. A UTC-based gate would say "open".
    let fx = GateFixture::new(window_12_17(), berlin(2025, 1, 15, 12, 30));
    assert!(!fx.gate.is_editing_allowed_async().await);

    // 17:30 Berlin in summer = 15:30 UTC. A UTC-based gate would say "blocked".
    fx.clock.set(berlin(2025, 6, 4, 17, 30));
    assert!(fx.gate.is_editing_allowed_async().await);
}

#[tokio::test]
async fn status_messages_follow_the_day() {
    let fx = GateFixture::new(window_12_17(), berlin(2025, 6, 4, 9, 0));
    fx.gate.is_editing_allowed_async().await;

    assert_eq!(
        fx.gate.next_editing_time_message(),
        "Bearbeitung möglich bis 12:00 Uhr, danach gesperrt bis 17:00 Uhr"
    );

    fx.clock.set(berlin(2025, 6, 4, 13, 0));
    assert_eq!(
        fx.gate.next_editing_time_message(),
        "Bearbeitung gesperrt bis 17:00 Uhr (Montag–Freitag)"
    );

    fx.clock.set(berlin(2025, 6, 4, 19, 0));
    assert_eq!(
        fx.gate.next_editing_time_message(),
        "Bearbeitung möglich bis 24:00 Uhr"
    );
}

#[tokio::test]
async fn current_week_uses_gate_timezone() {
    // Sunday 2025-06-08 23:30 Berlin is 21:30 UTC: still week 23 locally.
    let fx = GateFixture::new(window_12_17(), berlin(2025, 6, 8, 23, 30));
    assert_eq!(
        fx.gate.current_week(),
        WeekId {
            year: 2025,
            week_number: 23
        }
    );

    // Monday 2025-06-09 00:30 Berlin is still Sunday in UTC, but week 24 here.
    fx.clock.set(berlin(2025, 6, 9, 0, 30));
    assert_eq!(fx.gate.current_week().week_number, 24);
}
