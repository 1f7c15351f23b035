//! Scenario: REST settings source against a mock settings API.
//!
//! Uses `httpmock`; no external network.

use std::sync::Arc;

use httpmock::prelude::*;
use hz_gate::{
    EditingWindowGate, FetchError, HttpSettingsSource, PolicyOrigin, SettingsSource,
    TimeRestrictionPolicy,
};
use serde_json::json;

const PATH: &str = "/settings/time-restrictions";

#[tokio::test]
async fn decodes_policy_and_sends_bearer_token() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(PATH)
                .header("authorization", "Bearer session-token");
            then.status(200).json_body(json!({
                "enabled": true,
                "blockStartHour": 7,
                "blockEndHour": 9,
                "blockWeekdaysOnly": false
            }));
        })
        .await;

    let src =
        HttpSettingsSource::with_options(server.base_url(), Some("session-token".into()), None)
            .unwrap();
    let policy = src.fetch_time_restrictions().await.unwrap();

    mock.assert_async().await;
    assert_eq!(
        policy,
        TimeRestrictionPolicy {
            enabled: true,
            block_start_hour: 7,
            block_end_hour: 9,
            block_weekdays_only: false,
        }
    );
}

#[tokio::test]
async fn non_success_status_is_status_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(PATH);
            then.status(401).body("unauthorized");
        })
        .await;

    let src = HttpSettingsSource::new(server.base_url());
    match src.fetch_time_restrictions().await {
        Err(FetchError::Status { code }) => assert_eq!(code, 401),
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(PATH);
            then.status(200).body("<html>maintenance</html>");
        })
        .await;

    let src = HttpSettingsSource::new(server.base_url());
    assert!(matches!(
        src.fetch_time_restrictions().await,
        Err(FetchError::Decode(_))
    ));
}

#[tokio::test]
async fn out_of_range_hour_is_invalid() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(PATH);
            then.status(200).json_body(json!({
                "enabled": true,
                "blockStartHour": 12,
                "blockEndHour": 25,
                "blockWeekdaysOnly": true
            }));
        })
        .await;

    let src = HttpSettingsSource::new(server.base_url());
    assert!(matches!(
        src.fetch_time_restrictions().await,
        Err(FetchError::Invalid(_))
    ));
}

#[tokio::test]
async fn gate_over_unreachable_api_falls_back() {
    // Port 9 (discard) on localhost: connection refused on any sane CI host.
    let src = HttpSettingsSource::new("http://127.0.0.1:9".to_string());
    let gate = EditingWindowGate::with_defaults(Arc::new(src));

    let resolved = gate.get_policy().await;
    assert_eq!(resolved.origin, PolicyOrigin::FallbackAfterFailure);
    assert_eq!(resolved.policy, TimeRestrictionPolicy::FALLBACK);
}
