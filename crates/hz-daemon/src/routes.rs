//! Axum router and all HTTP handlers for hz-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Handlers are `pub(crate)`; the scenario tests in
//! `tests/` compose the router directly.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use futures_util::{Stream, StreamExt};
use hz_gate::TimeRestrictionPolicy;
use hz_week::{is_current_or_future_week_at, week_of, WeekId};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

use crate::{
    api_types::{
        CachedEditingResponse, EditingResponse, ErrorResponse, HealthResponse,
        InvalidateResponse, WeekQuery, WeekResponse,
    },
    state::{AppState, BusMsg},
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/week", get(week))
        .route("/v1/weeks/:year/:week", get(week_by_id))
        .route("/v1/editing", get(editing))
        .route("/v1/editing/cached", get(editing_cached))
        .route("/v1/editing/invalidate", post(editing_invalidate))
        .route(
            "/v1/settings/time-restrictions",
            get(settings_get).put(settings_put),
        )
        .route("/v1/stream", get(stream))
        .with_state(state)
}

fn error(status: StatusCode, msg: String) -> Response {
    (status, Json(ErrorResponse { error: msg })).into_response()
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
            config_hash: st.config_hash.clone(),
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/week   GET /v1/weeks/:year/:week
// ---------------------------------------------------------------------------

fn week_response(id: WeekId, today: WeekId) -> WeekResponse {
    WeekResponse {
        week_number: id.week_number,
        year: id.year,
        label: id.label(),
        monday: id.monday(),
        friday: id.friday(),
        current_or_future: is_current_or_future_week_at(id.week_number, id.year, today),
    }
}

pub(crate) async fn week(
    State(st): State<Arc<AppState>>,
    Query(q): Query<WeekQuery>,
) -> Response {
    let today = st.gate.current_week();
    let id = match q.date.as_deref() {
        None => today,
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => week_of(date),
            Err(_) => {
                return error(
                    StatusCode::BAD_REQUEST,
                    format!("invalid date '{raw}': expected YYYY-MM-DD"),
                )
            }
        },
    };
    (StatusCode::OK, Json(week_response(id, today))).into_response()
}

pub(crate) async fn week_by_id(
    State(st): State<Arc<AppState>>,
    Path((year, week_number)): Path<(i32, u32)>,
) -> Response {
    let Some(id) = WeekId::new(week_number, year) else {
        return error(
            StatusCode::BAD_REQUEST,
            format!("week {week_number} does not exist in {year}"),
        );
    };
    let today = st.gate.current_week();
    (StatusCode::OK, Json(week_response(id, today))).into_response()
}

// ---------------------------------------------------------------------------
// GET /v1/editing
// ---------------------------------------------------------------------------

/// Async check: refreshes the policy when the cache is stale.
pub(crate) async fn editing(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let check = st.gate.check().await;
    (
        StatusCode::OK,
        Json(EditingResponse {
            allowed: check.allowed,
            message: check.status.to_string(),
            status: check.status,
            origin: check.resolved.origin,
            policy: check.resolved.policy,
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/editing/cached
// ---------------------------------------------------------------------------

/// Cache-only check; never contacts the settings source.
pub(crate) async fn editing_cached(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let snap = st.gate.snapshot_cached();
    let check = snap.check;
    (
        StatusCode::OK,
        Json(CachedEditingResponse {
            cache_state: snap.cache_state,
            allowed: snap.fetched_allowed,
            allowed_or_fallback: check.allowed,
            message: check.status.to_string(),
            origin: check.resolved.origin,
            policy: check.resolved.policy,
        }),
    )
}

// ---------------------------------------------------------------------------
// POST /v1/editing/invalidate
// ---------------------------------------------------------------------------

pub(crate) async fn editing_invalidate(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    st.gate.invalidate_cache();

    info!("editing/invalidate");
    let _ = st.bus.send(BusMsg::LogLine {
        level: "INFO".to_string(),
        msg: "time restriction cache invalidated".to_string(),
    });

    (
        StatusCode::OK,
        Json(InvalidateResponse {
            cache_state: st.gate.cache_state(),
        }),
    )
}

// ---------------------------------------------------------------------------
// GET/PUT /v1/settings/time-restrictions
// ---------------------------------------------------------------------------

const REMOTE_SETTINGS: &str = "time restrictions are managed by the remote settings api";

pub(crate) async fn settings_get(State(st): State<Arc<AppState>>) -> Response {
    let Some(store) = &st.store else {
        return error(StatusCode::CONFLICT, REMOTE_SETTINGS.to_string());
    };
    (StatusCode::OK, Json(store.time_restrictions().await)).into_response()
}

/// Replace the policy, then invalidate the gate so the next check sees it
/// immediately instead of after the TTL.
pub(crate) async fn settings_put(
    State(st): State<Arc<AppState>>,
    Json(policy): Json<TimeRestrictionPolicy>,
) -> Response {
    let Some(store) = &st.store else {
        return error(StatusCode::CONFLICT, REMOTE_SETTINGS.to_string());
    };

    if let Err(e) = store.set_time_restrictions(policy).await {
        warn!(error = %e, "settings/time-restrictions rejected");
        return error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string());
    }

    st.gate.invalidate_cache();

    info!(?policy, "settings/time-restrictions updated");
    let _ = st.bus.send(BusMsg::PolicyChanged { policy });

    (StatusCode::OK, Json(policy)).into_response()
}

// ---------------------------------------------------------------------------
// GET /v1/stream  (SSE)
// ---------------------------------------------------------------------------

pub(crate) async fn stream(State(st): State<Arc<AppState>>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));

    let rx = st.bus.subscribe();
    let events = broadcast_to_sse(rx);

    (headers, Sse::new(events).keep_alive(KeepAlive::new())).into_response()
}

fn broadcast_to_sse(
    rx: broadcast::Receiver<BusMsg>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(|msg| async move {
        match msg {
            Ok(m) => {
                let event_name = match &m {
                    BusMsg::Heartbeat { .. } => "heartbeat",
                    BusMsg::PolicyChanged { .. } => "policy_changed",
                    BusMsg::LogLine { .. } => "log",
                };
                let data = serde_json::to_string(&m).ok()?;
                Some(Ok(Event::default().event(event_name).data(data)))
            }
            Err(_) => None, // lagged / closed
        }
    })
}
