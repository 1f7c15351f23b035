//! hz-daemon entry point.
//!
//! Sets up tracing, loads config, builds the shared state, wires middleware,
//! and starts the HTTP server. Route handlers live in `routes.rs`; shared
//! state types live in `state.rs`.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use hz_config::{load_hort_config, secrets::resolve_secrets, HortConfig};
use hz_daemon::{routes, state};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

const DEFAULT_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 8898);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Dev convenience; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let (config_hash, cfg) = load_config()?;
    let secrets = resolve_secrets(&cfg)?;

    let mut st = state::AppState::from_config(&cfg, &secrets)?;
    if let Some(hash) = config_hash {
        st = st.with_config_hash(hash);
    }
    let shared = Arc::new(st);

    // Warm the cache so the first synchronous check sees a fetched policy.
    let warm = shared.gate.get_policy().await;
    info!(origin = ?warm.origin, policy = ?warm.policy, "editing gate warmed");

    state::spawn_heartbeat(shared.bus.clone(), Duration::from_secs(1));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let addr = bind_addr(&cfg)?;
    info!("hz-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// `HZ_CONFIG_PATHS` is a comma-separated list of YAML layers, merged in
/// order. Without it the daemon runs on built-in defaults.
fn load_config() -> anyhow::Result<(Option<String>, HortConfig)> {
    let Ok(raw) = std::env::var("HZ_CONFIG_PATHS") else {
        info!("HZ_CONFIG_PATHS not set; using built-in defaults");
        return Ok((None, HortConfig::default()));
    };

    let paths: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let (loaded, cfg) = load_hort_config(&paths)?;
    info!(config_hash = %loaded.config_hash, layers = paths.len(), "config loaded");
    Ok((Some(loaded.config_hash), cfg))
}

/// `HZ_DAEMON_ADDR` wins over `daemon.bind_addr`.
fn bind_addr(cfg: &HortConfig) -> anyhow::Result<SocketAddr> {
    if let Ok(raw) = std::env::var("HZ_DAEMON_ADDR") {
        return raw
            .parse()
            .with_context(|| format!("HZ_DAEMON_ADDR is not a socket address: {raw}"));
    }
    match &cfg.daemon.bind_addr {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("daemon.bind_addr is not a socket address: {raw}")),
        None => Ok(SocketAddr::from(DEFAULT_ADDR)),
    }
}

/// CORS: allow only localhost origins.
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers(tower_http::cors::Any)
}
