//! Shared runtime state for hz-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The gate and the
//! settings store are `Arc`s so background tasks can hold them too.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use hz_config::{secrets::ResolvedSecrets, HortConfig, SourceKind};
use hz_gate::{
    EditingWindowGate, HttpSettingsSource, SettingsSource, SystemClock, TimeRestrictionPolicy,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::info;

use crate::store::{SettingsStore, StoreSettingsSource};

// ---------------------------------------------------------------------------
// BusMsg — SSE event bus payload
// ---------------------------------------------------------------------------

/// Messages broadcast over the internal event bus and surfaced as SSE events.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    Heartbeat { ts_millis: i64 },
    /// Admin replaced the time restrictions; clients should re-check.
    PolicyChanged { policy: TimeRestrictionPolicy },
    LogLine { level: String, msg: String },
}

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    /// Broadcast bus for SSE.
    pub bus: broadcast::Sender<BusMsg>,
    pub build: BuildInfo,
    pub gate: Arc<EditingWindowGate>,
    /// Admin store. `None` when settings live in a remote API, in which case
    /// the daemon does not accept policy updates.
    pub store: Option<Arc<SettingsStore>>,
    /// Hash of the configuration the daemon booted with.
    pub config_hash: Option<String>,
}

impl AppState {
    pub fn new(gate: Arc<EditingWindowGate>, store: Option<Arc<SettingsStore>>) -> Self {
        let (bus, _rx) = broadcast::channel::<BusMsg>(1024);
        Self {
            bus,
            build: BuildInfo {
                service: "hz-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            gate,
            store,
            config_hash: None,
        }
    }

    /// Wire the gate to the source named in config.
    pub fn from_config(cfg: &HortConfig, secrets: &ResolvedSecrets) -> Result<Self> {
        let (gate, store) = build_gate(cfg, secrets)?;
        Ok(Self::new(gate, store))
    }

    pub fn with_config_hash(mut self, hash: String) -> Self {
        self.config_hash = Some(hash);
        self
    }
}

// ---------------------------------------------------------------------------
// Gate wiring
// ---------------------------------------------------------------------------

/// Build the editing gate over the settings source named in config.
///
/// `settings.source: memory` yields an in-process [`SettingsStore`] seeded
/// from config; `http` reads a remote settings API and returns no store.
pub fn build_gate(
    cfg: &HortConfig,
    secrets: &ResolvedSecrets,
) -> Result<(Arc<EditingWindowGate>, Option<Arc<SettingsStore>>)> {
    let options = cfg.gate_options()?;

    let (source, store): (Arc<dyn SettingsSource>, Option<Arc<SettingsStore>>) =
        match cfg.settings.source {
            SourceKind::Memory => {
                let store = Arc::new(SettingsStore::new(cfg.initial_store_policy()));
                let src = StoreSettingsSource::new(Arc::clone(&store));
                (Arc::new(src) as Arc<dyn SettingsSource>, Some(store))
            }
            SourceKind::Http => {
                let base_url = cfg
                    .settings
                    .base_url
                    .clone()
                    .context("settings.base_url missing")?;
                let src = HttpSettingsSource::with_options(
                    base_url,
                    secrets.settings_token.clone(),
                    cfg.settings.timeout(),
                )
                .context("failed to build settings http client")?;
                (Arc::new(src) as Arc<dyn SettingsSource>, None)
            }
        };

    info!(
        source = source.source_name(),
        timezone = %options.timezone,
        ttl_secs = options.ttl.num_seconds(),
        "editing gate configured"
    );

    let gate = EditingWindowGate::new(source, Arc::new(SystemClock), options);
    Ok((Arc::new(gate), store))
}

// ---------------------------------------------------------------------------
// Background tasks
// ---------------------------------------------------------------------------

/// Spawn a background task that emits a heartbeat SSE every `interval`.
pub fn spawn_heartbeat(bus: broadcast::Sender<BusMsg>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let ts = chrono::Utc::now().timestamp_millis();
            let _ = bus.send(BusMsg::Heartbeat { ts_millis: ts });
        }
    });
}
