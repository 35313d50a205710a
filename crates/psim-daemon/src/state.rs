//! Shared runtime state for psim-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. Run status is owned by
//! the [`Simulator`]; this module only projects it into status snapshots and
//! bus messages.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use psim_config::SimConfig;
use psim_engine::{RunState, RunStatus, Simulator, SymbolCatalog};
use psim_md::{QuoteService, RandomSource, SplitMix64, YahooChartProvider};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::info;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// BusMsg: SSE event bus payload
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    Heartbeat { ts_millis: i64 },
    Status(StatusSnapshot),
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
// StatusSnapshot
// ---------------------------------------------------------------------------

/// Returned by GET /v1/status and carried inside SSE `status` events.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub daemon_uptime_secs: u64,
    /// "idle" | "running"
    pub state: String,
    /// Run in progress, if any.
    pub active_run_id: Option<Uuid>,
    /// Most recently finished run, if any. Kept while a newer run is active.
    pub last_run_id: Option<Uuid>,
    pub last_position_count: usize,
    pub last_fallback_count: usize,
}

impl StatusSnapshot {
    pub fn from_run_state(rs: &RunState) -> Self {
        let running = rs.status == RunStatus::Running;
        Self {
            daemon_uptime_secs: uptime_secs(),
            state: if running { "running" } else { "idle" }.to_string(),
            active_run_id: rs.active_run_id,
            last_run_id: rs.last_run_id,
            last_position_count: rs.positions.len(),
            last_fallback_count: rs.positions.iter().filter(|p| p.is_fallback).count(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    /// Broadcast bus for SSE.
    pub bus: broadcast::Sender<BusMsg>,
    pub build: BuildInfo,
    pub simulator: Arc<Simulator>,
}

impl AppState {
    pub fn new(simulator: Simulator) -> Self {
        let (bus, _rx) = broadcast::channel::<BusMsg>(1024);
        Self {
            bus,
            build: BuildInfo {
                service: "psim-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            simulator: Arc::new(simulator),
        }
    }

    /// Wire provider, random source, catalog and simulator from config.
    pub fn from_config(cfg: &SimConfig) -> Result<Self> {
        let catalog = match cfg.catalog.path.as_deref() {
            Some(path) => SymbolCatalog::load(path)?,
            None => SymbolCatalog::empty(),
        };
        info!(entries = catalog.len(), "symbol catalog loaded");

        let provider = YahooChartProvider::new(cfg.yahoo_settings())?;
        let rng: Arc<dyn RandomSource> = match cfg.engine.seed {
            Some(seed) => Arc::new(SplitMix64::seeded(seed)),
            None => Arc::new(SplitMix64::from_entropy()),
        };
        let quotes = QuoteService::with_policy(Arc::new(provider), rng, cfg.fallback);
        let simulator =
            Simulator::new(quotes, Arc::new(catalog)).with_concurrency(cfg.engine.concurrency);
        Ok(Self::new(simulator))
    }

    pub fn status_snapshot(&self) -> StatusSnapshot {
        StatusSnapshot::from_run_state(&self.simulator.state())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Seconds since first call (process lifetime).
pub fn uptime_secs() -> u64 {
    static START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    START
        .get_or_init(std::time::Instant::now)
        .elapsed()
        .as_secs()
}

/// Emit a heartbeat on the bus every `interval`.
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

/// Forward every simulator status transition to the bus.
pub fn spawn_status_forwarder(state: Arc<AppState>) {
    let mut rx = state.simulator.subscribe();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let snap = StatusSnapshot::from_run_state(&rx.borrow_and_update());
            let _ = state.bus.send(BusMsg::Status(snap));
        }
    });
}
