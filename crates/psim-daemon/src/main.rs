//! psim-daemon entry point.
//!
//! Sets up tracing, loads config, builds the shared state, wires middleware,
//! and starts the HTTP server. Handlers live in `routes.rs`; shared state in
//! `state.rs`.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use psim_config::{LoadedConfig, UnusedKeyPolicy};
use psim_daemon::{routes, state};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

const ENV_ADDR: &str = "PSIM_DAEMON_ADDR";
/// Comma-separated YAML paths in merge order.
const ENV_CONFIG_PATHS: &str = "PSIM_CONFIG_PATHS";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let loaded = load_config_from_env()?;
    let cfg = loaded.sim_config()?;
    info!(config_hash = %loaded.config_hash, "config loaded");

    let shared = Arc::new(state::AppState::from_config(&cfg)?);

    state::spawn_heartbeat(shared.bus.clone(), Duration::from_secs(1));
    state::spawn_status_forwarder(Arc::clone(&shared));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let addr = bind_addr_from_env().unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8899)));
    info!("psim-daemon listening on http://{}", addr);

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

fn load_config_from_env() -> anyhow::Result<LoadedConfig> {
    let raw = std::env::var(ENV_CONFIG_PATHS).unwrap_or_default();
    let paths: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let loaded = if paths.is_empty() {
        LoadedConfig::empty()?
    } else {
        psim_config::load_layered_yaml(&paths)?
    };

    let report = psim_config::report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    if !report.is_clean() {
        warn!(unused = ?report.unused_leaf_pointers, "config has keys nothing reads");
    }
    Ok(loaded)
}

fn bind_addr_from_env() -> Option<SocketAddr> {
    std::env::var(ENV_ADDR).ok()?.parse().ok()
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
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}
