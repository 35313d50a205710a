//! Axum router and HTTP handlers for psim-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers so tests can drive the bare router.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use psim_engine::SimulationRequest;
use psim_portfolio::aggregate;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

use crate::{
    api_types::{
        AggregateRequest, CatalogHit, CatalogSearchQuery, CatalogSearchResponse, ErrorResponse,
        HealthResponse, SimulateResponse,
    },
    state::{AppState, BusMsg},
};

const DEFAULT_SEARCH_LIMIT: usize = 10;
const MAX_SEARCH_LIMIT: usize = 50;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/status", get(status_handler))
        .route("/v1/stream", get(stream))
        .route("/v1/simulate", post(simulate))
        .route("/v1/aggregate", post(aggregate_handler))
        .route("/v1/catalog/search", get(catalog_search))
        .with_state(state)
}

fn error(status: StatusCode, code: &str, msg: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: msg.into(),
            code: code.to_string(),
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/status
// ---------------------------------------------------------------------------

pub(crate) async fn status_handler(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, Json(st.status_snapshot()))
}

// ---------------------------------------------------------------------------
// POST /v1/simulate
// ---------------------------------------------------------------------------

/// Validate, run, and return ordered positions plus totals.
///
/// 400 on an invalid request, 409 while another run is in progress. The run
/// itself is spawned so a dropped client does not cut fetches short.
pub(crate) async fn simulate(
    State(st): State<Arc<AppState>>,
    Json(req): Json<SimulationRequest>,
) -> Response {
    if let Err(e) = req.validate() {
        return error(StatusCode::BAD_REQUEST, "invalid_request", e.to_string());
    }
    if st.simulator.is_running() {
        return error(
            StatusCode::CONFLICT,
            "run_in_progress",
            "a simulation is already running",
        );
    }

    let sim = Arc::clone(&st.simulator);
    let joined = tokio::spawn(async move { sim.try_run(&req).await }).await;

    match joined {
        Ok(Ok(positions)) => {
            let summary = aggregate(&positions);
            info!(
                positions = positions.len(),
                fallbacks = summary.fallback_count,
                "simulate served"
            );
            (StatusCode::OK, Json(SimulateResponse { positions, summary })).into_response()
        }
        Ok(Err(busy)) => error(StatusCode::CONFLICT, "run_in_progress", busy.to_string()),
        Err(e) => {
            warn!(error = %e, "simulation task failed");
            error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "simulation task failed",
            )
        }
    }
}

// ---------------------------------------------------------------------------
// POST /v1/aggregate
// ---------------------------------------------------------------------------

/// Recompute totals from positions the caller already holds. No fetches.
pub(crate) async fn aggregate_handler(Json(body): Json<AggregateRequest>) -> impl IntoResponse {
    (StatusCode::OK, Json(aggregate(&body.positions)))
}

// ---------------------------------------------------------------------------
// GET /v1/catalog/search
// ---------------------------------------------------------------------------

pub(crate) async fn catalog_search(
    State(st): State<Arc<AppState>>,
    Query(q): Query<CatalogSearchQuery>,
) -> impl IntoResponse {
    let limit = q
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .min(MAX_SEARCH_LIMIT);
    let catalog = st.simulator.catalog();
    let hits = catalog
        .search(&q.q, limit)
        .into_iter()
        .map(|e| CatalogHit {
            symbol: e.symbol.clone(),
            display_name: catalog.display_name(&e.symbol),
        })
        .collect();
    (StatusCode::OK, Json(CatalogSearchResponse { hits }))
}

// ---------------------------------------------------------------------------
// GET /v1/stream (SSE)
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
                    BusMsg::Status(_) => "status",
                };
                let data = serde_json::to_string(&m).ok()?;
                Some(Ok(Event::default().event(event_name).data(data)))
            }
            Err(_) => None, // lagged / closed
        }
    })
}
