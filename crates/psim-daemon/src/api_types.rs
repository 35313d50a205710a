//! Request and response types for psim-daemon HTTP endpoints.
//!
//! No business logic lives here.

use psim_schemas::{PortfolioSummary, PositionResult};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// Errors (400 / 409 / 500)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// "invalid_request" | "run_in_progress" | "internal"
    pub code: String,
}

// ---------------------------------------------------------------------------
// /v1/simulate  /v1/aggregate
// ---------------------------------------------------------------------------

/// Body of POST /v1/simulate is `psim_engine::SimulationRequest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulateResponse {
    pub positions: Vec<PositionResult>,
    pub summary: PortfolioSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateRequest {
    pub positions: Vec<PositionResult>,
}

// ---------------------------------------------------------------------------
// /v1/catalog/search
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogHit {
    pub symbol: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSearchResponse {
    pub hits: Vec<CatalogHit>,
}
