//! psim-engine
//!
//! Symbol catalog, simulation requests, and the orchestrator that turns a
//! request into ordered position results.

pub mod catalog;
pub mod orchestrator;
pub mod request;

pub use catalog::{CatalogEntry, CatalogError, SymbolCatalog};
pub use orchestrator::{AlreadyRunning, RunState, RunStatus, Simulator, DEFAULT_CONCURRENCY};
pub use request::{RequestError, SimulationRequest};
