//! Simulation orchestrator.
//!
//! `Simulator::run` fetches one quote per symbol (up to `concurrency` in
//! flight), feeds each into the position calculator, and returns results in
//! the caller's symbol order. Run status is published on a watch channel.
//!
//! Each symbol draws from its own stream, forked by its index in the request,
//! so a seeded run gives the same quotes whatever order the fetches finish in.

use std::fmt;
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use psim_md::QuoteService;
use psim_portfolio::compute_position;
use psim_schemas::PositionResult;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tracing::info;
use uuid::Uuid;

use crate::catalog::SymbolCatalog;
use crate::request::SimulationRequest;

pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Idle,
    Running,
}

/// Snapshot published on every transition.
///
/// `positions` always holds the ordered results of `last_run_id`, the most
/// recently finished run; they stay in place while the next run is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub status: RunStatus,
    /// Set only while `Running`.
    pub active_run_id: Option<Uuid>,
    pub last_run_id: Option<Uuid>,
    pub positions: Vec<PositionResult>,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            status: RunStatus::Idle,
            active_run_id: None,
            last_run_id: None,
            positions: Vec::new(),
        }
    }
}

/// Returned by [`Simulator::try_run`] when another run holds the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadyRunning;

impl fmt::Display for AlreadyRunning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a simulation is already running")
    }
}

impl std::error::Error for AlreadyRunning {}

pub struct Simulator {
    quotes: QuoteService,
    catalog: Arc<SymbolCatalog>,
    concurrency: usize,
    state_tx: watch::Sender<RunState>,
    run_lock: Mutex<()>,
}

impl Simulator {
    pub fn new(quotes: QuoteService, catalog: Arc<SymbolCatalog>) -> Self {
        let (state_tx, _) = watch::channel(RunState::default());
        Self {
            quotes,
            catalog,
            concurrency: DEFAULT_CONCURRENCY,
            state_tx,
            run_lock: Mutex::new(()),
        }
    }

    /// In-flight fetch limit; `0` is treated as `1`.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn catalog(&self) -> &SymbolCatalog {
        &self.catalog
    }

    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> RunState {
        self.state_tx.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.state_tx.borrow().status == RunStatus::Running
    }

    /// Run `req`, waiting for any run already in progress to finish first.
    pub async fn run(&self, req: &SimulationRequest) -> Vec<PositionResult> {
        let _guard = self.run_lock.lock().await;
        self.run_locked(req).await
    }

    /// Run `req` unless another run is in progress.
    pub async fn try_run(
        &self,
        req: &SimulationRequest,
    ) -> Result<Vec<PositionResult>, AlreadyRunning> {
        let _guard = self.run_lock.try_lock().map_err(|_| AlreadyRunning)?;
        Ok(self.run_locked(req).await)
    }

    async fn run_locked(&self, req: &SimulationRequest) -> Vec<PositionResult> {
        let run_id = Uuid::new_v4();

        self.state_tx.send_modify(|state| {
            state.status = RunStatus::Running;
            state.active_run_id = Some(run_id);
        });
        let reset = IdleOnDrop {
            tx: &self.state_tx,
            run_id,
        };

        info!(
            %run_id,
            symbols = req.symbols.len(),
            start = %req.start_date,
            end = %req.end_date,
            provider = self.quotes.provider_name(),
            "simulation started"
        );

        let positions: Vec<PositionResult> = stream::iter(
            req.symbols
                .iter()
                .enumerate()
                .map(|(index, symbol)| self.simulate_symbol(index, symbol, req))
                .collect::<Vec<_>>(),
        )
        .buffered(self.concurrency)
            .collect()
            .await;

        let fallbacks = positions.iter().filter(|p| p.is_fallback).count();
        info!(
            %run_id,
            positions = positions.len(),
            fallbacks,
            "simulation finished"
        );

        self.state_tx.send_replace(RunState {
            status: RunStatus::Idle,
            active_run_id: None,
            last_run_id: Some(run_id),
            positions: positions.clone(),
        });
        drop(reset);

        positions
    }

    async fn simulate_symbol(
        &self,
        index: usize,
        symbol: &str,
        req: &SimulationRequest,
    ) -> PositionResult {
        let display_name = self.catalog.display_name(symbol);
        let invested = req.allocation_for(symbol);
        let rng = self.quotes.fork_rng(index as u64);
        let quote = self
            .quotes
            .fetch_quote_with(symbol, req.start_date, req.end_date, rng.as_ref())
            .await;
        compute_position(symbol, &display_name, invested, &quote)
    }
}

/// Puts the state back to `Idle` if a run future is dropped mid-flight.
struct IdleOnDrop<'a> {
    tx: &'a watch::Sender<RunState>,
    run_id: Uuid,
}

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        let run_id = self.run_id;
        self.tx.send_if_modified(|state| {
            if state.status == RunStatus::Running && state.active_run_id == Some(run_id) {
                state.status = RunStatus::Idle;
                state.active_run_id = None;
                true
            } else {
                false
            }
        });
    }
}

impl fmt::Debug for Simulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulator")
            .field("quotes", &self.quotes)
            .field("catalog_len", &self.catalog.len())
            .field("concurrency", &self.concurrency)
            .finish()
    }
}
