use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::NaiveDate;
use psim_schemas::Micros;
use serde::{Deserialize, Serialize};

/// One simulation request, as assembled by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationRequest {
    /// Ticker symbols, in the order results should come back.
    pub symbols: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Cash per symbol. Missing entries count as zero.
    #[serde(default)]
    pub allocations: BTreeMap<String, Micros>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    EmptySymbolSet,
    BlankSymbol,
    DuplicateSymbol(String),
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    NegativeAllocation(String),
    ZeroTotalAllocation,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::EmptySymbolSet => write!(f, "at least one symbol is required"),
            RequestError::BlankSymbol => write!(f, "symbols must not be blank"),
            RequestError::DuplicateSymbol(s) => write!(f, "symbol listed more than once: {s}"),
            RequestError::InvalidDateRange { start, end } => {
                write!(f, "start date {start} must be before end date {end}")
            }
            RequestError::NegativeAllocation(s) => {
                write!(f, "allocation for {s} must not be negative")
            }
            RequestError::ZeroTotalAllocation => {
                write!(f, "total allocation across selected symbols must be positive")
            }
        }
    }
}

impl std::error::Error for RequestError {}

impl SimulationRequest {
    pub fn new(symbols: Vec<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            symbols,
            start_date,
            end_date,
            allocations: BTreeMap::new(),
        }
    }

    pub fn with_allocation(mut self, symbol: impl Into<String>, amount: Micros) -> Self {
        self.allocations.insert(symbol.into(), amount);
        self
    }

    /// Allocation for `symbol`; zero when absent.
    pub fn allocation_for(&self, symbol: &str) -> Micros {
        self.allocations
            .get(symbol)
            .copied()
            .unwrap_or(Micros::ZERO)
    }

    /// Sum of allocations over the selected symbols only.
    pub fn total_allocation(&self) -> Micros {
        self.symbols
            .iter()
            .map(|s| self.allocation_for(s))
            .fold(Micros::ZERO, Micros::saturating_add)
    }

    /// Caller-side checks run before handing the request to the simulator.
    ///
    /// The simulator itself never calls this; an unvalidated request still
    /// runs, it just may not mean anything.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.symbols.is_empty() {
            return Err(RequestError::EmptySymbolSet);
        }

        let mut seen = HashSet::with_capacity(self.symbols.len());
        for s in &self.symbols {
            if s.trim().is_empty() {
                return Err(RequestError::BlankSymbol);
            }
            // tickers are case-insensitive
            if !seen.insert(s.trim().to_ascii_uppercase()) {
                return Err(RequestError::DuplicateSymbol(s.clone()));
            }
        }

        if self.start_date >= self.end_date {
            return Err(RequestError::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }

        if let Some(s) = self
            .symbols
            .iter()
            .find(|s| self.allocation_for(s).is_negative())
        {
            return Err(RequestError::NegativeAllocation(s.clone()));
        }

        if !self.total_allocation().is_positive() {
            return Err(RequestError::ZeroTotalAllocation);
        }

        Ok(())
    }
}
