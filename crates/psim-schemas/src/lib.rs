//! psim-schemas
//!
//! Shared data model for the portfolio simulator. Plain data only: the
//! arithmetic that produces these values lives in `psim-portfolio`, the
//! retrieval that produces quotes lives in `psim-md`.
//!
//! Monetary fields are [`Micros`] and carry a `_micros` suffix so JSON
//! consumers never mistake them for floats.

pub mod fixedpoint;

pub use fixedpoint::{DecimalError, Micros, MICROS_SCALE};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Round a percentage to 2 decimal places (half away from zero).
///
/// Non-finite input maps to `0.0`; a percentage is never NaN or infinite.
pub fn round_percent(p: f64) -> f64 {
    if !p.is_finite() {
        return 0.0;
    }
    (p * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Quotes
// ---------------------------------------------------------------------------

/// One dated closing price from the daily history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Upstream timestamp, UTC epoch seconds.
    pub ts: i64,
    /// Calendar date of `ts` in UTC.
    pub date: NaiveDate,
    pub close_micros: Micros,
}

/// Price data for one symbol over one simulation period.
///
/// Created fresh per run, consumed once by the position calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub open_price_micros: Micros,
    pub close_price_micros: Micros,
    /// Estimated, not taken from any dividend record.
    pub dividend_per_share_micros: Micros,
    /// Chronological, null points already removed. Empty when synthetic.
    pub series: Vec<SeriesPoint>,
    /// `true` when retrieval failed and the prices were synthesized.
    pub is_fallback: bool,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Per-symbol outcome of a simulation. Write-once.
///
/// Invariants (within one cent of rounding):
/// - `close_value - open_value == appreciation_profit`
/// - `appreciation_profit + dividend_value == total_profit`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionResult {
    pub symbol: String,
    pub display_name: String,
    pub invested_micros: Micros,
    /// Opening price after the degenerate-price guard.
    pub open_price_micros: Micros,
    /// Closing price after the degenerate-price guard.
    pub close_price_micros: Micros,
    pub shares_held: u64,
    pub open_value_micros: Micros,
    pub close_value_micros: Micros,
    pub dividend_value_micros: Micros,
    pub appreciation_profit_micros: Micros,
    pub total_profit_micros: Micros,
    pub profit_percent: f64,
    pub is_fallback: bool,
    #[serde(default)]
    pub series: Vec<SeriesPoint>,
}

/// Portfolio totals. `total_profit_percent` is derived from the summed
/// values, never from averaging per-position percentages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub position_count: usize,
    pub fallback_count: usize,
    pub total_invested_micros: Micros,
    pub total_open_value_micros: Micros,
    pub total_close_value_micros: Micros,
    pub total_dividend_value_micros: Micros,
    pub total_appreciation_profit_micros: Micros,
    pub total_profit_micros: Micros,
    pub total_profit_percent: f64,
}

impl PortfolioSummary {
    /// Final position value including dividends.
    pub fn close_plus_dividends(&self) -> Micros {
        self.total_close_value_micros
            .saturating_add(self.total_dividend_value_micros)
    }

    pub fn is_profit(&self) -> bool {
        !self.total_profit_micros.is_negative()
    }
}
