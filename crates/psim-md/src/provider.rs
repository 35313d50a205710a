//! Provider boundary for daily price history.
//!
//! This module defines the request/response types and the fallible
//! [`PriceProvider`] trait. It does not decide what happens on failure; the
//! total, never-failing layer is `QuoteService` in `quote.rs`.

use std::fmt;

use chrono::NaiveDate;
use psim_schemas::{Micros, SeriesPoint};

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// Daily history request for a single symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRequest {
    /// Symbol as the caller knows it (e.g. `"PETR4"`); providers qualify it.
    pub symbol: String,
    /// Inclusive first calendar day.
    pub start: NaiveDate,
    /// Inclusive last calendar day.
    pub end: NaiveDate,
}

/// Validated daily closes for one symbol.
///
/// `points` is chronological and only holds points with a usable price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSeries {
    /// Symbol as sent upstream (exchange-qualified).
    pub symbol: String,
    pub points: Vec<SeriesPoint>,
}

impl ChartSeries {
    /// Price at the first valid point.
    pub fn first_close(&self) -> Option<Micros> {
        self.points.first().map(|p| p.close_micros)
    }

    /// Price at the last valid point.
    pub fn last_close(&self) -> Option<Micros> {
        self.points.last().map(|p| p.close_micros)
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors a [`PriceProvider`] may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Network or transport failure (connect, timeout, body read).
    Transport(String),
    /// Non-2xx HTTP response.
    Http { status: u16, message: String },
    /// The upstream API reported an application-level error.
    Api {
        code: Option<String>,
        message: String,
    },
    /// The payload is not valid JSON of the expected types.
    Decode(String),
    /// The payload decoded but does not have the expected shape.
    Shape(String),
    /// The series holds no usable price in the requested range.
    NoValidPrices,
    /// Provider misconfiguration (bad base URL, client build failure).
    Config(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Transport(msg) => write!(f, "transport error: {msg}"),
            ProviderError::Http { status, message } => {
                write!(f, "http error status={status}: {message}")
            }
            ProviderError::Api {
                code: Some(c),
                message,
            } => write!(f, "provider api error code={c}: {message}"),
            ProviderError::Api {
                code: None,
                message,
            } => write!(f, "provider api error: {message}"),
            ProviderError::Decode(msg) => write!(f, "decode error: {msg}"),
            ProviderError::Shape(msg) => write!(f, "unexpected payload shape: {msg}"),
            ProviderError::NoValidPrices => write!(f, "no valid prices in requested range"),
            ProviderError::Config(msg) => write!(f, "config error: {msg}"),
        }
    }
}

impl std::error::Error for ProviderError {}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Upstream daily-price source.
///
/// Object-safe so callers can hold an `Arc<dyn PriceProvider>`; `Send + Sync`
/// so fetches for different symbols can run concurrently.
#[async_trait::async_trait]
pub trait PriceProvider: Send + Sync {
    /// Short identifier used in logs (e.g. `"yahoo"`).
    fn name(&self) -> &'static str;

    /// Fetch the daily closing prices for `req.symbol` over `[start, end]`.
    async fn fetch_daily_closes(&self, req: &SeriesRequest) -> Result<ChartSeries, ProviderError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
