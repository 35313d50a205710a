//! psim-md
//!
//! Price data for the simulator.
//!
//! - `provider`: fallible [`PriceProvider`] boundary and its error type
//! - `yahoo`: HTTP chart provider
//! - `normalizer`: chart JSON -> [`ChartSeries`]
//! - `fallback` / `rng`: synthetic quotes and the injectable random source
//! - `quote`: [`QuoteService`], the total layer callers use

pub mod fallback;
pub mod normalizer;
pub mod provider;
pub mod quote;
pub mod rng;
pub mod yahoo;

pub use fallback::FallbackPolicy;
pub use normalizer::normalize_chart;
pub use provider::{ChartSeries, PriceProvider, ProviderError, SeriesRequest};
pub use quote::QuoteService;
pub use rng::{ConstantSource, RandomSource, SplitMix64};
pub use yahoo::{normalize_symbol, period_bounds, YahooChartProvider, YahooSettings};
