//! Total quote retrieval.
//!
//! [`QuoteService::fetch_quote`] never fails: any provider error becomes a
//! synthetic quote drawn from the [`FallbackPolicy`], flagged `is_fallback`.

use std::sync::Arc;

use chrono::NaiveDate;
use psim_schemas::PriceQuote;
use tracing::{debug, warn};

use crate::fallback::FallbackPolicy;
use crate::provider::{ChartSeries, PriceProvider, ProviderError, SeriesRequest};
use crate::rng::RandomSource;

#[derive(Clone)]
pub struct QuoteService {
    provider: Arc<dyn PriceProvider>,
    rng: Arc<dyn RandomSource>,
    policy: FallbackPolicy,
}

impl std::fmt::Debug for QuoteService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteService")
            .field("provider", &self.provider.name())
            .field("policy", &self.policy)
            .finish()
    }
}

impl QuoteService {
    pub fn new(provider: Arc<dyn PriceProvider>, rng: Arc<dyn RandomSource>) -> Self {
        Self::with_policy(provider, rng, FallbackPolicy::default())
    }

    pub fn with_policy(
        provider: Arc<dyn PriceProvider>,
        rng: Arc<dyn RandomSource>,
        policy: FallbackPolicy,
    ) -> Self {
        Self {
            provider,
            rng,
            policy,
        }
    }

    pub fn policy(&self) -> &FallbackPolicy {
        &self.policy
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Draw stream `stream` of this service's random source.
    pub fn fork_rng(&self, stream: u64) -> Box<dyn RandomSource> {
        self.rng.fork(stream)
    }

    /// Quote for `symbol` over `[start, end]`. Never fails.
    pub async fn fetch_quote(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> PriceQuote {
        self.fetch_quote_with(symbol, start, end, self.rng.as_ref())
            .await
    }

    /// As [`fetch_quote`](Self::fetch_quote), drawing from `rng` instead of
    /// the shared source.
    pub async fn fetch_quote_with(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        rng: &dyn RandomSource,
    ) -> PriceQuote {
        let req = SeriesRequest {
            symbol: symbol.to_string(),
            start,
            end,
        };

        match self.provider.fetch_daily_closes(&req).await {
            Ok(series) => match self.quote_from_series(series, rng) {
                Ok(q) => q,
                Err(err) => self.fallback(symbol, &err, rng),
            },
            Err(err) => self.fallback(symbol, &err, rng),
        }
    }

    fn quote_from_series(
        &self,
        series: ChartSeries,
        rng: &dyn RandomSource,
    ) -> Result<PriceQuote, ProviderError> {
        let (open, close) = match (series.first_close(), series.last_close()) {
            (Some(o), Some(c)) => (o, c),
            _ => return Err(ProviderError::NoValidPrices),
        };
        debug!(
            symbol = %series.symbol,
            points = series.points.len(),
            open = %open,
            close = %close,
            "quote from history"
        );
        let dividend = self.policy.estimate_dividend(open, rng);
        Ok(PriceQuote {
            open_price_micros: open,
            close_price_micros: close,
            dividend_per_share_micros: dividend,
            series: series.points,
            is_fallback: false,
        })
    }

    fn fallback(&self, symbol: &str, err: &ProviderError, rng: &dyn RandomSource) -> PriceQuote {
        warn!(
            symbol,
            provider = self.provider.name(),
            error = %err,
            "price retrieval failed, using synthetic quote"
        );
        self.policy.synthesize(rng)
    }
}
