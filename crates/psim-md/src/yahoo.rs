//! Yahoo-style chart endpoint provider.

use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use tracing::debug;

use crate::normalizer::{error_description, normalize_chart};
use crate::provider::{ChartSeries, PriceProvider, ProviderError, SeriesRequest};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_MARKET_SUFFIX: &str = ".SA";
pub const DEFAULT_USER_AGENT: &str = concat!("psim/", env!("CARGO_PKG_VERSION"));

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YahooSettings {
    pub base_url: String,
    /// Appended to symbols that do not already carry it.
    pub market_suffix: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for YahooSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            market_suffix: DEFAULT_MARKET_SUFFIX.to_string(),
            timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Daily closes from `GET {base_url}/v8/finance/chart/{symbol}`.
#[derive(Debug, Clone)]
pub struct YahooChartProvider {
    http: reqwest::Client,
    settings: YahooSettings,
}

impl YahooChartProvider {
    pub fn new(settings: YahooSettings) -> Result<Self, ProviderError> {
        if settings.base_url.trim().is_empty() {
            return Err(ProviderError::Config("base_url is empty".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| ProviderError::Config(format!("http client build failed: {e}")))?;
        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &YahooSettings {
        &self.settings
    }

    fn chart_url(&self, qualified: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}",
            self.settings.base_url.trim_end_matches('/'),
            qualified
        )
    }
}

/// Exchange-qualify `symbol`: trim, uppercase, append `suffix` if absent.
pub fn normalize_symbol(symbol: &str, suffix: &str) -> String {
    let sym = symbol.trim().to_ascii_uppercase();
    let suffix = suffix.trim().to_ascii_uppercase();
    if suffix.is_empty() || sym.ends_with(&suffix) {
        sym
    } else {
        format!("{sym}{suffix}")
    }
}

/// `(period1, period2)` in epoch seconds.
///
/// `period2` is one day past midnight of `end` so the last calendar day is kept.
pub fn period_bounds(start: NaiveDate, end: NaiveDate) -> (i64, i64) {
    let midnight = |d: NaiveDate| d.and_time(NaiveTime::MIN).and_utc().timestamp();
    (midnight(start), midnight(end) + SECONDS_PER_DAY)
}

#[async_trait::async_trait]
impl PriceProvider for YahooChartProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_daily_closes(&self, req: &SeriesRequest) -> Result<ChartSeries, ProviderError> {
        let qualified = normalize_symbol(&req.symbol, &self.settings.market_suffix);
        let (period1, period2) = period_bounds(req.start, req.end);
        let p1 = period1.to_string();
        let p2 = period2.to_string();

        debug!(symbol = %qualified, period1, period2, "chart request");

        let resp = self
            .http
            .get(self.chart_url(&qualified))
            .query(&[
                ("period1", p1.as_str()),
                ("period2", p2.as_str()),
                ("interval", "1d"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| ProviderError::Transport(format!("body read failed: {e}")))?;

        if !status.is_success() {
            let message = error_description(&body)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "unknown".to_string());
            return Err(ProviderError::Http {
                status: status.as_u16(),
                message,
            });
        }

        normalize_chart(&qualified, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn suffix_is_appended_once() {
        assert_eq!(normalize_symbol("PETR4", ".SA"), "PETR4.SA");
        assert_eq!(normalize_symbol("petr4", ".SA"), "PETR4.SA");
        assert_eq!(normalize_symbol("PETR4.SA", ".SA"), "PETR4.SA");
        assert_eq!(normalize_symbol(" vale3.sa ", ".SA"), "VALE3.SA");
    }

    #[test]
    fn empty_suffix_leaves_symbol_alone() {
        assert_eq!(normalize_symbol("AAPL", ""), "AAPL");
    }

    #[test]
    fn period_bounds_extend_end_by_one_day() {
        let (p1, p2) = period_bounds(d(2024, 1, 1), d(2024, 1, 31));
        assert_eq!(p1, 1_704_067_200);
        assert_eq!(p2, 1_706_659_200 + 86_400);
    }

    #[test]
    fn chart_url_tolerates_trailing_slash() {
        let p = YahooChartProvider::new(YahooSettings {
            base_url: "http://localhost:1234/".to_string(),
            ..YahooSettings::default()
        })
        .unwrap();
        assert_eq!(
            p.chart_url("PETR4.SA"),
            "http://localhost:1234/v8/finance/chart/PETR4.SA"
        );
    }

    #[test]
    fn empty_base_url_is_config_error() {
        let err = YahooChartProvider::new(YahooSettings {
            base_url: "  ".to_string(),
            ..YahooSettings::default()
        })
        .unwrap_err();
        assert!(matches!(err, ProviderError::Config(_)));
    }
}
