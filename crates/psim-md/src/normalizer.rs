//! Chart payload normalization.
//!
//! Converts the JSON document returned by a chart endpoint (a parallel
//! `timestamp` array plus a nested `indicators.quote[0].close` array) into a
//! [`ChartSeries`] of micros prices.
//!
//! Rules:
//! - `chart.result[0]` must exist.
//! - The close array must be non-empty and exactly as long as the timestamp array.
//! - Null closes are dropped, as are non-finite or out-of-range values and
//!   timestamps chrono cannot represent.
//! - If nothing survives, the result is [`ProviderError::NoValidPrices`].

use chrono::DateTime;
use psim_schemas::{Micros, SeriesPoint};
use serde::Deserialize;

use crate::provider::{ChartSeries, ProviderError};

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Option<ChartBody>,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartApiError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartApiError {
    pub(crate) code: Option<String>,
    pub(crate) description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Option<Vec<QuoteBlock>>,
}

#[derive(Debug, Deserialize)]
struct QuoteBlock {
    close: Option<Vec<Option<f64>>>,
}

/// Normalize a chart payload for `symbol` (the exchange-qualified symbol).
pub fn normalize_chart(symbol: &str, body: &[u8]) -> Result<ChartSeries, ProviderError> {
    let env: ChartEnvelope =
        serde_json::from_slice(body).map_err(|e| ProviderError::Decode(e.to_string()))?;

    let chart = env
        .chart
        .ok_or_else(|| ProviderError::Shape("missing 'chart'".to_string()))?;

    if let Some(err) = chart.error {
        return Err(api_error(err));
    }

    let result = chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ProviderError::Shape("missing 'chart.result[0]'".to_string()))?;

    let timestamps = result.timestamp.unwrap_or_default();
    let closes = result
        .indicators
        .and_then(|i| i.quote)
        .and_then(|q| q.into_iter().next())
        .and_then(|q| q.close)
        .unwrap_or_default();

    if closes.is_empty() {
        return Err(ProviderError::Shape("empty close array".to_string()));
    }
    if timestamps.len() != closes.len() {
        return Err(ProviderError::Shape(format!(
            "timestamp/close length mismatch ({} vs {})",
            timestamps.len(),
            closes.len()
        )));
    }

    let points: Vec<SeriesPoint> = timestamps
        .iter()
        .zip(closes)
        .filter_map(|(&ts, close)| {
            let close_micros = close.and_then(Micros::from_f64)?;
            let date = DateTime::from_timestamp(ts, 0)?.date_naive();
            Some(SeriesPoint {
                ts,
                date,
                close_micros,
            })
        })
        .collect();

    if points.is_empty() {
        return Err(ProviderError::NoValidPrices);
    }

    Ok(ChartSeries {
        symbol: symbol.to_string(),
        points,
    })
}

/// Best-effort extraction of `chart.error` from an error response body.
pub(crate) fn error_description(body: &[u8]) -> Option<String> {
    let env: ChartEnvelope = serde_json::from_slice(body).ok()?;
    let err = env.chart?.error?;
    err.description.or(err.code)
}

fn api_error(err: ChartApiError) -> ProviderError {
    ProviderError::Api {
        message: err
            .description
            .unwrap_or_else(|| "unspecified error".to_string()),
        code: err.code,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn payload(ts: &str, close: &str) -> String {
        format!(
            r#"{{"chart":{{"result":[{{"meta":{{"symbol":"PETR4.SA"}},"timestamp":{ts},
            "indicators":{{"quote":[{{"close":{close}}}]}}}}],"error":null}}}}"#
        )
    }

    #[test]
    fn happy_path_keeps_all_points() {
        let body = payload("[1704204000,1704290400,1704376800]", "[10.0,11.5,12.0]");
        let s = normalize_chart("PETR4.SA", body.as_bytes()).unwrap();
        assert_eq!(s.symbol, "PETR4.SA");
        assert_eq!(s.points.len(), 3);
        assert_eq!(s.first_close(), Some(Micros::from_units(10)));
        assert_eq!(s.last_close(), Some(Micros::from_units(12)));
        assert_eq!(s.points[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(s.points[1].close_micros, Micros::new(11_500_000));
    }

    #[test]
    fn leading_and_trailing_nulls_are_skipped() {
        let body = payload(
            "[1704204000,1704290400,1704376800,1704463200]",
            "[null,20.25,21.0,null]",
        );
        let s = normalize_chart("VALE3.SA", body.as_bytes()).unwrap();
        assert_eq!(s.points.len(), 2);
        assert_eq!(s.first_close(), Some(Micros::new(20_250_000)));
        assert_eq!(s.last_close(), Some(Micros::from_units(21)));
        assert_eq!(s.points[0].ts, 1_704_290_400);
    }

    #[test]
    fn interior_nulls_are_dropped_from_series() {
        let body = payload("[1,2,3]", "[5.0,null,6.0]");
        let s = normalize_chart("X", body.as_bytes()).unwrap();
        assert_eq!(s.points.iter().map(|p| p.ts).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn all_nulls_is_no_valid_prices() {
        let body = payload("[1,2]", "[null,null]");
        assert_eq!(
            normalize_chart("X", body.as_bytes()),
            Err(ProviderError::NoValidPrices)
        );
    }

    #[test]
    fn empty_close_array_is_shape_error() {
        let body = payload("[]", "[]");
        assert!(matches!(
            normalize_chart("X", body.as_bytes()),
            Err(ProviderError::Shape(_))
        ));
    }

    #[test]
    fn misaligned_arrays_are_shape_error() {
        let body = payload("[1,2,3]", "[1.0,2.0]");
        let err = normalize_chart("X", body.as_bytes()).unwrap_err();
        assert_eq!(
            err,
            ProviderError::Shape("timestamp/close length mismatch (3 vs 2)".to_string())
        );
    }

    #[test]
    fn missing_result_is_shape_error() {
        let body = r#"{"chart":{"result":[],"error":null}}"#;
        assert!(matches!(
            normalize_chart("X", body.as_bytes()),
            Err(ProviderError::Shape(_))
        ));
        let body = r#"{"unexpected":true}"#;
        assert!(matches!(
            normalize_chart("X", body.as_bytes()),
            Err(ProviderError::Shape(_))
        ));
    }

    #[test]
    fn missing_indicators_is_shape_error() {
        let body = r#"{"chart":{"result":[{"timestamp":[1,2]}],"error":null}}"#;
        assert!(matches!(
            normalize_chart("X", body.as_bytes()),
            Err(ProviderError::Shape(_))
        ));
    }

    #[test]
    fn chart_error_is_api_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert_eq!(
            normalize_chart("ZZZZ3.SA", body.as_bytes()),
            Err(ProviderError::Api {
                code: Some("Not Found".to_string()),
                message: "No data found, symbol may be delisted".to_string(),
            })
        );
    }

    #[test]
    fn invalid_json_is_decode_error() {
        assert!(matches!(
            normalize_chart("X", b"<html>rate limited</html>"),
            Err(ProviderError::Decode(_))
        ));
        let wrong_types = payload("[1]", r#"["ten"]"#);
        assert!(matches!(
            normalize_chart("X", wrong_types.as_bytes()),
            Err(ProviderError::Decode(_))
        ));
    }

    #[test]
    fn error_description_reads_chart_error() {
        let body = br#"{"chart":{"result":null,"error":{"code":"Not Found","description":"gone"}}}"#;
        assert_eq!(error_description(body), Some("gone".to_string()));
        assert_eq!(error_description(b"not json"), None);
    }
}
