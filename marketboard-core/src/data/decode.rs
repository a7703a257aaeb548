//! Decoding boundary between vendor payloads and [`Bar`].
//!
//! Vendors change their JSON without notice. Everything that knows about a
//! payload shape lives behind [`BarDecoder`], so nothing past the fetch layer
//! has to.

use chrono::DateTime;
use serde::Deserialize;

use super::provider::DataError;
use crate::domain::Bar;

/// Turns a raw response body for one symbol into bars.
pub trait BarDecoder: Send + Sync {
    /// Decode `body`. Output is sorted by date ascending.
    ///
    /// An empty result set is not an error; a body that doesn't match the
    /// expected shape is [`DataError::ResponseFormatChanged`].
    fn decode(&self, symbol: &str, body: &str) -> Result<Vec<Bar>, DataError>;
}

/// Polygon aggregates response (`/v2/aggs/...`).
#[derive(Debug, Deserialize)]
struct AggsResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    results: Option<Vec<AggBar>>,
}

#[derive(Debug, Deserialize)]
struct AggBar {
    #[serde(rename = "o")]
    open: Option<f64>,
    #[serde(rename = "h")]
    high: Option<f64>,
    #[serde(rename = "l")]
    low: Option<f64>,
    #[serde(rename = "c")]
    close: Option<f64>,
    /// Window start, Unix milliseconds.
    #[serde(rename = "t")]
    timestamp: i64,
}

/// Decoder for Polygon's aggregates endpoints (range and previous close).
#[derive(Debug, Clone, Copy, Default)]
pub struct PolygonAggsDecoder;

impl BarDecoder for PolygonAggsDecoder {
    fn decode(&self, symbol: &str, body: &str) -> Result<Vec<Bar>, DataError> {
        let resp: AggsResponse = serde_json::from_str(body).map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })?;

        if resp.status.as_deref() == Some("ERROR") {
            let reason = resp
                .error
                .or(resp.message)
                .unwrap_or_else(|| "unspecified error".into());
            return Err(DataError::ResponseFormatChanged(format!("{symbol}: {reason}")));
        }

        let results = resp.results.unwrap_or_default();
        let mut bars = Vec::with_capacity(results.len());

        for agg in results {
            let date = DateTime::from_timestamp_millis(agg.timestamp)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {}", agg.timestamp))
                })?;

            // Skip bars with no prices at all
            if agg.open.is_none() && agg.high.is_none() && agg.low.is_none() && agg.close.is_none() {
                continue;
            }

            bars.push(Bar {
                symbol: symbol.to_string(),
                date,
                open: agg.open.unwrap_or(f64::NAN),
                high: agg.high.unwrap_or(f64::NAN),
                low: agg.low.unwrap_or(f64::NAN),
                close: agg.close.unwrap_or(f64::NAN),
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const RANGE_BODY: &str = r#"{
        "ticker": "AAPL",
        "queryCount": 2,
        "resultsCount": 2,
        "adjusted": true,
        "status": "OK",
        "request_id": "abc",
        "results": [
            {"v": 70790813, "vw": 131.6292, "o": 130.465, "c": 131.6, "h": 132.15, "l": 130.1, "t": 1673326800000, "n": 1},
            {"v": 63896155, "vw": 132.9, "o": 131.25, "c": 130.15, "h": 133.51, "l": 129.89, "t": 1673240400000, "n": 1}
        ]
    }"#;

    #[test]
    fn decodes_and_sorts_results() {
        let bars = PolygonAggsDecoder.decode("AAPL", RANGE_BODY).unwrap();
        assert_eq!(bars.len(), 2);
        assert!(bars[0].date < bars[1].date);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2023, 1, 9).unwrap());
        assert_eq!(bars[0].close, 130.15);
        assert_eq!(bars[1].high, 132.15);
        assert!(bars.iter().all(|b| b.symbol == "AAPL"));
    }

    #[test]
    fn missing_results_is_empty() {
        let body = r#"{"ticker":"ZZZZ","queryCount":0,"resultsCount":0,"status":"OK"}"#;
        assert!(PolygonAggsDecoder.decode("ZZZZ", body).unwrap().is_empty());
    }

    #[test]
    fn error_status_is_reported() {
        let body = r#"{"status":"ERROR","request_id":"x","error":"Unknown API Key"}"#;
        match PolygonAggsDecoder.decode("AAPL", body) {
            Err(DataError::ResponseFormatChanged(msg)) => assert!(msg.contains("Unknown API Key")),
            other => panic!("expected ResponseFormatChanged, got: {other:?}"),
        }
    }

    #[test]
    fn malformed_body_is_format_change() {
        assert!(matches!(
            PolygonAggsDecoder.decode("AAPL", "<html>busy</html>"),
            Err(DataError::ResponseFormatChanged(_))
        ));
    }

    #[test]
    fn partial_prices_become_nan() {
        let body = r#"{"status":"OK","results":[{"c":10.0,"t":1673240400000}]}"#;
        let bars = PolygonAggsDecoder.decode("X", body).unwrap();
        assert_eq!(bars[0].close, 10.0);
        assert!(bars[0].low.is_nan());
    }
}
