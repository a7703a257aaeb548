//! Bar: one daily observation for one symbol.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// OHLC bar for a single symbol on a single day.
///
/// `close` is the canonical price. Vendor data is not guaranteed to satisfy
/// `low <= open, close <= high`; nothing downstream relies on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    pub fn new(
        symbol: impl Into<String>,
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            open,
            high,
            low,
            close,
        }
    }

    /// Returns true if any OHLC field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.low >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> Bar {
        Bar::new(
            "SPY",
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            100.0,
            105.0,
            98.0,
            103.0,
        )
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
    }

    #[test]
    fn bar_detects_void() {
        let mut bar = sample_bar();
        bar.close = f64::NAN;
        assert!(bar.is_void());
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_detects_inverted_high_low() {
        let mut bar = sample_bar();
        bar.high = 97.0;
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_deserializes_from_json() {
        let json = r#"{"symbol":"QQQ","date":"2024-03-01","open":1.0,"high":2.0,"low":0.5,"close":1.5}"#;
        let bar: Bar = serde_json::from_str(json).unwrap();
        assert_eq!(bar.symbol, "QQQ");
        assert_eq!(bar.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(bar.close, 1.5);
    }
}
