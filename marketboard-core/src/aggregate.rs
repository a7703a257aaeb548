//! Multi-horizon return and range aggregation.
//!
//! Percentage change per window:
//! change = (last.close - first.close) / first.close * 100
//! where `first`/`last` are the earliest/latest bars of the symbol inside the window.
//!
//! Nothing here fails. Missing symbols, empty windows and unusable baselines
//! degrade to `0` for changes and to [`NOT_AVAILABLE`] for ranges.

use std::collections::HashMap;

use crate::domain::{AggregateResult, Bar, HorizonChanges, NOT_AVAILABLE};
use crate::window::WindowSet;

fn series<'a>(bars_by_window: &'a HashMap<String, Vec<Bar>>, label: &str) -> &'a [Bar] {
    bars_by_window.get(label).map(Vec::as_slice).unwrap_or(&[])
}

fn matching<'a>(bars: &'a [Bar], symbol: &'a str) -> impl Iterator<Item = &'a Bar> + 'a {
    bars.iter().filter(move |b| b.symbol == symbol)
}

/// Percentage change between the earliest and latest bar of `symbol`.
///
/// Returns 0 with fewer than two bars, when the baseline close is not
/// positive, or when the result is not finite.
pub fn compute_change(bars: &[Bar], symbol: &str) -> f64 {
    let mut first: Option<&Bar> = None;
    let mut last: Option<&Bar> = None;
    let mut count = 0usize;

    for bar in matching(bars, symbol) {
        count += 1;
        if first.map_or(true, |f| bar.date < f.date) {
            first = Some(bar);
        }
        if last.map_or(true, |l| bar.date >= l.date) {
            last = Some(bar);
        }
    }

    let (Some(first), Some(last)) = (first, last) else {
        return 0.0;
    };
    if count < 2 {
        return 0.0;
    }

    let base = first.close;
    // Also rejects NaN.
    if !(base > 0.0) {
        return 0.0;
    }

    let change = (last.close - base) / base * 100.0;
    if change.is_finite() {
        change
    } else {
        0.0
    }
}

/// `"{low} - {high}"` with `precision` decimals, or the sentinel when either end is not finite.
pub fn format_range(low: f64, high: f64, precision: usize) -> String {
    if !low.is_finite() || !high.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    format!("{low:.precision$} - {high:.precision$}")
}

/// Low/high of the first bar of `symbol`.
///
/// The input is expected to hold a single trading day, so only one bar per
/// symbol should match.
pub fn compute_daily_range(bars: &[Bar], symbol: &str, precision: usize) -> String {
    match matching(bars, symbol).next() {
        Some(bar) => format_range(bar.low, bar.high, precision),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Lowest low and highest high over every bar of `symbol`. NaN fields are skipped.
pub fn compute_span_range(bars: &[Bar], symbol: &str, precision: usize) -> String {
    let mut seen = false;
    let mut low = f64::INFINITY;
    let mut high = f64::NEG_INFINITY;

    for bar in matching(bars, symbol) {
        seen = true;
        low = low.min(bar.low);
        high = high.max(bar.high);
    }

    if !seen {
        return NOT_AVAILABLE.to_string();
    }
    format_range(low, high, precision)
}

/// Stateless aggregator over a fixed window configuration.
#[derive(Debug, Clone)]
pub struct HorizonAggregator {
    windows: WindowSet,
    precision: usize,
}

impl HorizonAggregator {
    pub fn new(windows: WindowSet, precision: usize) -> Self {
        Self { windows, precision }
    }

    pub fn windows(&self) -> &WindowSet {
        &self.windows
    }

    pub fn precision(&self) -> usize {
        self.precision
    }

    /// One result per symbol, in input order.
    ///
    /// `bars_by_window` is keyed by window label; a label with no entry is
    /// treated as an empty series. `today_bars` holds the most recent
    /// session and supplies the latest price and the daily range. The year
    /// range spans the longest configured window.
    pub fn aggregate(
        &self,
        bars_by_window: &HashMap<String, Vec<Bar>>,
        symbols: &[String],
        today_bars: &[Bar],
    ) -> Vec<AggregateResult> {
        let span_bars = self
            .windows
            .longest()
            .map(|w| series(bars_by_window, &w.label))
            .unwrap_or(&[]);

        symbols
            .iter()
            .map(|symbol| {
                let latest_price = matching(today_bars, symbol)
                    .next()
                    .map(|b| b.close)
                    .unwrap_or(0.0);

                let mut changes = HorizonChanges::with_capacity(self.windows.len());
                for window in &self.windows {
                    changes.insert(
                        window.label.clone(),
                        compute_change(series(bars_by_window, &window.label), symbol),
                    );
                }

                AggregateResult {
                    symbol: symbol.clone(),
                    name: None,
                    latest_price,
                    changes,
                    daily_range: compute_daily_range(today_bars, symbol, self.precision),
                    year_range: compute_span_range(span_bars, symbol, self.precision),
                }
            })
            .collect()
    }
}
