//! Static fallback provider.
//!
//! Serves bars from an in-memory snapshot when the live source is unavailable.
//! Snapshot rows are stored relative to "today" (`days_ago`) and rebased onto
//! the injected clock at fetch time, so the fallback always lands inside the
//! current windows. Never fails.

use std::path::Path;
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::provider::{DataError, DataProvider};
use crate::clock::Clock;
use crate::domain::Bar;

const BUNDLED_SNAPSHOT: &str = include_str!("../../fixtures/fallback_snapshot.json");

/// One snapshot row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotBar {
    pub symbol: String,
    pub days_ago: u64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl SnapshotBar {
    fn rebase(&self, today: NaiveDate) -> Option<Bar> {
        let date = today.checked_sub_days(Days::new(self.days_ago))?;
        Some(Bar::new(
            self.symbol.clone(),
            date,
            self.open,
            self.high,
            self.low,
            self.close,
        ))
    }
}

pub struct StaticProvider {
    snapshot: Vec<SnapshotBar>,
    clock: Arc<dyn Clock>,
}

impl StaticProvider {
    pub fn new(snapshot: Vec<SnapshotBar>, clock: Arc<dyn Clock>) -> Self {
        Self { snapshot, clock }
    }

    /// The snapshot compiled into the crate.
    pub fn bundled(clock: Arc<dyn Clock>) -> Result<Self, DataError> {
        Self::from_json(BUNDLED_SNAPSHOT, clock)
    }

    pub fn from_json(json: &str, clock: Arc<dyn Clock>) -> Result<Self, DataError> {
        let snapshot: Vec<SnapshotBar> = serde_json::from_str(json)
            .map_err(|e| DataError::ResponseFormatChanged(format!("invalid fallback snapshot: {e}")))?;
        Ok(Self::new(snapshot, clock))
    }

    pub fn from_file(path: &Path, clock: Arc<dyn Clock>) -> Result<Self, DataError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            DataError::Other(format!("cannot read fallback snapshot {}: {e}", path.display()))
        })?;
        Self::from_json(&json, clock)
    }

    pub fn symbols(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for row in &self.snapshot {
            if !seen.contains(&row.symbol.as_str()) {
                seen.push(&row.symbol);
            }
        }
        seen
    }

    fn bars_for(&self, symbol: &str, today: NaiveDate) -> Vec<Bar> {
        let mut bars: Vec<Bar> = self
            .snapshot
            .iter()
            .filter(|row| row.symbol == symbol)
            .filter_map(|row| row.rebase(today))
            .collect();
        bars.sort_by_key(|b| b.date);
        bars
    }
}

impl DataProvider for StaticProvider {
    fn name(&self) -> &str {
        "static_fallback"
    }

    fn fetch_daily_bars(
        &self,
        symbols: &[String],
        from: NaiveDate,
        to: NaiveDate,
        limit: usize,
    ) -> Result<Vec<Bar>, DataError> {
        let today = self.clock.today();
        let mut out = Vec::new();
        for symbol in symbols {
            out.extend(
                self.bars_for(symbol, today)
                    .into_iter()
                    .filter(|b| from <= b.date && b.date <= to)
                    .take(limit),
            );
        }
        Ok(out)
    }

    fn fetch_latest_bars(&self, symbols: &[String]) -> Result<Vec<Bar>, DataError> {
        let today = self.clock.today();
        Ok(symbols
            .iter()
            .filter_map(|symbol| self.bars_for(symbol, today).pop())
            .collect())
    }
}
