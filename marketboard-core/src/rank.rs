//! Presentation policy applied to aggregated results.
//!
//! The aggregator emits every requested symbol. Callers decide what reaches the
//! client: drop symbols without a price, order by one horizon, keep the top N.

use serde::{Deserialize, Serialize};

use crate::domain::AggregateResult;
use crate::window::WindowSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankPolicy {
    /// Remove results whose latest price is zero or negative.
    pub drop_non_positive: bool,
    /// Horizon label to sort by, descending. `None` sorts by the longest window.
    pub sort_by: Option<String>,
    /// Keep at most this many results after sorting.
    pub top_n: Option<usize>,
}

impl Default for RankPolicy {
    fn default() -> Self {
        Self {
            drop_non_positive: true,
            sort_by: None,
            top_n: None,
        }
    }
}

impl RankPolicy {
    /// Pass-through: keep everything in input order.
    pub fn none() -> Self {
        Self {
            drop_non_positive: false,
            sort_by: None,
            top_n: None,
        }
    }

    pub fn with_top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    pub fn sorted_by(mut self, label: impl Into<String>) -> Self {
        self.sort_by = Some(label.into());
        self
    }

    pub fn is_pass_through(&self) -> bool {
        !self.drop_non_positive && self.sort_by.is_none() && self.top_n.is_none()
    }

    /// Apply the policy. Sorting is stable, so equal changes keep input order.
    pub fn apply(&self, mut results: Vec<AggregateResult>, windows: &WindowSet) -> Vec<AggregateResult> {
        if self.is_pass_through() {
            return results;
        }

        if self.drop_non_positive {
            results.retain(|r| r.latest_price > 0.0);
        }

        let key = self
            .sort_by
            .clone()
            .or_else(|| windows.longest().map(|w| w.label.clone()));
        if let Some(label) = key {
            results.sort_by(|a, b| b.change(&label).total_cmp(&a.change(&label)));
        }

        if let Some(n) = self.top_n {
            results.truncate(n);
        }
        results
    }
}
