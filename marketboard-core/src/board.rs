//! Board orchestration: one request for one category.
//!
//! Resolution order for bars:
//! 1. Live provider, every window fetched concurrently, all must succeed
//! 2. On failure (or when offline) → static fallback provider
//! 3. With `PropagateRateLimit`, a 429 from the live provider is returned to
//!    the caller instead of falling back
//!
//! The aggregator only runs once every window has resolved, and never learns
//! which source the bars came from.

use std::collections::HashMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregate::HorizonAggregator;
use crate::clock::Clock;
use crate::config::Category;
use crate::data::{DataError, DataProvider, DataSource};
use crate::domain::{AggregateResult, Bar};
use crate::window::WindowSet;

/// What to do when the live provider fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Always answer from the fallback source.
    #[default]
    Substitute,
    /// Return rate-limit errors to the caller; fall back on anything else.
    PropagateRateLimit,
}

/// Bars for every window plus the latest session.
#[derive(Debug, Default)]
pub struct FetchedBars {
    pub by_window: HashMap<String, Vec<Bar>>,
    pub latest: Vec<Bar>,
}

/// Aggregated, ranked output of one board request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub category: String,
    pub as_of: NaiveDate,
    pub source: DataSource,
    pub windows: WindowSet,
    pub results: Vec<AggregateResult>,
}

/// A category with its windows resolved for one request.
#[derive(Debug, Clone)]
pub struct Board {
    category: Category,
    aggregator: HorizonAggregator,
    as_of: NaiveDate,
    limit: usize,
}

impl Board {
    /// Resolve the category's horizons against `clock`.
    pub fn new(category: &Category, clock: &dyn Clock, limit: usize) -> Self {
        let windows = WindowSet::resolve(&category.horizons, clock);
        Self {
            aggregator: HorizonAggregator::new(windows, category.asset_class.price_precision()),
            category: category.clone(),
            as_of: clock.today(),
            limit,
        }
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn windows(&self) -> &WindowSet {
        self.aggregator.windows()
    }

    /// Fetch every window and the latest session concurrently, waiting for all.
    ///
    /// When several requests fail, a rate-limit error is reported ahead of any
    /// other so the fallback policy sees it.
    pub fn fetch(&self, provider: &dyn DataProvider) -> Result<FetchedBars, DataError> {
        let symbols = &self.category.symbols;
        let limit = self.limit;

        let (windows, latest) = rayon::join(
            || {
                self.windows()
                    .as_slice()
                    .par_iter()
                    .map(|w| {
                        debug!(
                            provider = provider.name(),
                            window = %w.label,
                            from = %w.from,
                            to = %w.to,
                            "fetching window"
                        );
                        provider
                            .fetch_daily_bars(symbols, w.from, w.to, limit)
                            .map(|bars| (w.label.clone(), bars))
                    })
                    .collect::<Vec<_>>()
            },
            || provider.fetch_latest_bars(symbols),
        );

        let mut by_window = HashMap::with_capacity(windows.len());
        let mut errors = Vec::new();
        for result in windows {
            match result {
                Ok((label, bars)) => {
                    by_window.insert(label, bars);
                }
                Err(e) => errors.push(e),
            }
        }
        let latest = match latest {
            Ok(bars) => bars,
            Err(e) => {
                errors.push(e);
                Vec::new()
            }
        };

        if let Some(pos) = errors.iter().position(DataError::is_rate_limited) {
            return Err(errors.swap_remove(pos));
        }
        if let Some(e) = errors.into_iter().next() {
            return Err(e);
        }
        Ok(FetchedBars { by_window, latest })
    }

    /// Aggregate fetched bars and apply the category's rank policy.
    pub fn build(&self, fetched: &FetchedBars, source: DataSource) -> BoardSnapshot {
        for bar in fetched.latest.iter().filter(|b| !b.is_sane()) {
            debug!(symbol = %bar.symbol, date = %bar.date, "latest bar violates OHLC ordering");
        }

        let mut results =
            self.aggregator
                .aggregate(&fetched.by_window, &self.category.symbols, &fetched.latest);
        for result in &mut results {
            result.name = self.category.display_name(&result.symbol).map(str::to_string);
        }
        let results = self.category.rank_policy().apply(results, self.windows());

        BoardSnapshot {
            category: self.category.name.clone(),
            as_of: self.as_of,
            source,
            windows: self.windows().clone(),
            results,
        }
    }

    /// Fetch, aggregate and rank, falling back per `policy`.
    ///
    /// `live = None` means offline: the fallback source answers directly.
    pub fn load(
        &self,
        live: Option<&dyn DataProvider>,
        fallback: &dyn DataProvider,
        policy: FallbackPolicy,
    ) -> Result<BoardSnapshot, DataError> {
        if let Some(provider) = live {
            match self.fetch(provider) {
                Ok(fetched) => {
                    info!(category = %self.category.name, provider = provider.name(), "board loaded from live source");
                    return Ok(self.build(&fetched, DataSource::Live));
                }
                Err(e) if e.is_rate_limited() && policy == FallbackPolicy::PropagateRateLimit => {
                    warn!(category = %self.category.name, error = %e, "propagating rate limit");
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        category = %self.category.name,
                        provider = provider.name(),
                        error = %e,
                        "live source failed, using fallback"
                    );
                }
            }
        }

        let fetched = self.fetch(fallback)?;
        info!(category = %self.category.name, provider = fallback.name(), "board loaded from fallback source");
        Ok(self.build(&fetched, DataSource::Fallback))
    }
}
