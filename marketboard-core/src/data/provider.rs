//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over bar sources (Polygon, the static
//! fallback snapshot) so the board can swap them and tests can mock them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Bar;

/// Structured error types for data operations.
///
/// These are designed to be displayable in CLI output.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("HTTP {status} for {symbol}")]
    Http { status: u16, symbol: String },

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, DataError::RateLimited { .. })
    }

    /// HTTP status a route-style caller would answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            DataError::RateLimited { .. } => 429,
            DataError::AuthenticationRequired(_) => 401,
            DataError::SymbolNotFound { .. } => 404,
            DataError::Http { status, .. } => *status,
            _ => 500,
        }
    }
}

/// Where a board's bars came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Live,
    Fallback,
}

/// Trait for daily bar sources.
///
/// Implementations handle the specifics of one vendor or dataset. Fallback
/// selection lives above this trait; providers don't know about each other.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Daily bars for `symbols` between `from` and `to` (both inclusive).
    ///
    /// `limit` caps the number of observations per symbol. Output is grouped
    /// by symbol in request order, dates ascending.
    fn fetch_daily_bars(
        &self,
        symbols: &[String],
        from: NaiveDate,
        to: NaiveDate,
        limit: usize,
    ) -> Result<Vec<Bar>, DataError>;

    /// Most recent completed daily bar for each symbol.
    ///
    /// Symbols without data are omitted rather than reported as errors.
    fn fetch_latest_bars(&self, symbols: &[String]) -> Result<Vec<Bar>, DataError>;
}
