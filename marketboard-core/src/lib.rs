//! Marketboard Core: multi-horizon return and range aggregation over daily bars.
//!
//! This crate contains:
//! - Domain types (bars, asset classes, aggregate results)
//! - Clock injection and lookback window resolution (5D … 10Y)
//! - The horizon aggregator: percentage change per window, daily and yearly ranges
//! - Rank policy: drop unpriced symbols, sort by a horizon, keep the top N
//! - Data sources: provider trait, Polygon live source, static fallback snapshot
//! - Board orchestration with concurrent per-window fetches and fallback selection
//! - TOML board configuration

pub mod aggregate;
pub mod board;
pub mod clock;
pub mod config;
pub mod data;
pub mod domain;
pub mod rank;
pub mod window;

pub use aggregate::{compute_change, compute_daily_range, compute_span_range, HorizonAggregator};
pub use board::{Board, BoardSnapshot, FallbackPolicy};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{BoardConfig, Category, ConfigError};
pub use rank::RankPolicy;
pub use window::{Horizon, Window, WindowSet};
