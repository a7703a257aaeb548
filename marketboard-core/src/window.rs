//! Named lookback horizons and their resolution to concrete date ranges.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::Clock;

/// A named lookback horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Horizon {
    FiveDay,
    OneMonth,
    ThreeMonth,
    YearToDate,
    OneYear,
    ThreeYear,
    FiveYear,
    TenYear,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown horizon '{0}' (expected one of 5D, 1M, 3M, YTD, 1Y, 3Y, 5Y, 10Y)")]
pub struct UnknownHorizon(pub String);

impl Horizon {
    /// Every horizon, shortest first.
    pub const ALL: [Horizon; 8] = [
        Horizon::FiveDay,
        Horizon::OneMonth,
        Horizon::ThreeMonth,
        Horizon::YearToDate,
        Horizon::OneYear,
        Horizon::ThreeYear,
        Horizon::FiveYear,
        Horizon::TenYear,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Horizon::FiveDay => "5D",
            Horizon::OneMonth => "1M",
            Horizon::ThreeMonth => "3M",
            Horizon::YearToDate => "YTD",
            Horizon::OneYear => "1Y",
            Horizon::ThreeYear => "3Y",
            Horizon::FiveYear => "5Y",
            Horizon::TenYear => "10Y",
        }
    }

    /// First date covered by this horizon when looking back from `today`.
    ///
    /// Month arithmetic clamps to the end of the target month
    /// (2024-03-31 minus one month is 2024-02-29).
    pub fn start_from(self, today: NaiveDate) -> NaiveDate {
        let months_back = |n: u32| today.checked_sub_months(Months::new(n));
        let start = match self {
            Horizon::FiveDay => today.checked_sub_days(Days::new(5)),
            Horizon::OneMonth => months_back(1),
            Horizon::ThreeMonth => months_back(3),
            Horizon::YearToDate => NaiveDate::from_ymd_opt(today.year(), 1, 1),
            Horizon::OneYear => months_back(12),
            Horizon::ThreeYear => months_back(36),
            Horizon::FiveYear => months_back(60),
            Horizon::TenYear => months_back(120),
        };
        start.unwrap_or(NaiveDate::MIN)
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Horizon {
    type Err = UnknownHorizon;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Horizon::ALL
            .into_iter()
            .find(|h| h.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownHorizon(s.to_string()))
    }
}

impl TryFrom<String> for Horizon {
    type Error = UnknownHorizon;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Horizon> for String {
    fn from(h: Horizon) -> Self {
        h.label().to_string()
    }
}

/// A horizon resolved against a concrete date. Both ends are inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Window {
    pub label: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl Window {
    pub fn new(label: impl Into<String>, from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            label: label.into(),
            from,
            to,
        }
    }
}

/// The windows configured for one request, in configuration order.
///
/// Resolved once per request and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct WindowSet {
    windows: Vec<Window>,
}

impl WindowSet {
    /// Build a set from already-resolved windows.
    pub fn new(windows: Vec<Window>) -> Self {
        Self { windows }
    }

    /// Resolve `horizons` against the clock's current date.
    pub fn resolve(horizons: &[Horizon], clock: &dyn Clock) -> Self {
        let today = clock.today();
        let windows = horizons
            .iter()
            .map(|h| Window::new(h.label(), h.start_from(today), today))
            .collect();
        Self { windows }
    }

    /// The window reaching furthest back. Ties keep the first configured.
    pub fn longest(&self) -> Option<&Window> {
        self.windows
            .iter()
            .reduce(|best, w| if w.from < best.from { w } else { best })
    }

    pub fn get(&self, label: &str) -> Option<&Window> {
        self.windows.iter().find(|w| w.label == label)
    }

    pub fn as_slice(&self) -> &[Window] {
        &self.windows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Window> {
        self.windows.iter()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.windows.iter().map(|w| w.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

impl<'a> IntoIterator for &'a WindowSet {
    type Item = &'a Window;
    type IntoIter = std::slice::Iter<'a, Window>;

    fn into_iter(self) -> Self::IntoIter {
        self.windows.iter()
    }
}
