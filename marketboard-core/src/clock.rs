//! Injected source of "today".
//!
//! Window boundaries are resolved from a [`Clock`] at request time rather than
//! captured at startup, so tests and `--as-of` runs can pin the date.

use chrono::NaiveDate;

pub trait Clock: Send + Sync {
    /// Current calendar date (UTC).
    fn today(&self) -> NaiveDate;
}

/// Wall-clock UTC date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Utc::now().date_naive()
    }
}

/// A clock pinned to a single date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_returns_pinned_date() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
        assert_eq!(FixedClock(date).today(), date);
    }
}
