//! End-to-end aggregation scenarios over hand-built bar series.

use std::collections::HashMap;

use chrono::NaiveDate;
use marketboard_core::domain::Bar;
use marketboard_core::{
    compute_change, compute_daily_range, compute_span_range, FixedClock, Horizon,
    HorizonAggregator, Window, WindowSet,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn bar(symbol: &str, date: NaiveDate, low: f64, high: f64, close: f64) -> Bar {
    Bar::new(symbol, date, close, high, low, close)
}

#[test]
fn two_symbol_scenario_with_missing_data() {
    let t0 = d(2023, 7, 3);
    let t1 = d(2024, 6, 28);
    let windows = WindowSet::new(vec![Window::new("1Y", t0, t1)]);
    let agg = HorizonAggregator::new(windows, 2);

    let mut by_window = HashMap::new();
    by_window.insert(
        "1Y".to_string(),
        vec![bar("AAA", t0, 9.5, 10.5, 10.0), bar("AAA", t1, 14.0, 16.0, 15.0)],
    );
    let today = vec![bar("AAA", t1, 14.0, 16.0, 15.0)];
    let symbols = vec!["AAA".to_string(), "BBB".to_string()];

    let results = agg.aggregate(&by_window, &symbols, &today);

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].symbol, "AAA");
    assert_eq!(results[0].latest_price, 15.0);
    assert_eq!(results[0].change("1Y"), 50.0);
    assert_eq!(results[0].daily_range, "14.00 - 16.00");
    assert_eq!(results[0].year_range, "9.50 - 16.00");

    assert_eq!(results[1].symbol, "BBB");
    assert_eq!(results[1].latest_price, 0.0);
    assert_eq!(results[1].changes.get("1Y"), Some(0.0));
    assert_eq!(results[1].daily_range, "N/A");
    assert_eq!(results[1].year_range, "N/A");
}

#[test]
fn output_follows_input_symbol_order() {
    let windows = WindowSet::resolve(&[Horizon::OneMonth], &FixedClock(d(2024, 6, 28)));
    let agg = HorizonAggregator::new(windows, 2);
    let symbols: Vec<String> = ["ZZZ", "AAA", "MMM"].iter().map(|s| s.to_string()).collect();

    let results = agg.aggregate(&HashMap::new(), &symbols, &[]);
    let order: Vec<&str> = results.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(order, vec!["ZZZ", "AAA", "MMM"]);
}

#[test]
fn identical_inputs_give_identical_output() {
    let clock = FixedClock(d(2024, 6, 28));
    let windows = WindowSet::resolve(&Horizon::ALL, &clock);
    let agg = HorizonAggregator::new(windows.clone(), 2);

    let mut by_window = HashMap::new();
    for w in &windows {
        by_window.insert(
            w.label.clone(),
            vec![bar("A", w.from, 1.0, 3.0, 2.0), bar("A", w.to, 2.0, 5.0, 4.0)],
        );
    }
    let today = vec![bar("A", d(2024, 6, 28), 2.0, 5.0, 4.0)];
    let symbols = vec!["A".to_string()];

    let first = agg.aggregate(&by_window, &symbols, &today);
    let second = agg.aggregate(&by_window, &symbols, &today);
    assert_eq!(first, second);
    assert!(first[0].changes.iter().all(|(_, v)| v == 100.0));
}

#[test]
fn point_checks() {
    let t = |n| d(2024, 1, n);
    let closes = vec![bar("X", t(1), 0.0, 0.0, 100.0), bar("X", t(2), 0.0, 0.0, 150.0)];
    assert_eq!(compute_change(&closes, "X"), 50.0);

    let zero_base = vec![bar("X", t(1), 0.0, 0.0, 0.0), bar("X", t(2), 0.0, 0.0, 150.0)];
    assert_eq!(compute_change(&zero_base, "X"), 0.0);

    assert_eq!(compute_daily_range(&closes, "Y", 2), "N/A");

    let ranges = vec![bar("X", t(1), 10.0, 20.0, 15.0), bar("X", t(2), 5.0, 25.0, 15.0)];
    assert_eq!(compute_span_range(&ranges, "X", 2), "5.00 - 25.00");
    let reversed: Vec<Bar> = ranges.iter().rev().cloned().collect();
    assert_eq!(compute_span_range(&reversed, "X", 2), "5.00 - 25.00");
}

#[test]
fn json_shape_is_flat_and_ordered() {
    let windows = WindowSet::resolve(
        &[Horizon::FiveDay, Horizon::YearToDate, Horizon::OneYear],
        &FixedClock(d(2024, 6, 28)),
    );
    let agg = HorizonAggregator::new(windows, 4);
    let today = vec![bar("C:EURUSD", d(2024, 6, 28), 1.06891, 1.07234, 1.0712)];
    let results = agg.aggregate(&HashMap::new(), &["C:EURUSD".to_string()], &today);

    let json = serde_json::to_string(&results).unwrap();
    assert_eq!(
        json,
        r#"[{"symbol":"C:EURUSD","latestPrice":1.0712,"changes":{"5D":0.0,"YTD":0.0,"1Y":0.0},"dailyRange":"1.0689 - 1.0723","yearRange":"N/A"}]"#
    );
}
