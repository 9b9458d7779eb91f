//! Property tests for extraction and statistics invariants.
//!
//! Uses proptest to verify:
//! 1. Extracted series are date-ordered, finite and bounded by the window
//! 2. Truncation keeps the most recent valid observations
//! 3. Summary statistics are ordered: min <= avg <= max
//! 4. Rounding is idempotent and stays within half a cent

use chrono::NaiveDate;
use polars::prelude::*;
use proptest::prelude::*;
use screenlab_core::data::{extract_close, DATE_COLUMN};
use screenlab_core::stats::{round2, SummaryStats};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_cell() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        6 => (1.0..500.0_f64).prop_map(Some),
        1 => Just(None),
        1 => Just(Some(f64::NAN)),
    ]
}

fn arb_frame() -> impl Strategy<Value = (Vec<i32>, Vec<Option<f64>>)> {
    prop::collection::vec((0..2000i32, arb_cell()), 1..300)
        .prop_map(|rows| rows.into_iter().unzip())
}

fn frame(days: &[i32], closes: &[Option<f64>]) -> DataFrame {
    DataFrame::new(vec![
        Column::new(DATE_COLUMN.into(), days.to_vec())
            .cast(&DataType::Date)
            .unwrap(),
        Column::new("Close".into(), closes.to_vec()),
        Column::new("Adj Close".into(), closes.to_vec()),
    ])
    .unwrap()
}

fn window() -> impl Strategy<Value = usize> {
    prop_oneof![Just(120usize), Just(360), Just(720), 1..50usize]
}

// ── 1. Series shape ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn extracted_series_is_clean((days, closes) in arb_frame(), window in window()) {
        let df = frame(&days, &closes);
        if let Ok(series) = extract_close("T", &df, window) {
            prop_assert!(series.len() <= window);
            prop_assert!(!series.is_empty());
            prop_assert!(series.dates().windows(2).all(|w| w[0] < w[1]));
            prop_assert!(series.values().iter().all(|v| v.is_finite()));
        } else {
            // Only an all-invalid column can fail here
            prop_assert!(closes.iter().all(|c| !c.is_some_and(f64::is_finite)));
        }
    }
}

// ── 2. Truncate after null drop ──────────────────────────────────────

proptest! {
    #[test]
    fn truncation_keeps_most_recent_valid(
        closes in prop::collection::vec(arb_cell(), 1..200),
        window in 1..60usize,
    ) {
        let days: Vec<i32> = (0..closes.len() as i32).collect();
        let df = frame(&days, &closes);
        let valid: Vec<f64> = closes
            .iter()
            .filter_map(|c| c.filter(|v| v.is_finite()))
            .collect();
        match extract_close("T", &df, window) {
            Ok(series) => {
                let expected = &valid[valid.len().saturating_sub(window)..];
                prop_assert_eq!(series.values(), expected);
                let epoch = NaiveDate::default();
                prop_assert!(series.dates().iter().all(|d| *d >= epoch));
            }
            Err(_) => prop_assert!(valid.is_empty()),
        }
    }
}

// ── 3. Summary ordering ──────────────────────────────────────────────

proptest! {
    #[test]
    fn summary_is_ordered(values in prop::collection::vec(0.01..10_000.0_f64, 1..500)) {
        let s = SummaryStats::compute(&values).unwrap();
        prop_assert!(s.min <= s.avg + 1e-9);
        prop_assert!(s.avg <= s.max + 1e-9);
        prop_assert_eq!(s.last, *values.last().unwrap());

        let r = s.rounded();
        prop_assert!(r.min <= r.avg && r.avg <= r.max);
    }
}

// ── 4. Rounding ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn rounding_is_close_and_idempotent(x in -1e6..1e6_f64) {
        let r = round2(x);
        prop_assert!((r - x).abs() <= 0.005 + 1e-9);
        prop_assert_eq!(round2(r), r);
    }
}
