//! Look-ahead contamination tests for every rule.
//!
//! Invariant: the signal emitted at bar t may not depend on bars after t.
//!
//! Method: replay a truncated series (bars 0..150) and the full series
//! (bars 0..300). Signals and fills on bars 0..150 must be identical.

use chrono::NaiveDate;
use rulebench_core::domain::Bar;
use rulebench_core::engine::{run_simulation, BarStore, SimulationConfig};
use rulebench_core::strategy::{RuleKind, RuleStrategy};
use std::collections::BTreeMap;

const TRUNCATED: usize = 150;
const FULL: usize = 300;

/// Synthetic OHLCV with a deterministic LCG walk.
fn make_test_bars(n: usize) -> Vec<Bar> {
    let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let mut price = 100.0_f64;
    (0..n)
        .map(|i| {
            let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
            price = (price + ((seed % 200) as f64 - 100.0) * 0.05).max(10.0);
            let open = price - 0.5;
            let close = price + 0.3;
            Bar {
                symbol: "TEST".to_string(),
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 2.0,
                low: open.min(close) - 2.0,
                close,
                volume: 1000 + i as u64 * 100,
            }
        })
        .collect()
}

/// Periods short enough to produce signals inside the truncated span.
fn short_overrides(kind: RuleKind) -> BTreeMap<String, f64> {
    kind.param_specs()
        .iter()
        .filter(|s| s.name.contains("period") || s.name.contains("window"))
        .map(|s| (s.name.to_string(), s.min))
        .collect()
}

#[test]
fn no_rule_sees_future_bars() {
    let bars = make_test_bars(FULL);
    let config = SimulationConfig::default();
    for kind in RuleKind::ALL {
        let run = |series: &[Bar]| {
            let rule = kind.build(&short_overrides(kind)).unwrap();
            let mut strategy = RuleStrategy::new(rule);
            run_simulation(BarStore::new(series.to_vec()).unwrap(), &mut strategy, &config)
        };
        let short = run(&bars[..TRUNCATED]);
        let full = run(&bars);

        let cutoff = bars[TRUNCATED - 1].date;
        let full_fills: Vec<_> = full.fills.iter().filter(|f| f.date <= cutoff).collect();
        let short_fills: Vec<_> = short.fills.iter().collect();
        assert_eq!(short_fills, full_fills, "{kind}: fills diverge before cutoff");

        for (a, b) in short.equity_curve.iter().zip(&full.equity_curve) {
            assert_eq!(a.total, b.total, "{kind}: equity diverges on {}", a.date);
        }
    }
}
