//! Property tests for the performance summarizer: bounded, finite, consistent.

use chrono::NaiveDate;
use proptest::prelude::*;
use rulebench_core::domain::{Bar, TradeRecord};
use rulebench_core::strategy::RuleKind;
use rulebench_runner::metrics::{max_drawdown, profit_factor, PROFIT_FACTOR_CAP};
use rulebench_runner::{run_strategy, PerformanceMetrics, RunConfig, StrategySelection};

fn bars_from_returns(returns: &[f64]) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let mut price = 100.0;
    returns
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let open = price;
            price *= 1.0 + r;
            Bar {
                symbol: "PROP".into(),
                date: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(price) * 1.005,
                low: open.min(price) * 0.995,
                close: price,
                volume: 10_000,
            }
        })
        .collect()
}

fn trade(net_pnl: f64) -> TradeRecord {
    let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    TradeRecord {
        symbol: "PROP".into(),
        entry_bar: 0,
        entry_date: date,
        entry_price: 10.0,
        exit_bar: 1,
        exit_date: date,
        exit_price: 10.0,
        quantity: 1,
        gross_pnl: net_pnl,
        commission: 0.0,
        net_pnl,
    }
}

fn all_finite(m: &PerformanceMetrics) -> bool {
    [
        m.total_return_pct,
        m.net_profit,
        m.cagr_pct,
        m.sharpe,
        m.sortino,
        m.calmar,
        m.max_drawdown_pct,
        m.win_rate_pct,
        m.profit_factor,
        m.avg_profit_per_trade,
    ]
    .iter()
    .all(|v| v.is_finite())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn drawdown_is_a_bounded_loss(equity in prop::collection::vec(1.0f64..1e6, 0..200)) {
        let dd = max_drawdown(&equity);
        prop_assert!(dd <= 0.0);
        prop_assert!(dd > -1.0);
    }

    #[test]
    fn profit_factor_is_bounded(pnls in prop::collection::vec(-1000.0f64..1000.0, 0..50)) {
        let trades: Vec<TradeRecord> = pnls.iter().map(|&p| trade(p)).collect();
        let pf = profit_factor(&trades);
        prop_assert!(pf >= 0.0);
        prop_assert!(pf <= PROFIT_FACTOR_CAP);
    }

    #[test]
    fn metrics_are_finite_and_consistent(
        returns in prop::collection::vec(-0.05f64..0.05, 30..250),
        kind_index in 0usize..RuleKind::ALL.len(),
    ) {
        let kind = RuleKind::ALL[kind_index];
        let bars = bars_from_returns(&returns);
        let r = run_strategy(&RunConfig::new("PROP"), &bars, &StrategySelection::new(kind)).unwrap();
        let m = &r.metrics;

        prop_assert!(all_finite(m));
        prop_assert!((0.0..=100.0).contains(&m.win_rate_pct));
        prop_assert!(m.max_drawdown_pct <= 0.0);
        prop_assert!((m.net_profit - (r.final_equity - r.initial_capital)).abs() < 1e-6);
        prop_assert!(
            (m.total_return_pct - m.net_profit / r.initial_capital * 100.0).abs() < 1e-9
        );
        prop_assert_eq!(m.trade_count, r.trades.len());
    }
}
