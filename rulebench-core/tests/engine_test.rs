//! End-to-end engine tests: controller + ledger + execution + strategies.

use chrono::NaiveDate;
use rulebench_core::domain::{Bar, Event, OrderSide, SignalDirection, SignalEvent};
use rulebench_core::engine::{
    run_simulation, BarStore, CommissionModel, SimulationConfig, SimulationResult,
};
use rulebench_core::strategy::{
    build_rule, ParamKind, RuleKind, RuleStrategy, SignalRule, Strategy, Suppression, Trigger,
    MAX_PERIOD,
};
use std::collections::BTreeMap;

fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            symbol: "SPY".to_string(),
            date: base + chrono::Duration::days(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 10_000,
        })
        .collect()
}

/// Deterministic pseudo-random walk.
fn walk(n: usize) -> Vec<f64> {
    let mut price: f64 = 100.0;
    (0..n)
        .map(|i| {
            let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
            price += ((seed % 200) as f64 - 100.0) * 0.05;
            price = price.max(10.0);
            price
        })
        .collect()
}

fn run_rule(kind: RuleKind, closes: &[f64], config: &SimulationConfig) -> SimulationResult {
    let mut strategy = RuleStrategy::new(kind.build(&BTreeMap::new()).unwrap());
    let store = BarStore::new(bars_from_closes(closes)).unwrap();
    run_simulation(store, &mut strategy, config)
}

/// Enters at one bar index and exits at another.
struct Scripted {
    enter_at: usize,
    exit_at: usize,
}

impl Strategy for Scripted {
    fn id(&self) -> &str {
        "scripted"
    }

    fn on_event(&mut self, _event: &Event, bars: &BarStore) -> Option<SignalEvent> {
        let i = bars.current_index()?;
        let bar = bars.latest_bar()?;
        let direction = match i {
            i if i == self.enter_at => SignalDirection::EnterLong,
            i if i == self.exit_at => SignalDirection::Exit,
            _ => return None,
        };
        Some(SignalEvent {
            strategy_id: self.id().to_string(),
            symbol: bar.symbol.clone(),
            date: bar.date,
            direction,
            strength: 1.0,
        })
    }
}

#[test]
fn worked_sizing_example() {
    let closes: Vec<f64> = (0..=10).map(|i| 100.0 + i as f64).collect();
    let config = SimulationConfig {
        initial_capital: 100_000.0,
        position_fraction: 0.05,
        commission: CommissionModel::None,
    };
    let mut strategy = Scripted {
        enter_at: 2,
        exit_at: 8,
    };
    let store = BarStore::new(bars_from_closes(&closes)).unwrap();
    let result = run_simulation(store, &mut strategy, &config);

    let entry = &result.fills[0];
    assert_eq!(entry.side, OrderSide::Buy);
    assert_eq!(entry.quantity, 49);
    assert_eq!(entry.cost, 4998.0);

    let exit = &result.fills[1];
    assert_eq!(exit.side, OrderSide::Sell);
    assert_eq!(exit.quantity, 49);

    assert_eq!(result.trades.len(), 1);
    assert_eq!(result.trades[0].net_pnl, 294.0);
}

#[test]
fn buy_and_hold_profit_formula() {
    let closes = walk(300);
    let config = SimulationConfig {
        initial_capital: 50_000.0,
        position_fraction: 0.5,
        commission: CommissionModel::PerShare { amount: 0.01 },
    };
    let result = run_rule(RuleKind::BuyAndHold, &closes, &config);

    assert_eq!(result.fills.len(), 1);
    assert_eq!(result.fills[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    let shares = result.fills[0].quantity as f64;
    let expected = shares * (closes[closes.len() - 1] - closes[0]) - result.commission_paid;
    let net = result.final_equity - config.initial_capital;
    assert!((net - expected).abs() < 1e-6, "net {net} expected {expected}");
    assert!(result.trades.is_empty());
    assert_eq!(result.open_trades.len(), 1);
}

#[test]
fn flat_strategy_holds_cash() {
    let closes = walk(120);
    let config = SimulationConfig::default();
    let result = run_rule(RuleKind::Flat, &closes, &config);

    assert_eq!(result.equity_curve.len(), 120);
    assert!(result
        .equity_curve
        .iter()
        .all(|p| p.total == config.initial_capital && p.period_return == 0.0));
    assert!(result.fills.is_empty());
    assert_eq!(result.counts.signals, 0);
}

#[test]
fn replay_is_byte_identical() {
    let closes = walk(400);
    let config = SimulationConfig {
        initial_capital: 10_000.0,
        position_fraction: 0.25,
        commission: CommissionModel::Percentage { percent: 0.1 },
    };
    for kind in [RuleKind::SmaCrossover, RuleKind::Rsi, RuleKind::ParabolicSar] {
        let a = serde_json::to_string(&run_rule(kind, &closes, &config)).unwrap();
        let b = serde_json::to_string(&run_rule(kind, &closes, &config)).unwrap();
        assert_eq!(a, b, "{kind} replay differs");
    }
}

#[test]
fn every_rule_completes_and_alternates_fills() {
    let closes = walk(500);
    let config = SimulationConfig::default();
    for kind in RuleKind::ALL {
        let result = run_rule(kind, &closes, &config);
        assert_eq!(result.equity_curve.len(), 500, "{kind}");
        for (i, fill) in result.fills.iter().enumerate() {
            let expected = if i % 2 == 0 { OrderSide::Buy } else { OrderSide::Sell };
            assert_eq!(fill.side, expected, "{kind}: fill {i}");
        }
        assert!(result.equity_curve.iter().all(|p| p.total.is_finite()), "{kind}");
    }
}

#[test]
fn short_series_suppresses_without_error() {
    let rule = build_rule("sma_crossover", &BTreeMap::new()).unwrap();
    let mut strategy = RuleStrategy::new(rule);
    let store = BarStore::new(bars_from_closes(&walk(50))).unwrap();
    let result = run_simulation(store, &mut strategy, &SimulationConfig::default());
    assert!(result.fills.is_empty());
    assert_eq!(strategy.suppressed().insufficient_history, 50);
}

#[test]
fn commission_drags_equity_not_quantity() {
    let closes: Vec<f64> = (0..=10).map(|i| 100.0 + i as f64).collect();
    let run = |commission| {
        let mut strategy = Scripted {
            enter_at: 2,
            exit_at: 8,
        };
        let store = BarStore::new(bars_from_closes(&closes)).unwrap();
        let config = SimulationConfig {
            initial_capital: 100_000.0,
            position_fraction: 0.05,
            commission,
        };
        run_simulation(store, &mut strategy, &config)
    };
    let free = run(CommissionModel::None);
    let paid = run(CommissionModel::PerTrade { amount: 5.0 });
    assert_eq!(free.fills[0].quantity, paid.fills[0].quantity);
    assert_eq!(paid.commission_paid, 10.0);
    assert!((free.final_equity - paid.final_equity - 10.0).abs() < 1e-9);
}

/// Enters while the high is above 100, exits while it is below.
#[derive(Debug)]
struct HighAbove100;

impl SignalRule for HighAbove100 {
    fn name(&self) -> &'static str {
        "high_above_100"
    }

    fn window(&self) -> usize {
        1
    }

    fn evaluate(&self, bars: &[Bar]) -> Result<Trigger, Suppression> {
        let high = bars[bars.len() - 1].high;
        Ok(Trigger::new(high > 100.0, high < 100.0))
    }
}

#[test]
fn dropped_entry_recovers_on_next_exit_trigger() {
    let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let rows = [
        (91.0, 90.0),
        (106.0, f64::NAN),
        (107.0, 106.0),
        (96.0, 95.0),
        (108.0, 107.0),
    ];
    let bars: Vec<Bar> = rows
        .iter()
        .enumerate()
        .map(|(i, &(high, close))| Bar {
            symbol: "SPY".to_string(),
            date: base + chrono::Duration::days(i as i64),
            open: high - 1.0,
            high,
            low: high - 2.0,
            close,
            volume: 10_000,
        })
        .collect();
    let mut strategy = RuleStrategy::new(Box::new(HighAbove100));
    let store = BarStore::new(bars.clone()).unwrap();
    let result = run_simulation(store, &mut strategy, &SimulationConfig::default());

    // Entry on the void bar is dropped, but the strategy still counts itself long
    // until the next exit trigger, which the flat ledger refuses.
    assert_eq!(result.counts.signals, 3);
    assert_eq!(result.counts.unfilled_orders, 1);
    assert_eq!(result.counts.refused_signals, 1);
    assert_eq!(result.fills.len(), 1);
    assert_eq!(result.fills[0].date, bars[4].date);
    assert_eq!(result.fills[0].side, OrderSide::Buy);
    assert!(strategy.is_long("SPY"));
}

#[test]
fn huge_periods_suppress_instead_of_panicking() {
    let closes = walk(60);
    for kind in RuleKind::ALL {
        let overrides: BTreeMap<String, f64> = kind
            .param_specs()
            .iter()
            .filter(|s| s.kind == ParamKind::Integer)
            .map(|s| (s.name.to_string(), 1e20))
            .collect();
        if overrides.is_empty() {
            continue;
        }
        let params = kind.resolve(&overrides).unwrap();
        assert!(params.as_map().values().all(|&v| v <= MAX_PERIOD as f64), "{kind}");

        let mut strategy = RuleStrategy::new(kind.build(&overrides).unwrap());
        let store = BarStore::new(bars_from_closes(&closes)).unwrap();
        let result = run_simulation(store, &mut strategy, &SimulationConfig::default());
        assert!(result.fills.is_empty(), "{kind}");
        assert_eq!(strategy.suppressed().insufficient_history, 60, "{kind}");
    }
}
