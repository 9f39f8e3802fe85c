//! Integration tests for the runner: config file, CSV bars, batch, ranking, artifacts.

use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use rulebench_core::domain::Bar;
use rulebench_core::strategy::RuleKind;
use rulebench_runner::{
    export_ranking_csv, generate_synthetic_bars, load_artifacts, load_bars_csv, rank, run_batch,
    run_strategy, save_artifacts, DataSource, FitnessMetric, RunConfig, StrategySelection,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn synthetic() -> Vec<Bar> {
    generate_synthetic_bars("SPY", d(2020, 1, 1), d(2023, 12, 31))
}

fn write_bars_csv(path: &Path, bars: &[Bar]) {
    let mut file = std::fs::File::create(path).unwrap();
    writeln!(file, "Date,Open,High,Low,Close,Adj Close,Volume").unwrap();
    for b in bars {
        writeln!(
            file,
            "{},{},{},{},{},{},{}",
            b.date, b.open, b.high, b.low, b.close, b.close, b.volume
        )
        .unwrap();
    }
}

#[test]
fn full_catalog_batch_completes() {
    let config = RunConfig::new("SPY");
    let report = run_batch(&config, &synthetic());
    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert_eq!(report.results.len(), RuleKind::ALL.len());
    for r in &report.results {
        assert_eq!(r.equity_curve.len(), r.counts.bars);
        assert!(r.final_equity.is_finite());
        assert!(r.metrics.sharpe.is_finite());
        assert_eq!(r.metrics.trade_count, r.trades.len());
    }
}

#[test]
fn batch_is_deterministic() {
    let mut config = RunConfig::new("SPY");
    config.strategies = vec![
        StrategySelection::new(RuleKind::Macd),
        StrategySelection::new(RuleKind::BollingerBands),
        StrategySelection::new(RuleKind::ParabolicSar),
    ];
    let bars = synthetic();
    let a = run_batch(&config, &bars);
    let b = run_batch(&config, &bars);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn csv_and_memory_bars_agree() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spy.csv");
    let bars = generate_synthetic_bars("SPY", d(2022, 1, 1), d(2022, 12, 31));
    write_bars_csv(&path, &bars);

    let loaded = load_bars_csv(&path, "SPY").unwrap();
    assert_eq!(loaded.len(), bars.len());

    let config = RunConfig::new("SPY");
    let selection = StrategySelection::new(RuleKind::SmaCrossover)
        .with_param("short_window", 10.0)
        .with_param("long_window", 30.0);
    let from_csv = run_strategy(&config, &loaded, &selection).unwrap();
    let from_memory = run_strategy(&config, &bars, &selection).unwrap();
    assert_eq!(from_csv.fills.len(), from_memory.fills.len());
    assert!((from_csv.final_equity - from_memory.final_equity).abs() < 1e-6);
}

#[test]
fn config_file_drives_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.toml");
    std::fs::write(
        &path,
        r#"
symbol = "SPY"
start = "2021-01-01"
end = "2022-12-31"
position_fraction = 0.25

[commission]
type = "PERCENTAGE"
percent = 0.1

[[strategies]]
kind = "buy_and_hold"

[[strategies]]
kind = "donchian_channel"
params = { period = 20 }
"#,
    )
    .unwrap();

    let config = RunConfig::from_file(&path).unwrap();
    let report = run_batch(&config, &synthetic());
    assert!(report.failures.is_empty());
    assert_eq!(report.results.len(), 2);
    for r in &report.results {
        assert!(r.start_date.unwrap() >= d(2021, 1, 1));
        assert!(r.end_date.unwrap() <= d(2022, 12, 31));
        assert!(r.commission_paid > 0.0);
        assert_eq!(r.run_id, config.run_id());
    }
}

#[test]
fn single_run_over_a_year_of_bars() {
    let bars = generate_synthetic_bars("SPY", d(2020, 1, 1), d(2020, 12, 31));
    let r = run_strategy(
        &RunConfig::new("SPY"),
        &bars,
        &StrategySelection::new(RuleKind::BuyAndHold),
    )
    .unwrap();
    assert_eq!(r.equity_curve.len(), bars.len());
    assert_eq!(r.start_date, Some(bars[0].date));
    assert_eq!(r.end_date, Some(bars[bars.len() - 1].date));
    assert_eq!(r.fills.len(), 1);
}

#[test]
fn window_outside_the_data_yields_zero_metrics() {
    let mut config = RunConfig::new("SPY");
    config.start = Some(d(2022, 1, 1));
    config.end = Some(d(2022, 6, 30));
    let bars = generate_synthetic_bars("SPY", d(2020, 1, 1), d(2020, 12, 31));
    let report = run_batch(&config, &bars);
    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert_eq!(report.results.len(), RuleKind::ALL.len());
    assert!(report.results.iter().all(|r| r.trades.is_empty() && r.metrics.sharpe == 0.0));
}

#[test]
fn rise_then_halve_drawdown() {
    let bars: Vec<Bar> = [100.0, 150.0, 200.0, 100.0]
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar {
            symbol: "X".into(),
            date: d(2024, 1, 2) + chrono::Duration::days(i as i64),
            open: c,
            high: c,
            low: c,
            close: c,
            volume: 1,
        })
        .collect();
    let mut config = RunConfig::new("X");
    config.initial_capital = 10_000.0;
    config.position_fraction = 1.0;
    let r = run_strategy(&config, &bars, &StrategySelection::new(RuleKind::BuyAndHold)).unwrap();
    assert_eq!(r.metrics.max_drawdown_pct, -50.0);
    assert_eq!(r.metrics.total_return_pct, 0.0);
}

#[test]
fn ranking_and_artifacts() {
    let mut config = RunConfig::new("SPY");
    config.strategies = vec![
        StrategySelection::new(RuleKind::BuyAndHold),
        StrategySelection::new(RuleKind::Flat),
        StrategySelection::new(RuleKind::Rsi),
    ];
    let mut report = run_batch(&config, &synthetic()).with_source(DataSource::Synthetic);
    rank(&mut report.results, FitnessMetric::Sharpe);

    let sharpes: Vec<f64> = report.results.iter().map(|r| r.metrics.sharpe).collect();
    assert!(sharpes.windows(2).all(|w| w[0] >= w[1]));

    let csv = export_ranking_csv(&report.results, FitnessMetric::Sharpe).unwrap();
    assert_eq!(csv.lines().count(), 4);

    let dir = tempfile::tempdir().unwrap();
    for r in &report.results {
        let out = save_artifacts(&dir.path().join(&r.strategy), r).unwrap();
        let back = load_artifacts(&out).unwrap();
        assert_eq!(back.data_source, DataSource::Synthetic);
        assert_eq!(&back, r);
    }
}
