//! Backtest runner — wires together configuration, engine, and metrics.
//!
//! Two entry points:
//! - `run_strategy()`: one strategy over pre-loaded bars.
//! - `run_batch()`: every selected strategy over the same bars, in parallel.
//!   A failing or panicking run is recorded and never aborts the batch.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use rulebench_core::domain::{Bar, BarError, EquityPoint, FillEvent, OpenTrade, TradeRecord};
use rulebench_core::engine::{run_simulation, BarStore, EventCounts};
use rulebench_core::strategy::{ParamError, RuleStrategy, SuppressionCounts};

use crate::config::{ConfigError, RunConfig, RunId, StrategySelection};
use crate::data_loader::{dataset_hash, filter_range, DataSource};
use crate::fitness::FitnessMetric;
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("bar series error: {0}")]
    Bars(#[from] BarError),
    #[error("strategy error: {0}")]
    Param(#[from] ParamError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub strategy: String,
    /// Resolved parameters, defaults included.
    pub params: BTreeMap<String, f64>,
    pub symbol: String,
    /// First and last bar dates of the window; `None` when the window held no bars.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub initial_capital: f64,
    pub final_equity: f64,
    pub commission_paid: f64,
    pub dataset_hash: String,
    pub data_source: DataSource,
    pub metrics: PerformanceMetrics,
    pub equity_curve: Vec<EquityPoint>,
    pub fills: Vec<FillEvent>,
    pub trades: Vec<TradeRecord>,
    pub open_trades: Vec<OpenTrade>,
    pub counts: EventCounts,
    pub suppressed: SuppressionCounts,
}

/// A run that produced no result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFailure {
    pub strategy: String,
    pub message: String,
}

/// Outcome of a batch: successful results plus isolated failures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: Vec<BacktestResult>,
    pub failures: Vec<RunFailure>,
}

impl BatchReport {
    /// Tag every result with where its bars came from.
    pub fn with_source(mut self, source: DataSource) -> Self {
        for result in &mut self.results {
            result.data_source = source;
        }
        self
    }

    /// Order the results by `metric`, best first.
    pub fn ranked(mut self, metric: FitnessMetric) -> Self {
        rank(&mut self.results, metric);
        self
    }
}

/// Run one strategy over `bars`, restricted to the configured date window.
pub fn run_strategy(
    config: &RunConfig,
    bars: &[Bar],
    selection: &StrategySelection,
) -> Result<BacktestResult, RunError> {
    config.validate_settings()?;

    let window = filter_range(bars, config.start, config.end);
    let hash = dataset_hash(&window);
    let params = selection.kind.resolve(&selection.params)?;
    let rule = selection.kind.build(&selection.params)?;

    let (start_date, end_date) = match (window.first(), window.last()) {
        (Some(first), Some(last)) => (first.date, last.date),
        _ => {
            warn!(
                strategy = selection.kind.name(),
                symbol = %config.symbol,
                "no bars in the configured window"
            );
            return Ok(empty_result(config, selection, params.as_map().clone(), hash));
        }
    };

    let store = BarStore::new(window)?;
    let mut strategy = RuleStrategy::new(rule);

    let sim = run_simulation(store, &mut strategy, &config.simulation());
    let metrics = PerformanceMetrics::compute(&sim.equity_curve, &sim.trades, sim.initial_capital);

    info!(
        strategy = selection.kind.name(),
        symbol = %sim.symbol,
        bars = sim.counts.bars,
        trades = metrics.trade_count,
        total_return_pct = metrics.total_return_pct,
        "run complete"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id(),
        strategy: selection.kind.name().to_string(),
        params: params.as_map().clone(),
        symbol: sim.symbol,
        start_date: Some(start_date),
        end_date: Some(end_date),
        initial_capital: sim.initial_capital,
        final_equity: sim.final_equity,
        commission_paid: sim.commission_paid,
        dataset_hash: hash,
        data_source: DataSource::Memory,
        metrics,
        equity_curve: sim.equity_curve,
        fills: sim.fills,
        trades: sim.trades,
        open_trades: sim.open_trades,
        counts: sim.counts,
        suppressed: strategy.suppressed(),
    })
}

/// A run over a window with no bars: capital untouched, zero-valued metrics.
fn empty_result(
    config: &RunConfig,
    selection: &StrategySelection,
    params: BTreeMap<String, f64>,
    dataset_hash: String,
) -> BacktestResult {
    BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id(),
        strategy: selection.kind.name().to_string(),
        params,
        symbol: config.symbol.clone(),
        start_date: None,
        end_date: None,
        initial_capital: config.initial_capital,
        final_equity: config.initial_capital,
        commission_paid: 0.0,
        dataset_hash,
        data_source: DataSource::Memory,
        metrics: PerformanceMetrics::default(),
        equity_curve: Vec::new(),
        fills: Vec::new(),
        trades: Vec::new(),
        open_trades: Vec::new(),
        counts: EventCounts::default(),
        suppressed: SuppressionCounts::default(),
    }
}

/// Run every selected strategy over the same bars on the rayon pool.
///
/// Results keep the selection order; use [`rank`] to order them by a metric.
pub fn run_batch(config: &RunConfig, bars: &[Bar]) -> BatchReport {
    let selections = config.selections();
    let outcomes: Vec<(String, Result<BacktestResult, String>)> = selections
        .par_iter()
        .map(|selection| {
            let name = selection.kind.name().to_string();
            let outcome = match catch_unwind(AssertUnwindSafe(|| {
                run_strategy(config, bars, selection)
            })) {
                Ok(Ok(result)) => Ok(result),
                Ok(Err(e)) => Err(e.to_string()),
                Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
            };
            (name, outcome)
        })
        .collect();

    let mut report = BatchReport::default();
    for (strategy, outcome) in outcomes {
        match outcome {
            Ok(result) => report.results.push(result),
            Err(message) => {
                warn!(strategy = %strategy, error = %message, "run failed");
                report.failures.push(RunFailure { strategy, message });
            }
        }
    }
    info!(
        succeeded = report.results.len(),
        failed = report.failures.len(),
        "batch complete"
    );
    report
}

/// Sort results best first by `metric`. Ties break by strategy name.
pub fn rank(results: &mut [BacktestResult], metric: FitnessMetric) {
    results.sort_by(|a, b| {
        let (va, vb) = (metric.extract(&a.metrics), metric.extract(&b.metrics));
        vb.total_cmp(&va).then_with(|| a.strategy.cmp(&b.strategy))
    });
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
