//! Export — JSON and CSV artifacts for runs and rankings.
//!
//! Persisted JSON carries a `schema_version`; files written by a newer
//! version are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rulebench_core::domain::{EquityPoint, TradeRecord};

use crate::fitness::FitnessMetric;
use crate::runner::{BacktestResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting newer schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the equity curve, one row per bar.
///
/// Columns: date, cash, commission, holdings, total, period_return,
/// cumulative_return. `holdings` is the summed market value of all positions.
pub fn export_equity_csv(curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "date",
        "cash",
        "commission",
        "holdings",
        "total",
        "period_return",
        "cumulative_return",
    ])?;
    for p in curve {
        let holdings: f64 = p.market_value.values().sum();
        wtr.write_record([
            &p.date.to_string(),
            &format!("{:.2}", p.cash),
            &format!("{:.2}", p.commission),
            &format!("{:.2}", holdings),
            &format!("{:.2}", p.total),
            &format!("{:.8}", p.period_return),
            &format!("{:.8}", p.cumulative_return),
        ])?;
    }
    finish(wtr)
}

/// Export closed trades.
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "symbol",
        "entry_bar",
        "entry_date",
        "entry_price",
        "exit_bar",
        "exit_date",
        "exit_price",
        "quantity",
        "gross_pnl",
        "commission",
        "net_pnl",
        "bars_held",
        "return_pct",
    ])?;
    for t in trades {
        wtr.write_record([
            &t.symbol,
            &t.entry_bar.to_string(),
            &t.entry_date.to_string(),
            &format!("{:.6}", t.entry_price),
            &t.exit_bar.to_string(),
            &t.exit_date.to_string(),
            &format!("{:.6}", t.exit_price),
            &t.quantity.to_string(),
            &format!("{:.2}", t.gross_pnl),
            &format!("{:.2}", t.commission),
            &format!("{:.2}", t.net_pnl),
            &t.bars_held().to_string(),
            &format!("{:.4}", t.return_pct()),
        ])?;
    }
    finish(wtr)
}

/// Export a ranking, assumed already ordered, with the ranking metric first.
pub fn export_ranking_csv(results: &[BacktestResult], metric: FitnessMetric) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "rank",
        "strategy",
        metric.name(),
        "net_profit",
        "total_return_pct",
        "max_drawdown_pct",
        "sharpe",
        "win_rate_pct",
        "profit_factor",
        "trades",
    ])?;
    for (i, r) in results.iter().enumerate() {
        let m = &r.metrics;
        wtr.write_record([
            &(i + 1).to_string(),
            &r.strategy,
            &format!("{:.6}", metric.extract(m)),
            &format!("{:.2}", m.net_profit),
            &format!("{:.4}", m.total_return_pct),
            &format!("{:.4}", m.max_drawdown_pct),
            &format!("{:.4}", m.sharpe),
            &format!("{:.2}", m.win_rate_pct),
            &format!("{:.4}", m.profit_factor),
            &m.trade_count.to_string(),
        ])?;
    }
    finish(wtr)
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for one run into `dir`:
/// - `result.json` — the full `BacktestResult`
/// - `equity.csv` — bar-by-bar equity curve
/// - `trades.csv` — closed trades
///
/// Creates `dir` if needed and returns it.
pub fn save_artifacts(dir: &Path, result: &BacktestResult) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create artifact dir: {}", dir.display()))?;

    std::fs::write(dir.join("result.json"), export_json(result)?)
        .with_context(|| format!("failed to write result.json in {}", dir.display()))?;
    std::fs::write(dir.join("equity.csv"), export_equity_csv(&result.equity_curve)?)
        .with_context(|| format!("failed to write equity.csv in {}", dir.display()))?;
    std::fs::write(dir.join("trades.csv"), export_trades_csv(&result.trades)?)
        .with_context(|| format!("failed to write trades.csv in {}", dir.display()))?;

    Ok(dir.to_path_buf())
}

/// Load a `BacktestResult` from an artifact directory's result.json.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
