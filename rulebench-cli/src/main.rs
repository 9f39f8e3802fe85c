//! Rulebench CLI — run and rank rule-based strategies over daily bars.
//!
//! Commands:
//! - `strategies` — list every rule with its parameters
//! - `run` — run a batch from a TOML config file and/or flags, print the ranking

mod obs;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;

use rulebench_core::engine::CommissionModel;
use rulebench_core::strategy::{ParamKind, RuleKind};
use rulebench_runner::{
    export_ranking_csv, generate_synthetic_bars, load_bars_csv, run_batch, save_artifacts,
    BatchReport, DataSource, FitnessMetric, RunConfig, StrategySelection,
};

use crate::obs::LogFormat;

/// Synthetic bars default to this window when no dates are given.
const SYNTHETIC_START: (i32, u32, u32) = (2015, 1, 1);
const SYNTHETIC_END: (i32, u32, u32) = (2024, 12, 31);

#[derive(Parser)]
#[command(
    name = "rulebench",
    about = "Rulebench — event-driven daily-bar backtests, ranked"
)]
struct Cli {
    /// Log filter, e.g. "info" or "rulebench_runner=debug". RULEBENCH_LOG overrides it.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every strategy with its parameters, defaults and ranges.
    Strategies,
    /// Run strategies over one symbol's bars and print the ranking.
    Run(RunArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// TOML run configuration. Flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// CSV file with date,open,high,low,close,volume columns.
    #[arg(long, conflicts_with = "synthetic")]
    data: Option<PathBuf>,

    /// Use deterministic synthetic bars instead of a data file.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    #[arg(long)]
    symbol: Option<String>,

    /// First bar date (YYYY-MM-DD).
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last bar date (YYYY-MM-DD).
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Initial capital.
    #[arg(long)]
    capital: Option<f64>,

    /// Percent of equity committed per entry, 1 to 100. Defaults to 5.
    #[arg(long)]
    position_pct: Option<f64>,

    /// none, per_trade:AMOUNT, per_share:AMOUNT or percentage:PERCENT.
    #[arg(long)]
    commission: Option<String>,

    /// Strategy to run (repeatable). Defaults to every strategy.
    #[arg(long = "strategy")]
    strategies: Vec<String>,

    /// Parameter override as strategy.param=value (repeatable).
    #[arg(long = "param")]
    params: Vec<String>,

    /// Metric to rank by.
    #[arg(long, default_value_t = FitnessMetric::TotalReturn)]
    rank_by: FitnessMetric,

    /// Write per-strategy artifacts and ranking.csv here.
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    obs::init_tracing(&cli.log_level, cli.log_format)?;

    match cli.command {
        Commands::Strategies => {
            print_strategies();
            Ok(())
        }
        Commands::Run(args) => run_cmd(args),
    }
}

fn print_strategies() {
    for kind in RuleKind::ALL {
        println!("{kind}");
        for spec in kind.param_specs() {
            let (default, min, max) = match spec.kind {
                ParamKind::Integer => (
                    format!("{}", spec.default as i64),
                    format!("{}", spec.min as i64),
                    format!("{}", spec.max as i64),
                ),
                ParamKind::Real => (
                    format!("{}", spec.default),
                    format!("{}", spec.min),
                    format!("{}", spec.max),
                ),
            };
            println!(
                "    {:<16} {:<8} default {:<8} range [{min}, {max}]",
                spec.name,
                format!("{:?}", spec.kind).to_lowercase(),
                default,
            );
        }
    }
}

fn run_cmd(args: RunArgs) -> Result<()> {
    let config = build_config(&args)?;

    let (bars, source) = if let Some(path) = &args.data {
        let bars = load_bars_csv(path, &config.symbol)
            .with_context(|| format!("loading bars from {}", path.display()))?;
        (bars, DataSource::Csv)
    } else if args.synthetic {
        let start = config.start.unwrap_or_else(|| ymd(SYNTHETIC_START));
        let end = config.end.unwrap_or_else(|| ymd(SYNTHETIC_END));
        (generate_synthetic_bars(&config.symbol, start, end), DataSource::Synthetic)
    } else {
        bail!("one of --data or --synthetic is required");
    };
    info!(symbol = %config.symbol, bars = bars.len(), source = ?source, "bars ready");

    let report = run_batch(&config, &bars)
        .with_source(source)
        .ranked(args.rank_by);

    if source == DataSource::Synthetic {
        println!("WARNING: results based on SYNTHETIC data");
    }
    print_ranking(&report, args.rank_by);

    if let Some(dir) = &args.output_dir {
        for result in &report.results {
            save_artifacts(&dir.join(&result.strategy), result)?;
        }
        let ranking = export_ranking_csv(&report.results, args.rank_by)?;
        std::fs::write(dir.join("ranking.csv"), ranking)
            .with_context(|| format!("failed to write ranking.csv in {}", dir.display()))?;
        println!("Artifacts saved to: {}", dir.display());
    }

    if report.results.is_empty() {
        bail!("every run failed");
    }
    Ok(())
}

/// Merge the optional config file with command-line overrides.
fn build_config(args: &RunArgs) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_file(path)?,
        None => {
            let symbol = args
                .symbol
                .clone()
                .or_else(|| symbol_from_path(args.data.as_ref()?))
                .unwrap_or_else(|| "SYNTH".to_string());
            RunConfig::new(symbol)
        }
    };

    if let Some(symbol) = &args.symbol {
        config.symbol = symbol.clone();
    }
    if args.start.is_some() {
        config.start = args.start;
    }
    if args.end.is_some() {
        config.end = args.end;
    }
    if let Some(capital) = args.capital {
        config.initial_capital = capital;
    }
    if let Some(pct) = args.position_pct {
        if !(1.0..=100.0).contains(&pct) {
            bail!("--position-pct must be between 1 and 100, got {pct}");
        }
        config.position_fraction = pct / 100.0;
    }
    if let Some(raw) = &args.commission {
        config.commission = parse_commission(raw)?;
    }

    if !args.strategies.is_empty() {
        config.strategies = args
            .strategies
            .iter()
            .map(|name| Ok(StrategySelection::new(name.parse::<RuleKind>()?)))
            .collect::<Result<_>>()?;
    } else if config.strategies.is_empty() && !args.params.is_empty() {
        config.strategies = config.selections();
    }

    for raw in &args.params {
        let (kind, key, value) = parse_param(raw)?;
        let Some(selection) = config.strategies.iter_mut().find(|s| s.kind == kind) else {
            bail!("--param {raw}: strategy '{kind}' is not selected");
        };
        selection.params.insert(key, value);
    }

    config.validate()?;
    Ok(config)
}

fn symbol_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_uppercase())
}

fn ymd((y, m, d): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// Parse `none`, `per_trade:1.0`, `per_share:0.005` or `percentage:0.1`.
fn parse_commission(raw: &str) -> Result<CommissionModel> {
    let raw = raw.trim().to_lowercase();
    if raw == "none" {
        return Ok(CommissionModel::None);
    }
    let Some((model, amount)) = raw.split_once(':') else {
        bail!("invalid --commission '{raw}', expected MODEL:AMOUNT or none");
    };
    let amount: f64 = amount
        .parse()
        .with_context(|| format!("invalid commission amount '{amount}'"))?;
    Ok(match model {
        "per_trade" => CommissionModel::PerTrade { amount },
        "per_share" => CommissionModel::PerShare { amount },
        "percentage" => CommissionModel::Percentage { percent: amount },
        _ => bail!("unknown commission model '{model}', expected per_trade, per_share or percentage"),
    })
}

/// Parse `strategy.param=value`.
fn parse_param(raw: &str) -> Result<(RuleKind, String, f64)> {
    let Some((target, value)) = raw.split_once('=') else {
        bail!("invalid --param '{raw}', expected strategy.param=value");
    };
    let Some((strategy, param)) = target.split_once('.') else {
        bail!("invalid --param '{raw}', expected strategy.param=value");
    };
    let kind: RuleKind = strategy.trim().parse()?;
    let value: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("invalid value in --param '{raw}'"))?;
    Ok((kind, param.trim().to_string(), value))
}

fn print_ranking(report: &BatchReport, metric: FitnessMetric) {
    println!();
    println!("Ranked by {metric}");
    println!(
        "{:>4} {:<20} {:>14} {:>10} {:>10} {:>8} {:>9} {:>8} {:>7}",
        "#", "Strategy", "Net Profit", "Return %", "Max DD %", "Sharpe", "Win Rate", "PF", "Trades"
    );
    println!("{}", "-".repeat(98));
    for (i, r) in report.results.iter().enumerate() {
        let m = &r.metrics;
        println!(
            "{:>4} {:<20} {:>14.2} {:>10.2} {:>10.2} {:>8.3} {:>8.1}% {:>8.2} {:>7}",
            i + 1,
            r.strategy,
            m.net_profit,
            m.total_return_pct,
            m.max_drawdown_pct,
            m.sharpe,
            m.win_rate_pct,
            m.profit_factor,
            m.trade_count,
        );
    }

    if !report.failures.is_empty() {
        println!();
        println!("Failures:");
        for failure in &report.failures {
            println!("  {}: {}", failure.strategy, failure.message);
        }
    }
    println!();
}
