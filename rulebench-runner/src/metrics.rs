//! Performance summarizer — pure functions from a finished run to statistics.
//!
//! Returns, drawdown and win rate are in percent. Every metric degrades to 0
//! on empty input, a single point, zero variance, or zero trades; none of them
//! yields NaN or infinity.

use serde::{Deserialize, Serialize};
use rulebench_core::domain::{EquityPoint, TradeRecord};

/// Trading days per year for annualization.
pub const TRADING_DAYS: f64 = 252.0;

/// Profit factor reported when there are winners and no losers.
pub const PROFIT_FACTOR_CAP: f64 = 100.0;

/// Aggregate performance metrics for a single run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Final equity over initial capital, percent.
    pub total_return_pct: f64,
    /// Final equity minus initial capital, open position included.
    pub net_profit: f64,
    pub cagr_pct: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub calmar: f64,
    /// Worst peak-to-trough decline, as a negative percent.
    pub max_drawdown_pct: f64,
    pub win_rate_pct: f64,
    pub profit_factor: f64,
    /// Net P&L of closed trades divided by their count.
    pub avg_profit_per_trade: f64,
    pub trade_count: usize,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
}

impl PerformanceMetrics {
    /// Compute all metrics from a finalized equity curve and closed trades.
    pub fn compute(curve: &[EquityPoint], trades: &[TradeRecord], initial_capital: f64) -> Self {
        if curve.is_empty() {
            return Self::default();
        }
        let equity = equity_series(curve, initial_capital);
        let returns: Vec<f64> = curve.iter().map(|p| p.period_return).collect();
        let bars = curve.len();
        Self {
            total_return_pct: total_return(&equity) * 100.0,
            net_profit: net_profit(&equity),
            cagr_pct: cagr(&equity, bars) * 100.0,
            sharpe: sharpe_ratio(&returns),
            sortino: sortino_ratio(&returns),
            calmar: calmar_ratio(&equity, bars),
            max_drawdown_pct: max_drawdown(&equity) * 100.0,
            win_rate_pct: win_rate(trades) * 100.0,
            profit_factor: profit_factor(trades),
            avg_profit_per_trade: avg_profit_per_trade(trades),
            trade_count: trades.len(),
            max_consecutive_wins: max_consecutive(trades, true),
            max_consecutive_losses: max_consecutive(trades, false),
        }
    }
}

/// Initial capital followed by each bar's total equity.
pub fn equity_series(curve: &[EquityPoint], initial_capital: f64) -> Vec<f64> {
    std::iter::once(initial_capital)
        .chain(curve.iter().map(|p| p.total))
        .collect()
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final − initial) / initial.
pub fn total_return(equity: &[f64]) -> f64 {
    match (equity.first(), equity.last()) {
        (Some(&first), Some(&last)) if equity.len() >= 2 && first > 0.0 => (last - first) / first,
        _ => 0.0,
    }
}

pub fn net_profit(equity: &[f64]) -> f64 {
    match (equity.first(), equity.last()) {
        (Some(&first), Some(&last)) if equity.len() >= 2 => last - first,
        _ => 0.0,
    }
}

/// Compound annual growth rate over `bars` trading days.
pub fn cagr(equity: &[f64], bars: usize) -> f64 {
    let (Some(&first), Some(&last)) = (equity.first(), equity.last()) else {
        return 0.0;
    };
    if equity.len() < 2 || bars < 2 || first <= 0.0 || last <= 0.0 {
        return 0.0;
    }
    let years = bars as f64 / TRADING_DAYS;
    (last / first).powf(1.0 / years) - 1.0
}

/// Annualized Sharpe ratio: √252 × mean / sample std of per-bar returns.
/// Zero with fewer than two returns or zero variance.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(returns) / std * TRADING_DAYS.sqrt()
}

/// Annualized Sortino ratio (downside deviation only).
pub fn sortino_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let downside: f64 = returns.iter().filter(|&&r| r < 0.0).map(|r| r * r).sum();
    let downside_std = (downside / returns.len() as f64).sqrt();
    if downside_std < 1e-15 {
        return 0.0;
    }
    mean_f64(returns) / downside_std * TRADING_DAYS.sqrt()
}

/// CAGR / |max drawdown|. Zero without a drawdown or without growth.
pub fn calmar_ratio(equity: &[f64], bars: usize) -> f64 {
    let c = cagr(equity, bars);
    let dd = max_drawdown(equity);
    if dd >= 0.0 || c <= 0.0 {
        return 0.0;
    }
    c / dd.abs()
}

/// Maximum drawdown as a negative fraction (−0.5 = halved from the peak).
pub fn max_drawdown(equity: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut max_dd = 0.0_f64;
    for &eq in equity {
        peak = peak.max(eq);
        if peak > 0.0 {
            max_dd = max_dd.min((eq - peak) / peak);
        }
    }
    max_dd
}

/// Fraction of closed trades with positive net P&L.
pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| t.is_winner()).count() as f64 / trades.len() as f64
}

/// Gross profit / gross loss, capped at [`PROFIT_FACTOR_CAP`].
pub fn profit_factor(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = trades.iter().map(|t| t.net_pnl.max(0.0)).sum();
    let gross_loss: f64 = trades.iter().map(|t| (-t.net_pnl).max(0.0)).sum();
    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { PROFIT_FACTOR_CAP } else { 0.0 };
    }
    (gross_profit / gross_loss).min(PROFIT_FACTOR_CAP)
}

pub fn avg_profit_per_trade(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.net_pnl).sum::<f64>() / trades.len() as f64
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation.
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn max_consecutive(trades: &[TradeRecord], winners: bool) -> usize {
    let mut max_streak = 0;
    let mut current = 0;
    for trade in trades {
        if trade.is_winner() == winners {
            current += 1;
            max_streak = max_streak.max(current);
        } else {
            current = 0;
        }
    }
    max_streak
}
