//! Fitness function — metric selector for ranking strategies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::metrics::PerformanceMetrics;

/// Which metric to sort by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessMetric {
    #[default]
    TotalReturn,
    NetProfit,
    Sharpe,
    Sortino,
    Calmar,
    Cagr,
    WinRate,
    ProfitFactor,
    MaxDrawdown,
}

impl FitnessMetric {
    pub const ALL: [FitnessMetric; 9] = [
        Self::TotalReturn,
        Self::NetProfit,
        Self::Sharpe,
        Self::Sortino,
        Self::Calmar,
        Self::Cagr,
        Self::WinRate,
        Self::ProfitFactor,
        Self::MaxDrawdown,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::TotalReturn => "total_return",
            Self::NetProfit => "net_profit",
            Self::Sharpe => "sharpe",
            Self::Sortino => "sortino",
            Self::Calmar => "calmar",
            Self::Cagr => "cagr",
            Self::WinRate => "win_rate",
            Self::ProfitFactor => "profit_factor",
            Self::MaxDrawdown => "max_drawdown",
        }
    }

    pub fn extract(&self, metrics: &PerformanceMetrics) -> f64 {
        match self {
            Self::TotalReturn => metrics.total_return_pct,
            Self::NetProfit => metrics.net_profit,
            Self::Sharpe => metrics.sharpe,
            Self::Sortino => metrics.sortino,
            Self::Calmar => metrics.calmar,
            Self::Cagr => metrics.cagr_pct,
            Self::WinRate => metrics.win_rate_pct,
            Self::ProfitFactor => metrics.profit_factor,
            Self::MaxDrawdown => metrics.max_drawdown_pct,
        }
    }

    /// Whether `a` is better than `b`.
    ///
    /// Drawdown is stored negative, so a plain `>` also prefers the
    /// shallower drawdown.
    pub fn is_better(&self, a: f64, b: f64) -> bool {
        a > b
    }
}

impl fmt::Display for FitnessMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FitnessMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|m| m.name()).collect();
                format!("unknown metric '{s}', expected one of: {}", names.join(", "))
            })
    }
}
