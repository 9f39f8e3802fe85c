//! Holdings snapshots and the finalized equity curve.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ledger state at the close of one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingsSnapshot {
    pub date: NaiveDate,
    pub cash: f64,
    /// Commission paid to date.
    pub commission: f64,
    /// Market value per symbol (position × latest close).
    pub market_value: BTreeMap<String, f64>,
    pub total: f64,
}

/// One row of the finalized equity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub cash: f64,
    pub commission: f64,
    pub market_value: BTreeMap<String, f64>,
    pub total: f64,
    /// Return over the previous bar (first bar: over initial capital).
    pub period_return: f64,
    /// Growth of one unit of initial capital: `total / initial_capital`.
    pub cumulative_return: f64,
}

/// Attach period and cumulative returns to a sequence of snapshots.
///
/// The first period return is measured against `initial_capital`. A zero or
/// negative base yields a zero return instead of an infinity.
pub fn finalize_equity_curve(
    snapshots: &[HoldingsSnapshot],
    initial_capital: f64,
) -> Vec<EquityPoint> {
    let mut prev_total = initial_capital;
    let mut cumulative = 1.0;
    snapshots
        .iter()
        .map(|snap| {
            let period_return = if prev_total > 0.0 {
                snap.total / prev_total - 1.0
            } else {
                0.0
            };
            cumulative *= 1.0 + period_return;
            prev_total = snap.total;
            EquityPoint {
                date: snap.date,
                cash: snap.cash,
                commission: snap.commission,
                market_value: snap.market_value.clone(),
                total: snap.total,
                period_return,
                cumulative_return: cumulative,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(day: u32, total: f64) -> HoldingsSnapshot {
        HoldingsSnapshot {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            cash: total,
            commission: 0.0,
            market_value: BTreeMap::new(),
            total,
        }
    }

    #[test]
    fn first_return_is_against_initial_capital() {
        let curve = finalize_equity_curve(&[snap(2, 101.0), snap(3, 99.99)], 100.0);
        assert!((curve[0].period_return - 0.01).abs() < 1e-12);
        assert!((curve[1].period_return - (-0.01)).abs() < 1e-12);
    }

    #[test]
    fn cumulative_index_tracks_total_over_initial() {
        let curve = finalize_equity_curve(&[snap(2, 110.0), snap(3, 121.0), snap(4, 60.5)], 100.0);
        for point in &curve {
            assert!((point.cumulative_return - point.total / 100.0).abs() < 1e-12);
        }
    }

    #[test]
    fn flat_curve_has_zero_returns() {
        let curve = finalize_equity_curve(&[snap(2, 100.0), snap(3, 100.0)], 100.0);
        assert!(curve.iter().all(|p| p.period_return == 0.0));
        assert!(curve.iter().all(|p| p.cumulative_return == 1.0));
    }

    #[test]
    fn empty_snapshots_give_empty_curve() {
        assert!(finalize_equity_curve(&[], 100.0).is_empty());
    }
}
