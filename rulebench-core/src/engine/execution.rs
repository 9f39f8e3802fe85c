//! Execution simulator — fills market orders at the current bar's close.
//!
//! No slippage, no partial fills, no rejection. A signal computed from bar T's
//! close is filled at bar T's close.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{BarField, FillEvent, OrderEvent, DEFAULT_VENUE};
use crate::engine::BarStore;

/// Commission charged per fill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionModel {
    /// No commission.
    #[default]
    None,

    /// Fixed per-fill commission.
    PerTrade { amount: f64 },

    /// Per-share commission.
    PerShare { amount: f64 },

    /// Percentage of fill notional (1.0 = 1%).
    Percentage { percent: f64 },
}

impl CommissionModel {
    pub fn commission(&self, quantity: u64, price: f64) -> f64 {
        match *self {
            Self::None => 0.0,
            Self::PerTrade { amount } => amount,
            Self::PerShare { amount } => amount * quantity as f64,
            Self::Percentage { percent } => price * quantity as f64 * percent / 100.0,
        }
    }

    /// The model's single rate parameter (0 for `None`).
    pub fn rate(&self) -> f64 {
        match *self {
            Self::None => 0.0,
            Self::PerTrade { amount } | Self::PerShare { amount } => amount,
            Self::Percentage { percent } => percent,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionSimulator {
    commission: CommissionModel,
    venue: String,
}

impl ExecutionSimulator {
    pub fn new(commission: CommissionModel) -> Self {
        Self {
            commission,
            venue: DEFAULT_VENUE.to_string(),
        }
    }

    /// Fill `order` at the latest close. Returns `None` when no valid close
    /// is available for the order's symbol at this bar.
    pub fn on_order(&self, order: &OrderEvent, bars: &BarStore) -> Option<FillEvent> {
        let bar = bars.latest_bar()?;
        if order.symbol != bars.symbol() || order.quantity == 0 {
            debug!(symbol = %order.symbol, quantity = order.quantity, "order not fillable");
            return None;
        }
        let price = match bars.latest_value(BarField::Close) {
            Some(p) if p > 0.0 => p,
            _ => {
                debug!(symbol = %order.symbol, date = %bar.date, "no valid close, order dropped");
                return None;
            }
        };
        Some(FillEvent {
            date: bar.date,
            symbol: order.symbol.clone(),
            venue: self.venue.clone(),
            quantity: order.quantity,
            side: order.side,
            price,
            cost: price * order.quantity as f64,
            commission: self.commission.commission(order.quantity, price),
        })
    }
}

impl Default for ExecutionSimulator {
    fn default() -> Self {
        Self::new(CommissionModel::None)
    }
}
