//! TradeRecord — a completed round trip, derived from fills.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A complete round-trip trade: BUY fill paired with the SELL that closed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,

    // ── Entry ──
    pub entry_bar: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_bar: usize,
    pub exit_date: NaiveDate,
    pub exit_price: f64,

    // ── Size ──
    pub quantity: u64,

    // ── PnL ──
    pub gross_pnl: f64,
    pub commission: f64,
    pub net_pnl: f64,
}

impl TradeRecord {
    /// Bars between entry and exit fills.
    pub fn bars_held(&self) -> usize {
        self.exit_bar.saturating_sub(self.entry_bar)
    }

    /// Net return on the entry notional, in percent.
    pub fn return_pct(&self) -> f64 {
        let notional = self.entry_price * self.quantity as f64;
        if notional == 0.0 {
            return 0.0;
        }
        self.net_pnl / notional * 100.0
    }

    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }
}

/// A position still open when the data ran out. Not counted as a trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenTrade {
    pub symbol: String,
    pub entry_bar: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub quantity: u64,
    pub entry_commission: f64,
    /// Mark-to-market P&L at the last close, net of entry commission.
    pub unrealized_pnl: f64,
}
