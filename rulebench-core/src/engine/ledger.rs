//! Portfolio ledger — the single owner of positions, cash, and equity.
//!
//! Signals become sized orders here and fills become position/cash updates.
//! After every bar valuation and every fill:
//!
//! `total_equity == cash + Σ(position[s] × latest_close[s])`

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, trace};

use crate::domain::{
    Bar, FillEvent, HoldingsSnapshot, OrderEvent, OrderSide, SignalDirection, SignalEvent, Symbol,
};

/// Tolerance for the equity identity check.
const EQUITY_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct PortfolioLedger {
    initial_capital: f64,
    position_fraction: f64,
    cash: f64,
    commission: f64,
    positions: BTreeMap<Symbol, i64>,
    /// Last valid close per symbol. Carried forward across void bars.
    marks: BTreeMap<Symbol, f64>,
    snapshots: Vec<HoldingsSnapshot>,
}

impl PortfolioLedger {
    pub fn new(initial_capital: f64, position_fraction: f64) -> Self {
        Self {
            initial_capital,
            position_fraction,
            cash: initial_capital,
            commission: 0.0,
            positions: BTreeMap::new(),
            marks: BTreeMap::new(),
            snapshots: Vec::new(),
        }
    }

    // ─── Valuation ───────────────────────────────────────────────────

    /// Mark the new bar and append its holdings snapshot.
    pub fn on_bar_advance(&mut self, bar: &Bar) {
        if bar.close.is_finite() && bar.close > 0.0 {
            self.marks.insert(bar.symbol.clone(), bar.close);
        }
        self.positions.entry(bar.symbol.clone()).or_insert(0);
        let snapshot = self.snapshot(bar.date);
        self.snapshots.push(snapshot);
        self.debug_check_identity();
    }

    // ─── Sizing ──────────────────────────────────────────────────────

    /// Turn a signal into a market order, or `None` if it cannot be honored.
    ///
    /// Entry size is `floor(equity × fraction / price)`, at least one share,
    /// capped by what cash can buy. Exits liquidate the whole position.
    pub fn on_signal(&self, signal: &SignalEvent) -> Option<OrderEvent> {
        let held = self.position(&signal.symbol);
        match signal.direction {
            SignalDirection::EnterLong => {
                if held != 0 {
                    debug!(symbol = %signal.symbol, held, "entry refused: already holding");
                    return None;
                }
                let price = self.mark(&signal.symbol)?;
                let target = (self.total_equity() * self.position_fraction / price).floor();
                let affordable = (self.cash / price).floor().max(0.0);
                let quantity = target.max(1.0).min(affordable) as u64;
                if quantity == 0 {
                    debug!(symbol = %signal.symbol, cash = self.cash, price, "entry refused: cash cannot cover one share");
                    return None;
                }
                trace!(symbol = %signal.symbol, quantity, price, "sized entry");
                Some(OrderEvent::market(&signal.symbol, quantity, OrderSide::Buy))
            }
            SignalDirection::Exit => {
                if held <= 0 {
                    debug!(symbol = %signal.symbol, held, "exit refused: flat");
                    return None;
                }
                Some(OrderEvent::market(&signal.symbol, held as u64, OrderSide::Sell))
            }
        }
    }

    // ─── Fills ───────────────────────────────────────────────────────

    /// Apply a fill. The only place money state changes after construction.
    pub fn on_fill(&mut self, fill: &FillEvent) {
        *self.positions.entry(fill.symbol.clone()).or_insert(0) += fill.signed_quantity();
        self.cash += fill.signed_cost() - fill.commission;
        self.commission += fill.commission;
        self.marks.entry(fill.symbol.clone()).or_insert(fill.price);

        // Fold the fill into this bar's snapshot so the curve shows end-of-bar state.
        if let Some(date) = self.snapshots.last().map(|s| s.date) {
            let refreshed = self.snapshot(date);
            if let Some(last) = self.snapshots.last_mut() {
                *last = refreshed;
            }
        }
        self.debug_check_identity();
    }

    // ─── Queries ─────────────────────────────────────────────────────

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn commission_paid(&self) -> f64 {
        self.commission
    }

    pub fn position(&self, symbol: &str) -> i64 {
        self.positions.get(symbol).copied().unwrap_or(0)
    }

    /// Latest valid close for `symbol`.
    pub fn mark(&self, symbol: &str) -> Option<f64> {
        self.marks.get(symbol).copied()
    }

    pub fn market_value(&self, symbol: &str) -> f64 {
        self.position(symbol) as f64 * self.mark(symbol).unwrap_or(0.0)
    }

    /// `cash + Σ position × latest close`.
    pub fn total_equity(&self) -> f64 {
        self.cash
            + self
                .positions
                .keys()
                .map(|s| self.market_value(s))
                .sum::<f64>()
    }

    pub fn snapshots(&self) -> &[HoldingsSnapshot] {
        &self.snapshots
    }

    /// Absolute gap between the latest snapshot total and a fresh revaluation.
    /// Zero before the first bar.
    pub fn equity_identity_gap(&self) -> f64 {
        self.snapshots
            .last()
            .map(|s| (s.total - self.total_equity()).abs())
            .unwrap_or(0.0)
    }

    fn snapshot(&self, date: NaiveDate) -> HoldingsSnapshot {
        let market_value = self
            .positions
            .keys()
            .map(|s| (s.clone(), self.market_value(s)))
            .collect();
        HoldingsSnapshot {
            date,
            cash: self.cash,
            commission: self.commission,
            market_value,
            total: self.total_equity(),
        }
    }

    fn debug_check_identity(&self) {
        debug_assert!(
            self.equity_identity_gap() < EQUITY_EPSILON * self.initial_capital.abs().max(1.0),
            "equity identity violated: gap={}",
            self.equity_identity_gap()
        );
    }
}
