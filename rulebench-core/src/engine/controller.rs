//! Simulation controller — the bar-by-bar replay loop.
//!
//! State machine: `Running → Draining → Running → … → Done`.
//!
//! Per bar:
//! 1. Running: advance the bar store. Exhausted → Done. Otherwise publish
//!    `BarAdvance` and enter Draining.
//! 2. Draining: pop one event at a time and route it until the channel is
//!    empty, then return to Running.
//!    - `BarAdvance` → ledger valuation, then strategy evaluation
//!    - `Signal` → ledger sizing
//!    - `Order` → execution simulator
//!    - `Fill` → ledger update, trade log
//! 3. Done: finalize the equity curve and pair fills into trades.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::domain::{
    finalize_equity_curve, Bar, EquityPoint, Event, FillEvent, OpenTrade, TradeRecord,
};
use crate::engine::trades::extract_trades;
use crate::engine::{BarStore, CommissionModel, EventChannel, ExecutionSimulator, PortfolioLedger};
use crate::strategy::Strategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControllerState {
    Running,
    Draining,
    Done,
}

/// Fraction of equity committed per entry when the caller does not choose one.
pub const DEFAULT_POSITION_FRACTION: f64 = 0.05;

/// Run-scoped settings handed to the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub initial_capital: f64,
    /// Fraction of current equity committed per entry, in (0, 1].
    pub position_fraction: f64,
    #[serde(default)]
    pub commission: CommissionModel,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            position_fraction: DEFAULT_POSITION_FRACTION,
            commission: CommissionModel::None,
        }
    }
}

/// Counters collected while draining events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCounts {
    pub bars: usize,
    pub signals: usize,
    pub orders: usize,
    pub fills: usize,
    /// Signals the ledger declined to size.
    pub refused_signals: usize,
    /// Orders dropped for lack of a valid price.
    pub unfilled_orders: usize,
}

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub strategy_id: String,
    pub symbol: String,
    pub initial_capital: f64,
    pub equity_curve: Vec<EquityPoint>,
    /// Every fill, in execution order.
    pub fills: Vec<FillEvent>,
    pub trades: Vec<TradeRecord>,
    pub open_trades: Vec<OpenTrade>,
    pub counts: EventCounts,
    pub commission_paid: f64,
    pub final_equity: f64,
}

/// One simulation run. Owns the bar store, channel and ledger for its lifetime.
pub struct Simulation<'s> {
    store: BarStore,
    channel: EventChannel,
    ledger: PortfolioLedger,
    execution: ExecutionSimulator,
    strategy: &'s mut dyn Strategy,
    state: ControllerState,
    fills: Vec<FillEvent>,
    counts: EventCounts,
}

impl<'s> Simulation<'s> {
    pub fn new(store: BarStore, strategy: &'s mut dyn Strategy, config: &SimulationConfig) -> Self {
        Self {
            store,
            channel: EventChannel::new(),
            ledger: PortfolioLedger::new(config.initial_capital, config.position_fraction),
            execution: ExecutionSimulator::new(config.commission),
            strategy,
            state: ControllerState::Running,
            fills: Vec::new(),
            counts: EventCounts::default(),
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn ledger(&self) -> &PortfolioLedger {
        &self.ledger
    }

    /// Perform one state transition. Returns the new state.
    pub fn step(&mut self) -> ControllerState {
        self.state = match self.state {
            ControllerState::Running => {
                if self.store.advance() {
                    self.counts.bars += 1;
                    self.channel.publish(Event::BarAdvance);
                    ControllerState::Draining
                } else {
                    ControllerState::Done
                }
            }
            ControllerState::Draining => {
                while let Some(event) = self.channel.drain_one() {
                    self.dispatch(event);
                }
                ControllerState::Running
            }
            ControllerState::Done => ControllerState::Done,
        };
        self.state
    }

    /// Drive the loop to completion and return the finalized result.
    pub fn run(mut self) -> SimulationResult {
        while self.step() != ControllerState::Done {}
        self.finish()
    }

    fn dispatch(&mut self, event: Event) {
        trace!(kind = event.kind(), "dispatch");
        match event {
            Event::BarAdvance => {
                // Valuation first: sizing on this bar sees this bar's equity.
                if let Some(bar) = self.store.latest_bar() {
                    self.ledger.on_bar_advance(bar);
                }
                if let Some(signal) = self.strategy.on_event(&Event::BarAdvance, &self.store) {
                    self.counts.signals += 1;
                    self.channel.publish(Event::Signal(signal));
                }
            }
            Event::Signal(signal) => match self.ledger.on_signal(&signal) {
                Some(order) => {
                    self.counts.orders += 1;
                    self.channel.publish(Event::Order(order));
                }
                None => self.counts.refused_signals += 1,
            },
            Event::Order(order) => match self.execution.on_order(&order, &self.store) {
                Some(fill) => self.channel.publish(Event::Fill(fill)),
                None => self.counts.unfilled_orders += 1,
            },
            Event::Fill(fill) => {
                debug!(
                    date = %fill.date,
                    side = ?fill.side,
                    quantity = fill.quantity,
                    price = fill.price,
                    "fill"
                );
                self.ledger.on_fill(&fill);
                self.counts.fills += 1;
                self.fills.push(fill);
            }
        }
    }

    fn finish(self) -> SimulationResult {
        let bars: &[Bar] = self.store.history();
        let (trades, open_trades) = extract_trades(&self.fills, bars);
        let final_equity = self.ledger.total_equity();
        let commission_paid = self.ledger.commission_paid();
        let initial_capital = self.ledger.initial_capital();
        let equity_curve = finalize_equity_curve(self.ledger.snapshots(), initial_capital);

        info!(
            strategy = self.strategy.id(),
            symbol = self.store.symbol(),
            bars = self.counts.bars,
            fills = self.counts.fills,
            trades = trades.len(),
            final_equity,
            "simulation complete"
        );

        SimulationResult {
            strategy_id: self.strategy.id().to_string(),
            symbol: self.store.symbol().to_string(),
            initial_capital,
            equity_curve,
            fills: self.fills,
            trades,
            open_trades,
            counts: self.counts,
            commission_paid,
            final_equity,
        }
    }
}

/// Replay `store` through `strategy` and return the run's result.
pub fn run_simulation(
    store: BarStore,
    strategy: &mut dyn Strategy,
    config: &SimulationConfig,
) -> SimulationResult {
    Simulation::new(store, strategy, config).run()
}
