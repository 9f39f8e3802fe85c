//! Event-driven replay engine.
//!
//! The controller owns a [`BarStore`] and an [`EventChannel`] for one run and
//! routes events between the strategy, the [`PortfolioLedger`] and the
//! [`ExecutionSimulator`].

pub mod bar_store;
pub mod controller;
pub mod event_channel;
pub mod execution;
pub mod ledger;
pub mod trades;

pub use bar_store::BarStore;
pub use controller::{
    run_simulation, ControllerState, EventCounts, Simulation, SimulationConfig, SimulationResult,
    DEFAULT_POSITION_FRACTION,
};
pub use event_channel::EventChannel;
pub use execution::{CommissionModel, ExecutionSimulator};
pub use ledger::PortfolioLedger;
pub use trades::extract_trades;
