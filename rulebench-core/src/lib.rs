//! Rulebench core — the daily-bar replay engine.
//!
//! - Domain types (bars, events, fills, holdings, trades)
//! - Bar store, event channel and the Running/Draining/Done controller
//! - Portfolio ledger and same-bar execution simulator
//! - Indicator math and the closed catalog of signal rules

pub mod domain;
pub mod engine;
pub mod indicators;
pub mod strategy;

pub use domain::{Bar, BarError, EquityPoint, FillEvent, SignalDirection, TradeRecord};
pub use engine::{run_simulation, BarStore, CommissionModel, SimulationConfig, SimulationResult};
pub use strategy::{build_rule, ParamError, RuleKind, RuleStrategy, SignalRule, Strategy};
