//! Signal — a strategy's directional recommendation, not yet sized.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Direction of a signal. Strategies are long-only: they either enter a long
/// position or exit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalDirection {
    EnterLong,
    Exit,
}

/// An immutable signal emitted by the strategy port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub strategy_id: String,
    pub symbol: String,
    pub date: NaiveDate,
    pub direction: SignalDirection,
    /// Signal strength (0.0 to 1.0). Rules in this crate always emit 1.0.
    pub strength: f64,
}
