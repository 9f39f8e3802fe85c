//! Event — the tagged union carried by the event channel.

use super::fill::FillEvent;
use super::order::OrderEvent;
use super::signal::SignalEvent;
use serde::{Deserialize, Serialize};

/// Events exchanged between engine components. Immutable value objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// A new bar is available in the bar store.
    BarAdvance,
    Signal(SignalEvent),
    Order(OrderEvent),
    Fill(FillEvent),
}

impl Event {
    /// Short tag for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BarAdvance => "bar_advance",
            Self::Signal(_) => "signal",
            Self::Order(_) => "order",
            Self::Fill(_) => "fill",
        }
    }
}
