//! Domain types: bars, events, fills, holdings, trades.

pub mod bar;
pub mod event;
pub mod fill;
pub mod holdings;
pub mod order;
pub mod signal;
pub mod trade;

pub use bar::{validate_series, Bar, BarError, BarField};
pub use event::Event;
pub use fill::{FillEvent, DEFAULT_VENUE};
pub use holdings::{finalize_equity_curve, EquityPoint, HoldingsSnapshot};
pub use order::{OrderEvent, OrderKind, OrderSide};
pub use signal::{SignalDirection, SignalEvent};
pub use trade::{OpenTrade, TradeRecord};

/// Symbol type alias
pub type Symbol = String;
