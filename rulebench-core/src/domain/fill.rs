use super::order::OrderSide;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Venue label stamped on simulated fills.
pub const DEFAULT_VENUE: &str = "ARCA";

/// Executed result of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillEvent {
    pub date: NaiveDate,
    pub symbol: String,
    pub venue: String,
    pub quantity: u64,
    pub side: OrderSide,
    pub price: f64,
    /// Gross notional: `price * quantity`, unsigned.
    pub cost: f64,
    pub commission: f64,
}

impl FillEvent {
    /// Signed change in shares this fill applies to a position.
    pub fn signed_quantity(&self) -> i64 {
        self.side.sign() * self.quantity as i64
    }

    /// Signed cash impact before commission (negative for buys).
    pub fn signed_cost(&self) -> f64 {
        -(self.side.sign() as f64) * self.cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(side: OrderSide) -> FillEvent {
        FillEvent {
            date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            symbol: "SPY".into(),
            venue: DEFAULT_VENUE.into(),
            quantity: 49,
            side,
            price: 102.0,
            cost: 4998.0,
            commission: 1.0,
        }
    }

    #[test]
    fn buy_reduces_cash_and_adds_shares() {
        let f = fill(OrderSide::Buy);
        assert_eq!(f.signed_quantity(), 49);
        assert_eq!(f.signed_cost(), -4998.0);
    }

    #[test]
    fn sell_adds_cash_and_removes_shares() {
        let f = fill(OrderSide::Sell);
        assert_eq!(f.signed_quantity(), -49);
        assert_eq!(f.signed_cost(), 4998.0);
    }
}
