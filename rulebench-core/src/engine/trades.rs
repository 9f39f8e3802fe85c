//! Trade extraction: pairs BUY and SELL fills into round trips.
//!
//! Runs after the bar loop. Fills arrive in log order; per symbol, a BUY while
//! flat opens a trade and the next SELL closes it. A BUY left unmatched at the
//! end becomes an [`OpenTrade`] marked at the last valid close.

use std::collections::BTreeMap;

use crate::domain::{Bar, FillEvent, OpenTrade, OrderSide, TradeRecord};

struct Entry<'a> {
    fill: &'a FillEvent,
    bar: usize,
}

/// Index of the bar dated `fill.date`. Bars are strictly increasing in time.
fn bar_index(bars: &[Bar], fill: &FillEvent) -> usize {
    bars.binary_search_by_key(&fill.date, |b| b.date)
        .unwrap_or_else(|insert_at| insert_at.saturating_sub(1))
}

/// Last finite, positive close for `symbol`.
fn last_mark(bars: &[Bar], symbol: &str) -> Option<f64> {
    bars.iter()
        .rev()
        .filter(|b| b.symbol == symbol)
        .map(|b| b.close)
        .find(|c| c.is_finite() && *c > 0.0)
}

/// Pair fills into completed trades plus any position still open.
pub fn extract_trades(fills: &[FillEvent], bars: &[Bar]) -> (Vec<TradeRecord>, Vec<OpenTrade>) {
    let mut trades = Vec::new();
    let mut open: BTreeMap<&str, Entry<'_>> = BTreeMap::new();

    for fill in fills {
        match fill.side {
            OrderSide::Buy => {
                open.entry(fill.symbol.as_str()).or_insert(Entry {
                    fill,
                    bar: bar_index(bars, fill),
                });
            }
            OrderSide::Sell => {
                let Some(entry) = open.remove(fill.symbol.as_str()) else {
                    continue;
                };
                let gross_pnl = (fill.price - entry.fill.price) * fill.quantity as f64;
                let commission = entry.fill.commission + fill.commission;
                trades.push(TradeRecord {
                    symbol: fill.symbol.clone(),
                    entry_bar: entry.bar,
                    entry_date: entry.fill.date,
                    entry_price: entry.fill.price,
                    exit_bar: bar_index(bars, fill),
                    exit_date: fill.date,
                    exit_price: fill.price,
                    quantity: fill.quantity,
                    gross_pnl,
                    commission,
                    net_pnl: gross_pnl - commission,
                });
            }
        }
    }

    let still_open = open
        .into_values()
        .map(|entry| {
            let f = entry.fill;
            let mark = last_mark(bars, &f.symbol).unwrap_or(f.price);
            OpenTrade {
                symbol: f.symbol.clone(),
                entry_bar: entry.bar,
                entry_date: f.date,
                entry_price: f.price,
                quantity: f.quantity,
                entry_commission: f.commission,
                unrealized_pnl: (mark - f.price) * f.quantity as f64 - f.commission,
            }
        })
        .collect();

    (trades, still_open)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DEFAULT_VENUE;
    use crate::indicators::make_bars;

    fn fill(bars: &[Bar], i: usize, side: OrderSide, qty: u64, commission: f64) -> FillEvent {
        let price = bars[i].close;
        FillEvent {
            date: bars[i].date,
            symbol: bars[i].symbol.clone(),
            venue: DEFAULT_VENUE.to_string(),
            quantity: qty,
            side,
            price,
            cost: price * qty as f64,
            commission,
        }
    }

    #[test]
    fn pairs_buy_with_following_sell() {
        let bars = make_bars(&[100.0, 101.0, 102.0, 105.0, 104.0]);
        let fills = vec![
            fill(&bars, 1, OrderSide::Buy, 10, 1.0),
            fill(&bars, 3, OrderSide::Sell, 10, 1.0),
        ];
        let (trades, open) = extract_trades(&fills, &bars);
        assert!(open.is_empty());
        assert_eq!(trades.len(), 1);
        let t = &trades[0];
        assert_eq!((t.entry_bar, t.exit_bar), (1, 3));
        assert_eq!(t.gross_pnl, 40.0);
        assert_eq!(t.commission, 2.0);
        assert_eq!(t.net_pnl, 38.0);
    }

    #[test]
    fn unmatched_buy_is_reported_open() {
        let bars = make_bars(&[100.0, 101.0, 103.0]);
        let fills = vec![fill(&bars, 0, OrderSide::Buy, 5, 0.5)];
        let (trades, open) = extract_trades(&fills, &bars);
        assert!(trades.is_empty());
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].unrealized_pnl, 5.0 * 3.0 - 0.5);
    }

    #[test]
    fn stray_sell_is_ignored() {
        let bars = make_bars(&[100.0, 101.0]);
        let fills = vec![fill(&bars, 1, OrderSide::Sell, 5, 0.0)];
        let (trades, open) = extract_trades(&fills, &bars);
        assert!(trades.is_empty() && open.is_empty());
    }

    #[test]
    fn consecutive_round_trips() {
        let bars = make_bars(&[10.0, 12.0, 11.0, 9.0, 13.0]);
        let fills = vec![
            fill(&bars, 0, OrderSide::Buy, 2, 0.0),
            fill(&bars, 1, OrderSide::Sell, 2, 0.0),
            fill(&bars, 3, OrderSide::Buy, 3, 0.0),
            fill(&bars, 4, OrderSide::Sell, 3, 0.0),
        ];
        let (trades, _) = extract_trades(&fills, &bars);
        let pnl: Vec<f64> = trades.iter().map(|t| t.net_pnl).collect();
        assert_eq!(pnl, vec![4.0, 12.0]);
    }
}
