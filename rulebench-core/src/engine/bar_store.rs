//! Bar store — reveals one symbol's series bar by bar.
//!
//! The store owns the full series but only exposes the prefix that has been
//! advanced to. Nothing downstream can observe a bar before `advance()`
//! reveals it.

use crate::domain::{validate_series, Bar, BarError, BarField};

#[derive(Debug, Clone)]
pub struct BarStore {
    symbol: String,
    bars: Vec<Bar>,
    /// Number of bars revealed so far.
    seen: usize,
}

impl BarStore {
    /// Build a store over a validated series.
    pub fn new(bars: Vec<Bar>) -> Result<Self, BarError> {
        validate_series(&bars)?;
        let symbol = bars[0].symbol.clone();
        Ok(Self {
            symbol,
            bars,
            seen: 0,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Reveal the next bar. Returns false once the series is exhausted.
    pub fn advance(&mut self) -> bool {
        if self.seen >= self.bars.len() {
            return false;
        }
        self.seen += 1;
        true
    }

    /// The last `n` revealed bars, oldest first. Fewer than `n` early in the run.
    pub fn latest(&self, n: usize) -> &[Bar] {
        let start = self.seen.saturating_sub(n);
        &self.bars[start..self.seen]
    }

    /// Every revealed bar, oldest first.
    pub fn history(&self) -> &[Bar] {
        &self.bars[..self.seen]
    }

    pub fn latest_bar(&self) -> Option<&Bar> {
        self.history().last()
    }

    /// Field of the most recent bar, or `None` before the first advance or
    /// when that field is NaN.
    pub fn latest_value(&self, field: BarField) -> Option<f64> {
        self.latest_bar()
            .map(|bar| bar.field(field))
            .filter(|v| !v.is_nan())
    }

    /// Zero-based index of the most recent bar.
    pub fn current_index(&self) -> Option<usize> {
        self.seen.checked_sub(1)
    }

    pub fn seen(&self) -> usize {
        self.seen
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn nothing_visible_before_first_advance() {
        let store = BarStore::new(make_bars(&[100.0, 101.0])).unwrap();
        assert!(store.latest(5).is_empty());
        assert_eq!(store.latest_value(BarField::Close), None);
        assert_eq!(store.current_index(), None);
    }

    #[test]
    fn advance_reveals_in_order_then_exhausts() {
        let mut store = BarStore::new(make_bars(&[100.0, 101.0, 102.0])).unwrap();
        assert!(store.advance());
        assert_eq!(store.latest_value(BarField::Close), Some(100.0));
        assert!(store.advance());
        assert!(store.advance());
        assert_eq!(store.latest_value(BarField::Close), Some(102.0));
        assert!(!store.advance());
        assert!(!store.advance());
        assert_eq!(store.seen(), 3);
    }

    #[test]
    fn latest_returns_short_window_early() {
        let mut store = BarStore::new(make_bars(&[1.0, 2.0, 3.0, 4.0])).unwrap();
        store.advance();
        store.advance();
        let window = store.latest(3);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].close, 1.0);
        assert_eq!(window[1].close, 2.0);
    }

    #[test]
    fn latest_never_includes_unrevealed_bars() {
        let mut store = BarStore::new(make_bars(&[1.0, 2.0, 3.0, 4.0])).unwrap();
        store.advance();
        store.advance();
        let closes: Vec<f64> = store.latest(10).iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 2.0]);
    }

    #[test]
    fn nan_close_reads_as_unavailable() {
        let mut bars = make_bars(&[1.0, 2.0]);
        bars[1].close = f64::NAN;
        let mut store = BarStore::new(bars).unwrap();
        store.advance();
        store.advance();
        assert_eq!(store.latest_value(BarField::Close), None);
        assert!(store.latest_value(BarField::High).is_some());
    }

    #[test]
    fn rejects_unordered_series() {
        let mut bars = make_bars(&[1.0, 2.0]);
        bars.swap(0, 1);
        assert!(BarStore::new(bars).is_err());
    }
}
