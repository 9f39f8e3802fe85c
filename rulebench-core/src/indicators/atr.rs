//! True range and Average True Range.
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR uses recursive smoothing with alpha = 1/period.

use super::ema::ewm;
use crate::domain::Bar;

/// TR[0] = high[0] - low[0] (no previous close).
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let n = bars.len();
    let mut tr = vec![f64::NAN; n];

    if n == 0 {
        return tr;
    }

    tr[0] = bars[0].high - bars[0].low;

    for i in 1..n {
        let h = bars[i].high;
        let l = bars[i].low;
        let pc = bars[i - 1].close;
        tr[i] = if pc.is_nan() {
            h - l
        } else {
            (h - l).max((h - pc).abs()).max((l - pc).abs())
        };
    }

    tr
}

pub fn atr(bars: &[Bar], period: usize) -> Vec<f64> {
    ewm(&true_range(bars), 1.0 / period.max(1) as f64)
}
