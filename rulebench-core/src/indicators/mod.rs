//! Indicator math over bar windows.
//!
//! Every function is pure and works on whatever slice it is handed, so a
//! strategy can only ever see the bars the bar store has revealed. Series
//! outputs are index-aligned with their input; undefined points are NaN.

pub mod atr;
pub mod ema;
pub mod parabolic_sar;
pub mod rolling;

pub use atr::{atr, true_range};
pub use ema::{ema, ewm, ewm_adjusted};
pub use parabolic_sar::{parabolic_sar, SarParams, SarPoint};
pub use rolling::{
    rolling_argmax, rolling_argmin, rolling_max, rolling_mean_abs_dev, rolling_min, rolling_std,
    rolling_sum, shift, sma,
};

use crate::domain::{Bar, BarField};

/// Extract one field from every bar.
pub fn series(bars: &[Bar], field: BarField) -> Vec<f64> {
    bars.iter().map(|b| b.field(field)).collect()
}

/// Typical price (high + low + close) / 3 per bar.
pub fn typical_prices(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(Bar::typical_price).collect()
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let high = open.max(close) + 1.0;
            let low = open.min(close) - 1.0;
            Bar {
                symbol: "TEST".to_string(),
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high,
                low,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
