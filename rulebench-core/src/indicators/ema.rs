//! Exponentially weighted moving averages.
//!
//! Recursive form: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], seeded with
//! the first non-NaN input. No warmup NaNs beyond leading NaN inputs, so an
//! EMA over a short window is defined from its first bar.

/// EMA with span-based smoothing: alpha = 2 / (span + 1).
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    ewm(values, 2.0 / (span as f64 + 1.0))
}

/// Recursive EWM with an explicit alpha.
///
/// A NaN input repeats the previous output without updating state.
pub fn ewm(values: &[f64], alpha: f64) -> Vec<f64> {
    let mut result = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &x in values {
        let next = match (prev, x.is_nan()) {
            (None, true) => f64::NAN,
            (None, false) => x,
            (Some(p), true) => p,
            (Some(p), false) => alpha * x + (1.0 - alpha) * p,
        };
        if !next.is_nan() {
            prev = Some(next);
        }
        result.push(next);
    }
    result
}

/// Bias-adjusted EWM: weighted mean of all observations so far with weights
/// (1 - alpha)^age. Output is NaN until `min_periods` non-NaN inputs are seen.
pub fn ewm_adjusted(values: &[f64], alpha: f64, min_periods: usize) -> Vec<f64> {
    let decay = 1.0 - alpha;
    let mut num = 0.0;
    let mut den = 0.0;
    let mut count = 0usize;
    values
        .iter()
        .map(|&x| {
            num *= decay;
            den *= decay;
            if !x.is_nan() {
                num += x;
                den += 1.0;
                count += 1;
            }
            if count >= min_periods.max(1) {
                num / den
            } else {
                f64::NAN
            }
        })
        .collect()
}
