//! Fixed-window rolling statistics over f64 series.
//!
//! Output is aligned with the input: index `i` covers `values[i+1-period..=i]`.
//! The first `period - 1` outputs are NaN, and any NaN inside a window makes
//! that output NaN.

/// Apply `f` to every full window, NaN where the window is short or tainted.
fn rolling<F>(values: &[f64], period: usize, f: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }
    for end in period..=n {
        let window = &values[end - period..end];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[end - 1] = f(window);
    }
    result
}

pub fn rolling_sum(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| w.iter().sum())
}

/// Simple moving average.
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| w.iter().sum::<f64>() / w.len() as f64)
}

/// Sample standard deviation (n - 1). NaN for `period < 2`.
pub fn rolling_std(values: &[f64], period: usize) -> Vec<f64> {
    if period < 2 {
        return vec![f64::NAN; values.len()];
    }
    rolling(values, period, |w| {
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        let var = w.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (w.len() - 1) as f64;
        var.sqrt()
    })
}

pub fn rolling_max(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| w.iter().copied().fold(f64::MIN, f64::max))
}

pub fn rolling_min(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| w.iter().copied().fold(f64::MAX, f64::min))
}

/// Mean absolute deviation from the window mean.
pub fn rolling_mean_abs_dev(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| {
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        w.iter().map(|v| (v - mean).abs()).sum::<f64>() / w.len() as f64
    })
}

/// Position of the window maximum, 0 = oldest. Ties resolve to the oldest.
pub fn rolling_argmax(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| {
        let mut best = 0;
        for (i, &v) in w.iter().enumerate() {
            if v > w[best] {
                best = i;
            }
        }
        best as f64
    })
}

/// Position of the window minimum, 0 = oldest. Ties resolve to the oldest.
pub fn rolling_argmin(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| {
        let mut best = 0;
        for (i, &v) in w.iter().enumerate() {
            if v < w[best] {
                best = i;
            }
        }
        best as f64
    })
}

/// Shift a series forward by `lag`, filling the head with NaN.
pub fn shift(values: &[f64], lag: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if lag < n {
        result[lag..].copy_from_slice(&values[..n - lag]);
    }
    result
}
