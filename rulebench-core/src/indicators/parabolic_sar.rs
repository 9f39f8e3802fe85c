//! Parabolic SAR — Wilder's stop-and-reverse.
//!
//! Sequential: each point depends on the trend direction, extreme point (EP)
//! and acceleration factor (AF) carried from the previous bar. The series is
//! recomputed from the start of whatever history it is given.

use crate::domain::Bar;

/// SAR level and trend direction at one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SarPoint {
    pub sar: f64,
    pub uptrend: bool,
}

/// Acceleration settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SarParams {
    pub af_start: f64,
    pub af_step: f64,
    pub af_max: f64,
}

impl Default for SarParams {
    fn default() -> Self {
        Self {
            af_start: 0.02,
            af_step: 0.02,
            af_max: 0.20,
        }
    }
}

/// Compute the SAR series. Index 0 is `None`; direction is seeded from the
/// first two closes. A void bar yields `None` and leaves state untouched.
pub fn parabolic_sar(bars: &[Bar], params: SarParams) -> Vec<Option<SarPoint>> {
    let n = bars.len();
    let mut out = vec![None; n];
    if n < 2 || bars[0].is_void() || bars[1].is_void() {
        return out;
    }

    let mut uptrend = bars[1].close >= bars[0].close;
    let mut af = params.af_start;
    let (mut sar, mut ep) = if uptrend {
        (bars[0].low, bars[1].high)
    } else {
        (bars[0].high, bars[1].low)
    };
    out[1] = Some(SarPoint { sar, uptrend });

    for i in 2..n {
        let bar = &bars[i];
        if bar.is_void() {
            continue;
        }
        let mut next = sar + af * (ep - sar);

        if uptrend {
            // SAR may not rise above the two prior lows.
            next = next.min(bars[i - 1].low).min(bars[i - 2].low);
            if bar.low < next {
                uptrend = false;
                next = ep;
                ep = bar.low;
                af = params.af_start;
            } else if bar.high > ep {
                ep = bar.high;
                af = (af + params.af_step).min(params.af_max);
            }
        } else {
            // SAR may not fall below the two prior highs.
            next = next.max(bars[i - 1].high).max(bars[i - 2].high);
            if bar.high > next {
                uptrend = true;
                next = ep;
                ep = bar.high;
                af = params.af_start;
            } else if bar.low < ep {
                ep = bar.low;
                af = (af + params.af_step).min(params.af_max);
            }
        }

        sar = next;
        out[i] = Some(SarPoint { sar, uptrend });
    }

    out
}
