//! Oscillator and volume rules.
//!
//! Threshold rules (RSI, stochastic, Williams %R, MFI) compare the latest value
//! with fixed levels. The rest look for a line crossing zero or its own average.

use crate::domain::{Bar, BarField};
use crate::indicators::{
    ewm_adjusted, rolling_max, rolling_mean_abs_dev, rolling_min, rolling_sum, series, shift, sma,
    typical_prices,
};
use crate::strategy::{crossover, last, last_two, ParamSpec, Params, SignalRule, Suppression, Trigger};

const ZERO_LINE: (f64, f64) = (0.0, 0.0);

/// Enter below `oversold`, exit above `overbought`.
fn band_trigger(value: f64, oversold: f64, overbought: f64) -> Trigger {
    Trigger::new(value < oversold, value > overbought)
}

// ─── RSI ─────────────────────────────────────────────────────────────

/// Relative Strength Index with bias-adjusted exponential averages of gains
/// and losses (com = period − 1, at least `period` observations).
#[derive(Debug, Clone)]
pub struct Rsi {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Rsi {
    pub const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::int("period", 14, 5, 30),
        ParamSpec::real("oversold", 30.0, 10.0, 50.0),
        ParamSpec::real("overbought", 70.0, 50.0, 90.0),
    ];

    pub fn from_params(p: &Params) -> Self {
        Self {
            period: p.int("period"),
            oversold: p.real("oversold"),
            overbought: p.real("overbought"),
        }
    }
}

/// RSI series over closes.
pub fn rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len();
    let mut gains = vec![0.0; n];
    let mut losses = vec![0.0; n];
    for i in 1..n {
        let delta = closes[i] - closes[i - 1];
        if delta.is_nan() {
            gains[i] = f64::NAN;
            losses[i] = f64::NAN;
        } else {
            gains[i] = delta.max(0.0);
            losses[i] = (-delta).max(0.0);
        }
    }
    let alpha = 1.0 / period.max(1) as f64;
    let avg_gain = ewm_adjusted(&gains, alpha, period);
    let avg_loss = ewm_adjusted(&losses, alpha, period);
    avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(g, l)| 100.0 - 100.0 / (1.0 + g / l))
        .collect()
}

impl SignalRule for Rsi {
    fn name(&self) -> &'static str {
        "rsi"
    }

    fn window(&self) -> usize {
        self.period.saturating_add(1)
    }

    fn evaluate(&self, bars: &[Bar]) -> Result<Trigger, Suppression> {
        let value = last(&rsi(&series(bars, BarField::Close), self.period), "rsi")?;
        Ok(band_trigger(value, self.oversold, self.overbought))
    }
}

// ─── Stochastic %K / Williams %R ─────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Stochastic {
    pub k_period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Stochastic {
    pub const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::int("k_period", 14, 5, 30),
        ParamSpec::real("oversold", 20.0, 10.0, 50.0),
        ParamSpec::real("overbought", 80.0, 50.0, 90.0),
    ];

    pub fn from_params(p: &Params) -> Self {
        Self {
            k_period: p.int("k_period"),
            oversold: p.real("oversold"),
            overbought: p.real("overbought"),
        }
    }
}

impl SignalRule for Stochastic {
    fn name(&self) -> &'static str {
        "stochastic"
    }

    fn window(&self) -> usize {
        self.k_period
    }

    fn evaluate(&self, bars: &[Bar]) -> Result<Trigger, Suppression> {
        let low = last(&rolling_min(&series(bars, BarField::Low), self.k_period), "lowest_low")?;
        let high = last(&rolling_max(&series(bars, BarField::High), self.k_period), "highest_high")?;
        let close = last(&series(bars, BarField::Close), "close")?;
        let k = 100.0 * (close - low) / (high - low);
        if k.is_nan() {
            return Err(Suppression::UndefinedIndicator("percent_k"));
        }
        Ok(band_trigger(k, self.oversold, self.overbought))
    }
}

#[derive(Debug, Clone)]
pub struct WilliamsR {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl WilliamsR {
    pub const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::int("period", 14, 5, 30),
        ParamSpec::real("oversold", -80.0, -95.0, -50.0),
        ParamSpec::real("overbought", -20.0, -50.0, -5.0),
    ];

    pub fn from_params(p: &Params) -> Self {
        Self {
            period: p.int("period"),
            oversold: p.real("oversold"),
            overbought: p.real("overbought"),
        }
    }
}

impl SignalRule for WilliamsR {
    fn name(&self) -> &'static str {
        "williams_r"
    }

    fn window(&self) -> usize {
        self.period
    }

    fn evaluate(&self, bars: &[Bar]) -> Result<Trigger, Suppression> {
        let low = last(&rolling_min(&series(bars, BarField::Low), self.period), "lowest_low")?;
        let high = last(&rolling_max(&series(bars, BarField::High), self.period), "highest_high")?;
        let close = last(&series(bars, BarField::Close), "close")?;
        let r = -100.0 * (high - close) / (high - low);
        if r.is_nan() {
            return Err(Suppression::UndefinedIndicator("williams_r"));
        }
        Ok(band_trigger(r, self.oversold, self.overbought))
    }
}

// ─── CCI ─────────────────────────────────────────────────────────────

/// Commodity Channel Index: enters on a cross back above `oversold`, exits
/// on a cross back below `overbought`.
#[derive(Debug, Clone)]
pub struct Cci {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Cci {
    pub const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::int("period", 20, 10, 40),
        ParamSpec::real("oversold", -100.0, -200.0, -50.0),
        ParamSpec::real("overbought", 100.0, 50.0, 200.0),
    ];

    pub fn from_params(p: &Params) -> Self {
        Self {
            period: p.int("period"),
            oversold: p.real("oversold"),
            overbought: p.real("overbought"),
        }
    }
}

impl SignalRule for Cci {
    fn name(&self) -> &'static str {
        "cci"
    }

    fn window(&self) -> usize {
        self.period.saturating_add(1)
    }

    fn evaluate(&self, bars: &[Bar]) -> Result<Trigger, Suppression> {
        let tp = typical_prices(bars);
        let mean = sma(&tp, self.period);
        let dev = rolling_mean_abs_dev(&tp, self.period);
        let cci: Vec<f64> = (0..tp.len())
            .map(|i| (tp[i] - mean[i]) / (0.015 * dev[i]))
            .collect();
        let (prev, cur) = last_two(&cci, "cci")?;
        Ok(Trigger::new(
            cur > self.oversold && prev <= self.oversold,
            cur < self.overbought && prev >= self.overbought,
        ))
    }
}

// ─── Money Flow Index ────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MoneyFlowIndex {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl MoneyFlowIndex {
    pub const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::int("period", 14, 5, 30),
        ParamSpec::real("oversold", 20.0, 10.0, 50.0),
        ParamSpec::real("overbought", 80.0, 50.0, 90.0),
    ];

    pub fn from_params(p: &Params) -> Self {
        Self {
            period: p.int("period"),
            oversold: p.real("oversold"),
            overbought: p.real("overbought"),
        }
    }
}

impl SignalRule for MoneyFlowIndex {
    fn name(&self) -> &'static str {
        "money_flow_index"
    }

    fn window(&self) -> usize {
        self.period.saturating_add(1)
    }

    fn evaluate(&self, bars: &[Bar]) -> Result<Trigger, Suppression> {
        let tp = typical_prices(bars);
        let n = tp.len();
        let mut positive = vec![0.0; n];
        let mut negative = vec![0.0; n];
        for i in 1..n {
            let flow = tp[i] * bars[i].volume as f64;
            if tp[i] > tp[i - 1] {
                positive[i] = flow;
            } else if tp[i] < tp[i - 1] {
                negative[i] = flow;
            }
        }
        let pos = last(&rolling_sum(&positive, self.period), "positive_flow")?;
        let neg = last(&rolling_sum(&negative, self.period), "negative_flow")?;
        let mfi = 100.0 - 100.0 / (1.0 + pos / neg);
        if mfi.is_nan() {
            return Err(Suppression::UndefinedIndicator("mfi"));
        }
        Ok(band_trigger(mfi, self.oversold, self.overbought))
    }
}

// ─── Rate of change ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RateOfChange {
    pub roc_period: usize,
    pub ma_period: usize,
}

impl RateOfChange {
    pub const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::int("roc_period", 12, 5, 40),
        ParamSpec::int("ma_period", 20, 5, 50),
    ];

    pub fn from_params(p: &Params) -> Self {
        Self {
            roc_period: p.int("roc_period"),
            ma_period: p.int("ma_period"),
        }
    }
}

impl SignalRule for RateOfChange {
    fn name(&self) -> &'static str {
        "rate_of_change"
    }

    fn window(&self) -> usize {
        self.roc_period
            .saturating_add(self.ma_period)
            .saturating_add(1)
    }

    fn evaluate(&self, bars: &[Bar]) -> Result<Trigger, Suppression> {
        let c = series(bars, BarField::Close);
        let base = shift(&c, self.roc_period);
        let roc: Vec<f64> = c.iter().zip(&base).map(|(x, b)| (x - b) / b * 100.0).collect();
        let roc_ma = sma(&roc, self.ma_period);
        Ok(crossover(last_two(&roc, "roc")?, last_two(&roc_ma, "roc_ma")?))
    }
}

// ─── Awesome oscillator ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AwesomeOscillator {
    pub short_period: usize,
    pub long_period: usize,
}

impl AwesomeOscillator {
    pub const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::int("short_period", 5, 2, 20),
        ParamSpec::int("long_period", 34, 10, 100),
    ];

    pub fn from_params(p: &Params) -> Self {
        Self {
            short_period: p.int("short_period"),
            long_period: p.int("long_period"),
        }
    }
}

impl SignalRule for AwesomeOscillator {
    fn name(&self) -> &'static str {
        "awesome_oscillator"
    }

    fn window(&self) -> usize {
        self.short_period.max(self.long_period).saturating_add(1)
    }

    fn evaluate(&self, bars: &[Bar]) -> Result<Trigger, Suppression> {
        let mid: Vec<f64> = bars.iter().map(|b| (b.high + b.low) / 2.0).collect();
        let fast = sma(&mid, self.short_period);
        let slow = sma(&mid, self.long_period);
        let ao: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        Ok(crossover(last_two(&ao, "awesome_oscillator")?, ZERO_LINE))
    }
}

// ─── Chaikin money flow ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ChaikinMoneyFlow {
    pub period: usize,
}

impl ChaikinMoneyFlow {
    pub const PARAMS: &'static [ParamSpec] = &[ParamSpec::int("period", 20, 5, 50)];

    pub fn from_params(p: &Params) -> Self {
        Self {
            period: p.int("period"),
        }
    }
}

impl SignalRule for ChaikinMoneyFlow {
    fn name(&self) -> &'static str {
        "chaikin_money_flow"
    }

    fn window(&self) -> usize {
        self.period.saturating_add(1)
    }

    fn evaluate(&self, bars: &[Bar]) -> Result<Trigger, Suppression> {
        let flow_volume: Vec<f64> = bars
            .iter()
            .map(|b| {
                let multiplier = ((b.close - b.low) - (b.high - b.close)) / (b.high - b.low);
                multiplier * b.volume as f64
            })
            .collect();
        let volume = series(bars, BarField::Volume);
        let num = rolling_sum(&flow_volume, self.period);
        let den = rolling_sum(&volume, self.period);
        let cmf: Vec<f64> = num.iter().zip(&den).map(|(n, d)| n / d).collect();
        Ok(crossover(last_two(&cmf, "cmf")?, ZERO_LINE))
    }
}

// ─── On-balance volume ───────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OnBalanceVolume {
    pub ma_period: usize,
}

impl OnBalanceVolume {
    pub const PARAMS: &'static [ParamSpec] = &[ParamSpec::int("ma_period", 20, 10, 50)];

    pub fn from_params(p: &Params) -> Self {
        Self {
            ma_period: p.int("ma_period"),
        }
    }
}

/// Cumulative signed volume, starting at zero on the first bar of the window.
pub fn on_balance_volume(bars: &[Bar]) -> Vec<f64> {
    let mut total = 0.0;
    let mut out = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        if i > 0 {
            let delta = bar.close - bars[i - 1].close;
            if delta > 0.0 {
                total += bar.volume as f64;
            } else if delta < 0.0 {
                total -= bar.volume as f64;
            }
        }
        out.push(total);
    }
    out
}

impl SignalRule for OnBalanceVolume {
    fn name(&self) -> &'static str {
        "on_balance_volume"
    }

    fn window(&self) -> usize {
        self.ma_period.saturating_add(1)
    }

    fn evaluate(&self, bars: &[Bar]) -> Result<Trigger, Suppression> {
        let obv = on_balance_volume(bars);
        let obv_ma = sma(&obv, self.ma_period);
        Ok(crossover(last_two(&obv, "obv")?, last_two(&obv_ma, "obv_ma")?))
    }
}

// ─── VWAP crossover ──────────────────────────────────────────────────

/// Window-anchored VWAP of typical price against its moving average.
#[derive(Debug, Clone)]
pub struct VwapCrossover {
    pub ma_period: usize,
}

impl VwapCrossover {
    pub const PARAMS: &'static [ParamSpec] = &[ParamSpec::int("ma_period", 20, 2, 50)];

    pub fn from_params(p: &Params) -> Self {
        Self {
            ma_period: p.int("ma_period"),
        }
    }
}

impl SignalRule for VwapCrossover {
    fn name(&self) -> &'static str {
        "vwap_crossover"
    }

    fn window(&self) -> usize {
        self.ma_period.saturating_add(1)
    }

    fn evaluate(&self, bars: &[Bar]) -> Result<Trigger, Suppression> {
        let mut pv = 0.0;
        let mut vol = 0.0;
        let vwap: Vec<f64> = bars
            .iter()
            .map(|b| {
                pv += b.typical_price() * b.volume as f64;
                vol += b.volume as f64;
                pv / vol
            })
            .collect();
        let vwap_ma = sma(&vwap, self.ma_period);
        Ok(crossover(last_two(&vwap, "vwap")?, last_two(&vwap_ma, "vwap_ma")?))
    }
}
