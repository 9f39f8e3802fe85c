//! Price-channel and directional rules.

use crate::domain::{Bar, BarField};
use crate::indicators::{
    atr, ema, rolling_argmax, rolling_argmin, rolling_max, rolling_min, rolling_std, rolling_sum,
    series, shift, sma, true_range,
};
use crate::strategy::{crossover, last, last_two, ParamSpec, Params, SignalRule, Suppression, Trigger};

fn latest_close(bars: &[Bar]) -> Result<f64, Suppression> {
    last(&series(bars, BarField::Close), "close")
}

// ─── Bollinger bands ─────────────────────────────────────────────────

/// Mean reversion: buy below the lower band, sell above the upper band.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    pub window: usize,
    pub num_std: f64,
}

impl BollingerBands {
    pub const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::int("window", 20, 10, 50),
        ParamSpec::real("num_std", 2.0, 1.0, 3.0),
    ];

    pub fn from_params(p: &Params) -> Self {
        Self {
            window: p.int("window"),
            num_std: p.real("num_std"),
        }
    }
}

impl SignalRule for BollingerBands {
    fn name(&self) -> &'static str {
        "bollinger_bands"
    }

    fn window(&self) -> usize {
        self.window
    }

    fn evaluate(&self, bars: &[Bar]) -> Result<Trigger, Suppression> {
        let c = series(bars, BarField::Close);
        let middle = last(&sma(&c, self.window), "bollinger_middle")?;
        let std = last(&rolling_std(&c, self.window), "bollinger_std")?;
        let close = latest_close(bars)?;
        Ok(Trigger::new(
            close < middle - self.num_std * std,
            close > middle + self.num_std * std,
        ))
    }
}

// ─── Donchian channel ────────────────────────────────────────────────

/// Breakout above the prior `period` highs, exit below the prior lows.
#[derive(Debug, Clone)]
pub struct DonchianChannel {
    pub period: usize,
}

impl DonchianChannel {
    pub const PARAMS: &'static [ParamSpec] = &[ParamSpec::int("period", 20, 10, 50)];

    pub fn from_params(p: &Params) -> Self {
        Self {
            period: p.int("period"),
        }
    }
}

impl SignalRule for DonchianChannel {
    fn name(&self) -> &'static str {
        "donchian_channel"
    }

    fn window(&self) -> usize {
        self.period.saturating_add(1)
    }

    fn evaluate(&self, bars: &[Bar]) -> Result<Trigger, Suppression> {
        let highs = shift(&series(bars, BarField::High), 1);
        let lows = shift(&series(bars, BarField::Low), 1);
        let upper = last(&rolling_max(&highs, self.period), "donchian_upper")?;
        let lower = last(&rolling_min(&lows, self.period), "donchian_lower")?;
        let close = latest_close(bars)?;
        Ok(Trigger::new(close > upper, close < lower))
    }
}

// ─── Keltner channel / ATR channel ───────────────────────────────────

#[derive(Debug, Clone)]
pub struct KeltnerChannel {
    pub ema_period: usize,
    pub atr_period: usize,
    pub atr_multiplier: f64,
}

impl KeltnerChannel {
    pub const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::int("ema_period", 20, 10, 50),
        ParamSpec::int("atr_period", 10, 5, 30),
        ParamSpec::real("atr_multiplier", 2.0, 1.0, 4.0),
    ];

    pub fn from_params(p: &Params) -> Self {
        Self {
            ema_period: p.int("ema_period"),
            atr_period: p.int("atr_period"),
            atr_multiplier: p.real("atr_multiplier"),
        }
    }
}

impl SignalRule for KeltnerChannel {
    fn name(&self) -> &'static str {
        "keltner_channel"
    }

    fn window(&self) -> usize {
        self.ema_period.max(self.atr_period)
    }

    fn evaluate(&self, bars: &[Bar]) -> Result<Trigger, Suppression> {
        let middle = last(&ema(&series(bars, BarField::Close), self.ema_period), "keltner_middle")?;
        let range = last(&atr(bars, self.atr_period), "atr")?;
        let close = latest_close(bars)?;
        Ok(Trigger::new(
            close > middle + self.atr_multiplier * range,
            close < middle,
        ))
    }
}

/// Volatility breakout above SMA + k·ATR. Has no exit condition; once long,
/// the position is held to the end of the run.
#[derive(Debug, Clone)]
pub struct AtrChannel {
    pub sma_period: usize,
    pub atr_period: usize,
    pub atr_multiplier: f64,
}

impl AtrChannel {
    pub const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::int("sma_period", 20, 10, 50),
        ParamSpec::int("atr_period", 14, 5, 30),
        ParamSpec::real("atr_multiplier", 2.0, 1.0, 4.0),
    ];

    pub fn from_params(p: &Params) -> Self {
        Self {
            sma_period: p.int("sma_period"),
            atr_period: p.int("atr_period"),
            atr_multiplier: p.real("atr_multiplier"),
        }
    }
}

impl SignalRule for AtrChannel {
    fn name(&self) -> &'static str {
        "atr_channel"
    }

    fn window(&self) -> usize {
        self.sma_period.max(self.atr_period)
    }

    fn evaluate(&self, bars: &[Bar]) -> Result<Trigger, Suppression> {
        let mid = last(&sma(&series(bars, BarField::Close), self.sma_period), "atr_channel_sma")?;
        let range = last(&atr(bars, self.atr_period), "atr")?;
        let close = latest_close(bars)?;
        Ok(Trigger::new(close > mid + self.atr_multiplier * range, false))
    }
}

// ─── Aroon ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Aroon {
    pub period: usize,
}

impl Aroon {
    pub const PARAMS: &'static [ParamSpec] = &[ParamSpec::int("period", 25, 10, 50)];

    pub fn from_params(p: &Params) -> Self {
        Self {
            period: p.int("period"),
        }
    }

    /// `(up, down)` on the latest bar: position of the window high/low,
    /// oldest = 0, scaled to percent of `period`.
    pub fn lines(&self, bars: &[Bar]) -> Result<(f64, f64), Suppression> {
        let scale = 100.0 / self.period as f64;
        let up = last(&rolling_argmax(&series(bars, BarField::High), self.period), "aroon_up")?;
        let down = last(&rolling_argmin(&series(bars, BarField::Low), self.period), "aroon_down")?;
        Ok((up * scale, down * scale))
    }
}

impl SignalRule for Aroon {
    fn name(&self) -> &'static str {
        "aroon"
    }

    fn window(&self) -> usize {
        self.period.saturating_add(1)
    }

    fn evaluate(&self, bars: &[Bar]) -> Result<Trigger, Suppression> {
        let (up, down) = self.lines(bars)?;
        Ok(Trigger::new(up > down, up < down))
    }
}

// ─── Ichimoku ────────────────────────────────────────────────────────

/// Tenkan-sen / kijun-sen cross. The cloud spans are not traded.
#[derive(Debug, Clone)]
pub struct Ichimoku {
    pub tenkan_period: usize,
    pub kijun_period: usize,
}

impl Ichimoku {
    pub const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::int("tenkan_period", 9, 5, 30),
        ParamSpec::int("kijun_period", 26, 15, 60),
    ];

    pub fn from_params(p: &Params) -> Self {
        Self {
            tenkan_period: p.int("tenkan_period"),
            kijun_period: p.int("kijun_period"),
        }
    }
}

/// Midpoint of the rolling high and low.
fn midline(bars: &[Bar], period: usize) -> Vec<f64> {
    let hi = rolling_max(&series(bars, BarField::High), period);
    let lo = rolling_min(&series(bars, BarField::Low), period);
    hi.iter().zip(&lo).map(|(h, l)| (h + l) / 2.0).collect()
}

impl SignalRule for Ichimoku {
    fn name(&self) -> &'static str {
        "ichimoku"
    }

    fn window(&self) -> usize {
        self.tenkan_period.max(self.kijun_period).saturating_add(1)
    }

    fn evaluate(&self, bars: &[Bar]) -> Result<Trigger, Suppression> {
        let tenkan = last_two(&midline(bars, self.tenkan_period), "tenkan_sen")?;
        let kijun = last_two(&midline(bars, self.kijun_period), "kijun_sen")?;
        Ok(crossover(tenkan, kijun))
    }
}

// ─── Vortex ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Vortex {
    pub period: usize,
}

impl Vortex {
    pub const PARAMS: &'static [ParamSpec] = &[ParamSpec::int("period", 14, 5, 30)];

    pub fn from_params(p: &Params) -> Self {
        Self {
            period: p.int("period"),
        }
    }
}

impl SignalRule for Vortex {
    fn name(&self) -> &'static str {
        "vortex"
    }

    fn window(&self) -> usize {
        self.period.saturating_add(2)
    }

    fn evaluate(&self, bars: &[Bar]) -> Result<Trigger, Suppression> {
        let n = bars.len();
        let mut plus = vec![f64::NAN; n];
        let mut minus = vec![f64::NAN; n];
        for i in 1..n {
            plus[i] = (bars[i].high - bars[i - 1].low).abs();
            minus[i] = (bars[i].low - bars[i - 1].high).abs();
        }
        let tr = rolling_sum(&true_range(bars), self.period);
        let plus = rolling_sum(&plus, self.period);
        let minus = rolling_sum(&minus, self.period);
        let vi_plus: Vec<f64> = plus.iter().zip(&tr).map(|(p, t)| p / t).collect();
        let vi_minus: Vec<f64> = minus.iter().zip(&tr).map(|(m, t)| m / t).collect();
        Ok(crossover(
            last_two(&vi_plus, "vi_plus")?,
            last_two(&vi_minus, "vi_minus")?,
        ))
    }
}
