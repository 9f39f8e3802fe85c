//! Moving-average crossover rules: SMA, DEMA, TEMA, ribbon, MACD, TRIX.

use crate::domain::{Bar, BarField};
use crate::indicators::{ema, series, sma};
use crate::strategy::{crossover, last, last_two, ParamSpec, Params, SignalRule, Suppression, Trigger};

fn closes(bars: &[Bar]) -> Vec<f64> {
    series(bars, BarField::Close)
}

/// Double EMA: 2·EMA − EMA(EMA).
fn dema(values: &[f64], span: usize) -> Vec<f64> {
    let e1 = ema(values, span);
    let e2 = ema(&e1, span);
    e1.iter().zip(&e2).map(|(a, b)| 2.0 * a - b).collect()
}

/// Triple EMA: 3·e1 − 3·e2 + e3.
fn tema(values: &[f64], span: usize) -> Vec<f64> {
    let e1 = ema(values, span);
    let e2 = ema(&e1, span);
    let e3 = ema(&e2, span);
    e1.iter()
        .zip(&e2)
        .zip(&e3)
        .map(|((a, b), c)| 3.0 * a - 3.0 * b + c)
        .collect()
}

// ─── SMA crossover ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SmaCrossover {
    pub short_window: usize,
    pub long_window: usize,
}

impl SmaCrossover {
    pub const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::int("short_window", 50, 5, 100),
        ParamSpec::int("long_window", 200, 20, 400),
    ];

    pub fn from_params(p: &Params) -> Self {
        Self {
            short_window: p.int("short_window"),
            long_window: p.int("long_window"),
        }
    }
}

impl SignalRule for SmaCrossover {
    fn name(&self) -> &'static str {
        "sma_crossover"
    }

    fn window(&self) -> usize {
        self.short_window.max(self.long_window).saturating_add(1)
    }

    fn evaluate(&self, bars: &[Bar]) -> Result<Trigger, Suppression> {
        let c = closes(bars);
        let fast = last_two(&sma(&c, self.short_window), "sma_short")?;
        let slow = last_two(&sma(&c, self.long_window), "sma_long")?;
        Ok(crossover(fast, slow))
    }
}

// ─── DEMA / TEMA crossover ───────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DemaCrossover {
    pub short_window: usize,
    pub long_window: usize,
}

impl DemaCrossover {
    pub const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::int("short_window", 50, 5, 100),
        ParamSpec::int("long_window", 200, 20, 400),
    ];

    pub fn from_params(p: &Params) -> Self {
        Self {
            short_window: p.int("short_window"),
            long_window: p.int("long_window"),
        }
    }
}

impl SignalRule for DemaCrossover {
    fn name(&self) -> &'static str {
        "dema_crossover"
    }

    fn window(&self) -> usize {
        self.short_window.max(self.long_window).max(2)
    }

    fn evaluate(&self, bars: &[Bar]) -> Result<Trigger, Suppression> {
        let c = closes(bars);
        let fast = last_two(&dema(&c, self.short_window), "dema_short")?;
        let slow = last_two(&dema(&c, self.long_window), "dema_long")?;
        Ok(crossover(fast, slow))
    }
}

#[derive(Debug, Clone)]
pub struct TemaCrossover {
    pub short_window: usize,
    pub long_window: usize,
}

impl TemaCrossover {
    pub const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::int("short_window", 50, 5, 100),
        ParamSpec::int("long_window", 200, 20, 400),
    ];

    pub fn from_params(p: &Params) -> Self {
        Self {
            short_window: p.int("short_window"),
            long_window: p.int("long_window"),
        }
    }
}

impl SignalRule for TemaCrossover {
    fn name(&self) -> &'static str {
        "tema_crossover"
    }

    fn window(&self) -> usize {
        self.short_window.max(self.long_window).max(2)
    }

    fn evaluate(&self, bars: &[Bar]) -> Result<Trigger, Suppression> {
        let c = closes(bars);
        let fast = last_two(&tema(&c, self.short_window), "tema_short")?;
        let slow = last_two(&tema(&c, self.long_window), "tema_long")?;
        Ok(crossover(fast, slow))
    }
}

// ─── MA ribbon ───────────────────────────────────────────────────────

/// Short/medium crossover, entries gated on medium above long.
#[derive(Debug, Clone)]
pub struct MaRibbon {
    pub short_period: usize,
    pub medium_period: usize,
    pub long_period: usize,
}

impl MaRibbon {
    pub const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::int("short_period", 5, 2, 30),
        ParamSpec::int("medium_period", 10, 5, 60),
        ParamSpec::int("long_period", 20, 10, 200),
    ];

    pub fn from_params(p: &Params) -> Self {
        Self {
            short_period: p.int("short_period"),
            medium_period: p.int("medium_period"),
            long_period: p.int("long_period"),
        }
    }
}

impl SignalRule for MaRibbon {
    fn name(&self) -> &'static str {
        "ma_ribbon"
    }

    fn window(&self) -> usize {
        self.short_period
            .max(self.medium_period)
            .max(self.long_period)
            .saturating_add(1)
    }

    fn evaluate(&self, bars: &[Bar]) -> Result<Trigger, Suppression> {
        let c = closes(bars);
        let short = last_two(&sma(&c, self.short_period), "ma_short")?;
        let medium = last_two(&sma(&c, self.medium_period), "ma_medium")?;
        let long = last(&sma(&c, self.long_period), "ma_long")?;
        let cross = crossover(short, medium);
        Ok(Trigger::new(cross.enter && medium.1 > long, cross.exit))
    }
}

// ─── MACD ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Macd {
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
}

impl Macd {
    pub const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::int("fast_period", 12, 5, 20),
        ParamSpec::int("slow_period", 26, 15, 40),
        ParamSpec::int("signal_period", 9, 5, 15),
    ];

    pub fn from_params(p: &Params) -> Self {
        Self {
            fast_period: p.int("fast_period"),
            slow_period: p.int("slow_period"),
            signal_period: p.int("signal_period"),
        }
    }
}

impl SignalRule for Macd {
    fn name(&self) -> &'static str {
        "macd"
    }

    fn window(&self) -> usize {
        self.slow_period
            .max(self.fast_period)
            .saturating_add(self.signal_period)
            .max(2)
    }

    fn evaluate(&self, bars: &[Bar]) -> Result<Trigger, Suppression> {
        let c = closes(bars);
        let fast = ema(&c, self.fast_period);
        let slow = ema(&c, self.slow_period);
        let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal = ema(&line, self.signal_period);
        Ok(crossover(
            last_two(&line, "macd_line")?,
            last_two(&signal, "macd_signal")?,
        ))
    }
}

// ─── TRIX ────────────────────────────────────────────────────────────

/// One-bar percent change of a triple-smoothed EMA, against its own EMA.
#[derive(Debug, Clone)]
pub struct Trix {
    pub period: usize,
    pub signal_period: usize,
}

impl Trix {
    pub const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::int("period", 15, 5, 30),
        ParamSpec::int("signal_period", 9, 3, 20),
    ];

    pub fn from_params(p: &Params) -> Self {
        Self {
            period: p.int("period"),
            signal_period: p.int("signal_period"),
        }
    }
}

impl SignalRule for Trix {
    fn name(&self) -> &'static str {
        "trix"
    }

    fn window(&self) -> usize {
        self.period.saturating_mul(3).max(3)
    }

    fn evaluate(&self, bars: &[Bar]) -> Result<Trigger, Suppression> {
        let c = closes(bars);
        let e3 = ema(&ema(&ema(&c, self.period), self.period), self.period);
        let mut trix = vec![f64::NAN; e3.len()];
        for i in 1..e3.len() {
            trix[i] = (e3[i] - e3[i - 1]) / e3[i - 1] * 100.0;
        }
        let signal = ema(&trix, self.signal_period);
        Ok(crossover(
            last_two(&trix, "trix")?,
            last_two(&signal, "trix_signal")?,
        ))
    }
}
