//! Baselines and the stop-and-reverse trend follower.

use crate::domain::Bar;
use crate::indicators::{parabolic_sar, SarParams};
use crate::strategy::{ParamSpec, Params, SignalRule, Suppression, Trigger};

/// Enters on the first bar and never exits.
#[derive(Debug, Clone, Default)]
pub struct BuyAndHold;

impl BuyAndHold {
    pub const PARAMS: &'static [ParamSpec] = &[];
}

impl SignalRule for BuyAndHold {
    fn name(&self) -> &'static str {
        "buy_and_hold"
    }

    fn window(&self) -> usize {
        1
    }

    fn evaluate(&self, _bars: &[Bar]) -> Result<Trigger, Suppression> {
        Ok(Trigger::new(true, false))
    }
}

/// Never trades. Its equity curve is the initial capital held as cash.
#[derive(Debug, Clone, Default)]
pub struct Flat;

impl Flat {
    pub const PARAMS: &'static [ParamSpec] = &[];
}

impl SignalRule for Flat {
    fn name(&self) -> &'static str {
        "flat"
    }

    fn window(&self) -> usize {
        0
    }

    fn evaluate(&self, _bars: &[Bar]) -> Result<Trigger, Suppression> {
        Ok(Trigger::NONE)
    }
}

/// Parabolic SAR recomputed over the whole revealed history on every bar.
///
/// Enters when the latest bar flips the SAR into an uptrend, exits when it
/// flips into a downtrend.
#[derive(Debug, Clone)]
pub struct ParabolicSar {
    pub params: SarParams,
}

impl ParabolicSar {
    pub const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::real("af_start", 0.02, 0.01, 0.05),
        ParamSpec::real("af_step", 0.02, 0.01, 0.1),
        ParamSpec::real("af_max", 0.2, 0.1, 0.5),
    ];

    pub fn from_params(p: &Params) -> Self {
        Self {
            params: SarParams {
                af_start: p.real("af_start"),
                af_step: p.real("af_step"),
                af_max: p.real("af_max"),
            },
        }
    }
}

impl SignalRule for ParabolicSar {
    fn name(&self) -> &'static str {
        "parabolic_sar"
    }

    fn window(&self) -> usize {
        usize::MAX
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn evaluate(&self, bars: &[Bar]) -> Result<Trigger, Suppression> {
        let undefined = Suppression::UndefinedIndicator("parabolic_sar");
        let points = parabolic_sar(bars, self.params);
        let Some(Some(cur)) = points.last().copied() else {
            return Err(undefined);
        };
        // Previous defined point; void bars leave gaps.
        let prev = points[..points.len() - 1]
            .iter()
            .rev()
            .flatten()
            .next()
            .copied()
            .ok_or(undefined)?;
        Ok(Trigger::new(
            cur.uptrend && !prev.uptrend,
            !cur.uptrend && prev.uptrend,
        ))
    }
}
