//! Strategy port — turns bar advances into long-only signals.
//!
//! Every trading rule implements [`SignalRule`]: a pure function from a window
//! of revealed bars to entry/exit conditions. [`RuleStrategy`] wraps a rule
//! with the shared flat ⇄ long state machine, so a rule never decides whether
//! a signal is a duplicate.

pub mod catalog;
pub mod params;
pub mod rules;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::domain::{Bar, Event, SignalDirection, SignalEvent};
use crate::engine::BarStore;

pub use catalog::{build_rule, RuleKind};
pub use params::{ParamError, ParamKind, ParamSpec, Params, MAX_PERIOD};

/// Entry and exit conditions for the latest bar.
///
/// Both may hold at once; the state machine picks the one that applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Trigger {
    pub enter: bool,
    pub exit: bool,
}

impl Trigger {
    pub const NONE: Self = Self {
        enter: false,
        exit: false,
    };

    pub fn new(enter: bool, exit: bool) -> Self {
        Self { enter, exit }
    }
}

/// Conditions under which a rule declines to evaluate. Never fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Suppression {
    #[error("insufficient history: need {needed} bars, have {available}")]
    InsufficientHistory { needed: usize, available: usize },
    #[error("indicator '{0}' is undefined at this bar")]
    UndefinedIndicator(&'static str),
}

/// A trading rule's formula. Implementations must be pure over `bars`.
pub trait SignalRule: Send + Sync + std::fmt::Debug {
    /// Stable identifier, e.g. "sma_crossover".
    fn name(&self) -> &'static str;

    /// Number of most recent bars requested per evaluation.
    fn window(&self) -> usize;

    /// Fewest bars the rule can work with. Defaults to the full window.
    fn min_bars(&self) -> usize {
        self.window()
    }

    /// Evaluate on the requested window, oldest bar first.
    fn evaluate(&self, bars: &[Bar]) -> Result<Trigger, Suppression>;
}

/// Consumer of engine events that may emit a signal.
pub trait Strategy: Send {
    fn id(&self) -> &str;

    /// Called for every event routed to the strategy. Returns at most one signal.
    fn on_event(&mut self, event: &Event, bars: &BarStore) -> Option<SignalEvent>;
}

/// Counts of bars on which evaluation was suppressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionCounts {
    pub insufficient_history: usize,
    pub undefined_indicator: usize,
}

/// A [`SignalRule`] plus the per-symbol "currently long" flag.
///
/// The flag follows emitted signals, not fills. If the ledger refuses an entry
/// or the order goes unfilled, the strategy stays "long" until its next exit
/// trigger; that exit is refused by the flat ledger and the flag resets.
#[derive(Debug)]
pub struct RuleStrategy {
    rule: Box<dyn SignalRule>,
    long: BTreeMap<String, bool>,
    suppressed: SuppressionCounts,
}

impl RuleStrategy {
    pub fn new(rule: Box<dyn SignalRule>) -> Self {
        Self {
            rule,
            long: BTreeMap::new(),
            suppressed: SuppressionCounts::default(),
        }
    }

    pub fn rule(&self) -> &dyn SignalRule {
        self.rule.as_ref()
    }

    pub fn suppressed(&self) -> SuppressionCounts {
        self.suppressed
    }

    pub fn is_long(&self, symbol: &str) -> bool {
        self.long.get(symbol).copied().unwrap_or(false)
    }

    fn evaluate(&self, bars: &BarStore) -> Result<Trigger, Suppression> {
        let window = bars.latest(self.rule.window());
        let needed = self.rule.min_bars();
        if window.len() < needed {
            return Err(Suppression::InsufficientHistory {
                needed,
                available: window.len(),
            });
        }
        self.rule.evaluate(window)
    }
}

impl Strategy for RuleStrategy {
    fn id(&self) -> &str {
        self.rule.name()
    }

    fn on_event(&mut self, event: &Event, bars: &BarStore) -> Option<SignalEvent> {
        if !matches!(event, Event::BarAdvance) {
            return None;
        }
        let bar = bars.latest_bar()?;

        let trigger = match self.evaluate(bars) {
            Ok(t) => t,
            Err(reason) => {
                match reason {
                    Suppression::InsufficientHistory { .. } => {
                        self.suppressed.insufficient_history += 1
                    }
                    Suppression::UndefinedIndicator(_) => self.suppressed.undefined_indicator += 1,
                }
                trace!(rule = self.rule.name(), date = %bar.date, %reason, "signal suppressed");
                return None;
            }
        };

        let long = self.is_long(&bar.symbol);
        let direction = if !long && trigger.enter {
            SignalDirection::EnterLong
        } else if long && trigger.exit {
            SignalDirection::Exit
        } else {
            return None;
        };
        self.long
            .insert(bar.symbol.clone(), direction == SignalDirection::EnterLong);

        Some(SignalEvent {
            strategy_id: self.rule.name().to_string(),
            symbol: bar.symbol.clone(),
            date: bar.date,
            direction,
            strength: 1.0,
        })
    }
}

// ─── Helpers shared by rule implementations ──────────────────────────

/// Latest value of a series, or `UndefinedIndicator` if missing/NaN.
pub(crate) fn last(series: &[f64], indicator: &'static str) -> Result<f64, Suppression> {
    match series.last() {
        Some(v) if !v.is_nan() => Ok(*v),
        _ => Err(Suppression::UndefinedIndicator(indicator)),
    }
}

/// `(previous, latest)` values of a series, both defined.
pub(crate) fn last_two(series: &[f64], indicator: &'static str) -> Result<(f64, f64), Suppression> {
    let n = series.len();
    if n < 2 {
        return Err(Suppression::UndefinedIndicator(indicator));
    }
    let (prev, cur) = (series[n - 2], series[n - 1]);
    if prev.is_nan() || cur.is_nan() {
        return Err(Suppression::UndefinedIndicator(indicator));
    }
    Ok((prev, cur))
}

/// Enter when `fast` crosses above `slow`, exit when it crosses below.
/// Arguments are `(previous, latest)` pairs.
pub(crate) fn crossover(fast: (f64, f64), slow: (f64, f64)) -> Trigger {
    Trigger {
        enter: fast.1 > slow.1 && fast.0 <= slow.0,
        exit: fast.1 < slow.1 && fast.0 >= slow.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    /// Enters on every bar and exits on every bar, to exercise idempotence.
    #[derive(Debug)]
    struct Always(Trigger);

    impl SignalRule for Always {
        fn name(&self) -> &'static str {
            "always"
        }
        fn window(&self) -> usize {
            3
        }
        fn evaluate(&self, _bars: &[Bar]) -> Result<Trigger, Suppression> {
            Ok(self.0)
        }
    }

    #[derive(Debug)]
    struct Undefined;

    impl SignalRule for Undefined {
        fn name(&self) -> &'static str {
            "undefined"
        }
        fn window(&self) -> usize {
            1
        }
        fn evaluate(&self, _bars: &[Bar]) -> Result<Trigger, Suppression> {
            Err(Suppression::UndefinedIndicator("nan"))
        }
    }

    fn run(strategy: &mut RuleStrategy, closes: &[f64]) -> Vec<Option<SignalDirection>> {
        let mut store = BarStore::new(make_bars(closes)).unwrap();
        let mut out = Vec::new();
        while store.advance() {
            out.push(
                strategy
                    .on_event(&Event::BarAdvance, &store)
                    .map(|s| s.direction),
            );
        }
        out
    }

    #[test]
    fn suppressed_until_window_is_full() {
        let mut s = RuleStrategy::new(Box::new(Always(Trigger::new(true, false))));
        let out = run(&mut s, &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(out, vec![None, None, Some(SignalDirection::EnterLong), None]);
        assert_eq!(s.suppressed().insufficient_history, 2);
    }

    #[test]
    fn alternates_when_both_conditions_hold() {
        let mut s = RuleStrategy::new(Box::new(Always(Trigger::new(true, true))));
        let out = run(&mut s, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(
            out,
            vec![
                None,
                None,
                Some(SignalDirection::EnterLong),
                Some(SignalDirection::Exit),
                Some(SignalDirection::EnterLong),
            ]
        );
    }

    #[test]
    fn exit_never_emitted_while_flat() {
        let mut s = RuleStrategy::new(Box::new(Always(Trigger::new(false, true))));
        let out = run(&mut s, &[1.0, 2.0, 3.0, 4.0]);
        assert!(out.iter().all(|o| o.is_none()));
    }

    #[test]
    fn undefined_indicator_is_counted_not_fatal() {
        let mut s = RuleStrategy::new(Box::new(Undefined));
        let out = run(&mut s, &[1.0, 2.0]);
        assert!(out.iter().all(|o| o.is_none()));
        assert_eq!(s.suppressed().undefined_indicator, 2);
    }

    #[test]
    fn ignores_non_bar_events() {
        let mut s = RuleStrategy::new(Box::new(Always(Trigger::new(true, false))));
        let mut store = BarStore::new(make_bars(&[1.0, 2.0, 3.0])).unwrap();
        for _ in 0..3 {
            store.advance();
        }
        let ev = Event::Order(crate::domain::OrderEvent::market(
            "TEST",
            1,
            crate::domain::OrderSide::Buy,
        ));
        assert!(s.on_event(&ev, &store).is_none());
    }

    #[test]
    fn crossover_helper() {
        assert_eq!(crossover((1.0, 3.0), (2.0, 2.0)), Trigger::new(true, false));
        assert_eq!(crossover((3.0, 1.0), (2.0, 2.0)), Trigger::new(false, true));
        assert_eq!(crossover((2.0, 3.0), (2.0, 2.0)), Trigger::new(true, false));
        assert_eq!(crossover((3.0, 3.0), (2.0, 2.0)), Trigger::NONE);
    }

    #[test]
    fn last_two_rejects_nan() {
        assert!(last_two(&[f64::NAN, 1.0], "x").is_err());
        assert!(last_two(&[1.0], "x").is_err());
        assert_eq!(last_two(&[1.0, 2.0, 3.0], "x").unwrap(), (2.0, 3.0));
        assert!(last(&[], "x").is_err());
    }
}
