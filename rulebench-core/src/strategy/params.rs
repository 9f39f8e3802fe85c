//! Typed strategy parameters.
//!
//! Each rule declares its parameters as [`ParamSpec`]s. Caller overrides are
//! resolved against those specs once, when the rule is built: integers are
//! rounded and clamped to `[1, MAX_PERIOD]`, unknown names and non-finite values are
//! rejected, and values outside the advisory range are accepted with a warning.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Largest integer parameter a rule will see. Far beyond any daily series,
/// so a larger request still just means insufficient history.
pub const MAX_PERIOD: usize = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Integer,
    Real,
}

/// Declaration of one named numeric parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub default: f64,
    pub min: f64,
    pub max: f64,
}

impl ParamSpec {
    pub const fn int(name: &'static str, default: usize, min: usize, max: usize) -> Self {
        Self {
            name,
            kind: ParamKind::Integer,
            default: default as f64,
            min: min as f64,
            max: max as f64,
        }
    }

    pub const fn real(name: &'static str, default: f64, min: f64, max: f64) -> Self {
        Self {
            name,
            kind: ParamKind::Real,
            default,
            min,
            max,
        }
    }

    /// Whether `value` lies in the advisory `[min, max]` range.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Coerce a raw value to this parameter's type.
    pub fn coerce(&self, value: f64) -> f64 {
        match self.kind {
            ParamKind::Integer => value.round().clamp(1.0, MAX_PERIOD as f64),
            ParamKind::Real => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("unknown strategy: {0}")]
    UnknownRule(String),
    #[error("strategy '{rule}' has no parameter '{param}'")]
    UnknownParam { rule: String, param: String },
    #[error("parameter '{rule}.{param}' must be a finite number, got {value}")]
    NonFinite {
        rule: String,
        param: String,
        value: f64,
    },
}

/// Resolved parameter values: every declared name, defaults filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Params {
    values: BTreeMap<String, f64>,
}

impl Params {
    /// Resolve `overrides` against `specs` for the rule named `rule`.
    pub fn resolve(
        rule: &str,
        specs: &[ParamSpec],
        overrides: &BTreeMap<String, f64>,
    ) -> Result<Self, ParamError> {
        if let Some(unknown) = overrides
            .keys()
            .find(|k| !specs.iter().any(|s| s.name == k.as_str()))
        {
            return Err(ParamError::UnknownParam {
                rule: rule.to_string(),
                param: unknown.clone(),
            });
        }

        let mut values = BTreeMap::new();
        for spec in specs {
            let raw = overrides.get(spec.name).copied().unwrap_or(spec.default);
            if !raw.is_finite() {
                return Err(ParamError::NonFinite {
                    rule: rule.to_string(),
                    param: spec.name.to_string(),
                    value: raw,
                });
            }
            let value = spec.coerce(raw);
            if !spec.contains(value) {
                warn!(
                    rule,
                    param = spec.name,
                    value,
                    min = spec.min,
                    max = spec.max,
                    "parameter outside recommended range"
                );
            }
            values.insert(spec.name.to_string(), value);
        }
        Ok(Self { values })
    }

    /// Integer parameter as a period length in `[1, MAX_PERIOD]`.
    pub fn int(&self, name: &str) -> usize {
        self.values
            .get(name)
            .map(|v| v.clamp(1.0, MAX_PERIOD as f64) as usize)
            .unwrap_or(1)
    }

    pub fn real(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or(0.0)
    }

    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.values
    }
}
