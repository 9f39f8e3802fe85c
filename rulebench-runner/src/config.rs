//! Serializable run configuration.
//!
//! One `RunConfig` describes a batch: a symbol, an optional date window,
//! money settings, and the strategies to run against the same bars. It loads
//! from TOML, is validated once, and every run receives an immutable
//! [`SimulationConfig`] derived from it.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rulebench_core::engine::{CommissionModel, SimulationConfig, DEFAULT_POSITION_FRACTION};
use rulebench_core::strategy::{ParamError, RuleKind};

/// Content hash of a configuration.
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("initial capital must be positive, got {0}")]
    Capital(f64),
    #[error("position fraction must be in (0, 1], got {0}")]
    Fraction(f64),
    #[error("start date {start} is after end date {end}")]
    DateRange { start: NaiveDate, end: NaiveDate },
    #[error("commission must be non-negative and finite")]
    Commission,
    #[error(transparent)]
    Param(#[from] ParamError),
}

/// A strategy to run plus its parameter overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySelection {
    pub kind: RuleKind,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl StrategySelection {
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: &str, value: f64) -> Self {
        self.params.insert(name.to_string(), value);
        self
    }
}

fn default_capital() -> f64 {
    100_000.0
}

fn default_fraction() -> f64 {
    DEFAULT_POSITION_FRACTION
}

/// Serializable configuration for a batch of runs over one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub symbol: String,

    /// First bar date (inclusive).
    #[serde(default)]
    pub start: Option<NaiveDate>,

    /// Last bar date (inclusive).
    #[serde(default)]
    pub end: Option<NaiveDate>,

    #[serde(default = "default_capital")]
    pub initial_capital: f64,

    /// Share of current equity committed per entry.
    #[serde(default = "default_fraction")]
    pub position_fraction: f64,

    #[serde(default)]
    pub commission: CommissionModel,

    /// Empty means every rule in the catalog with default parameters.
    #[serde(default)]
    pub strategies: Vec<StrategySelection>,
}

impl RunConfig {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            start: None,
            end: None,
            initial_capital: default_capital(),
            position_fraction: default_fraction(),
            commission: CommissionModel::None,
            strategies: Vec::new(),
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check money settings, the date window, and every strategy's parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_settings()?;
        for selection in &self.strategies {
            selection.kind.resolve(&selection.params)?;
        }
        Ok(())
    }

    /// Check everything except strategy parameters, which each run resolves
    /// on its own.
    pub fn validate_settings(&self) -> Result<(), ConfigError> {
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(ConfigError::Capital(self.initial_capital));
        }
        if !(self.position_fraction > 0.0 && self.position_fraction <= 1.0) {
            return Err(ConfigError::Fraction(self.position_fraction));
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(ConfigError::DateRange { start, end });
            }
        }
        let rate = self.commission.rate();
        if !(rate.is_finite() && rate >= 0.0) {
            return Err(ConfigError::Commission);
        }
        Ok(())
    }

    /// The strategies to run: the explicit list, or the whole catalog.
    pub fn selections(&self) -> Vec<StrategySelection> {
        if self.strategies.is_empty() {
            RuleKind::ALL.into_iter().map(StrategySelection::new).collect()
        } else {
            self.strategies.clone()
        }
    }

    pub fn simulation(&self) -> SimulationConfig {
        SimulationConfig {
            initial_capital: self.initial_capital,
            position_fraction: self.position_fraction,
            commission: self.commission,
        }
    }

    /// Deterministic hash of this configuration.
    ///
    /// Two identical configurations share a RunId.
    pub fn run_id(&self) -> RunId {
        // Serializing plain data with string keys cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
