//! Bar — the fundamental market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV bar for a single symbol on a single trading day.
///
/// Bars are immutable once loaded. A series handed to the engine must be
/// strictly increasing in `date` (see [`validate_series`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Returns true if any OHLC field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.close > 0.0
    }

    /// Typical price: (high + low + close) / 3.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Read a single field by selector.
    pub fn field(&self, field: BarField) -> f64 {
        match field {
            BarField::Open => self.open,
            BarField::High => self.high,
            BarField::Low => self.low,
            BarField::Close => self.close,
            BarField::Volume => self.volume as f64,
        }
    }
}

/// Field selector for [`Bar::field`] and `BarStore::latest_value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

/// Structural problems with a bar series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("bar series is empty")]
    Empty,
    #[error("bar {index} ({date}) is not after the previous bar ({previous})")]
    NotIncreasing {
        index: usize,
        date: NaiveDate,
        previous: NaiveDate,
    },
    #[error("bar {index} belongs to '{found}', expected '{expected}'")]
    MixedSymbols {
        index: usize,
        expected: String,
        found: String,
    },
}

/// Check that a series is non-empty, single-symbol, and strictly increasing in date.
pub fn validate_series(bars: &[Bar]) -> Result<(), BarError> {
    let first = bars.first().ok_or(BarError::Empty)?;
    for (index, pair) in bars.windows(2).enumerate() {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.symbol != first.symbol {
            return Err(BarError::MixedSymbols {
                index: index + 1,
                expected: first.symbol.clone(),
                found: next.symbol.clone(),
            });
        }
        if next.date <= prev.date {
            return Err(BarError::NotIncreasing {
                index: index + 1,
                date: next.date,
                previous: prev.date,
            });
        }
    }
    Ok(())
}
