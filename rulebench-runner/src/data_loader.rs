//! Bar loading for the runner.
//!
//! Two sources:
//! 1. A CSV file with `date,open,high,low,close,volume` columns
//! 2. `--synthetic`: a deterministic random walk seeded from the symbol
//!
//! Synthetic data is a developer-only mode; runs on it are tagged in their
//! result so they are never mistaken for real data.

use std::path::Path;

use chrono::{Datelike, NaiveDate};
use thiserror::Error;
use tracing::{debug, warn};

use rulebench_core::domain::Bar;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("{path}: missing required column '{column}'")]
    MissingColumn { path: String, column: &'static str },

    #[error("{path} line {line}: invalid {field} value '{value}'")]
    Parse {
        path: String,
        line: u64,
        field: &'static str,
        value: String,
    },

    #[error("{path} contains no bars")]
    Empty { path: String },
}

/// Where a run's bars came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Csv,
    Synthetic,
    Memory,
}

const REQUIRED: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

/// Map a header to its canonical column name.
fn canonical(header: &str) -> String {
    header.trim().to_ascii_lowercase().replace([' ', '_'], "")
}

/// Load one symbol's bars from a CSV file.
///
/// Header names are case-insensitive. Extra columns such as `Adj Close` are
/// ignored. Empty price cells load as NaN so the engine can treat the bar as
/// void; an empty volume loads as 0. Rows are sorted by date.
pub fn load_bars_csv(path: &Path, symbol: &str) -> Result<Vec<Bar>, LoadError> {
    let display = path.display().to_string();
    let csv_err = |source| LoadError::Csv {
        path: display.clone(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;
    let headers: Vec<String> = reader.headers().map_err(csv_err)?.iter().map(canonical).collect();

    let mut index = [0usize; 6];
    for (slot, column) in index.iter_mut().zip(REQUIRED) {
        *slot = headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| LoadError::MissingColumn {
                path: display.clone(),
                column,
            })?;
    }
    let [date_i, open_i, high_i, low_i, close_i, volume_i] = index;

    let mut bars = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let cell = |i: usize| record.get(i).unwrap_or("");
        let parse_err = |field: &'static str, value: &str| LoadError::Parse {
            path: display.clone(),
            line,
            field,
            value: value.to_string(),
        };

        let date_raw = cell(date_i);
        // Timestamps like "2024-01-02 00:00:00-05:00" keep only the day.
        let date = NaiveDate::parse_from_str(date_raw.get(..10).unwrap_or(date_raw), "%Y-%m-%d")
            .map_err(|_| parse_err("date", date_raw))?;

        let price = |i: usize, field: &'static str| -> Result<f64, LoadError> {
            let raw = cell(i);
            if raw.is_empty() || raw.eq_ignore_ascii_case("nan") || raw.eq_ignore_ascii_case("null") {
                return Ok(f64::NAN);
            }
            raw.parse::<f64>().map_err(|_| parse_err(field, raw))
        };

        let volume_raw = price(volume_i, "volume")?;
        bars.push(Bar {
            symbol: symbol.to_string(),
            date,
            open: price(open_i, "open")?,
            high: price(high_i, "high")?,
            low: price(low_i, "low")?,
            close: price(close_i, "close")?,
            volume: if volume_raw.is_finite() && volume_raw > 0.0 {
                volume_raw.round() as u64
            } else {
                0
            },
        });
    }

    if bars.is_empty() {
        return Err(LoadError::Empty { path: display });
    }
    bars.sort_by_key(|b| b.date);
    let void = bars.iter().filter(|b| b.is_void()).count();
    if void > 0 {
        warn!(path = %path.display(), void, "bars with missing prices");
    }
    debug!(path = %path.display(), symbol, bars = bars.len(), "loaded csv");
    Ok(bars)
}

/// Keep bars dated within `[start, end]` (either bound optional).
pub fn filter_range(bars: &[Bar], start: Option<NaiveDate>, end: Option<NaiveDate>) -> Vec<Bar> {
    bars.iter()
        .filter(|b| start.map_or(true, |s| b.date >= s) && end.map_or(true, |e| b.date <= e))
        .cloned()
        .collect()
}

/// Deterministic BLAKE3 hash over every bar field, in series order.
pub fn dataset_hash(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(bar.symbol.as_bytes());
        hasher.update(bar.date.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Generate weekday bars for `[start, end]`: a random walk from 100.0.
///
/// The same symbol always yields the same series.
pub fn generate_synthetic_bars(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        if matches!(current.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun) {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        bars.push(Bar {
            symbol: symbol.to_string(),
            date: current,
            open,
            high: open.max(close) * (1.0 + rng.gen_range(0.0..0.01)),
            low: open.min(close) * (1.0 - rng.gen_range(0.0..0.01)),
            close,
            volume: rng.gen_range(500_000..5_000_000u64),
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn loads_yahoo_style_headers() {
        let file = write_csv(
            "Date,Open,High,Low,Close,Adj Close,Volume\n\
             2024-01-03,101,103,100,102,101.5,1100\n\
             2024-01-02,100,102,99,101,100.5,1000\n",
        );
        let bars = load_bars_csv(file.path(), "SPY").unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, d(2024, 1, 2));
        assert_eq!(bars[1].close, 102.0);
        assert_eq!(bars[0].volume, 1000);
        assert_eq!(bars[0].symbol, "SPY");
    }

    #[test]
    fn empty_price_cell_becomes_void_bar() {
        let file = write_csv("date,open,high,low,close,volume\n2024-01-02,1,2,0.5,,\n");
        let bars = load_bars_csv(file.path(), "X").unwrap();
        assert!(bars[0].close.is_nan());
        assert!(bars[0].is_void());
        assert_eq!(bars[0].volume, 0);
    }

    #[test]
    fn missing_column_is_reported() {
        let file = write_csv("date,open,high,low,volume\n2024-01-02,1,2,0.5,10\n");
        let err = load_bars_csv(file.path(), "X").unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { column: "close", .. }));
    }

    #[test]
    fn bad_number_is_reported_with_line() {
        let file = write_csv("date,open,high,low,close,volume\n2024-01-02,1,2,0.5,abc,10\n");
        let err = load_bars_csv(file.path(), "X").unwrap_err();
        assert!(matches!(err, LoadError::Parse { field: "close", line: 2, .. }));
    }

    #[test]
    fn header_only_file_is_empty() {
        let file = write_csv("date,open,high,low,close,volume\n");
        assert!(matches!(
            load_bars_csv(file.path(), "X"),
            Err(LoadError::Empty { .. })
        ));
    }

    #[test]
    fn synthetic_is_deterministic_weekdays_only() {
        let a = generate_synthetic_bars("SPY", d(2024, 1, 1), d(2024, 3, 31));
        let b = generate_synthetic_bars("SPY", d(2024, 1, 1), d(2024, 3, 31));
        assert_eq!(a, b);
        assert!(a
            .iter()
            .all(|bar| !matches!(bar.date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun)));
        assert!(a.iter().all(|bar| bar.is_sane()));
        let other = generate_synthetic_bars("QQQ", d(2024, 1, 1), d(2024, 3, 31));
        assert_ne!(a[5].close, other[5].close);
    }

    #[test]
    fn range_filter_is_inclusive() {
        let bars = generate_synthetic_bars("SPY", d(2024, 1, 1), d(2024, 1, 31));
        let kept = filter_range(&bars, Some(d(2024, 1, 2)), Some(d(2024, 1, 5)));
        assert_eq!(kept.len(), 4);
        assert_eq!(filter_range(&bars, None, None).len(), bars.len());
    }

    #[test]
    fn dataset_hash_changes_with_data() {
        let bars = generate_synthetic_bars("SPY", d(2024, 1, 1), d(2024, 1, 31));
        let mut changed = bars.clone();
        changed[3].close += 0.01;
        assert_eq!(dataset_hash(&bars), dataset_hash(&bars));
        assert_ne!(dataset_hash(&bars), dataset_hash(&changed));
    }
}
