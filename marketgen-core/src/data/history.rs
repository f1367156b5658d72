//! Per-ticker history store.
//!
//! Layout: `{history_dir}/{TICKER}.csv`, columns
//! `Date, Open, High, Low, Close, Adj Close, Volume` in that fixed order,
//! dates ascending, `%Y-%m-%d`.
//!
//! Writes are atomic (write to .tmp, rename into place) so an interrupted
//! fetch never leaves a truncated history file behind.

use super::provider::DailyBar;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The persisted column order. Readers validate against this exactly.
pub const HISTORY_COLUMNS: [&str; 7] = [
    "Date",
    "Open",
    "High",
    "Low",
    "Close",
    "Adj Close",
    "Volume",
];

/// Errors from the history store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no history file for '{ticker}' at {path}")]
    NoHistory { ticker: String, path: String },

    #[error("malformed history file for '{ticker}': {reason}")]
    Malformed { ticker: String, reason: String },

    #[error("no price for '{ticker}' on {date}")]
    MissingPrice { ticker: String, date: NaiveDate },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// CSV-backed store of per-ticker daily histories.
pub struct HistoryStore {
    history_dir: PathBuf,
}

impl HistoryStore {
    pub fn new(history_dir: impl Into<PathBuf>) -> Self {
        Self {
            history_dir: history_dir.into(),
        }
    }

    /// Root directory of the store.
    pub fn history_dir(&self) -> &Path {
        &self.history_dir
    }

    /// Path to the history file for a ticker.
    pub fn ticker_path(&self, ticker: &str) -> PathBuf {
        self.history_dir.join(format!("{ticker}.csv"))
    }

    /// Write a ticker's bars, replacing any existing file.
    ///
    /// Bars are written in the order given; callers are expected to pass
    /// date-ascending series (providers sort before handing them over).
    pub fn write(&self, ticker: &str, bars: &[DailyBar]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.history_dir)?;

        let path = self.ticker_path(ticker);
        let tmp_path = path.with_extension("csv.tmp");

        {
            let mut wtr = csv::Writer::from_path(&tmp_path)?;
            wtr.write_record(HISTORY_COLUMNS)?;
            for bar in bars {
                wtr.write_record([
                    bar.date.format("%Y-%m-%d").to_string(),
                    bar.open.to_string(),
                    bar.high.to_string(),
                    bar.low.to_string(),
                    bar.close.to_string(),
                    bar.adj_close.to_string(),
                    bar.volume.to_string(),
                ])?;
            }
            wtr.flush()?;
        }

        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            e.into()
        })
    }

    /// Load a ticker's full history, sorted by date ascending.
    pub fn load(&self, ticker: &str) -> Result<Vec<DailyBar>, StoreError> {
        let path = self.ticker_path(ticker);
        if !path.exists() {
            return Err(StoreError::NoHistory {
                ticker: ticker.to_string(),
                path: path.display().to_string(),
            });
        }

        let mut rdr = csv::Reader::from_path(&path)?;

        let headers = rdr.headers()?.clone();
        if headers.iter().ne(HISTORY_COLUMNS) {
            return Err(StoreError::Malformed {
                ticker: ticker.to_string(),
                reason: format!("unexpected columns: {headers:?}"),
            });
        }

        let mut bars = Vec::new();
        for record in rdr.records() {
            let record = record?;
            bars.push(parse_bar(ticker, &record)?);
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    /// Look up the closing price for a ticker on an exact date.
    ///
    /// Absence of the date is an error, not a fallback to the nearest
    /// session: the index builder is fail-fast on missing snapshot prices.
    pub fn close_on(&self, ticker: &str, date: NaiveDate) -> Result<f64, StoreError> {
        let bars = self.load(ticker)?;
        bars.iter()
            .find(|b| b.date == date)
            .map(|b| b.close)
            .ok_or_else(|| StoreError::MissingPrice {
                ticker: ticker.to_string(),
                date,
            })
    }
}

fn parse_bar(ticker: &str, record: &csv::StringRecord) -> Result<DailyBar, StoreError> {
    let malformed = |reason: String| StoreError::Malformed {
        ticker: ticker.to_string(),
        reason,
    };

    let field = |i: usize| {
        record
            .get(i)
            .ok_or_else(|| malformed(format!("missing field {i}")))
    };

    let date = NaiveDate::parse_from_str(field(0)?, "%Y-%m-%d")
        .map_err(|e| malformed(format!("bad date '{}': {e}", record.get(0).unwrap_or(""))))?;

    let num = |i: usize| -> Result<f64, StoreError> {
        let raw = field(i)?;
        raw.parse::<f64>()
            .map_err(|e| malformed(format!("bad number '{raw}': {e}")))
    };

    // Volume can come back fractional from some providers; truncate.
    let volume = num(6)? as u64;

    Ok(DailyBar {
        date,
        open: num(1)?,
        high: num(2)?,
        low: num(3)?,
        close: num(4)?,
        adj_close: num(5)?,
        volume,
    })
}
