//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over the market-data source so the
//! fetch pipeline can be exercised against a mock in tests instead of
//! hitting Yahoo Finance.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One normalized daily OHLCV row for a single ticker.
///
/// Field order mirrors the persisted column order:
/// `Date, Open, High, Low, Close, Adj Close, Volume`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}

/// Structured error types for provider operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("no data returned for '{ticker}'")]
    NoData { ticker: String },

    #[error("provider error: {0}")]
    Other(String),
}

impl DataError {
    /// True for the one non-fatal case in the batch fetch: the provider
    /// answered but had no rows for this ticker.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, DataError::NoData { .. })
    }
}

/// Trait for daily-bar data providers.
pub trait DataProvider {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily bars for a ticker over `[start, end)`, sorted by date
    /// ascending.
    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, DataError>;
}

/// Progress callback for multi-ticker fetches.
pub trait FetchProgress {
    /// Called when starting to fetch a ticker.
    fn on_start(&self, ticker: &str, index: usize, total: usize);

    /// Called when a ticker fetch completes (written, skipped, or failed).
    fn on_complete(&self, ticker: &str, outcome: &TickerOutcome);

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, written: usize, skipped: usize, failed: usize, total: usize);
}

/// Outcome of fetching one ticker within a batch.
#[derive(Debug)]
pub enum TickerOutcome {
    /// Bars were fetched and written; count of rows persisted.
    Written(usize),
    /// Provider returned no rows; ticker skipped, batch continues.
    SkippedEmpty,
    /// Hard failure for this ticker; batch continues.
    Failed(String),
}

/// Progress reporter that prints to stdout, one line per event.
pub struct StdoutProgress;

impl FetchProgress for StdoutProgress {
    fn on_start(&self, ticker: &str, index: usize, total: usize) {
        println!("[{}/{}] Fetching {ticker}...", index + 1, total);
    }

    fn on_complete(&self, ticker: &str, outcome: &TickerOutcome) {
        match outcome {
            TickerOutcome::Written(rows) => println!("  Saved {ticker}.csv with {rows} rows"),
            TickerOutcome::SkippedEmpty => println!("  WARNING: no data for {ticker}, skipping"),
            TickerOutcome::Failed(e) => println!("  FAIL: {ticker}: {e}"),
        }
    }

    fn on_batch_complete(&self, written: usize, skipped: usize, failed: usize, total: usize) {
        println!("\nFetch complete: {written}/{total} written, {skipped} skipped, {failed} failed");
    }
}

/// Progress reporter that swallows all events (for tests and library use).
pub struct SilentProgress;

impl FetchProgress for SilentProgress {
    fn on_start(&self, _ticker: &str, _index: usize, _total: usize) {}
    fn on_complete(&self, _ticker: &str, _outcome: &TickerOutcome) {}
    fn on_batch_complete(&self, _written: usize, _skipped: usize, _failed: usize, _total: usize) {}
}
