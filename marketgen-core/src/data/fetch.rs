//! Batch fetch orchestrator.
//!
//! Walks a ticker list sequentially: fetch, normalize, persist, pause.
//! One ticker's failure never aborts the batch; empty results are the
//! warn-and-skip case, anything else is recorded in the summary.

use super::history::{HistoryStore, StoreError};
use super::provider::{DataError, DataProvider, FetchProgress, TickerOutcome};
use chrono::NaiveDate;
use std::time::Duration;

/// Fetch histories for all tickers and persist one CSV per ticker.
///
/// `pause` is the synchronous delay between consecutive requests, respecting
/// provider rate limits. It is skipped after the final ticker.
pub fn fetch_histories(
    provider: &dyn DataProvider,
    store: &HistoryStore,
    tickers: &[&str],
    start: NaiveDate,
    end: NaiveDate,
    pause: Duration,
    progress: &dyn FetchProgress,
) -> FetchSummary {
    let total = tickers.len();
    let mut written = 0;
    let mut skipped = 0;
    let mut failed = 0;
    let mut errors: Vec<(String, FetchError)> = Vec::new();

    for (i, ticker) in tickers.iter().enumerate() {
        progress.on_start(ticker, i, total);

        let outcome = match fetch_single(provider, store, ticker, start, end) {
            Ok(rows) => {
                written += 1;
                TickerOutcome::Written(rows)
            }
            Err(FetchError::Provider(e)) if e.is_empty_result() => {
                skipped += 1;
                TickerOutcome::SkippedEmpty
            }
            Err(e) => {
                failed += 1;
                let message = e.to_string();
                errors.push((ticker.to_string(), e));
                TickerOutcome::Failed(message)
            }
        };

        progress.on_complete(ticker, &outcome);

        if i + 1 < total && !pause.is_zero() {
            std::thread::sleep(pause);
        }
    }

    progress.on_batch_complete(written, skipped, failed, total);

    FetchSummary {
        total,
        written,
        skipped,
        failed,
        errors,
    }
}

/// Fetch one ticker and write its history file.
///
/// Returns the number of rows persisted.
fn fetch_single(
    provider: &dyn DataProvider,
    store: &HistoryStore,
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<usize, FetchError> {
    let bars = provider.fetch(ticker, start, end)?;
    store.write(ticker, &bars)?;
    Ok(bars.len())
}

/// Per-ticker error inside a batch fetch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Provider(#[from] DataError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Summary of a batch fetch.
#[derive(Debug)]
pub struct FetchSummary {
    pub total: usize,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<(String, FetchError)>,
}

impl FetchSummary {
    /// True when no ticker hit a hard failure (skips are fine).
    pub fn no_hard_failures(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::{DailyBar, SilentProgress};
    use std::collections::HashMap;

    struct FixedProvider {
        series: HashMap<String, Vec<DailyBar>>,
    }

    impl DataProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        fn fetch(
            &self,
            ticker: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<DailyBar>, DataError> {
            match self.series.get(ticker) {
                Some(bars) if !bars.is_empty() => Ok(bars.clone()),
                _ => Err(DataError::NoData {
                    ticker: ticker.to_string(),
                }),
            }
        }
    }

    fn bar(date: &str, close: f64) -> DailyBar {
        DailyBar {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            adj_close: close,
            volume: 100,
        }
    }

    #[test]
    fn empty_ticker_is_skipped_and_batch_continues() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path());

        let mut series = HashMap::new();
        series.insert("AAPL".to_string(), vec![bar("2024-01-02", 100.0)]);
        // "GHOST" has no data
        series.insert("MSFT".to_string(), vec![bar("2024-01-02", 300.0)]);
        let provider = FixedProvider { series };

        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();

        let summary = fetch_histories(
            &provider,
            &store,
            &["AAPL", "GHOST", "MSFT"],
            start,
            end,
            Duration::ZERO,
            &SilentProgress,
        );

        assert_eq!(summary.written, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 0);
        assert!(summary.no_hard_failures());

        // The skipped ticker produced no file; the later ticker still did.
        assert!(!store.ticker_path("GHOST").exists());
        assert!(store.ticker_path("MSFT").exists());
    }

    #[test]
    fn written_files_are_loadable() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path());

        let mut series = HashMap::new();
        series.insert(
            "JPM".to_string(),
            vec![bar("2024-01-02", 170.0), bar("2024-01-03", 171.0)],
        );
        let provider = FixedProvider { series };

        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();

        let summary = fetch_histories(
            &provider,
            &store,
            &["JPM"],
            start,
            end,
            Duration::ZERO,
            &SilentProgress,
        );

        assert_eq!(summary.written, 1);
        assert_eq!(store.load("JPM").unwrap().len(), 2);
    }
}
