//! Joint close-price panel with complete-case filtering.
//!
//! Given bars for multiple tickers, builds a close matrix on a common date
//! axis keeping only the dates where every ticker has an observed close.
//! A date with a missing or NaN close for any ticker is dropped entirely,
//! so downstream return series share one index.

use super::provider::DailyBar;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// Complete-case close matrix for a fixed ticker order.
#[derive(Debug, Clone)]
pub struct ClosePanel {
    /// Ticker order, matching the order given at construction.
    tickers: Vec<String>,
    /// Surviving dates, ascending. Same length as each row of `closes`.
    dates: Vec<NaiveDate>,
    /// Close prices per ticker: `closes[i][j]` is `tickers[i]` on `dates[j]`.
    closes: Vec<Vec<f64>>,
}

/// The filtered window has no usable rows.
#[derive(Debug, Error)]
#[error("no complete rows in the requested window ({0} ticker(s))")]
pub struct EmptyPanelError(pub usize);

impl ClosePanel {
    /// Build a panel from per-ticker bars, keeping ticker order.
    ///
    /// Complete-case: a date survives only when every ticker has a finite
    /// close on it. Fails if nothing survives.
    pub fn from_bars(series: &[(String, Vec<DailyBar>)]) -> Result<Self, EmptyPanelError> {
        let tickers: Vec<String> = series.iter().map(|(t, _)| t.clone()).collect();

        // Per-ticker date → close lookup, NaN closes treated as absent.
        let lookups: Vec<HashMap<NaiveDate, f64>> = series
            .iter()
            .map(|(_, bars)| {
                bars.iter()
                    .filter(|b| b.close.is_finite())
                    .map(|b| (b.date, b.close))
                    .collect()
            })
            .collect();

        // Candidate axis: union of all dates, then keep complete rows only.
        let mut all_dates = BTreeSet::new();
        for (_, bars) in series {
            for bar in bars {
                all_dates.insert(bar.date);
            }
        }

        let dates: Vec<NaiveDate> = all_dates
            .into_iter()
            .filter(|d| lookups.iter().all(|m| m.contains_key(d)))
            .collect();

        if dates.is_empty() || tickers.is_empty() {
            return Err(EmptyPanelError(tickers.len()));
        }

        let closes: Vec<Vec<f64>> = lookups
            .iter()
            .map(|m| dates.iter().map(|d| m[d]).collect())
            .collect();

        Ok(Self {
            tickers,
            dates,
            closes,
        })
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Number of surviving dates.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Close series for one ticker by panel index.
    pub fn closes(&self, idx: usize) -> &[f64] {
        &self.closes[idx]
    }

    /// Spot price: the close at the last surviving date.
    pub fn spot(&self, idx: usize) -> f64 {
        // closes rows are non-empty by construction
        *self.closes[idx].last().unwrap_or(&f64::NAN)
    }

    /// Simple daily returns over consecutive surviving dates.
    ///
    /// Gaps introduced by filtering are bridged silently: the return spans
    /// whatever two dates are adjacent in the panel.
    pub fn daily_returns(&self, idx: usize) -> Vec<f64> {
        self.closes[idx]
            .windows(2)
            .map(|w| w[1] / w[0] - 1.0)
            .collect()
    }
}
