//! Portfolio holdings and price-weighted index construction.
//!
//! A holding is either a stock position or an option position; a portfolio
//! is an ordered list of holdings with no uniqueness constraint (a ticker
//! may appear as both a stock and an option leg).

use crate::data::{HistoryStore, StoreError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Call or put, serialized as `CALL` / `PUT` on every surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptionType {
    Call,
    Put,
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "CALL"),
            OptionType::Put => write!(f, "PUT"),
        }
    }
}

/// One portfolio position. Rendered to CSV by the export module;
/// config-side parsing goes through `OptionSpec`.
#[derive(Debug, Clone, PartialEq)]
pub enum Holding {
    Stock {
        ticker: String,
        quantity: u64,
    },
    Option {
        ticker: String,
        quantity: u64,
        strike: f64,
        /// Time to expiry in years.
        maturity: f64,
        option_type: OptionType,
    },
}

impl Holding {
    pub fn ticker(&self) -> &str {
        match self {
            Holding::Stock { ticker, .. } | Holding::Option { ticker, .. } => ticker,
        }
    }

    pub fn quantity(&self) -> u64 {
        match self {
            Holding::Stock { quantity, .. } | Holding::Option { quantity, .. } => *quantity,
        }
    }
}

/// One constituent of a price-weighted index portfolio.
#[derive(Debug, Clone)]
pub struct IndexPosition {
    pub ticker: String,
    pub close: f64,
    pub weight: f64,
    pub quantity: u64,
}

/// A built index portfolio, in input ticker order.
#[derive(Debug, Clone)]
pub struct IndexPortfolio {
    pub snapshot_date: NaiveDate,
    pub target_value: f64,
    pub positions: Vec<IndexPosition>,
}

impl IndexPortfolio {
    /// The positions as stock holdings, in order.
    pub fn holdings(&self) -> Vec<Holding> {
        self.positions
            .iter()
            .map(|p| Holding::Stock {
                ticker: p.ticker.clone(),
                quantity: p.quantity,
            })
            .collect()
    }
}

/// Build a price-weighted index portfolio from stored histories.
///
/// Looks up each ticker's close on the exact snapshot date, weights each
/// constituent by `close / Σ close`, and converts weights to integer share
/// counts truncated toward zero. The lookup is fail-fast: a missing date
/// for any ticker aborts with `StoreError::MissingPrice` and nothing is
/// emitted.
///
/// Truncation can leave `Σ quantity × close` below the target value; that
/// drift is accepted, never rebalanced.
pub fn build_index_portfolio(
    store: &HistoryStore,
    tickers: &[&str],
    snapshot_date: NaiveDate,
    target_value: f64,
) -> Result<IndexPortfolio, StoreError> {
    let mut closes = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        closes.push(store.close_on(ticker, snapshot_date)?);
    }

    let weights = price_weights(&closes);

    let positions = tickers
        .iter()
        .zip(closes.iter().zip(&weights))
        .map(|(ticker, (&close, &weight))| IndexPosition {
            ticker: ticker.to_string(),
            close,
            weight,
            quantity: share_quantity(weight, target_value, close),
        })
        .collect();

    Ok(IndexPortfolio {
        snapshot_date,
        target_value,
        positions,
    })
}

/// Price weights: `weight(t) = close(t) / Σ close`.
///
/// The conventional index divisor is deliberately ignored; this mirrors a
/// raw price-weighted construction.
pub fn price_weights(closes: &[f64]) -> Vec<f64> {
    let total: f64 = closes.iter().sum();
    if total <= 0.0 {
        return vec![0.0; closes.len()];
    }
    closes.iter().map(|c| c / total).collect()
}

/// Integer share count: `floor(weight × value / close)`, truncated toward
/// zero. Never negative for positive inputs.
pub fn share_quantity(weight: f64, target_value: f64, close: f64) -> u64 {
    if close <= 0.0 {
        return 0;
    }
    let shares = (weight * target_value / close).floor();
    if shares.is_sign_negative() || shares.is_nan() {
        0
    } else {
        shares as u64
    }
}
