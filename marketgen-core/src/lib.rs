//! marketgen core — market data preparation for a derivatives pricing stack.
//!
//! Three pipelines, each a single sequential pass:
//! - History fetch: daily OHLCV per ticker from Yahoo Finance, persisted as
//!   one CSV per ticker
//! - Index portfolio: price-weighted share quantities from a close snapshot
//! - Market snapshot: spots, annualized volatilities, and the return
//!   correlation matrix, plus a mixed stock/option holdings list

pub mod config;
pub mod data;
pub mod export;
pub mod portfolio;
pub mod snapshot;
pub mod stats;

pub use config::JobConfig;
pub use portfolio::{build_index_portfolio, Holding, IndexPortfolio, OptionType};
pub use snapshot::{build_snapshot, snapshot_holdings, MarketSnapshot};
