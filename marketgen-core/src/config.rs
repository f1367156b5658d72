//! Job configuration.
//!
//! One TOML file drives all three pipelines; every field has a default so
//! running without a config reproduces the stock DJIA/snapshot job exactly.

use crate::portfolio::{Holding, OptionType};
use crate::snapshot::DEFAULT_RISK_FREE_RATE;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The 30 DJIA constituents fetched and weighted by default.
pub const DJIA_TICKERS: [&str; 30] = [
    "GS", "CAT", "MSFT", "AXP", "HD", "SHW", "V", "UNH", "AMGN", "JPM", //
    "MCD", "IBM", "TRV", "AAPL", "CRM", "AMZN", "JNJ", "BA", "HON", "NVDA", //
    "MMM", "CVX", "PG", "WMT", "DIS", "MRK", "CSCO", "KO", "NKE", "VZ",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level job configuration, one section per pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub portfolio: PortfolioConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
}

impl JobConfig {
    /// Load a job config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a job config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

/// History fetcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct HistoryConfig {
    pub tickers: Vec<String>,
    pub start: NaiveDate,
    pub output_dir: PathBuf,
    /// Synchronous pause between provider requests, in seconds.
    pub pause_secs: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            tickers: DJIA_TICKERS.iter().map(|s| s.to_string()).collect(),
            start: NaiveDate::from_ymd_opt(1980, 1, 1).unwrap(),
            output_dir: PathBuf::from("data/history/djia"),
            pause_secs: 1,
        }
    }
}

/// Index portfolio builder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PortfolioConfig {
    pub tickers: Vec<String>,
    pub snapshot_date: NaiveDate,
    pub value: f64,
    pub output: PathBuf,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            tickers: DJIA_TICKERS.iter().map(|s| s.to_string()).collect(),
            snapshot_date: NaiveDate::from_ymd_opt(2025, 8, 8).unwrap(),
            value: 10_000_000.0,
            output: PathBuf::from("data/portfolio_djia.csv"),
        }
    }
}

/// Market snapshot generator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SnapshotConfig {
    pub tickers: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub risk_free_rate: f64,
    /// Shares per ticker in the emitted holdings list.
    pub stock_quantity: u64,
    pub output_dir: PathBuf,
    /// Listed last so TOML renders the array-of-tables after plain keys.
    pub options: Vec<OptionSpec>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            tickers: vec!["AAPL".into(), "MSFT".into(), "GOOG".into()],
            start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2023, 7, 1).unwrap(),
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            stock_quantity: 100,
            output_dir: PathBuf::from("data"),
            options: vec![
                OptionSpec {
                    ticker: "AAPL".into(),
                    quantity: 100,
                    strike: 180.0,
                    maturity: 0.5,
                    option_type: OptionType::Call,
                },
                OptionSpec {
                    ticker: "MSFT".into(),
                    quantity: 50,
                    strike: 320.0,
                    maturity: 1.0,
                    option_type: OptionType::Put,
                },
            ],
        }
    }
}

/// One illustrative option position in the snapshot holdings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionSpec {
    pub ticker: String,
    pub quantity: u64,
    pub strike: f64,
    /// Time to expiry in years.
    pub maturity: f64,
    pub option_type: OptionType,
}

impl OptionSpec {
    pub fn to_holding(&self) -> Holding {
        Holding::Option {
            ticker: self.ticker.clone(),
            quantity: self.quantity,
            strike: self.strike,
            maturity: self.maturity,
            option_type: self.option_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_stock_defaults() {
        let cfg = JobConfig::from_toml("").unwrap();
        assert_eq!(cfg.history.tickers.len(), 30);
        assert_eq!(cfg.history.pause_secs, 1);
        assert_eq!(cfg.portfolio.value, 10_000_000.0);
        assert_eq!(cfg.snapshot.tickers, vec!["AAPL", "MSFT", "GOOG"]);
        assert_eq!(cfg.snapshot.risk_free_rate, 0.03);
        assert_eq!(cfg.snapshot.options.len(), 2);
    }

    #[test]
    fn partial_section_overrides_defaults() {
        let cfg = JobConfig::from_toml(
            r#"
[snapshot]
tickers = ["SPY"]
risk_free_rate = 0.05

[[snapshot.options]]
ticker = "SPY"
quantity = 10
strike = 500.0
maturity = 0.25
option_type = "PUT"
"#,
        )
        .unwrap();

        assert_eq!(cfg.snapshot.tickers, vec!["SPY"]);
        assert_eq!(cfg.snapshot.risk_free_rate, 0.05);
        assert_eq!(cfg.snapshot.options.len(), 1);
        assert_eq!(cfg.snapshot.options[0].option_type, OptionType::Put);
        // Untouched sections keep their defaults.
        assert_eq!(cfg.portfolio.tickers.len(), 30);
    }

    #[test]
    fn dates_parse_from_iso_strings() {
        let cfg = JobConfig::from_toml(
            r#"
[portfolio]
snapshot_date = "2024-12-31"
"#,
        )
        .unwrap();
        assert_eq!(
            cfg.portfolio.snapshot_date,
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = JobConfig::from_toml("[history]\nticker_list = []\n");
        assert!(result.is_err());
    }

    #[test]
    fn toml_round_trip() {
        let cfg = JobConfig::default();
        let serialized = toml::to_string(&cfg).unwrap();
        let parsed = JobConfig::from_toml(&serialized).unwrap();
        assert_eq!(parsed.history.tickers, cfg.history.tickers);
        assert_eq!(parsed.snapshot.options.len(), cfg.snapshot.options.len());
    }
}
