//! CSV artifact generation — holdings, market parameters, and the
//! correlation matrix.
//!
//! Every exporter renders the full document in memory and only then writes
//! it, so a failed export never leaves a partial file behind.

use crate::portfolio::Holding;
use crate::snapshot::{MarketParams, MarketSnapshot};
use crate::stats::CorrelationMatrix;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv output is not valid UTF-8")]
    Encoding,
}

/// Render a holdings list as CSV.
///
/// Columns: `type, ticker, quantity, strike, maturity, option_type`.
/// Strike, maturity, and option_type are blank for STOCK rows.
pub fn holdings_csv(holdings: &[Holding]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["type", "ticker", "quantity", "strike", "maturity", "option_type"])?;

    for holding in holdings {
        match holding {
            Holding::Stock { ticker, quantity } => {
                wtr.write_record(["STOCK", ticker, &quantity.to_string(), "", "", ""])?;
            }
            Holding::Option {
                ticker,
                quantity,
                strike,
                maturity,
                option_type,
            } => {
                wtr.write_record([
                    "OPTION",
                    ticker,
                    &quantity.to_string(),
                    &strike.to_string(),
                    &maturity.to_string(),
                    &option_type.to_string(),
                ])?;
            }
        }
    }

    finish(wtr)
}

/// Render a market parameters table as CSV.
///
/// Columns: `ticker, spot, vol, r`.
pub fn market_csv(params: &[MarketParams]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["ticker", "spot", "vol", "r"])?;
    for p in params {
        wtr.write_record([
            p.ticker.as_str(),
            &p.spot.to_string(),
            &p.vol.to_string(),
            &p.r.to_string(),
        ])?;
    }
    finish(wtr)
}

/// Render a correlation matrix as CSV.
///
/// The first header cell is empty and the first column of each row is the
/// row ticker label, mirroring a labeled square-matrix dump.
pub fn correlation_csv(matrix: &CorrelationMatrix) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header: Vec<&str> = vec![""];
    header.extend(matrix.tickers().iter().map(|t| t.as_str()));
    wtr.write_record(&header)?;

    for (i, ticker) in matrix.tickers().iter().enumerate() {
        let mut row: Vec<String> = vec![ticker.clone()];
        row.extend(matrix.row(i).iter().map(|v| v.to_string()));
        wtr.write_record(&row)?;
    }

    finish(wtr)
}

/// Write the three snapshot artifacts (market.csv, correlation.csv,
/// portfolio.csv) into `output_dir`, creating it if needed.
pub fn save_snapshot_artifacts(
    snapshot: &MarketSnapshot,
    holdings: &[Holding],
    output_dir: &Path,
) -> Result<(), ExportError> {
    std::fs::create_dir_all(output_dir)?;

    let market = market_csv(&snapshot.params)?;
    let correlation = correlation_csv(&snapshot.correlation)?;
    let portfolio = holdings_csv(holdings)?;

    std::fs::write(output_dir.join("market.csv"), market)?;
    std::fs::write(output_dir.join("correlation.csv"), correlation)?;
    std::fs::write(output_dir.join("portfolio.csv"), portfolio)?;

    Ok(())
}

/// Write a holdings CSV to a single path.
pub fn save_holdings(holdings: &[Holding], path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let csv = holdings_csv(holdings)?;
    std::fs::write(path, csv)?;
    Ok(())
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let data = wtr
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;
    String::from_utf8(data).map_err(|_| ExportError::Encoding)
}
