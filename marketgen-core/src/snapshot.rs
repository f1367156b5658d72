//! Market snapshot: spot prices, annualized volatilities, and the return
//! correlation matrix derived from a close panel.
//!
//! The risk-free rate is a configured constant applied uniformly to all
//! tickers, not fetched or derived.

use crate::data::ClosePanel;
use crate::portfolio::Holding;
use crate::stats::{annualized_volatility, CorrelationMatrix};
use serde::Serialize;

/// Default risk-free rate when none is configured.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.03;

/// Per-ticker market parameters.
#[derive(Debug, Clone, Serialize)]
pub struct MarketParams {
    pub ticker: String,
    pub spot: f64,
    pub vol: f64,
    pub r: f64,
}

/// Derived market snapshot for a ticker set.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub params: Vec<MarketParams>,
    pub correlation: CorrelationMatrix,
}

/// Compute spot, volatility, and pairwise correlation from a close panel.
///
/// Spot is the close at the last surviving date; volatility is the sample
/// stddev of daily returns annualized by √252. All return series share the
/// panel's common date index, so correlations are computed pairwise over
/// identical dates.
pub fn build_snapshot(panel: &ClosePanel, risk_free_rate: f64) -> MarketSnapshot {
    let tickers = panel.tickers();

    let returns: Vec<Vec<f64>> = (0..tickers.len()).map(|i| panel.daily_returns(i)).collect();

    let params = tickers
        .iter()
        .enumerate()
        .map(|(i, ticker)| MarketParams {
            ticker: ticker.clone(),
            spot: panel.spot(i),
            vol: annualized_volatility(&returns[i]),
            r: risk_free_rate,
        })
        .collect();

    let correlation = CorrelationMatrix::from_returns(tickers, &returns);

    MarketSnapshot {
        params,
        correlation,
    }
}

/// Assemble the snapshot holdings list: one fixed-size stock position per
/// ticker followed by the configured option positions.
///
/// No cross-validation happens against the snapshot itself; option strikes
/// are taken as given.
pub fn snapshot_holdings(
    tickers: &[String],
    stock_quantity: u64,
    options: &[Holding],
) -> Vec<Holding> {
    let mut holdings: Vec<Holding> = tickers
        .iter()
        .map(|t| Holding::Stock {
            ticker: t.clone(),
            quantity: stock_quantity,
        })
        .collect();
    holdings.extend_from_slice(options);
    holdings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DailyBar;
    use crate::portfolio::OptionType;
    use chrono::NaiveDate;

    fn bars(closes: &[(&str, f64)]) -> Vec<DailyBar> {
        closes
            .iter()
            .map(|(date, close)| DailyBar {
                date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
                open: *close,
                high: *close,
                low: *close,
                close: *close,
                adj_close: *close,
                volume: 100,
            })
            .collect()
    }

    fn two_ticker_panel() -> ClosePanel {
        ClosePanel::from_bars(&[
            (
                "AAPL".to_string(),
                bars(&[
                    ("2023-01-03", 100.0),
                    ("2023-01-04", 102.0),
                    ("2023-01-05", 101.0),
                    ("2023-01-06", 103.0),
                ]),
            ),
            (
                "MSFT".to_string(),
                bars(&[
                    ("2023-01-03", 200.0),
                    ("2023-01-04", 204.0),
                    ("2023-01-05", 202.0),
                    ("2023-01-06", 206.0),
                ]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn spots_are_last_closes() {
        let snap = build_snapshot(&two_ticker_panel(), 0.03);
        assert_eq!(snap.params[0].spot, 103.0);
        assert_eq!(snap.params[1].spot, 206.0);
    }

    #[test]
    fn risk_free_rate_is_uniform() {
        let snap = build_snapshot(&two_ticker_panel(), 0.045);
        assert!(snap.params.iter().all(|p| p.r == 0.045));
    }

    #[test]
    fn volatility_is_non_negative() {
        let snap = build_snapshot(&two_ticker_panel(), 0.03);
        assert!(snap.params.iter().all(|p| p.vol >= 0.0));
    }

    #[test]
    fn proportional_series_correlate_perfectly() {
        // MSFT closes are exactly 2× AAPL's, so returns are identical.
        let snap = build_snapshot(&two_ticker_panel(), 0.03);
        assert!((snap.correlation.get(0, 1) - 1.0).abs() < 1e-12);
        assert_eq!(snap.correlation.get(0, 0), 1.0);
        assert_eq!(snap.correlation.get(1, 1), 1.0);
    }

    #[test]
    fn holdings_are_stocks_then_options() {
        let tickers = vec!["AAPL".to_string(), "MSFT".to_string()];
        let options = vec![Holding::Option {
            ticker: "AAPL".to_string(),
            quantity: 100,
            strike: 180.0,
            maturity: 0.5,
            option_type: OptionType::Call,
        }];

        let holdings = snapshot_holdings(&tickers, 100, &options);

        assert_eq!(holdings.len(), 3);
        assert!(matches!(holdings[0], Holding::Stock { .. }));
        assert!(matches!(holdings[1], Holding::Stock { .. }));
        assert!(matches!(holdings[2], Holding::Option { .. }));
        // A ticker may appear as both stock and option.
        assert_eq!(holdings[0].ticker(), holdings[2].ticker());
    }
}
