//! Yahoo Finance data provider.
//!
//! Fetches daily OHLCV bars from Yahoo's v8 chart API. Handles response
//! parsing and bounded retry with exponential backoff on rate limits and
//! transient network faults.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes; parse failures surface as `DataError::ResponseFormatChanged`.

use super::provider::{DailyBar, DataError, DataProvider};
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

impl ChartResponse {
    /// Flatten the nested chart payload into normalized daily bars.
    fn into_bars(self, ticker: &str) -> Result<Vec<DailyBar>, DataError> {
        let result = self.chart.result.ok_or_else(|| match self.chart.error {
            Some(err) if err.code == "Not Found" => DataError::NoData {
                ticker: ticker.to_string(),
            },
            Some(err) => {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let timestamps = match data.timestamp {
            Some(ts) if !ts.is_empty() => ts,
            // A valid response with no timestamps means the ticker simply
            // has no rows in the requested window.
            _ => {
                return Err(DataError::NoData {
                    ticker: ticker.to_string(),
                })
            }
        };

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let mut bars = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();
            let adj_close = adj_closes.as_ref().and_then(|v| v.get(i).copied().flatten());

            // All-None rows are holidays/non-trading days in Yahoo's payload.
            if open.is_none() && high.is_none() && low.is_none() && close.is_none() {
                continue;
            }

            bars.push(DailyBar {
                date,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close: close.unwrap_or(f64::NAN),
                adj_close: adj_close.unwrap_or(f64::NAN),
                volume: volume.unwrap_or(0),
            });
        }

        if bars.is_empty() {
            return Err(DataError::NoData {
                ticker: ticker.to_string(),
            });
        }

        Ok(bars)
    }
}

/// Yahoo Finance data provider over the blocking reqwest client.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new() -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    /// Build the chart API URL for a ticker and a half-open `[start, end)`
    /// date range. `period2` is midnight UTC of `end`, so a bar dated
    /// exactly `end` falls outside the window.
    fn chart_url(ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
        // and_hms_opt with in-range constants cannot fail
        let start_ts = start
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0);
        let end_ts = end
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0);
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{ticker}\
             ?period1={start_ts}&period2={end_ts}&interval=1d\
             &includeAdjustedClose=true"
        )
    }

    fn fetch_with_retry(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, DataError> {
        let url = Self::chart_url(ticker, start, end);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = match &last_error {
                    Some(DataError::RateLimited { retry_after_secs }) => {
                        Duration::from_secs(*retry_after_secs)
                    }
                    _ => self.base_delay * 2u32.pow(attempt - 1),
                };
                std::thread::sleep(delay);
            }

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if status.is_server_error() {
                        last_error = Some(DataError::Other(format!("HTTP {status} for {ticker}")));
                        continue;
                    }

                    if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
                        return Err(DataError::Other(format!("HTTP {status} for {ticker}")));
                    }

                    // 404 still carries a chart error body; let the parser
                    // turn it into NoData.
                    let chart: ChartResponse = resp.json().map_err(|e| {
                        DataError::ResponseFormatChanged(format!(
                            "failed to parse response for {ticker}: {e}"
                        ))
                    })?;

                    return chart.into_bars(ticker);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }

    /// Enforce the half-open `[start, end)` window. Yahoo's period bounds
    /// are timestamps, not dates, and session timestamps near a boundary
    /// can leak a bar from either side.
    fn restrict_window(bars: &mut Vec<DailyBar>, start: NaiveDate, end: NaiveDate) {
        bars.retain(|b| b.date >= start && b.date < end);
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, DataError> {
        let mut bars = self.fetch_with_retry(ticker, start, end)?;
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);
        Self::restrict_window(&mut bars, start, end);
        if bars.is_empty() {
            return Err(DataError::NoData {
                ticker: ticker.to_string(),
            });
        }
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ChartResponse {
        serde_json::from_str(json).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn bar(d: &str) -> DailyBar {
        DailyBar {
            date: date(d),
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.5,
            adj_close: 100.5,
            volume: 1000,
        }
    }

    #[test]
    fn window_excludes_end_date_and_earlier_bars() {
        let mut bars = vec![
            bar("2023-12-29"),
            bar("2024-01-02"),
            bar("2024-01-31"),
            bar("2024-02-01"),
        ];

        YahooProvider::restrict_window(
            &mut bars,
            date("2024-01-01"),
            date("2024-02-01"),
        );

        // A bar dated exactly `end` is out; bars before `start` are out.
        let dates: Vec<NaiveDate> = bars.iter().map(|b| b.date).collect();
        assert_eq!(dates, vec![date("2024-01-02"), date("2024-01-31")]);
    }

    #[test]
    fn chart_url_end_bound_is_exclusive() {
        let start = date("2023-01-01");
        let end = date("2023-06-30");
        let url = YahooProvider::chart_url("AAPL", start, end);

        // period2 is midnight UTC of `end`, so the session bar dated
        // `end` (timestamped later that day) cannot be returned.
        let end_midnight = end
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp();
        assert!(url.contains(&format!("period2={end_midnight}")));
    }

    #[test]
    fn parses_well_formed_chart_payload() {
        // 2024-01-02 and 2024-01-03 as UTC midnights
        let json = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1704153600, 1704240000],
                    "indicators": {
                        "quote": [{
                            "open": [100.0, 101.0],
                            "high": [102.0, 103.0],
                            "low": [99.0, 100.5],
                            "close": [101.5, 102.5],
                            "volume": [1000, 2000]
                        }],
                        "adjclose": [{"adjclose": [101.0, 102.0]}]
                    }
                }],
                "error": null
            }
        }"#;

        let bars = parse(json).into_bars("TEST").unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[0].close, 101.5);
        assert_eq!(bars[0].adj_close, 101.0);
        assert_eq!(bars[1].volume, 2000);
    }

    #[test]
    fn not_found_error_maps_to_no_data() {
        let json = r#"{
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found"}
            }
        }"#;

        let err = parse(json).into_bars("BOGUS").unwrap_err();
        assert!(err.is_empty_result());
    }

    #[test]
    fn missing_timestamps_map_to_no_data() {
        let json = r#"{
            "chart": {
                "result": [{
                    "timestamp": null,
                    "indicators": {"quote": [{"open": [], "high": [], "low": [], "close": [], "volume": []}]}
                }],
                "error": null
            }
        }"#;

        let err = parse(json).into_bars("EMPTY").unwrap_err();
        assert!(err.is_empty_result());
    }

    #[test]
    fn all_none_rows_are_dropped() {
        let json = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1704153600, 1704240000],
                    "indicators": {
                        "quote": [{
                            "open": [100.0, null],
                            "high": [102.0, null],
                            "low": [99.0, null],
                            "close": [101.5, null],
                            "volume": [1000, null]
                        }]
                    }
                }],
                "error": null
            }
        }"#;

        let bars = parse(json).into_bars("TEST").unwrap();
        assert_eq!(bars.len(), 1);
    }
}
