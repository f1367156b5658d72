//! marketgen CLI — fetch histories, build index portfolios, generate
//! market snapshots.
//!
//! Commands:
//! - `fetch` — download daily histories from Yahoo Finance, one CSV per ticker
//! - `portfolio` — build a price-weighted index portfolio from stored histories
//! - `snapshot` — derive spots, vols, and correlations for a small ticker set
//!
//! Every parameter has a default from `JobConfig`, so running a bare
//! subcommand reproduces the stock DJIA/snapshot job.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use marketgen_core::config::JobConfig;
use marketgen_core::data::{
    fetch_histories, ClosePanel, DataProvider, HistoryStore, StdoutProgress, YahooProvider,
};
use marketgen_core::export::{save_holdings, save_snapshot_artifacts};
use marketgen_core::{build_index_portfolio, build_snapshot, snapshot_holdings};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "marketgen",
    about = "marketgen CLI — market data preparation pipelines"
)]
struct Cli {
    /// Path to a TOML job config. Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download daily histories from Yahoo Finance, one CSV per ticker.
    Fetch {
        /// Tickers to fetch; overrides the configured list when given.
        tickers: Vec<String>,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// History directory.
        #[arg(long)]
        history_dir: Option<PathBuf>,
    },
    /// Build a price-weighted index portfolio from stored histories.
    Portfolio {
        /// Snapshot date (YYYY-MM-DD).
        #[arg(long)]
        date: Option<String>,

        /// Target total portfolio value.
        #[arg(long)]
        value: Option<f64>,

        /// History directory to read closes from.
        #[arg(long)]
        history_dir: Option<PathBuf>,

        /// Output holdings CSV path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Derive spots, volatilities, and correlations for a ticker set.
    Snapshot {
        /// Window start date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// Window end date (YYYY-MM-DD, exclusive).
        #[arg(long)]
        end: Option<String>,

        /// Directory for market.csv, correlation.csv, portfolio.csv.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => JobConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => JobConfig::default(),
    };

    match cli.command {
        Commands::Fetch {
            tickers,
            start,
            history_dir,
        } => run_fetch(config, tickers, start, history_dir),
        Commands::Portfolio {
            date,
            value,
            history_dir,
            output,
        } => run_portfolio(config, date, value, history_dir, output),
        Commands::Snapshot {
            start,
            end,
            output_dir,
        } => run_snapshot(config, start, end, output_dir),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
}

fn run_fetch(
    config: JobConfig,
    tickers: Vec<String>,
    start: Option<String>,
    history_dir: Option<PathBuf>,
) -> Result<()> {
    let cfg = config.history;

    let tickers = if tickers.is_empty() {
        cfg.tickers
    } else {
        tickers
    };
    let start = match start {
        Some(s) => parse_date(&s)?,
        None => cfg.start,
    };
    let end = chrono::Local::now().date_naive();
    let history_dir = history_dir.unwrap_or(cfg.output_dir);

    let provider = YahooProvider::new()?;
    let store = HistoryStore::new(&history_dir);
    let ticker_refs: Vec<&str> = tickers.iter().map(|t| t.as_str()).collect();

    println!(
        "Fetching {} ticker(s) from {start} to {end} into {}",
        ticker_refs.len(),
        history_dir.display()
    );

    let summary = fetch_histories(
        &provider,
        &store,
        &ticker_refs,
        start,
        end,
        Duration::from_secs(cfg.pause_secs),
        &StdoutProgress,
    );

    if !summary.no_hard_failures() {
        for (ticker, err) in &summary.errors {
            eprintln!("Error for {ticker}: {err}");
        }
        std::process::exit(1);
    }

    Ok(())
}

fn run_portfolio(
    config: JobConfig,
    date: Option<String>,
    value: Option<f64>,
    history_dir: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let cfg = config.portfolio;

    let snapshot_date = match date {
        Some(s) => parse_date(&s)?,
        None => cfg.snapshot_date,
    };
    let value = value.unwrap_or(cfg.value);
    let history_dir = history_dir.unwrap_or(config.history.output_dir);
    let output = output.unwrap_or(cfg.output);

    println!("Generating index portfolio for {snapshot_date}...");

    let store = HistoryStore::new(&history_dir);
    let ticker_refs: Vec<&str> = cfg.tickers.iter().map(|t| t.as_str()).collect();

    let portfolio = build_index_portfolio(&store, &ticker_refs, snapshot_date, value)
        .context("building index portfolio")?;

    save_holdings(&portfolio.holdings(), &output)?;
    println!("\nPortfolio saved to {}\n", output.display());

    println!("=== Portfolio Summary ===");
    for p in &portfolio.positions {
        println!(
            "{}: price={}, weight={:.4}, qty={}",
            p.ticker, p.close, p.weight, p.quantity
        );
    }

    Ok(())
}

fn run_snapshot(
    config: JobConfig,
    start: Option<String>,
    end: Option<String>,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let cfg = config.snapshot;

    let start = match start {
        Some(s) => parse_date(&s)?,
        None => cfg.start,
    };
    let end = match end {
        Some(s) => parse_date(&s)?,
        None => cfg.end,
    };
    let output_dir = output_dir.unwrap_or(cfg.output_dir);

    println!("Downloading market data from {start} to {end}...");

    let provider = YahooProvider::new()?;
    let mut series = Vec::with_capacity(cfg.tickers.len());
    for ticker in &cfg.tickers {
        let bars = provider
            .fetch(ticker, start, end)
            .with_context(|| format!("fetching {ticker}"))?;
        series.push((ticker.clone(), bars));
    }

    let panel = ClosePanel::from_bars(&series)
        .context("downloaded price data is empty, check dates or ticker symbols")?;

    let snapshot = build_snapshot(&panel, cfg.risk_free_rate);

    let options: Vec<_> = cfg.options.iter().map(|o| o.to_holding()).collect();
    let holdings = snapshot_holdings(panel.tickers(), cfg.stock_quantity, &options);

    save_snapshot_artifacts(&snapshot, &holdings, &output_dir)?;

    println!("Saved: {}", output_dir.join("market.csv").display());
    println!("Saved: {}", output_dir.join("correlation.csv").display());
    println!("Saved: {}", output_dir.join("portfolio.csv").display());

    Ok(())
}
