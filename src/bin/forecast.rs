use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use dotenv::dotenv;
use log::{error, info};

use stock_forecast_dashboard::config::Settings;
use stock_forecast_dashboard::services::cache::{CachedHistory, SeriesCache};
use stock_forecast_dashboard::services::csv_history::CsvHistory;
use stock_forecast_dashboard::services::dashboard::{present_all, ForecastDashboard};
use stock_forecast_dashboard::services::engine::AdditiveModel;
use stock_forecast_dashboard::services::history::HistorySource;
use stock_forecast_dashboard::services::input::collect_request;
use stock_forecast_dashboard::services::presenter::TerminalPresenter;
use stock_forecast_dashboard::services::yahoo::YahooHistory;

/// Forecast daily closing prices for a list of tickers.
#[derive(Parser)]
#[command(name = "forecast")]
#[command(about = "Stock forecast dashboard on the command line", long_about = None)]
struct Cli {
    /// Comma-separated ticker symbols (defaults to DEFAULT_TICKERS)
    #[arg(short, long)]
    tickers: Option<String>,

    /// Years of prediction, 1 to 5
    #[arg(short, long, default_value = "1")]
    years: i64,

    /// First day of history (defaults to FORECAST_START_DATE)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Treat this date as today; history ends the day before
    #[arg(long)]
    today: Option<NaiveDate>,

    /// Seed for the uncertainty simulation
    #[arg(long)]
    seed: Option<u64>,

    /// Read {SYMBOL}.csv files from this directory instead of Yahoo Finance
    #[arg(long)]
    csv_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();
    let cli = Cli::parse();

    let mut settings = Settings::from_env().context("Failed to load settings")?;
    if let Some(start) = cli.start {
        settings.start_date = start;
    }
    if cli.seed.is_some() {
        settings.model.seed = cli.seed;
    }
    if cli.csv_dir.is_some() {
        settings.csv_dir = cli.csv_dir;
    }

    let raw_tickers = cli.tickers.unwrap_or_else(|| settings.default_tickers.clone());
    let request = collect_request(&raw_tickers, cli.years)?;
    let today = cli.today.unwrap_or_else(|| Utc::now().date_naive());
    info!("Forecasting {:?} from {} to {}", request.tickers, settings.start_date, today);

    let source: Box<dyn HistorySource> = match &settings.csv_dir {
        Some(dir) => Box::new(CsvHistory::new(dir)),
        None => Box::new(YahooHistory::new(&settings.yahoo_base_url)?),
    };
    let dashboard = ForecastDashboard::new(
        Arc::new(CachedHistory::new(source, SeriesCache::new())),
        Arc::new(AdditiveModel::new(settings.model.clone())),
        settings.start_date,
        settings.workers,
    );

    let outcomes = dashboard.run(&request, today).await;
    let mut presenter = TerminalPresenter::new(io::stdout().lock());
    present_all(&outcomes, &mut presenter)?;

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    if failed == outcomes.len() {
        error!("No ticker could be forecast");
        anyhow::bail!("all {} ticker(s) failed", failed);
    }
    Ok(())
}
