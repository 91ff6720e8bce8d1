use std::net::SocketAddr;
use std::sync::Arc;

use dotenv::dotenv;
use log::info;
use warp::Filter;

use stock_forecast_dashboard::config::Settings;
use stock_forecast_dashboard::handlers::AppState;
use stock_forecast_dashboard::routes;
use stock_forecast_dashboard::services::cache::{CachedHistory, SeriesCache};
use stock_forecast_dashboard::services::csv_history::CsvHistory;
use stock_forecast_dashboard::services::dashboard::ForecastDashboard;
use stock_forecast_dashboard::services::engine::AdditiveModel;
use stock_forecast_dashboard::services::history::HistorySource;
use stock_forecast_dashboard::services::yahoo::YahooHistory;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    let settings = Settings::from_env()?;
    info!("Using PORT: {}", settings.port);

    let source: Box<dyn HistorySource> = match &settings.csv_dir {
        Some(dir) => {
            info!("Reading price history from {}", dir.display());
            Box::new(CsvHistory::new(dir))
        }
        None => {
            info!("Fetching price history from {}", settings.yahoo_base_url);
            Box::new(YahooHistory::new(&settings.yahoo_base_url)?)
        }
    };
    let history = CachedHistory::new(source, SeriesCache::new());
    let dashboard = ForecastDashboard::new(
        Arc::new(history),
        Arc::new(AdditiveModel::new(settings.model.clone())),
        settings.start_date,
        settings.workers,
    );
    let state = AppState::new(dashboard, settings.form_defaults());

    // Bind to 0.0.0.0 for container hosts
    let addr: SocketAddr = ([0, 0, 0, 0], settings.port).into();

    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET"]);

    let api = routes::routes(state).with(cors);
    info!("Routes configured successfully with CORS.");

    info!("Starting server on {}", addr);
    warp::serve(api).run(addr).await;
    Ok(())
}
