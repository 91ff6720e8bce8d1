// src/handlers/forecast.rs
use chrono::Utc;
use log::{info, warn};
use serde::Deserialize;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use crate::services::dashboard::DashboardResponse;
use crate::services::input::collect_request;

use super::error::ApiError;
use super::AppState;

/// `?tickers=GOOG,AAPL&years=2`; missing fields fall back to the form defaults.
#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub tickers: Option<String>,
    pub years: Option<i64>,
}

pub async fn get_forecast(query: ForecastQuery, state: Arc<AppState>) -> Result<Json, Rejection> {
    let tickers = query.tickers.unwrap_or_else(|| state.defaults.tickers.clone());
    let years = query.years.unwrap_or_else(|| i64::from(state.defaults.years));

    let request = collect_request(&tickers, years).map_err(|e| {
        warn!("Rejected forecast request ({:?}, {}): {}", tickers, years, e);
        warp::reject::custom(ApiError::from(e))
    })?;

    let today = Utc::now().date_naive();
    let outcomes = state.dashboard.run(&request, today).await;
    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    info!(
        "Forecast request done: {} ok, {} failed",
        outcomes.len() - failed,
        failed
    );
    Ok(warp::reply::json(&DashboardResponse::new(&request, outcomes)))
}
