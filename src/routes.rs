// src/routes.rs
use std::convert::Infallible;
use std::sync::Arc;

use log::{error, info};
use warp::http::StatusCode;
use warp::reject::Rejection;
use warp::{Filter, Reply};

use crate::handlers::defaults::get_defaults;
use crate::handlers::error::ApiError;
use crate::handlers::forecast::{get_forecast, ForecastQuery};
use crate::handlers::AppState;

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status;
        message = api_error.message.clone();
    } else if let Some(invalid) = err.find::<warp::reject::InvalidQuery>() {
        code = StatusCode::BAD_REQUEST;
        message = invalid.to_string();
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = StatusCode::METHOD_NOT_ALLOWED;
        message = "Method Not Allowed".to_string();
    } else {
        error!("Unhandled rejection: {:?}", err);
        code = StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

pub fn routes(state: Arc<AppState>) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let state_filter = warp::any().map(move || state.clone());

    let forecast_route = warp::path!("api" / "v1" / "forecast")
        .and(warp::get())
        .and(warp::query::<ForecastQuery>())
        .and(state_filter.clone())
        .and_then(get_forecast);

    let defaults_route = warp::path!("api" / "v1" / "defaults")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_defaults);

    info!("All routes configured successfully.");

    forecast_route.or(defaults_route).recover(handle_rejection)
}
