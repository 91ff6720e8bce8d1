// src/handlers/defaults.rs
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use super::AppState;

pub async fn get_defaults(state: Arc<AppState>) -> Result<Json, Rejection> {
    Ok(warp::reply::json(&state.defaults))
}
