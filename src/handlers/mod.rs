// src/handlers/mod.rs
use std::sync::Arc;

use crate::config::FormDefaults;
use crate::services::dashboard::ForecastDashboard;

pub mod defaults;
pub mod error;
pub mod forecast;

/// Shared by every route.
pub struct AppState {
    pub dashboard: ForecastDashboard,
    pub defaults: FormDefaults,
}

impl AppState {
    pub fn new(dashboard: ForecastDashboard, defaults: FormDefaults) -> Arc<Self> {
        Arc::new(AppState { dashboard, defaults })
    }
}
