#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};

use stock_forecast_dashboard::error::FetchError;
use stock_forecast_dashboard::models::{PriceObservation, PriceSeries};
use stock_forecast_dashboard::services::dashboard::ForecastDashboard;
use stock_forecast_dashboard::services::engine::{AdditiveModel, ModelConfig};
use stock_forecast_dashboard::services::history::HistorySource;

/// Serves synthetic daily rows starting at the requested start date; symbols
/// listed in `unknown` fail like a delisted ticker.
#[derive(Default)]
pub struct FakeMarket {
    pub unknown: Vec<String>,
    pub calls: AtomicUsize,
}

impl FakeMarket {
    pub fn with_unknown(symbols: &[&str]) -> Self {
        FakeMarket {
            unknown: symbols.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HistorySource for FakeMarket {
    async fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<PriceSeries, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unknown.iter().any(|u| u == symbol) {
            return Err(FetchError::UnknownSymbol(symbol.to_string()));
        }
        let base = 10.0 + symbol.len() as f64;
        let rows = (0..90)
            .map(|i| {
                let close = base + 0.05 * i as f64 + ((i % 7) as f64 - 3.0) * 0.1;
                PriceObservation {
                    date: start + Duration::days(i),
                    open: close - 0.2,
                    high: close + 0.5,
                    low: close - 0.5,
                    close,
                    volume: 1_000 + i as u64,
                }
            })
            .collect();
        PriceSeries::new(symbol, rows).map_err(|e| FetchError::Parse(e.to_string()))
    }
}

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

pub fn test_engine() -> AdditiveModel {
    AdditiveModel::new(ModelConfig {
        uncertainty_samples: 30,
        seed: Some(11),
        ..ModelConfig::default()
    })
}

pub fn dashboard_over(source: Arc<dyn HistorySource>) -> ForecastDashboard {
    ForecastDashboard::new(source, Arc::new(test_engine()), start_date(), 2)
}
