// src/services/dashboard.rs
use chrono::NaiveDate;
use log::{error, info};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::config::DAYS_PER_YEAR;
use crate::error::{ForecastError, Result};
use crate::models::ForecastRequest;

use super::engine::ForecastEngine;
use super::history::HistorySource;
use super::pipeline::run_pipeline;
use super::presenter::{render, Presenter, TickerReport};

/// Result for one ticker; a failure never affects the others.
#[derive(Debug)]
pub struct TickerOutcome {
    pub symbol: String,
    pub result: Result<TickerReport>,
}

/// Runs fetch, fit and render for every ticker of a request.
pub struct ForecastDashboard {
    history: Arc<dyn HistorySource>,
    engine: Arc<dyn ForecastEngine>,
    start_date: NaiveDate,
    workers: usize,
}

impl ForecastDashboard {
    pub fn new(
        history: Arc<dyn HistorySource>,
        engine: Arc<dyn ForecastEngine>,
        start_date: NaiveDate,
        workers: usize,
    ) -> Self {
        Self {
            history,
            engine,
            start_date,
            workers: workers.max(1),
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Forecasts each ticker with history from the configured start date up
    /// to (not including) `today`.
    ///
    /// At most `workers` tickers are in flight at once. Outcomes come back in
    /// request order whatever order the tasks finish in.
    pub async fn run(&self, request: &ForecastRequest, today: NaiveDate) -> Vec<TickerOutcome> {
        info!(
            "Forecasting {} ticker(s) over {} days with {} worker(s)",
            request.tickers.len(),
            request.horizon_days,
            self.workers
        );
        let semaphore = Arc::new(Semaphore::new(self.workers));

        let handles: Vec<_> = request
            .ticker_requests()
            .into_iter()
            .map(|ticker| {
                let semaphore = semaphore.clone();
                let history = self.history.clone();
                let engine = self.engine.clone();
                let start = self.start_date;
                let symbol = ticker.symbol.clone();
                let handle = tokio::spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| ForecastError::ModelFit(e.to_string()))?;
                    forecast_ticker(history, engine, ticker.symbol, start, today, ticker.horizon_days).await
                });
                (symbol, handle)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (symbol, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(ForecastError::ModelFit(format!("forecast task for {} failed: {}", symbol, e))),
            };
            if let Err(e) = &result {
                error!("Failed to forecast {}: {}", symbol, e);
            }
            outcomes.push(TickerOutcome { symbol, result });
        }
        outcomes
    }
}

async fn forecast_ticker(
    history: Arc<dyn HistorySource>,
    engine: Arc<dyn ForecastEngine>,
    symbol: String,
    start: NaiveDate,
    today: NaiveDate,
    horizon_days: u32,
) -> Result<TickerReport> {
    info!("Loading data for {}...", symbol);
    let series = history.fetch(&symbol, start, today).await?;
    info!("Loading data for {}... done! ({} rows)", symbol, series.len());

    let years = horizon_days / DAYS_PER_YEAR;
    tokio::task::spawn_blocking(move || -> Result<TickerReport> {
        let output = run_pipeline(&series, horizon_days, engine.as_ref())?;
        Ok(render(&series, &output.forecast, &output.components, years))
    })
    .await
    .map_err(|e| ForecastError::ModelFit(format!("model fit for {} aborted: {}", symbol, e)))?
}

/// Hands every outcome to `presenter`, reports first-to-last.
pub fn present_all(outcomes: &[TickerOutcome], presenter: &mut dyn Presenter) -> std::io::Result<()> {
    for outcome in outcomes {
        match &outcome.result {
            Ok(report) => presenter.show_report(report)?,
            Err(e) => presenter.show_failure(&outcome.symbol, e)?,
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TickerStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct TickerResult {
    pub symbol: String,
    pub status: TickerStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<TickerReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// JSON body of a dashboard run.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub years: u32,
    pub horizon_days: u32,
    pub results: Vec<TickerResult>,
}

impl DashboardResponse {
    pub fn new(request: &ForecastRequest, outcomes: Vec<TickerOutcome>) -> Self {
        let results = outcomes
            .into_iter()
            .map(|outcome| match outcome.result {
                Ok(report) => TickerResult {
                    symbol: outcome.symbol,
                    status: TickerStatus::Ok,
                    report: Some(report),
                    error: None,
                },
                Err(e) => TickerResult {
                    symbol: outcome.symbol,
                    status: TickerStatus::Error,
                    report: None,
                    error: Some(e.to_string()),
                },
            })
            .collect();
        DashboardResponse {
            years: request.horizon_days / DAYS_PER_YEAR,
            horizon_days: request.horizon_days,
            results,
        }
    }
}
