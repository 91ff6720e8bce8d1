// src/services/pipeline.rs
use log::{debug, info};

use crate::error::{ForecastError, Result};
use crate::models::{extended_index, ComponentDecomposition, ForecastSeries, PriceSeries};

use super::engine::ForecastEngine;

/// What one pipeline run hands to the presenter.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub forecast: ForecastSeries,
    pub components: ComponentDecomposition,
}

/// Fits `engine` to the closing prices of `series` and forecasts
/// `horizon_days` calendar days past the last observation.
///
/// Every observed date stays in the output index. Bounds come straight from
/// the engine and are never clamped.
pub fn run_pipeline(
    series: &PriceSeries,
    horizon_days: u32,
    engine: &dyn ForecastEngine,
) -> Result<PipelineOutput> {
    if horizon_days == 0 {
        return Err(ForecastError::InvalidHorizon("horizon must be at least one day".to_string()));
    }
    if series.len() < 2 {
        return Err(ForecastError::InsufficientData(format!(
            "{} has {} observation(s); at least 2 distinct dates are required",
            series.symbol(),
            series.len()
        )));
    }

    let observations = series.close_observations();
    let model = engine.fit(&observations)?;
    debug!("Model fitted for {} on {} closes", series.symbol(), observations.len());

    let observed: Vec<_> = observations.iter().map(|o| o.date).collect();
    let index = extended_index(&observed, horizon_days);

    let forecast = model.predict(&index)?;
    if forecast.len() != index.len() {
        return Err(ForecastError::ModelFit(format!(
            "engine predicted {} points for {} dates",
            forecast.len(),
            index.len()
        )));
    }

    let components = model.decompose(&index)?;
    if components.dates.len() != index.len()
        || components.components.iter().any(|c| c.values.len() != index.len())
    {
        return Err(ForecastError::ModelFit(
            "engine decomposition does not match the forecast index".to_string(),
        ));
    }

    info!(
        "Forecast for {} covers {} through {}",
        series.symbol(),
        index.first().map(|d| d.to_string()).unwrap_or_default(),
        index.last().map(|d| d.to_string()).unwrap_or_default()
    );
    Ok(PipelineOutput { forecast, components })
}
