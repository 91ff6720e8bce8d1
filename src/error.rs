// src/error.rs
//! Error types for the forecast dashboard.

use thiserror::Error;

/// Failures reported by a history source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Symbol text that no data provider would accept
    #[error("invalid ticker symbol '{0}'")]
    InvalidSymbol(String),

    /// Provider does not know the symbol (delisted, typo, ...)
    #[error("unknown ticker symbol '{0}'")]
    UnknownSymbol(String),

    /// Transport failure or unexpected HTTP status
    #[error("network error: {0}")]
    Network(String),

    /// Payload could not be decoded
    #[error("malformed history payload: {0}")]
    Parse(String),

    /// Provider answered but returned no usable rows
    #[error("no price history for '{0}' in the requested range")]
    EmptyResult(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

impl From<csv::Error> for FetchError {
    fn from(err: csv::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}

/// Errors raised while collecting input or running a ticker's forecast.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Nothing to iterate over; blocks the whole request
    #[error("no ticker symbols supplied")]
    EmptyTickerList,

    #[error("invalid forecast horizon: {0}")]
    InvalidHorizon(String),

    /// Series violating the ordering invariant
    #[error("invalid price series: {0}")]
    InvalidSeries(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("model fit failed: {0}")]
    ModelFit(String),
}

impl ForecastError {
    /// Input errors stop the whole request instead of a single ticker.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ForecastError::EmptyTickerList | ForecastError::InvalidHorizon(_)
        )
    }
}

/// Result type used across the crate
pub type Result<T> = std::result::Result<T, ForecastError>;
