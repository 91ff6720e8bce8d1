// src/models.rs
use serde::{Serialize, Deserialize};
use chrono::{Duration, NaiveDate};

use crate::error::{ForecastError, Result};

/// One ticker's share of a dashboard run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerRequest {
    pub symbol: String,
    pub horizon_days: u32,
}

/// Normalized user input: ordered tickers plus a horizon in days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastRequest {
    pub tickers: Vec<String>,
    pub horizon_days: u32,
}

impl ForecastRequest {
    pub fn ticker_requests(&self) -> Vec<TickerRequest> {
        self.tickers
            .iter()
            .map(|symbol| TickerRequest {
                symbol: symbol.clone(),
                horizon_days: self.horizon_days,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Daily history for one symbol, dates strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: String,
    observations: Vec<PriceObservation>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, observations: Vec<PriceObservation>) -> Result<Self> {
        let symbol = symbol.into();
        if let Some(pair) = observations.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(ForecastError::InvalidSeries(format!(
                "{}: dates must be strictly increasing ({} followed by {})",
                symbol, pair[0].date, pair[1].date
            )));
        }
        Ok(Self { symbol, observations })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn observations(&self) -> &[PriceObservation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(|o| o.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|o| o.date)
    }

    /// The forecast target: closing price per date.
    pub fn close_observations(&self) -> Vec<Observation> {
        self.observations
            .iter()
            .map(|o| Observation { date: o.date, value: o.close })
            .collect()
    }

    pub fn tail(&self, n: usize) -> &[PriceObservation] {
        let start = self.observations.len().saturating_sub(n);
        &self.observations[start..]
    }
}

/// A dated scalar fed to the forecasting engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub estimate: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSeries {
    pub points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn tail(&self, n: usize) -> &[ForecastPoint] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }
}

/// A single additive contribution (trend, weekly, yearly, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
    pub name: String,
    pub values: Vec<f64>,
}

/// Additive components sharing the forecast's date index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentDecomposition {
    pub dates: Vec<NaiveDate>,
    pub components: Vec<Component>,
}

impl ComponentDecomposition {
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.components
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn names(&self) -> Vec<&str> {
        self.components.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Observed dates followed by `horizon_days` consecutive calendar days.
pub fn extended_index(observed: &[NaiveDate], horizon_days: u32) -> Vec<NaiveDate> {
    let mut index = Vec::with_capacity(observed.len() + horizon_days as usize);
    index.extend_from_slice(observed);
    if let Some(&last) = observed.last() {
        index.extend((1..=i64::from(horizon_days)).map(|d| last + Duration::days(d)));
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(date: &str, close: f64) -> PriceObservation {
        PriceObservation {
            date: date.parse().unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn series_rejects_duplicate_and_unordered_dates() {
        let dup = PriceSeries::new("GOOG", vec![obs("2023-01-02", 1.0), obs("2023-01-02", 2.0)]);
        assert!(matches!(dup, Err(ForecastError::InvalidSeries(_))));

        let unordered = PriceSeries::new("GOOG", vec![obs("2023-01-03", 1.0), obs("2023-01-02", 2.0)]);
        assert!(matches!(unordered, Err(ForecastError::InvalidSeries(_))));
    }

    #[test]
    fn close_observations_project_the_close_price() {
        let series = PriceSeries::new("GOOG", vec![obs("2023-01-02", 10.0), obs("2023-01-03", 11.5)]).unwrap();
        let closes: Vec<f64> = series.close_observations().iter().map(|o| o.value).collect();
        assert_eq!(closes, vec![10.0, 11.5]);
        assert_eq!(series.tail(1)[0].close, 11.5);
        assert_eq!(series.tail(10).len(), 2);
    }

    #[test]
    fn extended_index_appends_calendar_days() {
        let observed: Vec<NaiveDate> = vec!["2023-01-05".parse().unwrap(), "2023-01-06".parse().unwrap()];
        let index = extended_index(&observed, 3);
        assert_eq!(index.len(), 5);
        assert_eq!(index[2], "2023-01-07".parse::<NaiveDate>().unwrap());
        assert_eq!(index[4], "2023-01-09".parse::<NaiveDate>().unwrap());
    }

    #[test]
    fn ticker_requests_keep_input_order() {
        let request = ForecastRequest {
            tickers: vec!["GOOG".into(), "AAPL".into()],
            horizon_days: 365,
        };
        let symbols: Vec<String> = request.ticker_requests().into_iter().map(|r| r.symbol).collect();
        assert_eq!(symbols, vec!["GOOG", "AAPL"]);
    }
}
