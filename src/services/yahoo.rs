// src/services/yahoo.rs
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use log::{debug, info};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::error::FetchError;
use crate::models::{PriceObservation, PriceSeries};

use super::history::{validate_symbol, HistorySource};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Daily history from the Yahoo Finance v8 chart endpoint.
#[derive(Debug, Clone)]
pub struct YahooHistory {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    exchange_timezone_name: Option<String>,
    #[serde(default)]
    gmtoffset: i32,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

impl YahooHistory {
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn chart_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=history",
            self.base_url,
            symbol.replace('^', "%5E").replace('=', "%3D"),
            midnight_utc(start),
            midnight_utc(end),
        )
    }
}

#[async_trait]
impl HistorySource for YahooHistory {
    async fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, FetchError> {
        validate_symbol(symbol)?;
        let url = self.chart_url(symbol, start, end);
        info!("Fetching daily history for {} from {}", symbol, url);

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if status == StatusCode::NOT_FOUND {
            debug!("Yahoo returned 404 for {}", symbol);
            return Err(FetchError::UnknownSymbol(symbol.to_string()));
        }
        if !status.is_success() {
            debug!("Yahoo returned status {} for {}", status, symbol);
            return Err(FetchError::Network(format!("yahoo returned status {}", status)));
        }

        parse_chart_response(symbol, &body, start, end)
    }
}

fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

/// Converts a chart payload into a series restricted to `[start, end)`.
///
/// Rows with any missing field are dropped; a repeated date keeps its last row.
pub fn parse_chart_response(
    symbol: &str,
    body: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PriceSeries, FetchError> {
    let response: ChartResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::Parse(format!("failed to parse yahoo chart: {}", e)))?;

    if let Some(err) = response.chart.error {
        if err.code.eq_ignore_ascii_case("Not Found") {
            return Err(FetchError::UnknownSymbol(symbol.to_string()));
        }
        return Err(FetchError::Network(format!(
            "yahoo chart API error {}: {}",
            err.code,
            err.description.unwrap_or_default()
        )));
    }

    let result = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| FetchError::EmptyResult(symbol.to_string()))?;

    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::Parse("no quote data in chart".to_string()))?;
    let to_date = exchange_date_fn(&result.meta);

    let mut rows: Vec<PriceObservation> = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let fields = (
            quote.open.get(i).copied().flatten(),
            quote.high.get(i).copied().flatten(),
            quote.low.get(i).copied().flatten(),
            quote.close.get(i).copied().flatten(),
            quote.volume.get(i).copied().flatten(),
        );
        let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = fields else {
            debug!("Dropping incomplete row {} for {}", i, symbol);
            continue;
        };
        let Some(date) = to_date(ts) else {
            return Err(FetchError::Parse(format!("invalid timestamp {}", ts)));
        };
        if date < start || date >= end {
            continue;
        }
        rows.push(PriceObservation { date, open, high, low, close, volume });
    }

    rows.sort_by_key(|row| row.date);
    let mut observations: Vec<PriceObservation> = Vec::with_capacity(rows.len());
    for row in rows {
        match observations.last_mut() {
            Some(last) if last.date == row.date => *last = row,
            _ => observations.push(row),
        }
    }

    if observations.is_empty() {
        return Err(FetchError::EmptyResult(symbol.to_string()));
    }

    debug!("Parsed {} daily rows for {}", observations.len(), symbol);
    PriceSeries::new(symbol, observations).map_err(|e| FetchError::Parse(e.to_string()))
}

/// Trading dates are read in the exchange's own time zone.
fn exchange_date_fn(meta: &ChartMeta) -> Box<dyn Fn(i64) -> Option<NaiveDate>> {
    if let Some(tz) = meta
        .exchange_timezone_name
        .as_deref()
        .and_then(|name| name.parse::<Tz>().ok())
    {
        return Box::new(move |ts| utc_from(ts).map(|dt| dt.with_timezone(&tz).date_naive()));
    }
    let offset = FixedOffset::east_opt(meta.gmtoffset).unwrap_or_else(|| Utc.fix());
    Box::new(move |ts| utc_from(ts).map(|dt| dt.with_timezone(&offset).date_naive()))
}

fn utc_from(ts: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(ts, 0).single()
}
