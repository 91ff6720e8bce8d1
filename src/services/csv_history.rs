// src/services/csv_history.rs
use async_trait::async_trait;
use chrono::NaiveDate;
use csv::ReaderBuilder;
use log::info;
use std::path::{Path, PathBuf};

use crate::error::FetchError;
use crate::models::{PriceObservation, PriceSeries};

use super::history::{validate_symbol, HistorySource};

/// Offline history read from `{dir}/{SYMBOL}.csv`.
///
/// Expects the usual downloader layout `Date,Open,High,Low,Close,Volume`;
/// other columns (for example `Adj Close`) are ignored.
#[derive(Debug, Clone)]
pub struct CsvHistory {
    dir: PathBuf,
}

impl CsvHistory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", symbol))
    }
}

#[async_trait]
impl HistorySource for CsvHistory {
    async fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, FetchError> {
        validate_symbol(symbol)?;
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(FetchError::UnknownSymbol(symbol.to_string()));
        }
        info!("Reading daily history for {} from {}", symbol, path.display());

        let text = tokio::fs::read_to_string(&path).await?;
        parse_history_csv(symbol, &text, start, end, &path)
    }
}

fn parse_history_csv(
    symbol: &str,
    text: &str,
    start: NaiveDate,
    end: NaiveDate,
    path: &Path,
) -> Result<PriceSeries, FetchError> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(text.as_bytes());

    let headers = rdr.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| FetchError::Parse(format!("no '{}' column in {}", name, path.display())))
    };
    let idx_date = column("Date")?;
    let idx_open = column("Open")?;
    let idx_high = column("High")?;
    let idx_low = column("Low")?;
    let idx_close = column("Close")?;
    let idx_volume = column("Volume")?;

    let mut observations = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let row = record?;
        let cell = |idx: usize| row.get(idx).unwrap_or("");
        let bad = |what: &str| FetchError::Parse(format!("row {}: bad {} in {}", line + 1, what, path.display()));

        // tolerate "2024-01-02 00:00:00-05:00" style stamps
        let date_text = cell(idx_date).get(..10).unwrap_or("");
        let date = NaiveDate::parse_from_str(date_text, "%Y-%m-%d").map_err(|_| bad("date"))?;
        if date < start || date >= end {
            continue;
        }

        let number = |idx: usize, what: &str| cell(idx).parse::<f64>().map_err(|_| bad(what));
        let volume = number(idx_volume, "volume")?;
        observations.push(PriceObservation {
            date,
            open: number(idx_open, "open")?,
            high: number(idx_high, "high")?,
            low: number(idx_low, "low")?,
            close: number(idx_close, "close")?,
            volume: volume.max(0.0).round() as u64,
        });
    }

    if observations.is_empty() {
        return Err(FetchError::EmptyResult(symbol.to_string()));
    }
    PriceSeries::new(symbol, observations).map_err(|e| FetchError::Parse(e.to_string()))
}
