// src/config.rs
use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::warn;
use serde::Serialize;

use crate::services::engine::ModelConfig;

pub const DEFAULT_START_DATE: &str = "2012-01-01";
pub const DEFAULT_TICKERS: &str = "GOOG, AAPL, MSFT, GME";
pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const MIN_YEARS: u32 = 1;
pub const MAX_YEARS: u32 = 5;
pub const DAYS_PER_YEAR: u32 = 365;

#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub start_date: NaiveDate,
    pub default_tickers: String,
    pub workers: usize,
    pub model: ModelConfig,
    pub yahoo_base_url: String,
    pub csv_dir: Option<PathBuf>,
}

/// What the input form shows before the user types anything.
#[derive(Debug, Clone, Serialize)]
pub struct FormDefaults {
    pub tickers: String,
    pub years: u32,
    pub min_years: u32,
    pub max_years: u32,
    pub start_date: NaiveDate,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            port: 3030,
            start_date: NaiveDate::from_ymd_opt(2012, 1, 1).unwrap_or(NaiveDate::MIN),
            default_tickers: DEFAULT_TICKERS.to_string(),
            workers: default_workers(),
            model: ModelConfig::default(),
            yahoo_base_url: DEFAULT_YAHOO_BASE_URL.to_string(),
            csv_dir: None,
        }
    }
}

impl Settings {
    /// Reads settings from the process environment (call `dotenv().ok()` first).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().context("PORT must be a number")?,
            None => {
                warn!("$PORT not set, defaulting to {}", defaults.port);
                defaults.port
            }
        };

        let start_date = match lookup("FORECAST_START_DATE") {
            Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .context("FORECAST_START_DATE must be YYYY-MM-DD")?,
            None => defaults.start_date,
        };

        let workers = match lookup("FORECAST_WORKERS") {
            Some(raw) => {
                let n = raw.trim().parse::<usize>().context("FORECAST_WORKERS must be a number")?;
                anyhow::ensure!(n > 0, "FORECAST_WORKERS must be at least 1");
                n
            }
            None => defaults.workers,
        };

        let mut model = defaults.model.clone();
        if let Some(raw) = lookup("FORECAST_SEED") {
            model.seed = Some(raw.trim().parse().context("FORECAST_SEED must be an unsigned integer")?);
        }
        if let Some(raw) = lookup("FORECAST_UNCERTAINTY_SAMPLES") {
            model.uncertainty_samples = raw
                .trim()
                .parse()
                .context("FORECAST_UNCERTAINTY_SAMPLES must be a number")?;
        }
        if let Some(raw) = lookup("FORECAST_INTERVAL_WIDTH") {
            let width: f64 = raw.trim().parse().context("FORECAST_INTERVAL_WIDTH must be a number")?;
            anyhow::ensure!(
                width > 0.0 && width < 1.0,
                "FORECAST_INTERVAL_WIDTH must be between 0 and 1"
            );
            model.interval_width = width;
        }

        Ok(Settings {
            port,
            start_date,
            default_tickers: lookup("DEFAULT_TICKERS").unwrap_or(defaults.default_tickers),
            workers,
            model,
            yahoo_base_url: lookup("YAHOO_BASE_URL").unwrap_or(defaults.yahoo_base_url),
            csv_dir: lookup("HISTORY_CSV_DIR").map(PathBuf::from),
        })
    }

    pub fn form_defaults(&self) -> FormDefaults {
        FormDefaults {
            tickers: self.default_tickers.clone(),
            years: MIN_YEARS,
            min_years: MIN_YEARS,
            max_years: MAX_YEARS,
            start_date: self.start_date,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let settings = Settings::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(settings.port, 3030);
        assert_eq!(settings.start_date.to_string(), DEFAULT_START_DATE);
        assert_eq!(settings.default_tickers, DEFAULT_TICKERS);
        assert!(settings.workers >= 1);
        assert!(settings.model.seed.is_none());
        assert!(settings.csv_dir.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("FORECAST_START_DATE", "2018-06-01"),
            ("FORECAST_WORKERS", "2"),
            ("FORECAST_SEED", "42"),
            ("FORECAST_UNCERTAINTY_SAMPLES", "200"),
            ("FORECAST_INTERVAL_WIDTH", "0.95"),
            ("HISTORY_CSV_DIR", "/tmp/prices"),
        ]))
        .unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.start_date, NaiveDate::from_ymd_opt(2018, 6, 1).unwrap());
        assert_eq!(settings.workers, 2);
        assert_eq!(settings.model.seed, Some(42));
        assert_eq!(settings.model.uncertainty_samples, 200);
        assert_eq!(settings.model.interval_width, 0.95);
        assert_eq!(settings.csv_dir, Some(PathBuf::from("/tmp/prices")));
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(Settings::from_lookup(lookup_from(&[("PORT", "http")])).is_err());
        assert!(Settings::from_lookup(lookup_from(&[("FORECAST_WORKERS", "0")])).is_err());
        assert!(Settings::from_lookup(lookup_from(&[("FORECAST_INTERVAL_WIDTH", "1.5")])).is_err());
        assert!(Settings::from_lookup(lookup_from(&[("FORECAST_START_DATE", "01/01/2012")])).is_err());
    }
}
