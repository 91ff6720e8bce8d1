// src/services/history.rs
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;

use crate::error::FetchError;
use crate::models::PriceSeries;

/// Where daily price history comes from.
///
/// `end` is exclusive: a request ending "today" returns rows up to yesterday's
/// close.
#[async_trait]
pub trait HistorySource: Send + Sync {
    async fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, FetchError>;
}

#[async_trait]
impl<T: HistorySource + ?Sized> HistorySource for Box<T> {
    async fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, FetchError> {
        (**self).fetch(symbol, start, end).await
    }
}

#[async_trait]
impl<T: HistorySource + ?Sized> HistorySource for Arc<T> {
    async fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, FetchError> {
        (**self).fetch(symbol, start, end).await
    }
}

fn symbol_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9.^=-]{1,20}$").ok())
        .as_ref()
}

/// Rejects symbols no provider would accept, before any I/O happens.
pub fn validate_symbol(symbol: &str) -> Result<(), FetchError> {
    match symbol_pattern() {
        Some(re) if re.is_match(symbol) => Ok(()),
        _ => Err(FetchError::InvalidSymbol(symbol.to_string())),
    }
}
