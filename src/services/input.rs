// src/services/input.rs
use log::debug;

use crate::config::{DAYS_PER_YEAR, MAX_YEARS, MIN_YEARS};
use crate::error::{ForecastError, Result};
use crate::models::ForecastRequest;

/// Splits comma-separated ticker text into normalized symbols.
///
/// Entries are trimmed and upper-cased; blanks are dropped and repeats keep
/// their first position.
pub fn parse_tickers(raw: &str) -> Vec<String> {
    let mut tickers: Vec<String> = Vec::new();
    for symbol in raw.split(',').map(|s| s.trim().to_uppercase()) {
        if symbol.is_empty() || tickers.contains(&symbol) {
            continue;
        }
        tickers.push(symbol);
    }
    tickers
}

/// Converts the slider value (whole years) into a horizon in days.
pub fn horizon_days_from_years(years: i64) -> Result<u32> {
    if years < i64::from(MIN_YEARS) || years > i64::from(MAX_YEARS) {
        return Err(ForecastError::InvalidHorizon(format!(
            "{} years is outside the supported range {}-{}",
            years, MIN_YEARS, MAX_YEARS
        )));
    }
    // bounded above by MAX_YEARS, cannot overflow
    Ok(years as u32 * DAYS_PER_YEAR)
}

/// Builds the normalized request, failing before any fetch on bad input.
pub fn collect_request(raw_tickers: &str, years: i64) -> Result<ForecastRequest> {
    let horizon_days = horizon_days_from_years(years)?;
    let tickers = parse_tickers(raw_tickers);
    if tickers.is_empty() {
        return Err(ForecastError::EmptyTickerList);
    }
    debug!("Collected request for {:?} over {} days", tickers, horizon_days);
    Ok(ForecastRequest { tickers, horizon_days })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_ticker_text_parses_in_order() {
        assert_eq!(
            parse_tickers("GOOG, AAPL, MSFT, GME"),
            vec!["GOOG", "AAPL", "MSFT", "GME"]
        );
    }

    #[test]
    fn blanks_and_repeats_are_dropped() {
        assert_eq!(parse_tickers(" goog,, AAPL ,goog, "), vec!["GOOG", "AAPL"]);
    }

    #[rstest]
    #[case(1, 365)]
    #[case(3, 1095)]
    #[case(5, 1825)]
    fn years_convert_to_days(#[case] years: i64, #[case] days: u32) {
        assert_eq!(horizon_days_from_years(years).unwrap(), days);
    }

    #[rstest]
    #[case(0)]
    #[case(-2)]
    #[case(6)]
    fn out_of_range_years_are_invalid(#[case] years: i64) {
        assert!(matches!(
            horizon_days_from_years(years),
            Err(ForecastError::InvalidHorizon(_))
        ));
    }

    #[test]
    fn empty_ticker_text_blocks_the_request() {
        assert!(matches!(
            collect_request(" , ,", 1),
            Err(ForecastError::EmptyTickerList)
        ));
    }

    #[test]
    fn horizon_is_checked_before_tickers() {
        assert!(matches!(
            collect_request("", 0),
            Err(ForecastError::InvalidHorizon(_))
        ));
    }
}
