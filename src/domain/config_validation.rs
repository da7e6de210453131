//! Validation of raw config values into typed run parameters.
//!
//! Callers read raw values through a config port (defaults already applied)
//! and pass them here; the first invalid value wins. Stop-loss and
//! take-profit fractions are deliberately not range-checked, the engine uses
//! them as given.

use chrono::NaiveDate;

use super::error::CrosstraderError;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyConfig {
    pub initial_capital: f64,
    pub short_window: usize,
    pub long_window: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MlConfig {
    pub lookahead: usize,
    pub test_fraction: f64,
}

fn missing(section: &str, key: &str) -> CrosstraderError {
    CrosstraderError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> CrosstraderError {
    CrosstraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn parse_date(section: &str, key: &str, raw: &str) -> Result<NaiveDate, CrosstraderError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| invalid(section, key, format!("'{raw}' is not a {DATE_FORMAT} date")))
}

pub fn validate_data_config(
    symbol: Option<String>,
    start: Option<String>,
    end: Option<String>,
) -> Result<DataConfig, CrosstraderError> {
    let symbol = symbol.filter(|s| !s.trim().is_empty()).ok_or_else(|| {
        missing("data", "symbol")
    })?;
    let start_raw = start.ok_or_else(|| missing("data", "start"))?;
    let end_raw = end.ok_or_else(|| missing("data", "end"))?;

    let start = parse_date("data", "start", &start_raw)?;
    let end = parse_date("data", "end", &end_raw)?;
    if start >= end {
        return Err(invalid(
            "data",
            "start",
            format!("start {start} is not before end {end}"),
        ));
    }

    Ok(DataConfig { symbol, start, end })
}

pub fn validate_strategy_config(
    initial_capital: f64,
    short_window: i64,
    long_window: i64,
) -> Result<StrategyConfig, CrosstraderError> {
    if !(initial_capital > 0.0) {
        return Err(invalid(
            "strategy",
            "initial_capital",
            format!("{initial_capital} must be positive"),
        ));
    }
    if short_window < 1 {
        return Err(invalid(
            "strategy",
            "short_window",
            format!("{short_window} must be at least 1"),
        ));
    }
    if long_window <= short_window {
        return Err(invalid(
            "strategy",
            "long_window",
            format!("{long_window} must exceed short_window {short_window}"),
        ));
    }

    Ok(StrategyConfig {
        initial_capital,
        short_window: short_window as usize,
        long_window: long_window as usize,
    })
}

pub fn validate_ml_config(lookahead: i64, test_fraction: f64) -> Result<MlConfig, CrosstraderError> {
    if lookahead < 1 {
        return Err(invalid(
            "ml",
            "lookahead",
            format!("{lookahead} must be at least 1"),
        ));
    }
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(invalid(
            "ml",
            "test_fraction",
            format!("{test_fraction} must be strictly between 0 and 1"),
        ));
    }

    Ok(MlConfig {
        lookahead: lookahead as usize,
        test_fraction,
    })
}
