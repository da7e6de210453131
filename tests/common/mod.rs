#![allow(dead_code)]

use std::collections::HashMap;

use chrono::NaiveDate;
use crosstrader::domain::error::CrosstraderError;
pub use crosstrader::domain::price::PricePoint;
use crosstrader::domain::signal::{Signal, SignalPoint, SignalSeries};
use crosstrader::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_prices(mut self, symbol: &str, prices: Vec<PricePoint>) -> Self {
        self.data.insert(symbol.to_string(), prices);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, CrosstraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(CrosstraderError::Data {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|prices| {
                prices
                    .iter()
                    .filter(|p| p.date >= start && p.date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_prices(closes: &[f64]) -> Vec<PricePoint> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint {
            date: date(2024, 1, 1) + chrono::Duration::days(i as i64),
            close,
            volume: 1000.0 + (i as f64) * 25.0,
        })
        .collect()
}

/// Signal series with the given transitions and everything else inert, for
/// driving the engine without computing real moving averages.
pub fn series_with_transitions(prices: &[PricePoint], transitions: &[i8]) -> SignalSeries {
    assert_eq!(prices.len(), transitions.len());
    SignalSeries {
        short_window: 10,
        long_window: 50,
        points: prices
            .iter()
            .zip(transitions)
            .map(|(price, &transition)| SignalPoint {
                date: price.date,
                short_ma: None,
                long_ma: None,
                signal: Signal::Neutral,
                transition,
            })
            .collect(),
    }
}
