//! CSV file data adapter.
//!
//! Reads `{symbol}.csv` from a base directory. Column positions come from
//! the header, matched case-insensitively, so exports from different sources
//! load without editing. Extra columns are ignored.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::domain::error::CrosstraderError;
use crate::domain::price::PricePoint;
use crate::ports::data_port::DataPort;

pub struct CsvDataAdapter {
    base_path: PathBuf,
}

impl CsvDataAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, CrosstraderError> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| CrosstraderError::MissingColumn {
            column: name.to_string(),
        })
}

impl DataPort for CsvDataAdapter {
    fn fetch_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, CrosstraderError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| CrosstraderError::Data {
            symbol: symbol.to_string(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());

        let headers = rdr
            .headers()
            .map_err(|e| CrosstraderError::Data {
                symbol: symbol.to_string(),
                reason: format!("CSV header error: {e}"),
            })?
            .clone();
        let date_idx = column_index(&headers, "date")?;
        let close_idx = column_index(&headers, "close")?;
        let volume_idx = column_index(&headers, "volume")?;

        let mut prices = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| CrosstraderError::Data {
                symbol: symbol.to_string(),
                reason: format!("CSV parse error: {e}"),
            })?;

            let field = |idx: usize, name: &str| {
                record.get(idx).ok_or_else(|| CrosstraderError::Data {
                    symbol: symbol.to_string(),
                    reason: format!("row missing {name} field"),
                })
            };

            let date = NaiveDate::parse_from_str(field(date_idx, "date")?, "%Y-%m-%d").map_err(
                |e| CrosstraderError::Data {
                    symbol: symbol.to_string(),
                    reason: format!("invalid date: {e}"),
                },
            )?;

            if date < start || date > end {
                continue;
            }

            let close: f64 =
                field(close_idx, "close")?
                    .parse()
                    .map_err(|e| CrosstraderError::Data {
                        symbol: symbol.to_string(),
                        reason: format!("invalid close value: {e}"),
                    })?;
            let volume: f64 =
                field(volume_idx, "volume")?
                    .parse()
                    .map_err(|e| CrosstraderError::Data {
                        symbol: symbol.to_string(),
                        reason: format!("invalid volume value: {e}"),
                    })?;

            prices.push(PricePoint {
                date,
                close,
                volume,
            });
        }

        prices.sort_by_key(|p| p.date);
        Ok(prices)
    }
}
