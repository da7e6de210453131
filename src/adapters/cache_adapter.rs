//! File-backed price cache decorating another data port.
//!
//! Cache files are keyed by symbol and date range, one CSV per fetch. A
//! corrupt cache file is deleted and the fetch retried against the inner
//! port, so a damaged cache never fails a run that fresh data could serve.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::domain::error::CrosstraderError;
use crate::domain::price::PricePoint;
use crate::ports::data_port::DataPort;

pub struct FileCacheAdapter<P: DataPort> {
    inner: P,
    cache_dir: PathBuf,
}

impl<P: DataPort> FileCacheAdapter<P> {
    pub fn new(inner: P, cache_dir: PathBuf) -> Self {
        Self { inner, cache_dir }
    }

    fn cache_path(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> PathBuf {
        self.cache_dir.join(format!("{symbol}_{start}_{end}.csv"))
    }

    fn fetch_and_store(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        path: &Path,
    ) -> Result<Vec<PricePoint>, CrosstraderError> {
        let prices = self.inner.fetch_prices(symbol, start, end)?;

        fs::create_dir_all(&self.cache_dir)?;
        let mut writer = csv::Writer::from_path(path).map_err(|e| CrosstraderError::Data {
            symbol: symbol.to_string(),
            reason: format!("cache write failed: {e}"),
        })?;
        writer
            .write_record(["date", "close", "volume"])
            .and_then(|()| {
                prices.iter().try_for_each(|p| {
                    writer.write_record([
                        p.date.format("%Y-%m-%d").to_string(),
                        p.close.to_string(),
                        p.volume.to_string(),
                    ])
                })
            })
            .map_err(|e| CrosstraderError::Data {
                symbol: symbol.to_string(),
                reason: format!("cache write failed: {e}"),
            })?;
        writer.flush()?;

        Ok(prices)
    }
}

// None means the cache file is unusable and should be refreshed.
fn parse_cached(content: &str) -> Option<Vec<PricePoint>> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let headers = rdr.headers().ok()?;
    if headers.iter().ne(["date", "close", "volume"]) {
        return None;
    }

    let mut prices = Vec::new();
    for result in rdr.records() {
        let record = result.ok()?;
        let date = NaiveDate::parse_from_str(record.get(0)?, "%Y-%m-%d").ok()?;
        let close: f64 = record.get(1)?.parse().ok()?;
        let volume: f64 = record.get(2)?.parse().ok()?;
        prices.push(PricePoint {
            date,
            close,
            volume,
        });
    }
    Some(prices)
}

impl<P: DataPort> DataPort for FileCacheAdapter<P> {
    fn fetch_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, CrosstraderError> {
        let path = self.cache_path(symbol, start, end);

        if let Ok(content) = fs::read_to_string(&path) {
            if let Some(prices) = parse_cached(&content) {
                return Ok(prices);
            }
            // Corrupt cache file. Remove it and fall through to a refetch.
            fs::remove_file(&path)?;
        }

        self.fetch_and_store(symbol, start, end, &path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_prices() -> Vec<PricePoint> {
        vec![
            PricePoint {
                date: date(2024, 1, 1),
                close: 100.0,
                volume: 1000.0,
            },
            PricePoint {
                date: date(2024, 1, 2),
                close: 101.5,
                volume: 1500.0,
            },
        ]
    }

    struct CountingPort {
        data: HashMap<String, Vec<PricePoint>>,
        calls: RefCell<usize>,
    }

    impl CountingPort {
        fn new(symbol: &str, prices: Vec<PricePoint>) -> Self {
            let mut data = HashMap::new();
            data.insert(symbol.to_string(), prices);
            Self {
                data,
                calls: RefCell::new(0),
            }
        }
    }

    impl DataPort for CountingPort {
        fn fetch_prices(
            &self,
            symbol: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<PricePoint>, CrosstraderError> {
            *self.calls.borrow_mut() += 1;
            Ok(self.data.get(symbol).cloned().unwrap_or_default())
        }
    }

    #[test]
    fn second_fetch_hits_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let inner = CountingPort::new("TEST", sample_prices());
        let adapter = FileCacheAdapter::new(inner, dir.path().to_path_buf());

        let first = adapter
            .fetch_prices("TEST", date(2024, 1, 1), date(2024, 1, 31))
            .unwrap();
        let second = adapter
            .fetch_prices("TEST", date(2024, 1, 1), date(2024, 1, 31))
            .unwrap();

        assert_eq!(first, sample_prices());
        assert_eq!(second, first);
        assert_eq!(*adapter.inner.calls.borrow(), 1);
    }

    #[test]
    fn distinct_ranges_use_distinct_cache_entries() {
        let dir = tempfile::tempdir().unwrap();
        let inner = CountingPort::new("TEST", sample_prices());
        let adapter = FileCacheAdapter::new(inner, dir.path().to_path_buf());

        adapter
            .fetch_prices("TEST", date(2024, 1, 1), date(2024, 1, 31))
            .unwrap();
        adapter
            .fetch_prices("TEST", date(2024, 2, 1), date(2024, 2, 28))
            .unwrap();

        assert_eq!(*adapter.inner.calls.borrow(), 2);
    }

    #[test]
    fn corrupt_cache_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let inner = CountingPort::new("TEST", sample_prices());
        let adapter = FileCacheAdapter::new(inner, dir.path().to_path_buf());

        let path = dir.path().join("TEST_2024-01-01_2024-01-31.csv");
        fs::write(&path, "garbage that is not a cache file").unwrap();

        let prices = adapter
            .fetch_prices("TEST", date(2024, 1, 1), date(2024, 1, 31))
            .unwrap();

        assert_eq!(prices, sample_prices());
        assert_eq!(*adapter.inner.calls.borrow(), 1);
        // Replacement cache is valid, so a second fetch stays local.
        adapter
            .fetch_prices("TEST", date(2024, 1, 1), date(2024, 1, 31))
            .unwrap();
        assert_eq!(*adapter.inner.calls.borrow(), 1);
    }

    #[test]
    fn empty_fetch_is_cached_too() {
        let dir = tempfile::tempdir().unwrap();
        let inner = CountingPort::new("OTHER", sample_prices());
        let adapter = FileCacheAdapter::new(inner, dir.path().to_path_buf());

        let prices = adapter
            .fetch_prices("TEST", date(2024, 1, 1), date(2024, 1, 31))
            .unwrap();
        assert!(prices.is_empty());

        adapter
            .fetch_prices("TEST", date(2024, 1, 1), date(2024, 1, 31))
            .unwrap();
        assert_eq!(*adapter.inner.calls.borrow(), 1);
    }
}
