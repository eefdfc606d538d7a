//! Flat-file cache of fetched price history.
//!
//! Every successful fetch is written as `<SYMBOL>_<period>_<interval>.csv`
//! in the cache directory, overwriting the previous copy. Files are never
//! evicted. A cached copy is read back only when a live fetch fails.

use crate::error::Result;
use crate::types::{HistoryKey, PricePoint, PriceSeries};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One CSV row; header names follow the usual OHLCV spreadsheet layout.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRow {
    #[serde(rename = "Datetime")]
    datetime: DateTime<Utc>,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Volume")]
    volume: f64,
}

impl From<&PricePoint> for CacheRow {
    fn from(p: &PricePoint) -> Self {
        Self {
            datetime: p.time,
            open: p.open,
            high: p.high,
            low: p.low,
            close: p.close,
            volume: p.volume,
        }
    }
}

impl From<CacheRow> for PricePoint {
    fn from(row: CacheRow) -> Self {
        Self {
            time: row.datetime,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        }
    }
}

/// CSV-backed history cache.
#[derive(Debug, Clone)]
pub struct HistoryCache {
    cache_dir: PathBuf,
}

impl HistoryCache {
    /// Create a cache rooted at `cache_dir`, creating the directory if needed.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        let cache_dir = cache_dir.into();
        if !cache_dir.exists() {
            if let Err(e) = fs::create_dir_all(&cache_dir) {
                warn!("Failed to create cache directory {:?}: {}", cache_dir, e);
            }
        }
        Self { cache_dir }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Get the cache file path for a key.
    pub fn path_for(&self, key: &HistoryKey) -> PathBuf {
        // Sanitize key for filesystem
        let safe_key = key
            .to_string()
            .replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_");
        self.cache_dir.join(format!("{}.csv", safe_key))
    }

    /// Write a series to disk. Empty series are not written.
    pub fn store(&self, series: &PriceSeries) -> Result<Option<PathBuf>> {
        if series.is_empty() {
            return Ok(None);
        }

        let path = self.path_for(&series.key());
        let mut writer = csv::Writer::from_path(&path)?;
        for point in &series.points {
            writer.serialize(CacheRow::from(point))?;
        }
        writer.flush()?;

        debug!("Cached {} rows to {:?}", series.len(), path);
        Ok(Some(path))
    }

    /// Read a cached series regardless of age.
    pub fn load(&self, key: &HistoryKey) -> Option<PriceSeries> {
        let path = self.path_for(key);
        if !path.exists() {
            return None;
        }

        let mut reader = match csv::Reader::from_path(&path) {
            Ok(r) => r,
            Err(e) => {
                warn!("Failed to open cache file {:?}: {}", path, e);
                return None;
            }
        };

        let mut points = Vec::new();
        for row in reader.deserialize::<CacheRow>() {
            match row {
                Ok(row) => points.push(PricePoint::from(row)),
                Err(e) => debug!("Skipping unreadable cache row in {:?}: {}", path, e),
            }
        }

        debug!("Using cached history for {}", key);
        Some(PriceSeries::new(key, points))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HistoryInterval, HistoryPeriod};
    use chrono::TimeZone;

    fn create_test_cache(name: &str) -> HistoryCache {
        let cache_dir = std::env::temp_dir().join(format!(
            "finsight_history_cache_{}_{}",
            name,
            std::process::id()
        ));
        if cache_dir.exists() {
            let _ = fs::remove_dir_all(&cache_dir);
        }
        HistoryCache::new(cache_dir)
    }

    fn cleanup_test_cache(cache: &HistoryCache) {
        let _ = fs::remove_dir_all(cache.cache_dir());
    }

    fn series(symbol: &str, closes: &[f64]) -> PriceSeries {
        let key = HistoryKey::new(symbol, HistoryPeriod::OneMonth, HistoryInterval::OneDay);
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                time: Utc.timestamp_opt(1_700_000_000 + i as i64 * 86_400, 0).unwrap(),
                open: close - 1.0,
                high: close + 1.0,
                low: close - 2.0,
                close,
                volume: 1_000.0 * (i + 1) as f64,
            })
            .collect();
        PriceSeries::new(&key, points)
    }

    #[test]
    fn test_store_and_load() {
        let cache = create_test_cache("store_load");
        let original = series("AAPL", &[10.0, 11.0, 12.5]);

        let path = cache.store(&original).unwrap().unwrap();
        assert!(path.ends_with("AAPL_1mo_1d.csv"));

        let loaded = cache.load(&original.key()).unwrap();
        assert_eq!(loaded, original);
        cleanup_test_cache(&cache);
    }

    #[test]
    fn test_csv_header_layout() {
        let cache = create_test_cache("header");
        let path = cache.store(&series("MSFT", &[5.0])).unwrap().unwrap();

        let content = fs::read_to_string(path).unwrap();
        assert!(content.starts_with("Datetime,Open,High,Low,Close,Volume"));
        cleanup_test_cache(&cache);
    }

    #[test]
    fn test_empty_series_not_written() {
        let cache = create_test_cache("empty");
        let empty = series("NONE", &[]);

        assert!(cache.store(&empty).unwrap().is_none());
        assert!(cache.load(&empty.key()).is_none());
        cleanup_test_cache(&cache);
    }

    #[test]
    fn test_overwrite() {
        let cache = create_test_cache("overwrite");
        cache.store(&series("AAPL", &[1.0, 2.0])).unwrap();
        cache.store(&series("AAPL", &[3.0])).unwrap();

        let key = HistoryKey::new("AAPL", HistoryPeriod::OneMonth, HistoryInterval::OneDay);
        assert_eq!(cache.load(&key).unwrap().closes(), vec![3.0]);
        cleanup_test_cache(&cache);
    }

    #[test]
    fn test_key_sanitization() {
        let cache = create_test_cache("sanitize");
        let key = HistoryKey::new("BTC/USD", HistoryPeriod::SevenDays, HistoryInterval::OneHour);

        let path = cache.path_for(&key);
        assert_eq!(path.file_name().unwrap(), "BTC_USD_7d_1h.csv");
        cleanup_test_cache(&cache);
    }
}
