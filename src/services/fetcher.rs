//! Price history fetching with a disk cache behind it.

use super::HistoryCache;
use crate::sources::HistorySource;
use crate::types::{HistoryInterval, HistoryKey, HistoryPeriod, PriceSeries};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Fetches history from a provider and keeps the CSV cache up to date.
///
/// Never fails: provider errors degrade to the last cached copy, and then
/// to an empty series.
pub struct HistoryFetcher {
    source: Arc<dyn HistorySource>,
    cache: HistoryCache,
}

impl HistoryFetcher {
    pub fn new(source: Arc<dyn HistorySource>, cache: HistoryCache) -> Self {
        Self { source, cache }
    }

    /// Fetch history for one symbol.
    pub async fn fetch_history(
        &self,
        symbol: &str,
        period: HistoryPeriod,
        interval: HistoryInterval,
    ) -> PriceSeries {
        let key = HistoryKey::new(symbol, period, interval);

        match self.source.fetch_history(&key).await {
            Ok(points) => {
                let series = PriceSeries::new(&key, points);
                if series.is_empty() {
                    debug!("{} returned no history for {}", self.source.name(), key);
                } else if let Err(e) = self.cache.store(&series) {
                    warn!("Failed to cache {}: {}", key, e);
                }
                series
            }
            Err(e) => {
                warn!("{} fetch failed for {}: {}", self.source.name(), key, e);
                match self.cache.load(&key) {
                    Some(stale) if !stale.is_empty() => {
                        info!("Serving {} cached rows for {}", stale.len(), key);
                        stale
                    }
                    _ => PriceSeries::empty(&key),
                }
            }
        }
    }

    /// Fetch history for several symbols, one after another. Blank symbols
    /// are skipped; order is preserved.
    pub async fn fetch_many(
        &self,
        symbols: &[String],
        period: HistoryPeriod,
        interval: HistoryInterval,
    ) -> Vec<PriceSeries> {
        let mut out = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let symbol = symbol.trim();
            if symbol.is_empty() {
                continue;
            }
            out.push(self.fetch_history(symbol, period, interval).await);
        }
        out
    }

    /// Most recent close from five days of one-minute bars.
    pub async fn latest_close(&self, symbol: &str) -> Option<f64> {
        self.fetch_history(symbol, HistoryPeriod::FiveDays, HistoryInterval::OneMinute)
            .await
            .last_close()
    }
}
