pub mod yahoo;

pub use yahoo::YahooFinanceClient;

use crate::error::Result;
use crate::types::{HistoryKey, PricePoint};
use async_trait::async_trait;

/// A market-data provider that can return price history for a symbol.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Fetch bars for the requested symbol, period and interval.
    ///
    /// An unknown symbol is an empty vector, not an error.
    async fn fetch_history(&self, key: &HistoryKey) -> Result<Vec<PricePoint>>;
}
