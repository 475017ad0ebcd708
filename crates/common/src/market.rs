use async_trait::async_trait;

use crate::{CandleSeries, Result, Timeframe};

/// Abstraction over the market-data provider.
///
/// `BinanceMarketData` implements this against the public REST API.
/// `PaperMarketData` implements this with deterministic synthetic data.
///
/// The analysis engine never fetches data itself; the signal generator holds
/// an injected `dyn MarketDataSource` and hands already-fetched series down.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch up to `limit` most recent candles, oldest first.
    async fn fetch_history(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<CandleSeries>;

    /// Get the latest traded price for a symbol.
    async fn fetch_current_price(&self, symbol: &str) -> Result<f64>;
}
