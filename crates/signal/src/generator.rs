use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, warn};

use analysis::{TechnicalAnalyzer, MIN_ANALYSIS_CANDLES};
use common::{Clock, Error, MarketDataSource, Result, Timeframe};

use crate::{Decision, SignalAggregator, SignalCache};

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Fetches data, runs the analysis and aggregation, and serves results
/// through the signal cache.
pub struct SignalGenerator {
    source: Arc<dyn MarketDataSource>,
    analyzer: TechnicalAnalyzer,
    aggregator: SignalAggregator,
    cache: Arc<SignalCache>,
    clock: Arc<dyn Clock>,
    history_limit: usize,
}

impl SignalGenerator {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        analyzer: TechnicalAnalyzer,
        aggregator: SignalAggregator,
        cache: Arc<SignalCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            analyzer,
            aggregator,
            cache,
            clock,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Candles requested per analysis; never fewer than the analysis minimum.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(MIN_ANALYSIS_CANDLES);
        self
    }

    pub fn cache(&self) -> &SignalCache {
        &self.cache
    }

    /// Current decision for (symbol, timeframe).
    ///
    /// A fresh cached signal is returned unchanged. `InsufficientData`,
    /// data-source failures and non-positive or non-finite prices are
    /// returned as errors, never as an absence.
    pub async fn generate(&self, symbol: &str, timeframe: Timeframe) -> Result<Decision> {
        if let Some(signal) = self.cache.get(symbol, timeframe) {
            return Ok(Decision::Emit(signal));
        }

        let series = self
            .source
            .fetch_history(symbol, timeframe, self.history_limit)
            .await
            .map_err(|e| {
                warn!(symbol, %timeframe, error = %e, "Failed to fetch history");
                e
            })?;
        series.require("signal", MIN_ANALYSIS_CANDLES)?;

        let price = self.source.fetch_current_price(symbol).await.map_err(|e| {
            warn!(symbol, error = %e, "Failed to fetch current price");
            e
        })?;
        if !price.is_finite() || price <= 0.0 {
            warn!(symbol, price, "Rejected current price");
            return Err(Error::MarketData(format!("invalid current price for {symbol}: {price}")));
        }

        let analysis = self.analyzer.analyze(&series)?;
        debug!(
            symbol,
            %timeframe,
            candles = series.len(),
            trend = %analysis.trend,
            price,
            "Analysis complete"
        );
        let decision = self
            .aggregator
            .aggregate(symbol, timeframe, price, &analysis, self.clock.now());
        Ok(self.cache.resolve(symbol, timeframe, decision))
    }

    /// Evaluate several pairs concurrently; results keep the input order.
    pub async fn generate_many(&self, pairs: &[(String, Timeframe)]) -> Vec<Result<Decision>> {
        join_all(
            pairs
                .iter()
                .map(|(symbol, timeframe)| self.generate(symbol, *timeframe)),
        )
        .await
    }
}
