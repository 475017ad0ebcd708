use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::RwLock;
use tracing::{debug, info};

use common::{Candle, CandleSeries, Clock, Error, MarketDataSource, Result, Timeframe};

/// Candles generated when only a current price is requested.
const PRICE_REFERENCE_CANDLES: usize = 50;

/// Reference price the synthetic walk starts from.
pub fn base_price(symbol: &str) -> f64 {
    match symbol {
        "BTCUSDT" => 60_000.0,
        "ETHUSDT" => 3_000.0,
        "EURUSD" => 1.08,
        "XAUUSD" => 2_300.0,
        _ => 100.0,
    }
}

/// Deterministic market data for tests and offline runs.
///
/// Unscripted symbols get a seeded random walk around their base price, one
/// candle per timeframe interval ending at the clock's current time. The same
/// seed and clock always produce the same candles. Scripted series and prices
/// take precedence over the walk.
pub struct PaperMarketData {
    seed: u64,
    clock: Arc<dyn Clock>,
    /// Scripted candles per (symbol, timeframe).
    series: Arc<RwLock<HashMap<(String, Timeframe), CandleSeries>>>,
    /// Scripted current prices per symbol.
    prices: Arc<RwLock<HashMap<String, f64>>>,
}

impl PaperMarketData {
    pub fn new(seed: u64, clock: Arc<dyn Clock>) -> Self {
        info!(seed, "PaperMarketData initialized");
        Self {
            seed,
            clock,
            series: Arc::new(RwLock::new(HashMap::new())),
            prices: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Serve `series` for (symbol, timeframe) instead of the random walk.
    pub async fn set_series(&self, symbol: &str, timeframe: Timeframe, series: CandleSeries) {
        self.series
            .write()
            .await
            .insert((symbol.to_string(), timeframe), series);
    }

    /// Pin the current price for a symbol.
    pub async fn set_price(&self, symbol: &str, price: f64) {
        self.prices.write().await.insert(symbol.to_string(), price);
    }

    fn rng_for(&self, symbol: &str, timeframe: Timeframe) -> StdRng {
        // FNV-1a over the key, mixed with the seed.
        let key = symbol.bytes().chain(timeframe.as_str().bytes());
        let hash = key.fold(0xcbf2_9ce4_8422_2325_u64, |h, b| {
            (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
        });
        StdRng::seed_from_u64(self.seed ^ hash)
    }

    /// Random-walk candles around the symbol's base price.
    pub fn synthetic(&self, symbol: &str, timeframe: Timeframe, count: usize) -> Result<CandleSeries> {
        let base = base_price(symbol);
        let step = timeframe.duration();
        let now = self.clock.now();
        let mut rng = self.rng_for(symbol, timeframe);

        let mut price = base;
        let mut candles = Vec::with_capacity(count);
        for i in 0..count {
            let timestamp = now - step * (count - i - 1) as i32;
            price = (price + rng.gen_range(-0.01..0.01) * base).max(base * 0.01);
            let open = price;
            let close = (price + rng.gen_range(-0.005..0.005) * base).max(base * 0.01);
            let high = open.max(close) + rng.gen_range(0.0..0.003) * base;
            let low = (open.min(close) - rng.gen_range(0.0..0.003) * base).max(0.0);
            let volume = rng.gen_range(0.0..1_000.0_f64).floor();
            candles.push(Candle::new(timestamp, open, high, low, close, volume));
        }
        CandleSeries::new(candles)
    }
}

#[async_trait]
impl MarketDataSource for PaperMarketData {
    async fn fetch_history(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<CandleSeries> {
        if let Some(series) = self.series.read().await.get(&(symbol.to_string(), timeframe)) {
            debug!(symbol, %timeframe, limit, "Serving scripted candles");
            return CandleSeries::new(series.tail(limit).to_vec());
        }
        let series = self.synthetic(symbol, timeframe, limit)?;
        debug!(symbol, %timeframe, candles = series.len(), "Generated synthetic candles");
        Ok(series)
    }

    async fn fetch_current_price(&self, symbol: &str) -> Result<f64> {
        if let Some(price) = self.prices.read().await.get(symbol).copied() {
            return Ok(price);
        }
        self.synthetic(symbol, Timeframe::H1, PRICE_REFERENCE_CANDLES)?
            .last()
            .map(|c| c.close)
            .ok_or_else(|| Error::MarketData(format!("No synthetic price for {symbol}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use common::ManualClock;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.timestamp_opt(1_700_000_000, 0).unwrap()))
    }

    #[tokio::test]
    async fn same_seed_and_clock_give_same_candles() {
        let clock = clock();
        let a = PaperMarketData::new(7, clock.clone());
        let b = PaperMarketData::new(7, clock.clone());
        let sa = a.fetch_history("BTCUSDT", Timeframe::H1, 50).await.unwrap();
        let sb = b.fetch_history("BTCUSDT", Timeframe::H1, 50).await.unwrap();
        assert_eq!(sa, sb);

        let other = PaperMarketData::new(8, clock);
        let sc = other.fetch_history("BTCUSDT", Timeframe::H1, 50).await.unwrap();
        assert_ne!(sa, sc);
    }

    #[tokio::test]
    async fn candles_end_at_now_spaced_by_timeframe() {
        let clock = clock();
        let paper = PaperMarketData::new(1, clock.clone());
        let series = paper.fetch_history("ETHUSDT", Timeframe::H4, 30).await.unwrap();
        assert_eq!(series.len(), 30);
        assert_eq!(series.last().unwrap().timestamp, clock.now());
        let c = series.candles();
        assert_eq!(c[1].timestamp - c[0].timestamp, Duration::hours(4));
    }

    #[tokio::test]
    async fn walk_stays_near_base_price() {
        let paper = PaperMarketData::new(3, clock());
        let series = paper.fetch_history("EURUSD", Timeframe::M15, 50).await.unwrap();
        // At most 1.5% drift per candle from 1.08.
        assert!(series.candles().iter().all(|c| c.close > 0.0 && c.close < 1.08 * 1.8));
        assert!(series.candles().iter().all(|c| c.high >= c.close && c.low <= c.close));
    }

    #[tokio::test]
    async fn scripted_series_and_price_take_precedence() {
        let clock = clock();
        let paper = PaperMarketData::new(1, clock.clone());
        let start = clock.now();
        let candles = (0..10)
            .map(|i| {
                let c = 10.0 + i as f64;
                Candle::new(start + Duration::hours(i), c, c, c, c, 0.0)
            })
            .collect();
        paper
            .set_series("TEST", Timeframe::H1, CandleSeries::new(candles).unwrap())
            .await;
        paper.set_price("TEST", 42.0).await;

        let series = paper.fetch_history("TEST", Timeframe::H1, 4).await.unwrap();
        assert_eq!(series.closes(), vec![16.0, 17.0, 18.0, 19.0]);
        assert_eq!(paper.fetch_current_price("TEST").await.unwrap(), 42.0);
    }

    #[tokio::test]
    async fn current_price_defaults_to_synthetic_last_close() {
        let clock = clock();
        let paper = PaperMarketData::new(5, clock);
        let price = paper.fetch_current_price("XAUUSD").await.unwrap();
        let history = paper.synthetic("XAUUSD", Timeframe::H1, 50).unwrap();
        assert_eq!(price, history.last().unwrap().close);
    }
}
