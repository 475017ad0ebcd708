use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use common::{Candle, CandleSeries, Error, MarketDataSource, Result, Timeframe};

use crate::RateLimiter;

const BASE_URL: &str = "https://api.binance.com";
/// Binance caps a klines request at 1000 rows.
const MAX_KLINES: usize = 1000;

/// Public (unsigned) Binance spot market data.
///
/// Every request passes through the rate limiter first; a refused request
/// fails with `Error::RateLimited` instead of waiting.
pub struct BinanceMarketData {
    http: Client,
    base_url: String,
    limiter: Arc<RateLimiter>,
}

impl BinanceMarketData {
    pub fn new(limiter: Arc<RateLimiter>) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            http,
            base_url: BASE_URL.to_string(),
            limiter,
        })
    }

    /// Point the client at another host (a testnet or a local mock).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get(&self, path: &str, query: &str) -> Result<String> {
        if !self.limiter.try_acquire() {
            warn!(path, "Binance request refused by rate limiter");
            return Err(Error::RateLimited(format!("too many requests to {path}")));
        }

        let url = format!("{}{path}?{query}", self.base_url);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::MarketData(format!("HTTP {status}: {body}")));
        }
        Ok(body)
    }
}

#[async_trait]
impl MarketDataSource for BinanceMarketData {
    async fn fetch_history(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<CandleSeries> {
        let limit = limit.clamp(1, MAX_KLINES);
        let query = format!("symbol={symbol}&interval={}&limit={limit}", timeframe.as_str());
        debug!(symbol, %timeframe, limit, "Fetching klines");
        let body = self.get("/api/v3/klines", &query).await?;
        parse_klines(&body)
    }

    async fn fetch_current_price(&self, symbol: &str) -> Result<f64> {
        let body = self.get("/api/v3/ticker/price", &format!("symbol={symbol}")).await?;
        let ticker: PriceTicker = serde_json::from_str(&body)?;
        ticker
            .price
            .parse::<f64>()
            .map_err(|e| Error::MarketData(format!("bad price '{}': {e}", ticker.price)))
    }
}

/// Decode a klines response: rows of `[open_time_ms, "open", "high", "low",
/// "close", "volume", ...]`, oldest first.
pub fn parse_klines(body: &str) -> Result<CandleSeries> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body)?;
    let candles = rows
        .iter()
        .map(|row| parse_row(row))
        .collect::<Result<Vec<_>>>()?;
    CandleSeries::new(candles)
}

fn parse_row(row: &[Value]) -> Result<Candle> {
    let open_time = row
        .first()
        .and_then(Value::as_i64)
        .ok_or_else(|| Error::MarketData("kline row without open time".into()))?;
    let timestamp = Utc
        .timestamp_millis_opt(open_time)
        .single()
        .ok_or_else(|| Error::MarketData(format!("kline open time out of range: {open_time}")))?;

    let field = |i: usize| -> Result<f64> {
        let raw = row
            .get(i)
            .ok_or_else(|| Error::MarketData(format!("kline row missing column {i}")))?;
        match raw {
            Value::String(s) => s
                .parse()
                .map_err(|e| Error::MarketData(format!("bad kline value '{s}': {e}"))),
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| Error::MarketData(format!("bad kline value {n}"))),
            other => Err(Error::MarketData(format!("unexpected kline value {other}"))),
        }
    };
    let volume = if row.len() > 5 { field(5)? } else { 0.0 };

    Ok(Candle::new(timestamp, field(1)?, field(2)?, field(3)?, field(4)?, volume))
}

#[derive(Deserialize)]
struct PriceTicker {
    price: String,
}
