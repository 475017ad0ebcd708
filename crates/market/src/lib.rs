pub mod binance;
pub mod limiter;

pub use binance::BinanceMarketData;
pub use limiter::RateLimiter;
