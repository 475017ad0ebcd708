use std::str::FromStr;

use crate::Timeframe;

const DEFAULT_PAIRS: &str = "BTCUSDT,ETHUSDT,BNBUSDT,EURUSD,GBPUSD,USDJPY,XAUUSD";
const DEFAULT_TIMEFRAMES: &str = "5m,15m,30m,1h,4h,1d";

/// Where candles and prices come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSourceKind {
    Paper,
    Binance,
}

impl std::fmt::Display for DataSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSourceKind::Paper => write!(f, "paper"),
            DataSourceKind::Binance => write!(f, "binance"),
        }
    }
}

/// All process configuration loaded from environment variables at startup.
/// Invalid values cause an immediate panic with a clear message.
///
/// Library crates never read this directly; the binary passes the relevant
/// values down as explicit parameters.
#[derive(Debug, Clone)]
pub struct Config {
    // Signal emission
    pub min_confidence: f64,
    pub cache_ttl_secs: u64,

    // Market data
    pub data_source: DataSourceKind,
    pub pairs: Vec<String>,
    pub timeframes: Vec<Timeframe>,
    pub history_limit: usize,
    pub paper_seed: u64,
    pub rate_limit_calls: usize,
    pub rate_limit_period_secs: u64,

    // Scheduling; `None` means scan once and exit
    pub scan_interval_secs: Option<u64>,

    // Optional TOML file with analysis thresholds
    pub analysis_config_path: Option<String>,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_source = match lookup("MARKET_DATA_SOURCE")
            .unwrap_or_else(|| "paper".to_string())
            .to_lowercase()
            .as_str()
        {
            "paper" => DataSourceKind::Paper,
            "binance" => DataSourceKind::Binance,
            other => panic!("ERROR: MARKET_DATA_SOURCE must be 'paper' or 'binance', got: '{other}'"),
        };

        let pairs = lookup("PAIRS")
            .unwrap_or_else(|| DEFAULT_PAIRS.to_string())
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();

        let timeframes = lookup("TIMEFRAMES")
            .unwrap_or_else(|| DEFAULT_TIMEFRAMES.to_string())
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.parse::<Timeframe>()
                    .unwrap_or_else(|e| panic!("TIMEFRAMES contains an invalid entry: {e}"))
            })
            .collect();

        Config {
            min_confidence: parsed(&lookup, "MIN_CONFIDENCE", 70.0),
            cache_ttl_secs: parsed(&lookup, "SIGNAL_CACHE_TTL_SECS", 300),
            data_source,
            pairs,
            timeframes,
            history_limit: parsed(&lookup, "HISTORY_LIMIT", 50),
            paper_seed: parsed(&lookup, "PAPER_SEED", 42),
            rate_limit_calls: parsed(&lookup, "RATE_LIMIT_CALLS", 5),
            rate_limit_period_secs: parsed(&lookup, "RATE_LIMIT_PERIOD_SECS", 1),
            scan_interval_secs: lookup("SCAN_INTERVAL_SECS").map(|v| {
                v.parse()
                    .unwrap_or_else(|_| panic!("SCAN_INTERVAL_SECS must be an integer, got: '{v}'"))
            }),
            analysis_config_path: lookup("ANALYSIS_CONFIG_PATH"),
        }
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("Environment variable '{key}' has an invalid value: '{raw}'")),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = config_from(&[]);
        assert_eq!(cfg.min_confidence, 70.0);
        assert_eq!(cfg.cache_ttl_secs, 300);
        assert_eq!(cfg.data_source, DataSourceKind::Paper);
        assert_eq!(cfg.pairs.len(), 7);
        assert_eq!(cfg.timeframes.len(), 6);
        assert_eq!(cfg.history_limit, 50);
        assert!(cfg.scan_interval_secs.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = config_from(&[
            ("MIN_CONFIDENCE", "80"),
            ("MARKET_DATA_SOURCE", "Binance"),
            ("PAIRS", "btcusdt, ethusdt"),
            ("TIMEFRAMES", "1h,4h"),
            ("SCAN_INTERVAL_SECS", "60"),
        ]);
        assert_eq!(cfg.min_confidence, 80.0);
        assert_eq!(cfg.data_source, DataSourceKind::Binance);
        assert_eq!(cfg.pairs, vec!["BTCUSDT", "ETHUSDT"]);
        assert_eq!(cfg.timeframes, vec![Timeframe::H1, Timeframe::H4]);
        assert_eq!(cfg.scan_interval_secs, Some(60));
    }

    #[test]
    #[should_panic(expected = "MARKET_DATA_SOURCE")]
    fn unknown_source_panics() {
        config_from(&[("MARKET_DATA_SOURCE", "carrier-pigeon")]);
    }
}
