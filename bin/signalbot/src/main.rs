use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use analysis::{AnalysisFileConfig, TechnicalAnalyzer};
use common::{Clock, Config, DataSourceKind, MarketDataSource, SystemClock, Timeframe};
use market::{BinanceMarketData, RateLimiter};
use paper::PaperMarketData;
use signal::{Decision, SignalAggregator, SignalCache, SignalConfig, SignalGenerator};

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    info!(
        source = %cfg.data_source,
        pairs = cfg.pairs.len(),
        timeframes = cfg.timeframes.len(),
        "SignalBot starting"
    );

    let file = match &cfg.analysis_config_path {
        Some(path) => AnalysisFileConfig::load(path)
            .unwrap_or_else(|e| panic!("Failed to load analysis config '{path}': {e}")),
        None => AnalysisFileConfig::default(),
    };
    let signal_cfg = SignalConfig {
        min_confidence: cfg.min_confidence,
    }
    .with_overrides(&file.signal);
    let ttl_secs = file.signal.cache_ttl_secs.unwrap_or(cfg.cache_ttl_secs);

    // ── Market data (injected based on MARKET_DATA_SOURCE) ────────────────────
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let source: Arc<dyn MarketDataSource> = match cfg.data_source {
        DataSourceKind::Binance => {
            info!(
                calls = cfg.rate_limit_calls,
                period_secs = cfg.rate_limit_period_secs,
                "Using Binance public market data"
            );
            let limiter = Arc::new(RateLimiter::per_second(
                cfg.rate_limit_calls,
                cfg.rate_limit_period_secs,
            ));
            Arc::new(
                BinanceMarketData::new(limiter)
                    .unwrap_or_else(|e| panic!("Failed to build Binance client: {e}")),
            )
        }
        DataSourceKind::Paper => {
            info!(seed = cfg.paper_seed, "Using synthetic paper market data");
            Arc::new(PaperMarketData::new(cfg.paper_seed, clock.clone()))
        }
    };

    // ── Signal generator ──────────────────────────────────────────────────────
    let cache = Arc::new(SignalCache::new(
        chrono::Duration::seconds(ttl_secs as i64),
        clock.clone(),
    ));
    let generator = SignalGenerator::new(
        source,
        TechnicalAnalyzer::new(file.analysis()),
        SignalAggregator::new(signal_cfg),
        cache.clone(),
        clock,
    )
    .with_history_limit(cfg.history_limit);

    let pairs: Vec<(String, Timeframe)> = cfg
        .pairs
        .iter()
        .flat_map(|symbol| cfg.timeframes.iter().map(move |tf| (symbol.clone(), *tf)))
        .collect();

    // ── Scan loop ─────────────────────────────────────────────────────────────
    let Some(interval_secs) = cfg.scan_interval_secs else {
        scan(&generator, &pairs).await;
        return;
    };

    info!(interval_secs, "Scanning on an interval. Press Ctrl-C to stop.");
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                scan(&generator, &pairs).await;
                let purged = cache.purge_expired();
                if purged > 0 {
                    info!(purged, "Expired signals purged");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }
    info!("SignalBot stopped");
}

/// Evaluate every pair once and print emitted signals as JSON lines.
async fn scan(generator: &SignalGenerator, pairs: &[(String, Timeframe)]) {
    let results = generator.generate_many(pairs).await;
    let mut emitted = 0usize;
    for ((symbol, timeframe), result) in pairs.iter().zip(results) {
        match result {
            Ok(Decision::Emit(signal)) => {
                emitted += 1;
                match serde_json::to_string(&signal) {
                    Ok(json) => println!("{json}"),
                    Err(e) => error!(symbol = %symbol, error = %e, "Failed to serialize signal"),
                }
            }
            Ok(Decision::NoSignal(reason)) => {
                info!(symbol = %symbol, %timeframe, ?reason, "No signal");
            }
            Err(e) if e.is_insufficient_data() => {
                warn!(symbol = %symbol, %timeframe, error = %e, "Not enough data yet");
            }
            Err(e) => {
                error!(symbol = %symbol, %timeframe, error = %e, "Signal generation failed");
            }
        }
    }
    info!(evaluated = pairs.len(), emitted, "Scan complete");
}
