pub mod config;
pub mod indicators;
pub mod levels;
pub mod patterns;
pub mod trend;

pub use config::{AnalysisConfig, AnalysisFileConfig, LevelConfig, PatternConfig, SignalSection, TrendConfig};
pub use indicators::{IndicatorEngine, IndicatorName, IndicatorReading, IndicatorSnapshot};
pub use levels::{LevelFinder, PivotLadder, PriceLevels};
pub use patterns::{PatternBias, PatternEvaluation, PatternKind, PatternOutcome, PatternRecognizer, PatternReport};
pub use trend::{TrendAssessment, TrendClassifier, TrendDirection, TrendQualifier};

use serde::Serialize;

use common::{CandleSeries, Result};

/// Minimum candles for a full analysis (trend, levels and multi-candle patterns).
pub const MIN_ANALYSIS_CANDLES: usize = 20;

/// Everything the signal stage needs from one candle series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicalAnalysis {
    pub indicators: IndicatorSnapshot,
    pub trend: TrendAssessment,
    pub levels: PriceLevels,
    pub patterns: PatternReport,
}

/// Runs the indicator engine, then trend, levels and patterns on its output.
#[derive(Debug, Clone, Default)]
pub struct TechnicalAnalyzer {
    pub engine: IndicatorEngine,
    pub trend: TrendClassifier,
    pub levels: LevelFinder,
    pub patterns: PatternRecognizer,
}

impl TechnicalAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            engine: IndicatorEngine::default(),
            trend: TrendClassifier::new(config.trend),
            levels: LevelFinder::new(config.levels),
            patterns: PatternRecognizer::new(config.patterns),
        }
    }

    pub fn analyze(&self, series: &CandleSeries) -> Result<TechnicalAnalysis> {
        series.require("analysis", MIN_ANALYSIS_CANDLES)?;
        let snapshot = self.engine.compute(series);
        self.analyze_with_indicators(series, snapshot)
    }

    /// Analyze with a caller-supplied indicator snapshot.
    pub fn analyze_with_indicators(
        &self,
        series: &CandleSeries,
        indicators: IndicatorSnapshot,
    ) -> Result<TechnicalAnalysis> {
        series.require("analysis", MIN_ANALYSIS_CANDLES)?;
        let trend = self.trend.classify(series, &indicators)?;
        let levels = self.levels.find(series)?;
        let patterns = self.patterns.recognize(series)?;
        Ok(TechnicalAnalysis {
            indicators,
            trend,
            levels,
            patterns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use common::{Candle, Error};

    fn series(n: usize) -> CandleSeries {
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let candles = (0..n)
            .map(|i| {
                let c = 100.0 + (i as f64 * 0.4).sin() * 4.0 + i as f64 * 0.2;
                Candle::new(start + Duration::hours(i as i64), c - 0.3, c + 0.8, c - 0.9, c, 5.0)
            })
            .collect();
        CandleSeries::new(candles).unwrap()
    }

    #[test]
    fn analyze_fills_every_component() {
        let analysis = TechnicalAnalyzer::default().analyze(&series(80)).unwrap();
        let close = analysis.indicators.close;
        assert!(analysis.levels.support.iter().all(|&s| s < close));
        assert!(analysis.levels.resistance.iter().all(|&r| r > close));
        assert_eq!(analysis.patterns.evaluations.len(), 22);
        assert!((0.0..=1.0).contains(&analysis.trend.strength));
    }

    #[test]
    fn analyze_rejects_short_series() {
        let err = TechnicalAnalyzer::default().analyze(&series(12)).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientData {
                required: MIN_ANALYSIS_CANDLES,
                actual: 12,
                ..
            }
        ));
    }
}
