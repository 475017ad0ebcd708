use serde::{Deserialize, Serialize};

use common::{Error, Result};

use crate::patterns::CANDLESTICK_WINDOW;

/// Trend classification thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrendConfig {
    /// |score| above this gives a directional label.
    pub direction_threshold: f64,
    /// strength above this is "strong".
    pub strong_threshold: f64,
    /// strength above this is "moderate".
    pub moderate_threshold: f64,
    pub min_candles: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            direction_threshold: 0.3,
            strong_threshold: 0.7,
            moderate_threshold: 0.4,
            min_candles: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Number of trailing candles used for pivots and extrema.
    pub window: usize,
    /// Levels kept on each side of the price.
    pub max_levels: usize,
    pub min_candles: usize,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            window: 20,
            max_levels: 3,
            min_candles: 20,
        }
    }
}

/// Candlestick thresholds (fractions of range or body) and chart-pattern geometry.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PatternConfig {
    pub doji_body_ratio: f64,
    pub hammer_body_ratio: f64,
    pub hammer_shadow_multiple: f64,
    pub hammer_opposite_shadow_ratio: f64,
    pub star_middle_body_ratio: f64,
    pub min_candles: usize,
    pub chart_min_candles: usize,
    /// Trailing candles scanned for chart formations.
    pub chart_window: usize,
    /// Bars on each side a pivot must dominate.
    pub pivot_lookback: usize,
    /// Relative tolerance when comparing peak/trough prices.
    pub price_tolerance: f64,
    /// Per-bar slope (relative to price) below which a trendline is flat.
    pub flat_slope: f64,
    /// Minimum relative move of a flag pole.
    pub flag_pole_move: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            doji_body_ratio: 0.05,
            hammer_body_ratio: 0.3,
            hammer_shadow_multiple: 2.0,
            hammer_opposite_shadow_ratio: 0.1,
            star_middle_body_ratio: 0.5,
            min_candles: 5,
            chart_min_candles: 20,
            chart_window: 60,
            pivot_lookback: 2,
            price_tolerance: 0.02,
            flat_slope: 0.001,
            flag_pole_move: 0.05,
        }
    }
}

/// Thresholds for the analysis stage, passed explicitly into each component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub trend: TrendConfig,
    pub levels: LevelConfig,
    pub patterns: PatternConfig,
}

/// `[signal]` table of the analysis file; interpreted by the signal stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SignalSection {
    pub min_confidence: Option<f64>,
    pub cache_ttl_secs: Option<u64>,
}

/// Optional TOML file overriding analysis thresholds.
///
/// Example (the full key set is in `analysis.example.toml`):
/// ```toml
/// [trend]
/// strong_threshold = 0.65
///
/// [patterns]
/// chart_window = 80
///
/// [signal]
/// min_confidence = 75.0
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisFileConfig {
    pub trend: TrendConfig,
    pub levels: LevelConfig,
    pub patterns: PatternConfig,
    pub signal: SignalSection,
}

impl AnalysisFileConfig {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let cfg = Self::parse(&content)
            .map_err(|e| Error::Config(format!("failed to parse analysis config at '{path}': {e}")))?;
        cfg.validate()
            .map_err(|e| Error::Config(format!("invalid analysis config at '{path}': {e}")))?;
        Ok(cfg)
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn analysis(&self) -> AnalysisConfig {
        AnalysisConfig {
            trend: self.trend,
            levels: self.levels,
            patterns: self.patterns,
        }
    }

    /// Reject values that would disable a stage or index past a series.
    pub fn validate(&self) -> Result<()> {
        self.analysis().validate()?;
        if let Some(min) = self.signal.min_confidence {
            if !(0.0..=100.0).contains(&min) {
                return Err(Error::Config(format!("signal.min_confidence must be within [0, 100], got {min}")));
            }
        }
        Ok(())
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        at_least("trend.min_candles", self.trend.min_candles, 1)?;
        at_least("levels.window", self.levels.window, 1)?;
        at_least("levels.max_levels", self.levels.max_levels, 1)?;
        at_least("levels.min_candles", self.levels.min_candles, 1)?;
        at_least("patterns.min_candles", self.patterns.min_candles, CANDLESTICK_WINDOW)?;
        at_least("patterns.chart_min_candles", self.patterns.chart_min_candles, 1)?;
        at_least("patterns.chart_window", self.patterns.chart_window, 1)?;
        at_least("patterns.pivot_lookback", self.patterns.pivot_lookback, 1)?;

        let t = &self.trend;
        if !(0.0..=1.0).contains(&t.moderate_threshold)
            || !(0.0..=1.0).contains(&t.strong_threshold)
            || t.moderate_threshold > t.strong_threshold
        {
            return Err(Error::Config(format!(
                "trend thresholds must satisfy 0 <= moderate ({}) <= strong ({}) <= 1",
                t.moderate_threshold, t.strong_threshold
            )));
        }
        Ok(())
    }
}

fn at_least(key: &str, value: usize, min: usize) -> Result<()> {
    if value < min {
        return Err(Error::Config(format!("{key} must be at least {min}, got {value}")));
    }
    Ok(())
}
