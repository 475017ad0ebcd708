use std::fmt;

use serde::Serialize;

use common::{CandleSeries, Result};

use crate::config::TrendConfig;
use crate::indicators::IndicatorSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Bullish,
    Bearish,
    Choppy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendQualifier {
    Weak,
    Moderate,
    Strong,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendAssessment {
    pub direction: TrendDirection,
    pub qualifier: TrendQualifier,
    /// |score| scaled by ADX, in [0, 1].
    pub strength: f64,
    /// Mean of the six ±1 factors, in [-1, 1].
    pub score: f64,
}

impl TrendAssessment {
    pub fn is(&self, qualifier: TrendQualifier, direction: TrendDirection) -> bool {
        self.qualifier == qualifier && self.direction == direction
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrendDirection::Bullish => "bullish",
            TrendDirection::Bearish => "bearish",
            TrendDirection::Choppy => "choppy",
        })
    }
}

impl fmt::Display for TrendQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrendQualifier::Weak => "weak",
            TrendQualifier::Moderate => "moderate",
            TrendQualifier::Strong => "strong",
        })
    }
}

impl fmt::Display for TrendAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.qualifier, self.direction)
    }
}

/// Labels the trend from moving-average position, momentum and ADX.
#[derive(Debug, Clone, Default)]
pub struct TrendClassifier {
    config: TrendConfig,
}

impl TrendClassifier {
    pub fn new(config: TrendConfig) -> Self {
        Self { config }
    }

    /// Gate on series length, then classify the snapshot.
    pub fn classify(
        &self,
        series: &CandleSeries,
        snapshot: &IndicatorSnapshot,
    ) -> Result<TrendAssessment> {
        series.require("trend", self.config.min_candles)?;
        Ok(self.assess(snapshot))
    }

    pub fn assess(&self, snapshot: &IndicatorSnapshot) -> TrendAssessment {
        let close = snapshot.close;
        let sma20 = snapshot.sma.p20.current;
        let sma50 = snapshot.sma.p50.current;
        let sma200 = snapshot.sma.p200.current;

        let factors = [
            close > sma20,
            close > sma50,
            close > sma200,
            sma20 > sma50,
            snapshot.rsi.current > 50.0,
            snapshot.macd.current.histogram > 0.0,
        ];
        let score = factors
            .iter()
            .map(|&up| if up { 1.0 } else { -1.0 })
            .sum::<f64>()
            / factors.len() as f64;

        let strength_factor = (snapshot.adx.current / 100.0).clamp(0.0, 1.0);
        let strength = score.abs() * strength_factor;

        let direction = if score > self.config.direction_threshold {
            TrendDirection::Bullish
        } else if score < -self.config.direction_threshold {
            TrendDirection::Bearish
        } else {
            TrendDirection::Choppy
        };

        let qualifier = if strength > self.config.strong_threshold {
            TrendQualifier::Strong
        } else if strength > self.config.moderate_threshold {
            TrendQualifier::Moderate
        } else {
            TrendQualifier::Weak
        };

        TrendAssessment {
            direction,
            qualifier,
            strength,
            score,
        }
    }
}
