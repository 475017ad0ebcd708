mod candlestick;
mod chart;

use std::fmt;

use serde::Serialize;
use tracing::debug;

use common::{CandleSeries, Result};

use crate::config::PatternConfig;

use candlestick::*;
use chart::ChartDetector;

/// Closed catalog of recognizable formations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Doji,
    Hammer,
    InvertedHammer,
    ShootingStar,
    BullishEngulfing,
    BearishEngulfing,
    MorningStar,
    EveningStar,
    HeadAndShoulders,
    InverseHeadAndShoulders,
    DoubleTop,
    DoubleBottom,
    TripleTop,
    TripleBottom,
    BullishFlag,
    BearishFlag,
    RisingWedge,
    FallingWedge,
    AscendingTriangle,
    DescendingTriangle,
    SymmetricalTriangle,
    Rectangle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternBias {
    Bullish,
    Bearish,
    Neutral,
}

impl PatternKind {
    pub const CANDLESTICK: [PatternKind; 8] = [
        PatternKind::Hammer,
        PatternKind::InvertedHammer,
        PatternKind::Doji,
        PatternKind::ShootingStar,
        PatternKind::BullishEngulfing,
        PatternKind::BearishEngulfing,
        PatternKind::MorningStar,
        PatternKind::EveningStar,
    ];

    pub const CHART: [PatternKind; 14] = [
        PatternKind::HeadAndShoulders,
        PatternKind::InverseHeadAndShoulders,
        PatternKind::DoubleBottom,
        PatternKind::DoubleTop,
        PatternKind::TripleBottom,
        PatternKind::TripleTop,
        PatternKind::BullishFlag,
        PatternKind::BearishFlag,
        PatternKind::RisingWedge,
        PatternKind::FallingWedge,
        PatternKind::AscendingTriangle,
        PatternKind::DescendingTriangle,
        PatternKind::SymmetricalTriangle,
        PatternKind::Rectangle,
    ];

    pub fn bias(&self) -> PatternBias {
        use PatternKind::*;
        match self {
            Hammer | InvertedHammer | BullishEngulfing | MorningStar | DoubleBottom
            | TripleBottom | InverseHeadAndShoulders | AscendingTriangle | BullishFlag
            | FallingWedge => PatternBias::Bullish,
            ShootingStar | BearishEngulfing | EveningStar | DoubleTop | TripleTop
            | HeadAndShoulders | DescendingTriangle | BearishFlag | RisingWedge => {
                PatternBias::Bearish
            }
            Doji | SymmetricalTriangle | Rectangle => PatternBias::Neutral,
        }
    }

    /// Whether a match counts as confirmation for a trade in `bias`'s
    /// direction. Narrower than `bias()`: stars, flags, wedges and
    /// head-and-shoulders only color the narrative.
    pub fn confirms(&self, bias: PatternBias) -> bool {
        use PatternKind::*;
        match bias {
            PatternBias::Bullish => matches!(
                self,
                Hammer | InvertedHammer | BullishEngulfing | AscendingTriangle | DoubleBottom | TripleBottom
            ),
            PatternBias::Bearish => matches!(
                self,
                BearishEngulfing | EveningStar | DescendingTriangle | DoubleTop | TripleTop
            ),
            PatternBias::Neutral => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PatternKind::Doji => "Doji",
            PatternKind::Hammer => "Hammer",
            PatternKind::InvertedHammer => "Inverted Hammer",
            PatternKind::ShootingStar => "Shooting Star",
            PatternKind::BullishEngulfing => "Bullish Engulfing",
            PatternKind::BearishEngulfing => "Bearish Engulfing",
            PatternKind::MorningStar => "Morning Star",
            PatternKind::EveningStar => "Evening Star",
            PatternKind::HeadAndShoulders => "Head and Shoulders",
            PatternKind::InverseHeadAndShoulders => "Inverse Head and Shoulders",
            PatternKind::DoubleTop => "Double Top",
            PatternKind::DoubleBottom => "Double Bottom",
            PatternKind::TripleTop => "Triple Top",
            PatternKind::TripleBottom => "Triple Bottom",
            PatternKind::BullishFlag => "Bullish Flag",
            PatternKind::BearishFlag => "Bearish Flag",
            PatternKind::RisingWedge => "Rising Wedge",
            PatternKind::FallingWedge => "Falling Wedge",
            PatternKind::AscendingTriangle => "Ascending Triangle",
            PatternKind::DescendingTriangle => "Descending Triangle",
            PatternKind::SymmetricalTriangle => "Symmetrical Triangle",
            PatternKind::Rectangle => "Rectangle",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternOutcome {
    Matched,
    NoMatch,
    /// The detector could not be applied (series shorter than its window).
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PatternEvaluation {
    pub kind: PatternKind,
    pub outcome: PatternOutcome,
}

/// Outcome of every detector in the catalog, in evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatternReport {
    pub evaluations: Vec<PatternEvaluation>,
}

impl PatternReport {
    /// Matched patterns in detection order.
    pub fn matches(&self) -> Vec<PatternKind> {
        self.with_outcome(PatternOutcome::Matched)
    }

    pub fn unsupported(&self) -> Vec<PatternKind> {
        self.with_outcome(PatternOutcome::Unsupported)
    }

    pub fn outcome(&self, kind: PatternKind) -> Option<PatternOutcome> {
        self.evaluations
            .iter()
            .find(|e| e.kind == kind)
            .map(|e| e.outcome)
    }

    fn with_outcome(&self, outcome: PatternOutcome) -> Vec<PatternKind> {
        self.evaluations
            .iter()
            .filter(|e| e.outcome == outcome)
            .map(|e| e.kind)
            .collect()
    }
}

/// Candles the three-candle formations need, whatever `min_candles` says.
pub const CANDLESTICK_WINDOW: usize = 3;

/// Candlestick detectors look at the last three candles; chart detectors scan
/// the pivots of the trailing `chart_window` candles.
#[derive(Debug, Clone, Default)]
pub struct PatternRecognizer {
    config: PatternConfig,
}

impl PatternRecognizer {
    pub fn new(config: PatternConfig) -> Self {
        Self { config }
    }

    pub fn recognize(&self, series: &CandleSeries) -> Result<PatternReport> {
        series.require("patterns", self.config.min_candles.max(CANDLESTICK_WINDOW))?;
        let cfg = &self.config;
        let candles = series.candles();
        let n = candles.len();
        let (c1, c2, c3) = (&candles[n - 3], &candles[n - 2], &candles[n - 1]);

        let mut evaluations = Vec::with_capacity(PatternKind::CANDLESTICK.len() + PatternKind::CHART.len());
        for kind in PatternKind::CANDLESTICK {
            let matched = match kind {
                PatternKind::Hammer => is_hammer(c3, cfg),
                PatternKind::InvertedHammer => is_inverted_hammer(c3, cfg),
                PatternKind::Doji => is_doji(c3, cfg),
                PatternKind::ShootingStar => is_shooting_star(c3, cfg),
                PatternKind::BullishEngulfing => is_bullish_engulfing(c2, c3),
                PatternKind::BearishEngulfing => is_bearish_engulfing(c2, c3),
                PatternKind::MorningStar => is_morning_star(c1, c2, c3, cfg),
                PatternKind::EveningStar => is_evening_star(c1, c2, c3, cfg),
                _ => false,
            };
            evaluations.push(PatternEvaluation {
                kind,
                outcome: if matched {
                    PatternOutcome::Matched
                } else {
                    PatternOutcome::NoMatch
                },
            });
        }

        if n < cfg.chart_min_candles {
            evaluations.extend(PatternKind::CHART.into_iter().map(|kind| PatternEvaluation {
                kind,
                outcome: PatternOutcome::Unsupported,
            }));
        } else {
            let detector = ChartDetector::new(series.tail(cfg.chart_window), cfg);
            evaluations.extend(PatternKind::CHART.into_iter().map(|kind| PatternEvaluation {
                kind,
                outcome: if detector.detect(kind) {
                    PatternOutcome::Matched
                } else {
                    PatternOutcome::NoMatch
                },
            }));
        }

        let report = PatternReport { evaluations };
        debug!(
            candles = n,
            matched = ?report.matches(),
            unsupported = report.unsupported().len(),
            "Patterns evaluated"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Candle, Error};

    fn series(candles: Vec<Candle>) -> CandleSeries {
        CandleSeries::new(candles).unwrap()
    }

    #[test]
    fn every_kind_has_exactly_one_evaluation() {
        let candles = chart::tests::from_anchors(&[(0, 100.0), (10, 110.0), (15, 104.0), (20, 110.5), (28, 102.0)]);
        let report = PatternRecognizer::default().recognize(&series(candles)).unwrap();
        assert_eq!(report.evaluations.len(), 22);
        for kind in PatternKind::CANDLESTICK.iter().chain(PatternKind::CHART.iter()) {
            assert!(report.outcome(*kind).is_some(), "{kind} missing");
        }
        assert!(report.matches().contains(&PatternKind::DoubleTop));
        assert!(report.unsupported().is_empty());
    }

    #[test]
    fn short_series_marks_chart_patterns_unsupported() {
        let candles = chart::tests::from_anchors(&[(0, 100.0), (9, 104.0)]);
        let report = PatternRecognizer::default().recognize(&series(candles)).unwrap();
        assert_eq!(report.unsupported().len(), PatternKind::CHART.len());
        assert_eq!(report.outcome(PatternKind::Hammer), Some(PatternOutcome::NoMatch));
        assert_eq!(
            report.outcome(PatternKind::HeadAndShoulders),
            Some(PatternOutcome::Unsupported)
        );
    }

    #[test]
    fn fewer_than_five_candles_is_insufficient() {
        let candles = chart::tests::from_anchors(&[(0, 100.0), (3, 101.0)]);
        let err = PatternRecognizer::default().recognize(&series(candles)).unwrap_err();
        assert!(matches!(err, Error::InsufficientData { operation: "patterns", required: 5, actual: 4 }));
    }

    #[test]
    fn hammer_on_last_candle_is_matched() {
        let mut candles = chart::tests::from_anchors(&[(0, 110.0), (6, 104.0)]);
        let last = candles.len() - 1;
        let ts = candles[last].timestamp;
        candles[last] = Candle::new(ts, 105.0, 106.2, 99.0, 106.0, 1.0);
        let report = PatternRecognizer::default().recognize(&series(candles)).unwrap();
        assert_eq!(report.outcome(PatternKind::Hammer), Some(PatternOutcome::Matched));
        assert_eq!(report.matches()[0], PatternKind::Hammer);
    }

    #[test]
    fn biases_cover_the_catalog() {
        assert_eq!(PatternKind::Hammer.bias(), PatternBias::Bullish);
        assert_eq!(PatternKind::TripleBottom.bias(), PatternBias::Bullish);
        assert_eq!(PatternKind::RisingWedge.bias(), PatternBias::Bearish);
        assert_eq!(PatternKind::Doji.bias(), PatternBias::Neutral);
        let bullish = PatternKind::CANDLESTICK
            .iter()
            .chain(PatternKind::CHART.iter())
            .filter(|k| k.bias() == PatternBias::Bullish)
            .count();
        assert_eq!(bullish, 10);
    }

    #[test]
    fn two_candles_are_insufficient_even_with_a_lower_minimum() {
        let candles = chart::tests::from_anchors(&[(0, 100.0), (1, 101.0)]);
        let recognizer = PatternRecognizer::new(PatternConfig {
            min_candles: 1,
            ..PatternConfig::default()
        });
        let err = recognizer.recognize(&series(candles)).unwrap_err();
        assert!(matches!(err, Error::InsufficientData { operation: "patterns", required: 3, actual: 2 }));
    }

    #[test]
    fn confirmation_families_are_narrower_than_bias() {
        let all = || PatternKind::CANDLESTICK.iter().chain(PatternKind::CHART.iter());
        let buys: Vec<_> = all().filter(|k| k.confirms(PatternBias::Bullish)).collect();
        let sells: Vec<_> = all().filter(|k| k.confirms(PatternBias::Bearish)).collect();
        assert_eq!(buys.len(), 6);
        assert_eq!(sells.len(), 5);
        for kind in buys {
            assert_eq!(kind.bias(), PatternBias::Bullish, "{kind}");
        }
        for kind in sells {
            assert_eq!(kind.bias(), PatternBias::Bearish, "{kind}");
        }
        assert!(!PatternKind::MorningStar.confirms(PatternBias::Bullish));
        assert!(!PatternKind::BullishFlag.confirms(PatternBias::Bullish));
        assert!(!PatternKind::HeadAndShoulders.confirms(PatternBias::Bearish));
        assert!(!PatternKind::ShootingStar.confirms(PatternBias::Bearish));
        assert!(!PatternKind::Doji.confirms(PatternBias::Neutral));
    }

    #[test]
    fn recognition_is_deterministic() {
        let candles = chart::tests::from_anchors(&[(0, 100.0), (6, 108.0), (10, 104.0), (16, 114.0), (22, 104.2), (28, 108.3), (34, 100.0)]);
        let data = series(candles);
        let recognizer = PatternRecognizer::default();
        assert_eq!(recognizer.recognize(&data).unwrap(), recognizer.recognize(&data).unwrap());
    }
}
