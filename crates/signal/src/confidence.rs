use serde::Serialize;

use analysis::{PatternBias, PatternKind};

use crate::subsignals::SubSignal;
use crate::SignalDirection;

pub const BASE_CONFIDENCE: f64 = 50.0;
pub const TREND_WEIGHT: f64 = 20.0;
pub const CONFIRMING_POINTS: f64 = 5.0;
pub const CONFIRMING_CAP: f64 = 20.0;
pub const OPPOSING_POINTS: f64 = 3.0;
pub const OPPOSING_CAP: f64 = 15.0;
pub const PATTERN_POINTS: f64 = 5.0;
pub const PATTERN_CAP: f64 = 15.0;
pub const MAX_CONFIDENCE: f64 = 98.0;

/// Components of a confidence score, kept for logging and inspection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceScore {
    pub confirming: usize,
    pub opposing: usize,
    pub confirming_patterns: usize,
    /// Final score clamped to [0, 98].
    pub value: f64,
}

/// Score a directional decision.
///
/// Only indicator sub-signals count toward the confirming and opposing
/// buckets; patterns have their own bucket, filled by the kinds that
/// `PatternKind::confirms` the direction.
pub fn score(
    direction: SignalDirection,
    strength: f64,
    sub_signals: &[SubSignal],
    patterns: &[PatternKind],
) -> ConfidenceScore {
    let favoured = direction.bias();
    let opposed = direction.opposite().bias();

    let indicator_biases = sub_signals
        .iter()
        .filter(|s| s.is_indicator())
        .map(SubSignal::bias);
    let confirming = indicator_biases.clone().filter(|&b| b == favoured).count();
    let opposing = indicator_biases.filter(|&b| b == opposed).count();
    let confirming_patterns = patterns.iter().filter(|k| k.confirms(favoured)).count();

    let value = BASE_CONFIDENCE + strength * TREND_WEIGHT
        + (confirming as f64 * CONFIRMING_POINTS).min(CONFIRMING_CAP)
        - (opposing as f64 * OPPOSING_POINTS).min(OPPOSING_CAP)
        + (confirming_patterns as f64 * PATTERN_POINTS).min(PATTERN_CAP);

    ConfidenceScore {
        confirming,
        opposing,
        confirming_patterns,
        value: value.clamp(0.0, MAX_CONFIDENCE),
    }
}

impl SignalDirection {
    pub fn bias(&self) -> PatternBias {
        match self {
            SignalDirection::Buy => PatternBias::Bullish,
            SignalDirection::Sell => PatternBias::Bearish,
        }
    }
}
