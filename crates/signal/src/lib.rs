pub mod aggregator;
pub mod cache;
pub mod confidence;
pub mod format;
pub mod generator;
pub mod narrative;
pub mod subsignals;

pub use aggregator::SignalAggregator;
pub use cache::SignalCache;
pub use format::format_price;
pub use generator::SignalGenerator;
pub use subsignals::SubSignal;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use analysis::{PatternKind, SignalSection, TrendAssessment};
use common::Timeframe;

pub const DEFAULT_MIN_CONFIDENCE: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalConfig {
    /// Signals scoring below this are withheld.
    pub min_confidence: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

impl SignalConfig {
    /// Apply the `[signal]` table of an analysis file on top of this config.
    pub fn with_overrides(mut self, section: &SignalSection) -> Self {
        if let Some(min_confidence) = section.min_confidence {
            self.min_confidence = min_confidence;
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalDirection {
    Buy,
    Sell,
}

impl SignalDirection {
    pub fn opposite(&self) -> Self {
        match self {
            SignalDirection::Buy => SignalDirection::Sell,
            SignalDirection::Sell => SignalDirection::Buy,
        }
    }
}

impl fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalDirection::Buy => write!(f, "BUY"),
            SignalDirection::Sell => write!(f, "SELL"),
        }
    }
}

/// A scored trade recommendation. Built only by `SignalAggregator`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    /// Unique per generation; a refreshed signal gets a new id.
    pub id: String,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub direction: SignalDirection,
    pub trend: TrendAssessment,
    pub entry: f64,
    pub stop_loss: f64,
    pub target1: f64,
    pub target2: f64,
    /// 0..=98
    pub confidence: u8,
    pub indicator_summary: String,
    pub patterns: Vec<PatternKind>,
    pub sub_signals: Vec<SubSignal>,
    pub analysis_text: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum NoSignalReason {
    /// Choppy or weak trend.
    TrendNotActionable,
    /// Moderate trend without a pattern in the same direction.
    NoConfirmingPattern,
    LowConfidence { confidence: f64, minimum: f64 },
}

/// Outcome of aggregation: a signal or a documented absence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision", content = "detail", rename_all = "snake_case")]
pub enum Decision {
    Emit(Signal),
    NoSignal(NoSignalReason),
}

impl Decision {
    pub fn signal(&self) -> Option<&Signal> {
        match self {
            Decision::Emit(signal) => Some(signal),
            Decision::NoSignal(_) => None,
        }
    }

    pub fn into_signal(self) -> Option<Signal> {
        match self {
            Decision::Emit(signal) => Some(signal),
            Decision::NoSignal(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&NoSignalReason> {
        match self {
            Decision::Emit(_) => None,
            Decision::NoSignal(reason) => Some(reason),
        }
    }
}
