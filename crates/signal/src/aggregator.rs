use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use analysis::{PatternKind, TechnicalAnalysis, TrendDirection, TrendQualifier};
use common::Timeframe;

use crate::confidence;
use crate::format::{format_price, price_decimals};
use crate::narrative::{analysis_text, indicator_summary};
use crate::subsignals::SubSignal;
use crate::{Decision, NoSignalReason, Signal, SignalConfig, SignalDirection};

const STOP_FALLBACK: f64 = 0.03;
const TARGET1_FALLBACK: f64 = 0.02;
const TARGET2_FALLBACK: f64 = 0.03;
const SECOND_TARGET_EXTENSION: f64 = 0.04;

/// Merges trend, levels, patterns and sub-signals into a `Decision`.
#[derive(Debug, Clone, Default)]
pub struct SignalAggregator {
    config: SignalConfig,
}

impl SignalAggregator {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    pub fn aggregate(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        current_price: f64,
        analysis: &TechnicalAnalysis,
        generated_at: DateTime<Utc>,
    ) -> Decision {
        let patterns = analysis.patterns.matches();
        let direction = match decide_direction(analysis, &patterns) {
            Ok(direction) => direction,
            Err(reason) => {
                debug!(symbol, %timeframe, trend = %analysis.trend, ?reason, "No signal");
                return Decision::NoSignal(reason);
            }
        };

        let sub_signals = SubSignal::derive(&analysis.indicators, &patterns);
        let score = confidence::score(direction, analysis.trend.strength, &sub_signals, &patterns);
        if score.value < self.config.min_confidence {
            debug!(
                symbol,
                %timeframe,
                confidence = score.value,
                minimum = self.config.min_confidence,
                "Confidence below minimum"
            );
            return Decision::NoSignal(NoSignalReason::LowConfidence {
                confidence: score.value,
                minimum: self.config.min_confidence,
            });
        }

        let entry = format_price(current_price);
        let (stop_loss, target1, target2) = price_plan(direction, current_price, analysis);

        let signal = Signal {
            id: Uuid::new_v4().to_string(),
            symbol: symbol.to_string(),
            timeframe,
            direction,
            trend: analysis.trend,
            entry,
            stop_loss,
            target1,
            target2,
            confidence: score.value as u8,
            indicator_summary: indicator_summary(&analysis.indicators),
            patterns,
            analysis_text: analysis_text(symbol, timeframe, analysis, &sub_signals),
            sub_signals,
            generated_at,
        };

        info!(
            symbol,
            %timeframe,
            direction = %signal.direction,
            confidence = signal.confidence,
            confirming = score.confirming,
            opposing = score.opposing,
            entry = signal.entry,
            "Signal generated"
        );
        Decision::Emit(signal)
    }
}

fn decide_direction(
    analysis: &TechnicalAnalysis,
    patterns: &[PatternKind],
) -> Result<SignalDirection, NoSignalReason> {
    let trend = &analysis.trend;
    let direction = match trend.direction {
        TrendDirection::Bullish => SignalDirection::Buy,
        TrendDirection::Bearish => SignalDirection::Sell,
        TrendDirection::Choppy => return Err(NoSignalReason::TrendNotActionable),
    };
    match trend.qualifier {
        TrendQualifier::Strong => Ok(direction),
        TrendQualifier::Moderate => {
            if patterns.iter().any(|k| k.confirms(direction.bias())) {
                Ok(direction)
            } else {
                Err(NoSignalReason::NoConfirmingPattern)
            }
        }
        TrendQualifier::Weak => Err(NoSignalReason::TrendNotActionable),
    }
}

/// Stop-loss and the two targets, already formatted.
fn price_plan(direction: SignalDirection, price: f64, analysis: &TechnicalAnalysis) -> (f64, f64, f64) {
    let levels = &analysis.levels;
    let entry = format_price(price);
    match direction {
        SignalDirection::Buy => {
            let stop = levels
                .support
                .iter()
                .copied()
                .filter(|&s| s < price)
                .min_by(f64::total_cmp)
                .map(format_price)
                .filter(|&s| s < entry)
                .unwrap_or_else(|| format_price(price * (1.0 - STOP_FALLBACK)));
            let stop = if stop < entry { stop } else { ticks_from(entry, -1.0) };

            let mut targets: Vec<f64> = levels.resistance.iter().copied().filter(|&r| r > price).collect();
            targets.sort_by(f64::total_cmp);
            let (t1, t2) = match targets.as_slice() {
                [] => (price * (1.0 + TARGET1_FALLBACK), price * (1.0 + TARGET2_FALLBACK)),
                [only] => (*only, only.max(price * (1.0 + SECOND_TARGET_EXTENSION))),
                [first, second, ..] => (*first, *second),
            };
            (stop, format_price(t1), format_price(t2))
        }
        SignalDirection::Sell => {
            let stop = levels
                .resistance
                .iter()
                .copied()
                .filter(|&r| r > price)
                .max_by(f64::total_cmp)
                .map(format_price)
                .filter(|&r| r > entry)
                .unwrap_or_else(|| format_price(price * (1.0 + STOP_FALLBACK)));
            let stop = if stop > entry { stop } else { ticks_from(entry, 1.0) };

            let mut targets: Vec<f64> = levels.support.iter().copied().filter(|&s| s < price).collect();
            targets.sort_by(|a, b| b.total_cmp(a));
            let (t1, t2) = match targets.as_slice() {
                [] => (price * (1.0 - TARGET1_FALLBACK), price * (1.0 - TARGET2_FALLBACK)),
                [only] => (*only, only.min(price * (1.0 - SECOND_TARGET_EXTENSION))),
                [first, second, ..] => (*first, *second),
            };
            (stop, format_price(t1), format_price(t2))
        }
    }
}

/// `entry` moved by whole ticks of its own display precision.
///
/// At small prices the percentage fallback rounds onto the entry itself.
fn ticks_from(entry: f64, ticks: f64) -> f64 {
    let scale = 10f64.powi(price_decimals(entry) as i32);
    ((entry * scale).round() + ticks) / scale
}
