use std::fmt;

use serde::Serialize;

use analysis::{IndicatorSnapshot, PatternBias, PatternKind};

/// Typed observation derived from indicators or a matched pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubSignal {
    RsiOverbought,
    RsiOversold,
    /// MACD above its signal line, with the histogram turning positive on this bar.
    MacdBullishCross,
    MacdBullish,
    MacdBearishCross,
    MacdBearish,
    StochasticOverbought,
    StochasticOversold,
    StochasticBullishCross,
    StochasticBearishCross,
    BollingerUpperBreach,
    BollingerLowerBreach,
    Pattern(PatternKind),
}

pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;
pub const STOCHASTIC_OVERBOUGHT: f64 = 80.0;
pub const STOCHASTIC_OVERSOLD: f64 = 20.0;

impl SubSignal {
    pub fn bias(&self) -> PatternBias {
        match self {
            SubSignal::RsiOversold
            | SubSignal::MacdBullishCross
            | SubSignal::MacdBullish
            | SubSignal::StochasticOversold
            | SubSignal::StochasticBullishCross
            | SubSignal::BollingerLowerBreach => PatternBias::Bullish,
            SubSignal::RsiOverbought
            | SubSignal::MacdBearishCross
            | SubSignal::MacdBearish
            | SubSignal::StochasticOverbought
            | SubSignal::StochasticBearishCross
            | SubSignal::BollingerUpperBreach => PatternBias::Bearish,
            SubSignal::Pattern(kind) => kind.bias(),
        }
    }

    pub fn is_indicator(&self) -> bool {
        !matches!(self, SubSignal::Pattern(_))
    }

    /// Derive sub-signals from the latest indicator readings and matched patterns.
    ///
    /// Indicator tags come first in a fixed order, then one tag per
    /// directional pattern in detection order.
    pub fn derive(snapshot: &IndicatorSnapshot, patterns: &[PatternKind]) -> Vec<SubSignal> {
        let mut out = Vec::new();

        let rsi = snapshot.rsi.current;
        if rsi > RSI_OVERBOUGHT {
            out.push(SubSignal::RsiOverbought);
        } else if rsi < RSI_OVERSOLD {
            out.push(SubSignal::RsiOversold);
        }

        let macd = snapshot.macd.current;
        let prev_hist = snapshot.macd.previous().map(|m| m.histogram);
        if macd.line > macd.signal && macd.histogram > 0.0 {
            out.push(if prev_hist.is_some_and(|h| h < 0.0) {
                SubSignal::MacdBullishCross
            } else {
                SubSignal::MacdBullish
            });
        } else if macd.line < macd.signal && macd.histogram < 0.0 {
            out.push(if prev_hist.is_some_and(|h| h > 0.0) {
                SubSignal::MacdBearishCross
            } else {
                SubSignal::MacdBearish
            });
        }

        let stoch = snapshot.stochastic.current;
        if stoch.k < STOCHASTIC_OVERSOLD && stoch.d < STOCHASTIC_OVERSOLD {
            out.push(SubSignal::StochasticOversold);
        } else if stoch.k > STOCHASTIC_OVERBOUGHT && stoch.d > STOCHASTIC_OVERBOUGHT {
            out.push(SubSignal::StochasticOverbought);
        }
        if let Some(prev) = snapshot.stochastic.previous() {
            if stoch.k > stoch.d && prev.k < prev.d {
                out.push(SubSignal::StochasticBullishCross);
            } else if stoch.k < stoch.d && prev.k > prev.d {
                out.push(SubSignal::StochasticBearishCross);
            }
        }

        let bands = snapshot.bollinger.current;
        if snapshot.close > bands.upper {
            out.push(SubSignal::BollingerUpperBreach);
        } else if snapshot.close < bands.lower {
            out.push(SubSignal::BollingerLowerBreach);
        }

        out.extend(
            patterns
                .iter()
                .filter(|kind| kind.bias() != PatternBias::Neutral)
                .map(|&kind| SubSignal::Pattern(kind)),
        );
        out
    }
}

impl fmt::Display for SubSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubSignal::RsiOverbought => f.write_str("RSI overbought"),
            SubSignal::RsiOversold => f.write_str("RSI oversold"),
            SubSignal::MacdBullishCross => f.write_str("Fresh bullish MACD crossover"),
            SubSignal::MacdBullish => f.write_str("Bullish MACD crossover"),
            SubSignal::MacdBearishCross => f.write_str("Fresh bearish MACD crossover"),
            SubSignal::MacdBearish => f.write_str("Bearish MACD crossover"),
            SubSignal::StochasticOverbought => f.write_str("Stochastic overbought"),
            SubSignal::StochasticOversold => f.write_str("Stochastic oversold"),
            SubSignal::StochasticBullishCross => f.write_str("Bullish Stochastic crossover"),
            SubSignal::StochasticBearishCross => f.write_str("Bearish Stochastic crossover"),
            SubSignal::BollingerUpperBreach => f.write_str("Price above the upper Bollinger band"),
            SubSignal::BollingerLowerBreach => f.write_str("Price below the lower Bollinger band"),
            SubSignal::Pattern(kind) => match kind.bias() {
                PatternBias::Bullish => write!(f, "Bullish signal from {kind}"),
                PatternBias::Bearish => write!(f, "Bearish signal from {kind}"),
                PatternBias::Neutral => write!(f, "{kind}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis::indicators::{BandValue, MacdValue, StochasticValue};
    use analysis::{IndicatorEngine, IndicatorReading};
    use chrono::{Duration, TimeZone, Utc};
    use common::{Candle, CandleSeries};

    fn neutral_snapshot() -> IndicatorSnapshot {
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let candles = (0..30)
            .map(|i| {
                let c = 100.0 + (i % 2) as f64 * 0.5;
                Candle::new(start + Duration::hours(i), c, c + 0.5, c - 0.5, c, 1.0)
            })
            .collect();
        let mut snapshot = IndicatorEngine::default().compute(&CandleSeries::new(candles).unwrap());
        snapshot.close = 100.0;
        snapshot.rsi.set_current(50.0);
        snapshot.macd = reading(MacdValue::default());
        snapshot.stochastic = reading(StochasticValue { k: 50.0, d: 50.0 });
        snapshot.bollinger = reading(BandValue {
            upper: 105.0,
            middle: 100.0,
            lower: 95.0,
        });
        snapshot
    }

    fn reading<T: Copy>(value: T) -> IndicatorReading<T> {
        IndicatorReading {
            series: vec![value; 30],
            current: value,
            valid: true,
        }
    }

    #[test]
    fn neutral_readings_produce_nothing() {
        assert!(SubSignal::derive(&neutral_snapshot(), &[]).is_empty());
    }

    #[test]
    fn oversold_readings_are_bullish() {
        let mut snapshot = neutral_snapshot();
        snapshot.rsi.set_current(25.0);
        snapshot.stochastic.set_current(StochasticValue { k: 12.0, d: 15.0 });
        snapshot.close = 94.0;

        let signals = SubSignal::derive(&snapshot, &[]);
        assert_eq!(
            signals,
            vec![
                SubSignal::RsiOversold,
                SubSignal::StochasticOversold,
                SubSignal::BollingerLowerBreach
            ]
        );
        assert!(signals.iter().all(|s| s.bias() == PatternBias::Bullish));
    }

    #[test]
    fn macd_cross_is_fresh_only_after_opposite_histogram() {
        let mut snapshot = neutral_snapshot();
        let n = snapshot.macd.series.len();
        snapshot.macd.series[n - 2].histogram = -0.2;
        snapshot.macd.set_current(MacdValue {
            line: 0.5,
            signal: 0.3,
            histogram: 0.2,
        });
        assert_eq!(SubSignal::derive(&snapshot, &[]), vec![SubSignal::MacdBullishCross]);

        snapshot.macd.series[n - 2].histogram = 0.1;
        assert_eq!(SubSignal::derive(&snapshot, &[]), vec![SubSignal::MacdBullish]);

        snapshot.macd.set_current(MacdValue {
            line: -0.5,
            signal: -0.3,
            histogram: -0.2,
        });
        assert_eq!(SubSignal::derive(&snapshot, &[]), vec![SubSignal::MacdBearishCross]);
    }

    #[test]
    fn stochastic_crossover_uses_previous_bar() {
        let mut snapshot = neutral_snapshot();
        let n = snapshot.stochastic.series.len();
        snapshot.stochastic.series[n - 2] = StochasticValue { k: 40.0, d: 45.0 };
        snapshot.stochastic.set_current(StochasticValue { k: 55.0, d: 50.0 });
        assert_eq!(
            SubSignal::derive(&snapshot, &[]),
            vec![SubSignal::StochasticBullishCross]
        );
    }

    #[test]
    fn only_directional_patterns_become_tags() {
        let signals = SubSignal::derive(
            &neutral_snapshot(),
            &[PatternKind::Doji, PatternKind::Hammer, PatternKind::DoubleTop],
        );
        assert_eq!(
            signals,
            vec![
                SubSignal::Pattern(PatternKind::Hammer),
                SubSignal::Pattern(PatternKind::DoubleTop)
            ]
        );
        assert!(!signals[0].is_indicator());
        assert_eq!(signals[1].bias(), PatternBias::Bearish);
        assert_eq!(signals[0].to_string(), "Bullish signal from Hammer");
    }
}
