pub mod adx;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stochastic;

pub use adx::AdxIndicator;
pub use bollinger::{BandPoint, BollingerIndicator};
pub use ema::EmaIndicator;
pub use macd::{MacdCross, MacdIndicator, MacdPoint};
pub use rsi::RsiIndicator;
pub use sma::SmaIndicator;
pub use stochastic::{StochasticIndicator, StochasticPoint};

use common::{Candle, CandleSeries};
use serde::Serialize;
use tracing::debug;

/// Neutral values substituted when an indicator cannot be computed.
pub const NEUTRAL_RSI: f64 = 50.0;
pub const NEUTRAL_STOCHASTIC: f64 = 50.0;
pub const NEUTRAL_ADX: f64 = 25.0;
/// Fallback Bollinger half-width as a fraction of the close.
pub const FALLBACK_BAND_WIDTH: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorName {
    Sma20,
    Sma50,
    Sma200,
    Ema20,
    Ema50,
    Ema200,
    Rsi,
    Macd,
    Stochastic,
    Bollinger,
    Adx,
}

/// One indicator's output aligned 1:1 with the candle series.
///
/// Undefined entries (warm-up, NaN, degenerate windows) are already replaced
/// with the indicator's neutral default. `valid` is false when `current` is
/// such a substitution rather than a computed value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorReading<T> {
    pub series: Vec<T>,
    pub current: T,
    pub valid: bool,
}

impl<T: Copy> IndicatorReading<T> {
    /// The value one bar before `current`.
    pub fn previous(&self) -> Option<T> {
        let len = self.series.len();
        (len >= 2).then(|| self.series[len - 2])
    }

    /// Override the latest value (used to feed externally sourced readings).
    pub fn set_current(&mut self, value: T) {
        self.current = value;
        if let Some(last) = self.series.last_mut() {
            *last = value;
        }
        self.valid = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MacdValue {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StochasticValue {
    pub k: f64,
    pub d: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandValue {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BandValue {
    fn fallback(close: f64) -> Self {
        Self {
            upper: close * (1.0 + FALLBACK_BAND_WIDTH),
            middle: close,
            lower: close * (1.0 - FALLBACK_BAND_WIDTH),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovingAverages {
    pub p20: IndicatorReading<f64>,
    pub p50: IndicatorReading<f64>,
    pub p200: IndicatorReading<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    /// Close of the last candle the snapshot was computed from.
    pub close: f64,
    pub sma: MovingAverages,
    pub ema: MovingAverages,
    pub rsi: IndicatorReading<f64>,
    pub macd: IndicatorReading<MacdValue>,
    pub stochastic: IndicatorReading<StochasticValue>,
    pub bollinger: IndicatorReading<BandValue>,
    pub adx: IndicatorReading<f64>,
}

impl IndicatorSnapshot {
    /// Indicators whose current value is a neutral-default substitution.
    pub fn degraded(&self) -> Vec<IndicatorName> {
        [
            (IndicatorName::Sma20, self.sma.p20.valid),
            (IndicatorName::Sma50, self.sma.p50.valid),
            (IndicatorName::Sma200, self.sma.p200.valid),
            (IndicatorName::Ema20, self.ema.p20.valid),
            (IndicatorName::Ema50, self.ema.p50.valid),
            (IndicatorName::Ema200, self.ema.p200.valid),
            (IndicatorName::Rsi, self.rsi.valid),
            (IndicatorName::Macd, self.macd.valid),
            (IndicatorName::Stochastic, self.stochastic.valid),
            (IndicatorName::Bollinger, self.bollinger.valid),
            (IndicatorName::Adx, self.adx.valid),
        ]
        .into_iter()
        .filter(|(_, valid)| !valid)
        .map(|(name, _)| name)
        .collect()
    }
}

/// Computes the full indicator set over a candle series.
///
/// Never fails: short series and degenerate windows degrade to neutral
/// defaults, flagged through `IndicatorReading::valid`.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    pub ma_periods: [usize; 3],
    pub rsi: RsiIndicator,
    pub macd: MacdIndicator,
    pub stochastic: StochasticIndicator,
    pub bollinger: BollingerIndicator,
    pub adx: AdxIndicator,
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self {
            ma_periods: [20, 50, 200],
            rsi: RsiIndicator::new(14),
            macd: MacdIndicator::new(12, 26, 9),
            stochastic: StochasticIndicator::new(14, 3, 3),
            bollinger: BollingerIndicator::new(20, 2.0),
            adx: AdxIndicator::new(14),
        }
    }
}

impl IndicatorEngine {
    pub fn compute(&self, series: &CandleSeries) -> IndicatorSnapshot {
        let candles = series.candles();
        let closes = series.closes();
        let close = closes.last().copied().unwrap_or(0.0);

        let [p20, p50, p200] = self.ma_periods;
        let sma = |period| fill(finite(SmaIndicator::new(period).series(&closes)), |_| 0.0, 0.0);
        let ema = |period| fill(finite(EmaIndicator::new(period).series(&closes)), |_| 0.0, 0.0);

        let snapshot = IndicatorSnapshot {
            close,
            sma: MovingAverages {
                p20: sma(p20),
                p50: sma(p50),
                p200: sma(p200),
            },
            ema: MovingAverages {
                p20: ema(p20),
                p50: ema(p50),
                p200: ema(p200),
            },
            rsi: fill(finite(self.rsi.series(&closes)), |_| NEUTRAL_RSI, NEUTRAL_RSI),
            macd: self.macd_reading(&closes),
            stochastic: self.stochastic_reading(candles),
            bollinger: self.band_reading(&closes),
            adx: fill(finite(self.adx.series(candles)), |_| NEUTRAL_ADX, NEUTRAL_ADX),
        };

        let degraded = snapshot.degraded();
        if !degraded.is_empty() {
            debug!(
                candles = candles.len(),
                degraded = ?degraded,
                "Indicator defaults substituted"
            );
        }
        snapshot
    }

    fn macd_reading(&self, closes: &[f64]) -> IndicatorReading<MacdValue> {
        let points = self.macd.series(closes);
        let line = fill(finite(points.iter().map(|p| p.line).collect()), |_| 0.0, 0.0);
        let signal = fill(finite(points.iter().map(|p| p.signal).collect()), |_| 0.0, 0.0);
        let histogram = fill(finite(points.iter().map(|p| p.histogram).collect()), |_| 0.0, 0.0);

        let series = line
            .series
            .iter()
            .zip(&signal.series)
            .zip(&histogram.series)
            .map(|((&line, &signal), &histogram)| MacdValue {
                line,
                signal,
                histogram,
            })
            .collect();
        IndicatorReading {
            series,
            current: MacdValue {
                line: line.current,
                signal: signal.current,
                histogram: histogram.current,
            },
            valid: line.valid && signal.valid && histogram.valid,
        }
    }

    fn stochastic_reading(&self, candles: &[Candle]) -> IndicatorReading<StochasticValue> {
        let points = self.stochastic.series(candles);
        let k = fill(finite(points.iter().map(|p| p.k).collect()), |_| NEUTRAL_STOCHASTIC, NEUTRAL_STOCHASTIC);
        let d = fill(finite(points.iter().map(|p| p.d).collect()), |_| NEUTRAL_STOCHASTIC, NEUTRAL_STOCHASTIC);

        let series = k
            .series
            .iter()
            .zip(&d.series)
            .map(|(&k, &d)| StochasticValue { k, d })
            .collect();
        IndicatorReading {
            series,
            current: StochasticValue {
                k: k.current,
                d: d.current,
            },
            valid: k.valid && d.valid,
        }
    }

    fn band_reading(&self, closes: &[f64]) -> IndicatorReading<BandValue> {
        let raw = self
            .bollinger
            .series(closes)
            .into_iter()
            .map(|band| {
                band.filter(|b| b.upper.is_finite() && b.middle.is_finite() && b.lower.is_finite())
                    .map(|b| BandValue {
                        upper: b.upper,
                        middle: b.middle,
                        lower: b.lower,
                    })
            })
            .collect();
        fill(raw, |i| BandValue::fallback(closes[i]), BandValue::fallback(0.0))
    }
}

fn finite(values: Vec<Option<f64>>) -> Vec<Option<f64>> {
    values
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect()
}

/// Replace undefined entries with `fallback(index)`; `empty` is the current
/// value reported for an empty series.
fn fill<T: Copy>(raw: Vec<Option<T>>, fallback: impl Fn(usize) -> T, empty: T) -> IndicatorReading<T> {
    let valid = matches!(raw.last(), Some(Some(_)));
    let series: Vec<T> = raw
        .into_iter()
        .enumerate()
        .map(|(i, v)| v.unwrap_or_else(|| fallback(i)))
        .collect();
    let current = series.last().copied().unwrap_or(empty);
    IndicatorReading {
        series,
        current,
        valid,
    }
}
