use analysis::{IndicatorEngine, LevelFinder, PatternOutcome, PatternRecognizer, TechnicalAnalyzer};
use chrono::{Duration, TimeZone, Utc};
use common::{Candle, CandleSeries};
use proptest::prelude::*;

/// Random walk candles built from (close change, wick) pairs.
fn build_series(start_price: f64, steps: &[(f64, f64, f64)]) -> CandleSeries {
    let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let mut close = start_price;
    let candles = steps
        .iter()
        .enumerate()
        .map(|(i, &(change, upper, lower))| {
            let open = close;
            close = (close * (1.0 + change)).max(0.01);
            let high = open.max(close) * (1.0 + upper);
            let low = open.min(close) * (1.0 - lower);
            Candle::new(start + Duration::minutes(15 * i as i64), open, high, low, close, 1.0)
        })
        .collect();
    CandleSeries::new(candles).unwrap()
}

fn steps(min: usize, max: usize) -> impl Strategy<Value = Vec<(f64, f64, f64)>> {
    prop::collection::vec((-0.03f64..0.03, 0.0f64..0.01, 0.0f64..0.01), min..max)
}

proptest! {
    /// Pattern recognition is a pure function of the candles.
    #[test]
    fn pattern_detection_is_pure(price in 1.0f64..50_000.0, steps in steps(5, 120)) {
        let series = build_series(price, &steps);
        let recognizer = PatternRecognizer::default();
        let first = recognizer.recognize(&series).unwrap();
        let second = recognizer.recognize(&series).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Chart detectors are unsupported exactly when the series is shorter than 20.
    #[test]
    fn unsupported_only_below_chart_minimum(price in 1.0f64..500.0, steps in steps(5, 40)) {
        let series = build_series(price, &steps);
        let report = PatternRecognizer::default().recognize(&series).unwrap();
        let unsupported = report
            .evaluations
            .iter()
            .filter(|e| e.outcome == PatternOutcome::Unsupported)
            .count();
        if series.len() < 20 {
            prop_assert_eq!(unsupported, 14);
        } else {
            prop_assert_eq!(unsupported, 0);
        }
    }

    /// Resistance strictly above and support strictly below the last close,
    /// at most three each, nearest first.
    #[test]
    fn levels_partition_around_close(price in 0.001f64..100_000.0, steps in steps(20, 150)) {
        let series = build_series(price, &steps);
        let close = series.last().unwrap().close;
        let levels = LevelFinder::default().find(&series).unwrap();

        prop_assert!(levels.support.len() <= 3);
        prop_assert!(levels.resistance.len() <= 3);
        prop_assert!(levels.support.iter().all(|&s| s < close));
        prop_assert!(levels.resistance.iter().all(|&r| r > close));
        prop_assert!(levels.support.windows(2).all(|w| w[0] > w[1]));
        prop_assert!(levels.resistance.windows(2).all(|w| w[0] < w[1]));
    }

    /// Indicator series never contain NaN and stay aligned with the input.
    #[test]
    fn indicators_are_finite_and_aligned(price in 0.01f64..10_000.0, steps in steps(1, 260)) {
        let series = build_series(price, &steps);
        let snapshot = IndicatorEngine::default().compute(&series);
        let n = series.len();

        prop_assert_eq!(snapshot.rsi.series.len(), n);
        prop_assert_eq!(snapshot.adx.series.len(), n);
        prop_assert!(snapshot.rsi.series.iter().all(|v| v.is_finite() && (0.0..=100.0).contains(v)));
        prop_assert!(snapshot.adx.series.iter().all(|v| v.is_finite()));
        prop_assert!(snapshot.macd.series.iter().all(|m| m.histogram.is_finite()));
        prop_assert!(snapshot.bollinger.series.iter().all(|b| b.upper >= b.lower));
    }

    /// Trend strength stays in [0, 1] and its score in [-1, 1].
    #[test]
    fn trend_strength_is_bounded(price in 0.01f64..10_000.0, steps in steps(20, 120)) {
        let series = build_series(price, &steps);
        let analysis = TechnicalAnalyzer::default().analyze(&series).unwrap();
        prop_assert!((0.0..=1.0).contains(&analysis.trend.strength));
        prop_assert!((-1.0..=1.0).contains(&analysis.trend.score));
    }

    /// Anything shorter than the analysis minimum is reported as insufficient data.
    #[test]
    fn short_series_never_analyzed(price in 1.0f64..1_000.0, steps in steps(1, 20)) {
        let series = build_series(price, &steps);
        let err = TechnicalAnalyzer::default().analyze(&series).unwrap_err();
        prop_assert!(err.is_insufficient_data());
    }
}
