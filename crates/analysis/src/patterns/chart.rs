use common::Candle;

use crate::config::PatternConfig;

use super::PatternKind;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Pivot {
    pub index: usize,
    pub price: f64,
}

/// Peaks and valleys of a window: bars whose high (low) strictly dominates
/// every other bar within `lookback` on both sides.
#[derive(Debug, Clone, Default)]
pub(crate) struct Pivots {
    pub peaks: Vec<Pivot>,
    pub valleys: Vec<Pivot>,
}

impl Pivots {
    pub fn find(candles: &[Candle], lookback: usize) -> Self {
        let mut pivots = Self::default();
        if candles.len() < 2 * lookback + 1 {
            return pivots;
        }
        for i in lookback..candles.len() - lookback {
            let neighbours = (i - lookback..=i + lookback).filter(|&j| j != i);
            let (high, low) = (candles[i].high, candles[i].low);
            if neighbours.clone().all(|j| candles[j].high < high) {
                pivots.peaks.push(Pivot { index: i, price: high });
            }
            if neighbours.into_iter().all(|j| candles[j].low > low) {
                pivots.valleys.push(Pivot { index: i, price: low });
            }
        }
        pivots
    }
}

/// Trendline slope between two pivots, per bar and relative to their mean price.
fn slope(a: &Pivot, b: &Pivot) -> f64 {
    let bars = b.index as f64 - a.index as f64;
    let mean = (a.price + b.price) / 2.0;
    if bars == 0.0 || mean == 0.0 {
        return 0.0;
    }
    (b.price - a.price) / bars / mean
}

fn within(a: f64, b: f64, tolerance: f64) -> bool {
    let mean = (a + b) / 2.0;
    mean != 0.0 && (a - b).abs() / mean.abs() <= tolerance
}

fn last_n<const N: usize>(points: &[Pivot]) -> Option<[Pivot; N]> {
    let start = points.len().checked_sub(N)?;
    points[start..].try_into().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slope {
    Rising,
    Flat,
    Falling,
}

/// Evaluates chart formations on the most recent pivots of a window.
pub(crate) struct ChartDetector<'a> {
    candles: &'a [Candle],
    pivots: Pivots,
    cfg: &'a PatternConfig,
}

impl<'a> ChartDetector<'a> {
    pub fn new(candles: &'a [Candle], cfg: &'a PatternConfig) -> Self {
        Self {
            candles,
            pivots: Pivots::find(candles, cfg.pivot_lookback),
            cfg,
        }
    }

    pub fn detect(&self, kind: PatternKind) -> bool {
        match kind {
            PatternKind::HeadAndShoulders => self.head_and_shoulders(true),
            PatternKind::InverseHeadAndShoulders => self.head_and_shoulders(false),
            PatternKind::DoubleTop => self.double(true),
            PatternKind::DoubleBottom => self.double(false),
            PatternKind::TripleTop => self.triple(true),
            PatternKind::TripleBottom => self.triple(false),
            PatternKind::BullishFlag => self.flag(true),
            PatternKind::BearishFlag => self.flag(false),
            PatternKind::RisingWedge
            | PatternKind::FallingWedge
            | PatternKind::AscendingTriangle
            | PatternKind::DescendingTriangle
            | PatternKind::SymmetricalTriangle
            | PatternKind::Rectangle => self.converging(kind),
            _ => false,
        }
    }

    /// Three pivots with a dominant middle one, similar shoulders and two
    /// opposite pivots (the neckline) between the shoulders.
    fn head_and_shoulders(&self, top: bool) -> bool {
        let (heads, neck) = self.sides(top);
        let Some([left, head, right]) = last_n::<3>(heads) else {
            return false;
        };
        let dominates = |shoulder: &Pivot| {
            if top {
                head.price > shoulder.price
            } else {
                head.price < shoulder.price
            }
        };
        let neckline = neck
            .iter()
            .filter(|p| p.index > left.index && p.index < right.index)
            .count();
        dominates(&left)
            && dominates(&right)
            && within(left.price, right.price, self.cfg.price_tolerance)
            && neckline >= 2
    }

    /// Two similar extremes separated by a retracement deeper than the tolerance.
    fn double(&self, top: bool) -> bool {
        let (extremes, opposite) = self.sides(top);
        let Some([first, second]) = last_n::<2>(extremes) else {
            return false;
        };
        if !within(first.price, second.price, self.cfg.price_tolerance) {
            return false;
        }
        let level = (first.price + second.price) / 2.0;
        opposite
            .iter()
            .filter(|p| p.index > first.index && p.index < second.index)
            .any(|p| (p.price - level).abs() / level > self.cfg.price_tolerance)
    }

    fn triple(&self, top: bool) -> bool {
        let (extremes, opposite) = self.sides(top);
        let Some([a, b, c]) = last_n::<3>(extremes) else {
            return false;
        };
        let tol = self.cfg.price_tolerance;
        let separated = |from: &Pivot, to: &Pivot| {
            opposite
                .iter()
                .any(|p| p.index > from.index && p.index < to.index)
        };
        within(a.price, b.price, tol)
            && within(b.price, c.price, tol)
            && within(a.price, c.price, tol)
            && separated(&a, &b)
            && separated(&b, &c)
    }

    /// Triangles, wedges and rectangles from the upper (peaks) and lower
    /// (valleys) trendlines through the last two pivots of each.
    fn converging(&self, kind: PatternKind) -> bool {
        let (Some([p1, p2]), Some([v1, v2])) = (
            last_n::<2>(&self.pivots.peaks),
            last_n::<2>(&self.pivots.valleys),
        ) else {
            return false;
        };
        let upper_slope = slope(&p1, &p2);
        let lower_slope = slope(&v1, &v2);
        let upper = self.classify(upper_slope);
        let lower = self.classify(lower_slope);

        match kind {
            PatternKind::AscendingTriangle => upper == Slope::Flat && lower == Slope::Rising,
            PatternKind::DescendingTriangle => upper == Slope::Falling && lower == Slope::Flat,
            PatternKind::SymmetricalTriangle => upper == Slope::Falling && lower == Slope::Rising,
            PatternKind::Rectangle => {
                upper == Slope::Flat && lower == Slope::Flat && p1.price > v1.price
            }
            PatternKind::RisingWedge => {
                upper == Slope::Rising && lower == Slope::Rising && lower_slope > upper_slope
            }
            PatternKind::FallingWedge => {
                upper == Slope::Falling && lower == Slope::Falling && upper_slope < lower_slope
            }
            _ => false,
        }
    }

    /// A pole of at least `flag_pole_move` into a counter-trend parallel channel.
    fn flag(&self, bullish: bool) -> bool {
        let (Some([p1, p2]), Some([v1, v2])) = (
            last_n::<2>(&self.pivots.peaks),
            last_n::<2>(&self.pivots.valleys),
        ) else {
            return false;
        };
        let upper_slope = slope(&p1, &p2);
        let lower_slope = slope(&v1, &v2);
        let channel = if bullish { Slope::Falling } else { Slope::Rising };
        if self.classify(upper_slope) != channel
            || self.classify(lower_slope) != channel
            || (upper_slope - lower_slope).abs() > self.cfg.flat_slope
        {
            return false;
        }

        let start = p1.index.min(v1.index);
        let closes: Vec<f64> = self.candles[..=start].iter().map(|c| c.close).collect();
        let pole_end = closes
            .iter()
            .enumerate()
            .max_by(|a, b| {
                if bullish {
                    a.1.total_cmp(b.1)
                } else {
                    b.1.total_cmp(a.1)
                }
            })
            .map(|(i, _)| i);
        let Some(pole_end) = pole_end else {
            return false;
        };
        let pole_start = pole_end.saturating_sub(10);
        let base = closes[pole_start..=pole_end].iter().copied().fold(
            if bullish { f64::INFINITY } else { f64::NEG_INFINITY },
            |acc, c| if bullish { acc.min(c) } else { acc.max(c) },
        );
        if base <= 0.0 {
            return false;
        }
        let pole_move = (closes[pole_end] - base) / base;
        if bullish {
            pole_move >= self.cfg.flag_pole_move
        } else {
            -pole_move >= self.cfg.flag_pole_move
        }
    }

    /// (extremes, opposite pivots): peaks/valleys for tops, valleys/peaks for bottoms.
    fn sides(&self, top: bool) -> (&[Pivot], &[Pivot]) {
        if top {
            (&self.pivots.peaks, &self.pivots.valleys)
        } else {
            (&self.pivots.valleys, &self.pivots.peaks)
        }
    }

    fn classify(&self, slope: f64) -> Slope {
        if slope > self.cfg.flat_slope {
            Slope::Rising
        } else if slope < -self.cfg.flat_slope {
            Slope::Falling
        } else {
            Slope::Flat
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    /// Candles whose closes interpolate linearly between `(index, close)` anchors.
    pub(crate) fn from_anchors(anchors: &[(usize, f64)]) -> Vec<Candle> {
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut closes = Vec::new();
        for pair in anchors.windows(2) {
            let ((i0, c0), (i1, c1)) = (pair[0], pair[1]);
            for i in i0..i1 {
                closes.push(c0 + (c1 - c0) * (i - i0) as f64 / (i1 - i0) as f64);
            }
        }
        if let Some(&(_, last)) = anchors.last() {
            closes.push(last);
        }
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle::new(start + Duration::hours(i as i64), c, c + 0.1, c - 0.1, c, 1.0))
            .collect()
    }

    fn detects(anchors: &[(usize, f64)], kind: PatternKind) -> bool {
        let candles = from_anchors(anchors);
        let cfg = PatternConfig::default();
        ChartDetector::new(&candles, &cfg).detect(kind)
    }

    const DOUBLE_TOP: &[(usize, f64)] = &[(0, 100.0), (10, 110.0), (15, 104.0), (20, 110.5), (28, 102.0)];
    const HEAD_AND_SHOULDERS: &[(usize, f64)] = &[
        (0, 100.0),
        (6, 108.0),
        (10, 104.0),
        (16, 114.0),
        (22, 104.2),
        (28, 108.3),
        (34, 100.0),
    ];
    const ASCENDING_TRIANGLE: &[(usize, f64)] = &[
        (0, 100.0),
        (5, 110.0),
        (10, 102.0),
        (15, 110.0),
        (20, 105.0),
        (25, 110.05),
        (30, 107.0),
        (33, 108.0),
    ];
    const BULL_FLAG: &[(usize, f64)] = &[
        (0, 100.0),
        (10, 112.0),
        (13, 110.0),
        (16, 111.5),
        (19, 109.0),
        (22, 110.5),
        (25, 108.0),
        (28, 109.5),
        (30, 109.0),
    ];

    #[test]
    fn pivots_are_strict_local_extremes() {
        let candles = from_anchors(DOUBLE_TOP);
        let pivots = Pivots::find(&candles, 2);
        let peaks: Vec<usize> = pivots.peaks.iter().map(|p| p.index).collect();
        let valleys: Vec<usize> = pivots.valleys.iter().map(|p| p.index).collect();
        assert_eq!(peaks, vec![10, 20]);
        assert_eq!(valleys, vec![15]);
    }

    #[test]
    fn pivots_on_short_input_are_empty() {
        let candles = from_anchors(&[(0, 1.0), (3, 2.0)]);
        let pivots = Pivots::find(&candles, 2);
        assert!(pivots.peaks.is_empty() && pivots.valleys.is_empty());
    }

    #[test]
    fn double_top_detected() {
        assert!(detects(DOUBLE_TOP, PatternKind::DoubleTop));
        assert!(!detects(DOUBLE_TOP, PatternKind::DoubleBottom));
        assert!(!detects(DOUBLE_TOP, PatternKind::HeadAndShoulders));
    }

    #[test]
    fn head_and_shoulders_detected() {
        assert!(detects(HEAD_AND_SHOULDERS, PatternKind::HeadAndShoulders));
        assert!(!detects(HEAD_AND_SHOULDERS, PatternKind::InverseHeadAndShoulders));
        assert!(!detects(HEAD_AND_SHOULDERS, PatternKind::DoubleTop));
    }

    #[test]
    fn inverse_head_and_shoulders_detected() {
        let mirrored: Vec<(usize, f64)> = HEAD_AND_SHOULDERS
            .iter()
            .map(|&(i, c)| (i, 220.0 - c))
            .collect();
        assert!(detects(&mirrored, PatternKind::InverseHeadAndShoulders));
        assert!(!detects(&mirrored, PatternKind::HeadAndShoulders));
    }

    #[test]
    fn ascending_triangle_detected() {
        assert!(detects(ASCENDING_TRIANGLE, PatternKind::AscendingTriangle));
        assert!(!detects(ASCENDING_TRIANGLE, PatternKind::DescendingTriangle));
        assert!(!detects(ASCENDING_TRIANGLE, PatternKind::SymmetricalTriangle));
        assert!(!detects(ASCENDING_TRIANGLE, PatternKind::RisingWedge));
    }

    #[test]
    fn bullish_flag_detected() {
        assert!(detects(BULL_FLAG, PatternKind::BullishFlag));
        assert!(!detects(BULL_FLAG, PatternKind::BearishFlag));
        assert!(!detects(BULL_FLAG, PatternKind::FallingWedge));
        assert!(!detects(BULL_FLAG, PatternKind::Rectangle));
    }

    #[test]
    fn bearish_flag_is_the_mirror() {
        let mirrored: Vec<(usize, f64)> = BULL_FLAG.iter().map(|&(i, c)| (i, 220.0 - c)).collect();
        assert!(detects(&mirrored, PatternKind::BearishFlag));
        assert!(!detects(&mirrored, PatternKind::BullishFlag));
    }

    #[test]
    fn slope_is_relative_to_price() {
        let a = Pivot { index: 0, price: 100.0 };
        let b = Pivot { index: 10, price: 101.0 };
        assert!((slope(&a, &b) - 1.0 / 10.0 / 100.5).abs() < 1e-12);
    }
}
