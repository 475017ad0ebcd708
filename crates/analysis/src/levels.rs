use serde::Serialize;

use common::{Candle, CandleSeries, Result};

use crate::config::LevelConfig;

/// Support and resistance around the latest close, nearest level first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceLevels {
    /// Strictly below the close, descending.
    pub support: Vec<f64>,
    /// Strictly above the close, ascending.
    pub resistance: Vec<f64>,
}

/// Classic floor-pivot ladder over a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PivotLadder {
    pub pivot: f64,
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
}

impl PivotLadder {
    pub fn from_window(window: &[Candle]) -> Option<Self> {
        let last = window.last()?;
        let high = window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
        let low = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        let pivot = (high + low + last.close) / 3.0;
        Some(Self {
            pivot,
            r1: 2.0 * pivot - low,
            r2: pivot + (high - low),
            r3: high + 2.0 * (pivot - low),
            s1: 2.0 * pivot - high,
            s2: pivot - (high - low),
            s3: low - 2.0 * (high - pivot),
        })
    }

    pub fn levels(&self) -> [f64; 7] {
        [self.pivot, self.r1, self.r2, self.r3, self.s1, self.s2, self.s3]
    }
}

#[derive(Debug, Clone, Default)]
pub struct LevelFinder {
    config: LevelConfig,
}

impl LevelFinder {
    pub fn new(config: LevelConfig) -> Self {
        Self { config }
    }

    pub fn find(&self, series: &CandleSeries) -> Result<PriceLevels> {
        series.require("levels", self.config.min_candles)?;
        let window = series.tail(self.config.window);
        let Some(ladder) = PivotLadder::from_window(window) else {
            return Ok(PriceLevels::default());
        };
        let close = window[window.len() - 1].close;

        let mut candidates: Vec<f64> = ladder.levels().to_vec();
        candidates.extend(local_extrema(window));
        candidates.retain(|level| level.is_finite());

        let mut resistance: Vec<f64> = candidates.iter().copied().filter(|&l| l > close).collect();
        let mut support: Vec<f64> = candidates.iter().copied().filter(|&l| l < close).collect();

        resistance.sort_by(f64::total_cmp);
        resistance.dedup();
        resistance.truncate(self.config.max_levels);

        support.sort_by(|a, b| b.total_cmp(a));
        support.dedup();
        support.truncate(self.config.max_levels);

        Ok(PriceLevels {
            support,
            resistance,
        })
    }
}

/// Strict local highs and lows (greater/less than both immediate neighbours).
fn local_extrema(window: &[Candle]) -> Vec<f64> {
    let mut out = Vec::new();
    for w in window.windows(3) {
        let (prev, curr, next) = (&w[0], &w[1], &w[2]);
        if curr.high > prev.high && curr.high > next.high {
            out.push(curr.high);
        }
        if curr.low < prev.low && curr.low < next.low {
            out.push(curr.low);
        }
    }
    out
}
