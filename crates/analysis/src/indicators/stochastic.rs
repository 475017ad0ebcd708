use common::Candle;

use super::sma::rolling_mean;

/// Slow Stochastic Oscillator.
///
/// raw %K = (close − lowest low) / (highest high − lowest low) × 100 over `k_period`,
/// %K = SMA(raw %K, `smooth_k`), %D = SMA(%K, `d_period`).
#[derive(Debug, Clone)]
pub struct StochasticIndicator {
    pub k_period: usize,
    pub d_period: usize,
    pub smooth_k: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StochasticPoint {
    pub k: Option<f64>,
    pub d: Option<f64>,
}

impl StochasticIndicator {
    pub fn new(k_period: usize, d_period: usize, smooth_k: usize) -> Self {
        assert!(k_period >= 1 && d_period >= 1 && smooth_k >= 1, "Stochastic periods must be >= 1");
        Self {
            k_period,
            d_period,
            smooth_k,
        }
    }

    pub fn series(&self, candles: &[Candle]) -> Vec<StochasticPoint> {
        let raw: Vec<Option<f64>> = (0..candles.len())
            .map(|i| {
                if i + 1 < self.k_period {
                    return None;
                }
                let window = &candles[i + 1 - self.k_period..=i];
                let lowest_low = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
                let highest_high = window
                    .iter()
                    .map(|c| c.high)
                    .fold(f64::NEG_INFINITY, f64::max);
                let range = highest_high - lowest_low;
                if range <= 0.0 {
                    return None;
                }
                Some((candles[i].close - lowest_low) / range * 100.0)
            })
            .collect();

        let k = rolling_mean(&raw, self.smooth_k);
        let d = rolling_mean(&k, self.d_period);
        k.into_iter()
            .zip(d)
            .map(|(k, d)| StochasticPoint { k, d })
            .collect()
    }
}
