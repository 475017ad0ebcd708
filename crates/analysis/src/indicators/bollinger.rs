use super::sma::SmaIndicator;

/// Bollinger Bands: SMA(period) ± `std_dev_multiplier` population standard deviations.
#[derive(Debug, Clone)]
pub struct BollingerIndicator {
    pub period: usize,
    pub std_dev_multiplier: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandPoint {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerIndicator {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Self {
        assert!(period >= 2, "Bollinger period must be >= 2");
        Self {
            period,
            std_dev_multiplier,
        }
    }

    pub fn series(&self, closes: &[f64]) -> Vec<Option<BandPoint>> {
        let middle = SmaIndicator::new(self.period).series(closes);
        middle
            .iter()
            .enumerate()
            .map(|(i, mean)| {
                let mean = (*mean)?;
                let window = &closes[i + 1 - self.period..=i];
                let variance =
                    window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / self.period as f64;
                let width = variance.sqrt() * self.std_dev_multiplier;
                Some(BandPoint {
                    upper: mean + width,
                    middle: mean,
                    lower: mean - width,
                })
            })
            .collect()
    }
}
