/// Simple Moving Average over a fixed window.
#[derive(Debug, Clone)]
pub struct SmaIndicator {
    pub period: usize,
}

impl SmaIndicator {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self { period }
    }

    /// SMA aligned 1:1 with `values`; `None` until a full window is available.
    pub fn series(&self, values: &[f64]) -> Vec<Option<f64>> {
        let defined: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
        rolling_mean(&defined, self.period)
    }
}

/// Rolling mean over the last `period` entries; an entry is `None` when any
/// value in its window is undefined.
pub(crate) fn rolling_mean(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            let sum = window.iter().copied().sum::<Option<f64>>()?;
            Some(sum / period as f64)
        })
        .collect()
}
