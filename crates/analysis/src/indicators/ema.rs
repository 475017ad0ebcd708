/// Exponential Moving Average, seeded with the SMA of the first `period` values.
#[derive(Debug, Clone)]
pub struct EmaIndicator {
    pub period: usize,
}

impl EmaIndicator {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self { period }
    }

    pub fn series(&self, values: &[f64]) -> Vec<Option<f64>> {
        let defined: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
        ema_of(&defined, self.period)
    }
}

/// EMA over a series that may start with undefined warm-up entries.
///
/// The seed is the mean of the first `period` defined values; entries before
/// the seed, and any undefined entry after it, stay `None`.
pub(crate) fn ema_of(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    let Some(first) = values.iter().position(Option::is_some) else {
        return out;
    };
    let seed_end = first + period;
    if period == 0 || seed_end > values.len() {
        return out;
    }

    let Some(seed_sum) = values[first..seed_end].iter().copied().sum::<Option<f64>>() else {
        return out;
    };
    let k = 2.0 / (period as f64 + 1.0);
    let mut ema_val = seed_sum / period as f64;
    out[seed_end - 1] = Some(ema_val);

    for (i, value) in values.iter().enumerate().skip(seed_end) {
        if let Some(price) = value {
            ema_val = price * k + ema_val * (1.0 - k);
            out[i] = Some(ema_val);
        }
    }
    out
}
