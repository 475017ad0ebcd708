use common::Candle;

/// ADX (Average Directional Index): trend strength, not direction.
///
/// True range and directional movement are Wilder-smoothed over `period`,
/// DX is derived from +DI/−DI and ADX is the Wilder average of DX.
/// The first value appears at index `2 * period - 1`.
#[derive(Debug, Clone)]
pub struct AdxIndicator {
    pub period: usize,
}

impl AdxIndicator {
    pub fn new(period: usize) -> Self {
        assert!(period >= 2, "ADX period must be >= 2");
        Self { period }
    }

    pub fn series(&self, candles: &[Candle]) -> Vec<Option<f64>> {
        let n = candles.len();
        let mut out = vec![None; n];
        let period = self.period;
        if n < 2 * period {
            return out;
        }

        // Per-bar TR, +DM, −DM; index i describes the move from i-1 to i.
        let mut tr = vec![0.0; n];
        let mut plus_dm = vec![0.0; n];
        let mut minus_dm = vec![0.0; n];
        for i in 1..n {
            let (curr, prev) = (&candles[i], &candles[i - 1]);
            tr[i] = (curr.high - curr.low)
                .max((curr.high - prev.close).abs())
                .max((curr.low - prev.close).abs());
            let up = curr.high - prev.high;
            let down = prev.low - curr.low;
            plus_dm[i] = if up > down && up > 0.0 { up } else { 0.0 };
            minus_dm[i] = if down > up && down > 0.0 { down } else { 0.0 };
        }

        let smooth_tr = wilder(&tr[1..], period);
        let smooth_plus = wilder(&plus_dm[1..], period);
        let smooth_minus = wilder(&minus_dm[1..], period);

        // dx[j] corresponds to candle index j + period
        let dx: Vec<Option<f64>> = smooth_tr
            .iter()
            .zip(&smooth_plus)
            .zip(&smooth_minus)
            .map(|((&tr, &plus), &minus)| {
                if tr <= 0.0 {
                    return None;
                }
                let plus_di = 100.0 * plus / tr;
                let minus_di = 100.0 * minus / tr;
                let sum = plus_di + minus_di;
                if sum <= 0.0 {
                    return None;
                }
                Some(100.0 * (plus_di - minus_di).abs() / sum)
            })
            .collect();

        if dx.len() < period {
            return out;
        }
        let Some(seed) = dx[..period].iter().copied().sum::<Option<f64>>() else {
            return out;
        };
        let mut adx = seed / period as f64;
        out[2 * period - 1] = Some(adx);
        for (j, value) in dx.iter().enumerate().skip(period) {
            let Some(value) = value else {
                continue;
            };
            adx = (adx * (period - 1) as f64 + value) / period as f64;
            out[j + period] = Some(adx);
        }
        out
    }
}

/// Wilder smoothing: seed with the mean of the first `period` values, then
/// `prev * (period - 1) / period + value / period`.
fn wilder(values: &[f64], period: usize) -> Vec<f64> {
    if values.len() < period {
        return Vec::new();
    }
    let mut result = Vec::with_capacity(values.len() - period + 1);
    let mut current = values[..period].iter().sum::<f64>() / period as f64;
    result.push(current);
    for value in &values[period..] {
        current = (current * (period - 1) as f64 + value) / period as f64;
        result.push(current);
    }
    result
}
