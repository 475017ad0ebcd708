use super::ema::{ema_of, EmaIndicator};

/// MACD (Moving Average Convergence/Divergence) indicator.
///
/// Computes: MACD line = EMA(fast) − EMA(slow), Signal = EMA(macd_line, signal_period),
/// Histogram = line − signal.
#[derive(Debug, Clone)]
pub struct MacdIndicator {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

/// One MACD reading; each component is `None` while it is still warming up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MacdPoint {
    pub line: Option<f64>,
    pub signal: Option<f64>,
    pub histogram: Option<f64>,
}

/// Direction of the latest MACD/signal crossover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdCross {
    Bullish, // MACD crossed above signal line
    Bearish, // MACD crossed below signal line
    Neutral, // No crossover on the latest bar
}

impl MacdIndicator {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast < slow, "MACD fast period must be less than slow period");
        Self { fast, slow, signal }
    }

    /// MACD components aligned 1:1 with `closes` (oldest first).
    /// The line needs `slow` prices, the signal and histogram `slow + signal - 1`.
    pub fn series(&self, closes: &[f64]) -> Vec<MacdPoint> {
        let fast = EmaIndicator::new(self.fast).series(closes);
        let slow = EmaIndicator::new(self.slow).series(closes);

        let line: Vec<Option<f64>> = fast
            .iter()
            .zip(&slow)
            .map(|(f, s)| Some((*f)? - (*s)?))
            .collect();
        let signal = ema_of(&line, self.signal);

        line.iter()
            .zip(&signal)
            .map(|(&line, &signal)| MacdPoint {
                line,
                signal,
                histogram: line.zip(signal).map(|(l, s)| l - s),
            })
            .collect()
    }

    /// Detect a crossover between the last two fully defined points.
    pub fn crossover(points: &[MacdPoint]) -> MacdCross {
        let defined: Vec<(f64, f64)> = points
            .iter()
            .rev()
            .take(2)
            .filter_map(|p| p.line.zip(p.signal))
            .collect();
        let &[(curr_macd, curr_sig), (prev_macd, prev_sig)] = defined.as_slice() else {
            return MacdCross::Neutral;
        };

        if prev_macd <= prev_sig && curr_macd > curr_sig {
            MacdCross::Bullish
        } else if prev_macd >= prev_sig && curr_macd < curr_sig {
            MacdCross::Bearish
        } else {
            MacdCross::Neutral
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trending_up(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64 * 0.5).collect()
    }

    #[test]
    fn macd_warmup_lengths() {
        let macd = MacdIndicator::new(12, 26, 9);
        let points = macd.series(&trending_up(40));
        assert!(points[24].line.is_none());
        assert!(points[25].line.is_some());
        assert!(points[32].signal.is_none());
        assert!(points[33].signal.is_some());
        assert!(points[33].histogram.is_some());
    }

    #[test]
    fn macd_positive_on_uptrend() {
        let macd = MacdIndicator::new(12, 26, 9);
        let points = macd.series(&trending_up(60));
        let last = points.last().unwrap();
        assert!(last.line.unwrap() > 0.0);
    }

    #[test]
    fn macd_detects_bullish_crossover() {
        let macd = MacdIndicator::new(3, 6, 3);
        // Down then sharply up → the line crosses above the signal at some bar
        let mut prices: Vec<f64> = (0..20).map(|i| 100.0 - i as f64 * 0.5).collect();
        prices.extend((0..20).map(|i| 90.0 + i as f64 * 2.0));
        let points = macd.series(&prices);
        let crossed = (2..=points.len())
            .any(|end| MacdIndicator::crossover(&points[..end]) == MacdCross::Bullish);
        assert!(crossed);
    }

    #[test]
    fn crossover_is_neutral_without_history() {
        assert_eq!(MacdIndicator::crossover(&[]), MacdCross::Neutral);
        let macd = MacdIndicator::new(3, 6, 3);
        let points = macd.series(&[1.0, 2.0, 3.0]);
        assert_eq!(MacdIndicator::crossover(&points), MacdCross::Neutral);
    }
}
