use common::Candle;

use crate::config::PatternConfig;

pub(crate) fn is_doji(c: &Candle, cfg: &PatternConfig) -> bool {
    let range = c.range();
    range > 0.0 && c.body_size() <= cfg.doji_body_ratio * range
}

pub(crate) fn is_hammer(c: &Candle, cfg: &PatternConfig) -> bool {
    let (body, range) = (c.body_size(), c.range());
    if body == 0.0 || range == 0.0 {
        return false;
    }
    body / range < cfg.hammer_body_ratio
        && c.lower_shadow() > cfg.hammer_shadow_multiple * body
        && c.upper_shadow() < cfg.hammer_opposite_shadow_ratio * range
}

pub(crate) fn is_inverted_hammer(c: &Candle, cfg: &PatternConfig) -> bool {
    let (body, range) = (c.body_size(), c.range());
    if body == 0.0 || range == 0.0 {
        return false;
    }
    body / range < cfg.hammer_body_ratio
        && c.upper_shadow() > cfg.hammer_shadow_multiple * body
        && c.lower_shadow() < cfg.hammer_opposite_shadow_ratio * range
}

pub(crate) fn is_shooting_star(c: &Candle, cfg: &PatternConfig) -> bool {
    c.is_bearish() && is_inverted_hammer(c, cfg)
}

pub(crate) fn is_bullish_engulfing(first: &Candle, second: &Candle) -> bool {
    first.is_bearish()
        && second.is_bullish()
        && second.open <= first.close
        && second.close >= first.open
}

pub(crate) fn is_bearish_engulfing(first: &Candle, second: &Candle) -> bool {
    first.is_bullish()
        && second.is_bearish()
        && second.open >= first.close
        && second.close <= first.open
}

/// Bearish candle, small middle body, bullish candle, with the middle body
/// gapped below the first close or above the third open.
pub(crate) fn is_morning_star(c1: &Candle, c2: &Candle, c3: &Candle, cfg: &PatternConfig) -> bool {
    let small_middle = c2.body_size() < cfg.star_middle_body_ratio * c1.body_size();
    let gap_down = c2.body_top() < c1.close;
    let gap_up = c2.body_bottom() > c3.open;
    c1.is_bearish() && small_middle && c3.is_bullish() && (gap_down || gap_up)
}

pub(crate) fn is_evening_star(c1: &Candle, c2: &Candle, c3: &Candle, cfg: &PatternConfig) -> bool {
    let small_middle = c2.body_size() < cfg.star_middle_body_ratio * c1.body_size();
    let gap_up = c2.body_bottom() > c1.close;
    let gap_down = c2.body_top() < c3.open;
    c1.is_bullish() && small_middle && c3.is_bearish() && (gap_up || gap_down)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle::new(Utc::now(), open, high, low, close, 0.0)
    }

    #[test]
    fn doji_needs_tiny_body_and_nonzero_range() {
        let cfg = PatternConfig::default();
        assert!(is_doji(&candle(100.0, 102.0, 98.0, 100.1), &cfg));
        assert!(!is_doji(&candle(100.0, 102.0, 98.0, 101.0), &cfg));
        assert!(!is_doji(&candle(100.0, 100.0, 100.0, 100.0), &cfg));
    }

    #[test]
    fn hammer_geometry() {
        let cfg = PatternConfig::default();
        // body 1, lower shadow 6, upper shadow 0.2, range 7.2
        let hammer = candle(105.0, 106.2, 99.0, 106.0);
        assert!(is_hammer(&hammer, &cfg));
        assert!(!is_inverted_hammer(&hammer, &cfg));
        assert!(!is_hammer(&candle(100.0, 100.0, 100.0, 100.0), &cfg));
    }

    #[test]
    fn shooting_star_is_bearish_inverted_hammer() {
        let cfg = PatternConfig::default();
        let bearish = candle(101.0, 107.0, 99.9, 100.0);
        let bullish = candle(100.0, 107.0, 99.9, 101.0);
        assert!(is_inverted_hammer(&bearish, &cfg));
        assert!(is_shooting_star(&bearish, &cfg));
        assert!(is_inverted_hammer(&bullish, &cfg));
        assert!(!is_shooting_star(&bullish, &cfg));
    }

    #[test]
    fn engulfing_requires_opposite_colours_and_containment() {
        let down = candle(102.0, 102.5, 100.5, 101.0);
        let up = candle(100.8, 103.5, 100.5, 103.0);
        assert!(is_bullish_engulfing(&down, &up));
        assert!(!is_bearish_engulfing(&down, &up));

        let small_up = candle(101.2, 102.0, 101.0, 101.8);
        assert!(!is_bullish_engulfing(&down, &small_up));

        let up_first = candle(100.0, 102.5, 99.5, 102.0);
        let down_second = candle(102.5, 103.0, 99.0, 99.5);
        assert!(is_bearish_engulfing(&up_first, &down_second));
    }

    #[test]
    fn morning_and_evening_star() {
        let cfg = PatternConfig::default();
        let c1 = candle(110.0, 110.5, 101.5, 102.0);
        let c2 = candle(100.5, 101.0, 99.5, 100.0);
        let c3 = candle(101.0, 109.5, 100.8, 109.0);
        assert!(is_morning_star(&c1, &c2, &c3, &cfg));
        assert!(!is_evening_star(&c1, &c2, &c3, &cfg));

        let e1 = candle(100.0, 108.5, 99.5, 108.0);
        let e2 = candle(109.0, 110.0, 108.8, 109.5);
        let e3 = candle(108.5, 109.0, 100.5, 101.0);
        assert!(is_evening_star(&e1, &e2, &e3, &cfg));
        assert!(!is_morning_star(&e1, &e2, &e3, &cfg));
    }

    #[test]
    fn star_without_gap_is_rejected() {
        let cfg = PatternConfig::default();
        let c1 = candle(110.0, 110.5, 101.5, 102.0);
        // middle body straddles the first close and sits below the third open
        let c2 = candle(101.5, 103.0, 101.0, 102.5);
        let c3 = candle(103.0, 109.5, 102.8, 109.0);
        assert!(!is_morning_star(&c1, &c2, &c3, &cfg));
    }
}
