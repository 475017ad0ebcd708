use std::fmt::{self, Write};

use analysis::{IndicatorSnapshot, PatternBias, TechnicalAnalysis, TrendDirection};
use common::Timeframe;

use crate::format::price_text;
use crate::subsignals::{SubSignal, RSI_OVERBOUGHT, RSI_OVERSOLD};

/// One-line indicator summary: RSI zone, MACD position and SMA20/SMA50 order.
pub fn indicator_summary(snapshot: &IndicatorSnapshot) -> String {
    let rsi = snapshot.rsi.current;
    let mut rsi_text = format!("RSI = {rsi:.1}");
    if rsi > RSI_OVERBOUGHT {
        rsi_text.push_str(" (overbought)");
    } else if rsi < RSI_OVERSOLD {
        rsi_text.push_str(" (oversold)");
    }

    let macd = snapshot.macd.current;
    let macd_text = if macd.line > macd.signal {
        "MACD positive crossover"
    } else {
        "MACD negative crossover"
    };

    let sma_text = if snapshot.sma.p20.current > snapshot.sma.p50.current {
        "SMA20 above SMA50"
    } else {
        "SMA20 below SMA50"
    };

    format!("{rsi_text}, {macd_text}, {sma_text}")
}

/// Multi-line narrative of an analysis, built from typed data.
pub fn analysis_text(
    symbol: &str,
    timeframe: Timeframe,
    analysis: &TechnicalAnalysis,
    sub_signals: &[SubSignal],
) -> String {
    Narrative {
        symbol,
        timeframe,
        analysis,
        sub_signals,
    }
    .to_string()
}

struct Narrative<'a> {
    symbol: &'a str,
    timeframe: Timeframe,
    analysis: &'a TechnicalAnalysis,
    sub_signals: &'a [SubSignal],
}

impl fmt::Display for Narrative<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_analysis(f, self.symbol, self.timeframe, self.analysis, self.sub_signals)
    }
}

fn write_analysis(
    out: &mut impl Write,
    symbol: &str,
    timeframe: Timeframe,
    analysis: &TechnicalAnalysis,
    sub_signals: &[SubSignal],
) -> fmt::Result {
    let snapshot = &analysis.indicators;

    writeln!(out, "Technical analysis for {symbol} on {timeframe}:")?;
    writeln!(out)?;
    writeln!(
        out,
        "Trend: {} (strength {:.2})",
        analysis.trend, analysis.trend.strength
    )?;

    writeln!(out)?;
    writeln!(out, "Indicators:")?;
    let rsi = snapshot.rsi.current;
    writeln!(out, "- RSI: {rsi:.2}")?;
    let zone = if rsi > RSI_OVERBOUGHT {
        "overbought, downside risk"
    } else if rsi < RSI_OVERSOLD {
        "oversold, upside potential"
    } else {
        "neutral zone"
    };
    writeln!(out, "  ({zone})")?;

    let macd = snapshot.macd.current;
    writeln!(
        out,
        "- MACD: {:.4}, signal: {:.4}, histogram: {:.4}",
        macd.line, macd.signal, macd.histogram
    )?;
    writeln!(
        out,
        "  ({})",
        if macd.line > macd.signal {
            "positive crossover, bullish"
        } else {
            "negative crossover, bearish"
        }
    )?;

    let degraded = snapshot.degraded();
    if !degraded.is_empty() {
        let names: Vec<String> = degraded.iter().map(|n| format!("{n:?}")).collect();
        writeln!(out, "- Defaults used for: {}", names.join(", "))?;
    }

    writeln!(out)?;
    writeln!(out, "Support levels:")?;
    for (i, level) in analysis.levels.support.iter().enumerate() {
        writeln!(out, "- Support {}: {}", i + 1, price_text(*level))?;
    }
    writeln!(out)?;
    writeln!(out, "Resistance levels:")?;
    for (i, level) in analysis.levels.resistance.iter().enumerate() {
        writeln!(out, "- Resistance {}: {}", i + 1, price_text(*level))?;
    }

    let patterns = analysis.patterns.matches();
    if !patterns.is_empty() {
        writeln!(out)?;
        writeln!(out, "Detected patterns:")?;
        for pattern in &patterns {
            writeln!(out, "- {pattern}")?;
        }
    }

    if !sub_signals.is_empty() {
        writeln!(out)?;
        writeln!(out, "Signals:")?;
        for signal in sub_signals {
            writeln!(out, "- {signal}")?;
        }
    }

    writeln!(out)?;
    writeln!(out, "Conclusion:")?;
    let bullish = sub_signals
        .iter()
        .filter(|s| s.bias() == PatternBias::Bullish)
        .count();
    let bearish = sub_signals
        .iter()
        .filter(|s| s.bias() == PatternBias::Bearish)
        .count();
    match analysis.trend.direction {
        TrendDirection::Bullish if bullish > bearish => {
            writeln!(out, "Uptrend confirmed by several indicators.")?;
            write!(out, "Possible buy with a stop below the nearest support.")
        }
        TrendDirection::Bearish if bearish > bullish => {
            writeln!(out, "Downtrend confirmed by several indicators.")?;
            write!(out, "Possible sell with a stop above the nearest resistance.")
        }
        _ => {
            writeln!(out, "Mixed indicators, no clear direction.")?;
            write!(out, "Wait for clearer signals.")
        }
    }
}
