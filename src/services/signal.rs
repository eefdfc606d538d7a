//! Moving-average crossover signal.
//!
//! Compares the mean of the last `window_short` closes with the mean of the
//! last `window_long` closes:
//! - short above long = bullish
//! - short below long = bearish
//! - equal = neutral
//!
//! Fewer than two usable closes gives `unknown`. This never fails.

use crate::types::{fmt_opt, Direction, PriceSeries, SignalResult};

pub const DEFAULT_SHORT_WINDOW: usize = 3;
pub const DEFAULT_LONG_WINDOW: usize = 7;

/// Mean of the trailing `window` values, or of all values when the series
/// is shorter. A zero window means the whole series.
fn trailing_mean(values: &[f64], window: usize) -> f64 {
    let take = if window == 0 || values.len() < window {
        values.len()
    } else {
        window
    };
    values.iter().rev().take(take).sum::<f64>() / take as f64
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Compute the crossover signal for a close sequence.
pub fn compute_signal(closes: &[f64], window_short: usize, window_long: usize) -> SignalResult {
    let closes: Vec<f64> = closes.iter().copied().filter(|c| c.is_finite()).collect();
    if closes.len() < 2 {
        return SignalResult::unknown();
    }

    let short_ma = trailing_mean(&closes, window_short);
    let long_ma = trailing_mean(&closes, window_long);

    let direction = if short_ma > long_ma {
        Direction::Bullish
    } else if short_ma < long_ma {
        Direction::Bearish
    } else {
        Direction::Neutral
    };

    let last = closes[closes.len() - 1];
    let expected_pct_change = if last != 0.0 {
        Some(round_to((short_ma - last) / last * 100.0, 3))
    } else {
        None
    };

    SignalResult {
        direction,
        short_ma: Some(round_to(short_ma, 4)),
        long_ma: Some(round_to(long_ma, 4)),
        expected_pct_change,
    }
}

/// Signal over a fetched series with the default 3/7 windows.
pub fn signal_for_series(series: &PriceSeries) -> SignalResult {
    compute_signal(&series.closes(), DEFAULT_SHORT_WINDOW, DEFAULT_LONG_WINDOW)
}

/// One-line plain-text summary of a ticker's signal.
pub fn text_summary(ticker: &str, series: &PriceSeries, signal: &SignalResult) -> String {
    let Some(last_close) = series.last_close() else {
        return format!("No historical data available for {}.", ticker);
    };

    format!(
        "{}: Last close {:.2}. Short MA={}, Long MA={}. Direction: {}. Expected (naive) change: {}%.",
        ticker,
        last_close,
        fmt_opt(signal.short_ma),
        fmt_opt(signal.long_ma),
        signal.direction,
        fmt_opt(signal.expected_pct_change)
    )
}
