use serde::{Deserialize, Serialize};
use std::fmt;

/// Naive trend label from the moving-average crossover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
    Unknown,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Bullish => write!(f, "bullish"),
            Direction::Bearish => write!(f, "bearish"),
            Direction::Neutral => write!(f, "neutral"),
            Direction::Unknown => write!(f, "unknown"),
        }
    }
}

/// Moving-average signal for one close series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalResult {
    pub direction: Direction,
    pub short_ma: Option<f64>,
    pub long_ma: Option<f64>,
    pub expected_pct_change: Option<f64>,
}

impl SignalResult {
    /// Result for a series too short to say anything about.
    pub fn unknown() -> Self {
        Self {
            direction: Direction::Unknown,
            short_ma: None,
            long_ma: None,
            expected_pct_change: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.direction == Direction::Unknown
    }
}

impl Default for SignalResult {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Render an optional number the way reports show it.
pub fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "None".to_string(),
    }
}
