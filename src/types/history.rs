use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lookback window for a history request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryPeriod {
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
}

impl HistoryPeriod {
    /// Get the period from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "5d" => Some(HistoryPeriod::FiveDays),
            "7d" => Some(HistoryPeriod::SevenDays),
            "1mo" => Some(HistoryPeriod::OneMonth),
            "3mo" => Some(HistoryPeriod::ThreeMonths),
            _ => None,
        }
    }

    /// Provider range token.
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryPeriod::FiveDays => "5d",
            HistoryPeriod::SevenDays => "7d",
            HistoryPeriod::OneMonth => "1mo",
            HistoryPeriod::ThreeMonths => "3mo",
        }
    }

    /// Periods offered in the interactive UI, in cycle order.
    pub fn selectable() -> [Self; 3] {
        [
            HistoryPeriod::SevenDays,
            HistoryPeriod::OneMonth,
            HistoryPeriod::ThreeMonths,
        ]
    }
}

impl fmt::Display for HistoryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bar size for a history request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryInterval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "1d")]
    OneDay,
}

impl HistoryInterval {
    /// Get the interval from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "1m" => Some(HistoryInterval::OneMinute),
            "1h" => Some(HistoryInterval::OneHour),
            "1d" => Some(HistoryInterval::OneDay),
            _ => None,
        }
    }

    /// Provider interval token.
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryInterval::OneMinute => "1m",
            HistoryInterval::OneHour => "1h",
            HistoryInterval::OneDay => "1d",
        }
    }

    /// Intervals offered in the interactive UI, in cycle order.
    pub fn selectable() -> [Self; 2] {
        [HistoryInterval::OneDay, HistoryInterval::OneHour]
    }
}

impl fmt::Display for HistoryInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one history request: what gets cached and memoized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryKey {
    pub symbol: String,
    pub period: HistoryPeriod,
    pub interval: HistoryInterval,
}

impl HistoryKey {
    pub fn new(symbol: &str, period: HistoryPeriod, interval: HistoryInterval) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            period,
            interval,
        }
    }
}

impl fmt::Display for HistoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.symbol, self.period, self.interval)
    }
}

/// One OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PricePoint {
    /// A bar is usable when its close is a positive finite number.
    pub fn is_valid(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }
}

/// Ordered price history for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub period: HistoryPeriod,
    pub interval: HistoryInterval,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series, dropping unusable bars and ordering by time.
    pub fn new(key: &HistoryKey, points: Vec<PricePoint>) -> Self {
        let mut points: Vec<PricePoint> = points.into_iter().filter(|p| p.is_valid()).collect();
        points.sort_by_key(|p| p.time);
        Self {
            symbol: key.symbol.clone(),
            period: key.period,
            interval: key.interval,
            points,
        }
    }

    /// An empty series for a key, the sentinel for "no data".
    pub fn empty(key: &HistoryKey) -> Self {
        Self::new(key, Vec::new())
    }

    pub fn key(&self) -> HistoryKey {
        HistoryKey {
            symbol: self.symbol.clone(),
            period: self.period,
            interval: self.interval,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.points.last().map(|p| p.close)
    }

    /// The most recent `n` closes, oldest first.
    pub fn recent_closes(&self, n: usize) -> Vec<f64> {
        let start = self.points.len().saturating_sub(n);
        self.points[start..].iter().map(|p| p.close).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn point(day: u32, close: f64) -> PricePoint {
        PricePoint {
            time: Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000.0,
        }
    }

    #[test]
    fn test_period_tokens() {
        for period in [
            HistoryPeriod::FiveDays,
            HistoryPeriod::SevenDays,
            HistoryPeriod::OneMonth,
            HistoryPeriod::ThreeMonths,
        ] {
            assert_eq!(HistoryPeriod::from_str(period.as_str()), Some(period));
        }
        assert_eq!(HistoryPeriod::from_str("1y"), None);
    }

    #[test]
    fn test_interval_serde_uses_tokens() {
        let json = serde_json::to_string(&HistoryInterval::OneHour).unwrap();
        assert_eq!(json, "\"1h\"");
        let parsed: HistoryInterval = serde_json::from_str("\"1d\"").unwrap();
        assert_eq!(parsed, HistoryInterval::OneDay);
    }

    #[test]
    fn test_history_key_normalizes_symbol() {
        let key = HistoryKey::new(" aapl ", HistoryPeriod::OneMonth, HistoryInterval::OneDay);
        assert_eq!(key.symbol, "AAPL");
        assert_eq!(key.to_string(), "AAPL_1mo_1d");
    }

    #[test]
    fn test_series_drops_invalid_points() {
        let key = HistoryKey::new("MSFT", HistoryPeriod::SevenDays, HistoryInterval::OneDay);
        let series = PriceSeries::new(
            &key,
            vec![point(1, 10.0), point(2, f64::NAN), point(3, 0.0), point(4, 11.0)],
        );

        assert_eq!(series.closes(), vec![10.0, 11.0]);
    }

    #[test]
    fn test_series_sorted_by_time() {
        let key = HistoryKey::new("MSFT", HistoryPeriod::SevenDays, HistoryInterval::OneDay);
        let series = PriceSeries::new(&key, vec![point(5, 12.0), point(1, 10.0), point(3, 11.0)]);

        assert_eq!(series.closes(), vec![10.0, 11.0, 12.0]);
        assert_eq!(series.last_close(), Some(12.0));
    }

    #[test]
    fn test_recent_closes_shorter_than_requested() {
        let key = HistoryKey::new("MSFT", HistoryPeriod::SevenDays, HistoryInterval::OneDay);
        let series = PriceSeries::new(&key, vec![point(1, 10.0), point(2, 11.0)]);

        assert_eq!(series.recent_closes(7), vec![10.0, 11.0]);
        assert_eq!(series.recent_closes(1), vec![11.0]);
    }
}
