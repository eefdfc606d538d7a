//! Per-ticker analysis: fetch, signal, prompt, insight.
//!
//! Everything runs in sequence. One slow ticker holds up the rest of a
//! portfolio; only the per-call timeouts bound it.

use super::{compute_signal, ChartAnalyzer, HistoryFetcher, LlmClient};
use crate::config::AnalysisConfig;
use crate::types::{
    HistoryInterval, HistoryPeriod, ImageInsight, ImageReport, InsightResponse, SignalResult,
    TickerReport,
};
use tracing::{debug, info, warn};

/// Closes included in the LLM prompt.
pub const PROMPT_CLOSES: usize = 7;

/// Prompt for a single ticker's insight.
pub fn build_prompt(ticker: &str, recent_closes: &[f64], signal: &SignalResult) -> String {
    format!(
        "You are a concise market analyst.\n\
         Ticker: {}\n\
         Recent closes (last {}): {:?}\n\
         Short MA: {}, Long MA: {}\n\
         Naive expected pct change: {}%\n\
         Produce a 2-3 sentence insight (no legal/advice language) and a one-line recommendation: \
         Buy/Hold/Sell with confidence score 0-100.\n",
        ticker,
        recent_closes.len(),
        recent_closes,
        crate::types::fmt_opt(signal.short_ma),
        crate::types::fmt_opt(signal.long_ma),
        crate::types::fmt_opt(signal.expected_pct_change),
    )
}

/// Prompt combining a chart description with a ticker's insight.
pub fn build_image_prompt(image_description: &str, ticker_insight: Option<&str>) -> String {
    match ticker_insight {
        Some(insight) => format!(
            "Image summary: {}\n\nTicker analysis (short): {}\n\nProvide a short combined insight.",
            image_description, insight
        ),
        None => format!("Image summary: {}\nProvide a short insight.", image_description),
    }
}

/// Sequences fetcher, signal, classifier and LLM.
pub struct InsightPipeline {
    fetcher: HistoryFetcher,
    llm: LlmClient,
    analyzer: ChartAnalyzer,
    analysis: AnalysisConfig,
}

impl InsightPipeline {
    pub fn new(
        fetcher: HistoryFetcher,
        llm: LlmClient,
        analyzer: ChartAnalyzer,
        analysis: AnalysisConfig,
    ) -> Self {
        Self {
            fetcher,
            llm,
            analyzer,
            analysis,
        }
    }

    pub fn fetcher(&self) -> &HistoryFetcher {
        &self.fetcher
    }

    pub fn llm(&self) -> &LlmClient {
        &self.llm
    }

    pub fn analyzer(&self) -> &ChartAnalyzer {
        &self.analyzer
    }

    pub fn analysis(&self) -> &AnalysisConfig {
        &self.analysis
    }

    /// Analyze one ticker with the configured period and interval.
    pub async fn analyze_ticker(&self, ticker: &str) -> TickerReport {
        self.analyze_ticker_with(ticker, self.analysis.period, self.analysis.interval)
            .await
    }

    /// Analyze one ticker. With no history the LLM is not called.
    pub async fn analyze_ticker_with(
        &self,
        ticker: &str,
        period: HistoryPeriod,
        interval: HistoryInterval,
    ) -> TickerReport {
        let ticker = ticker.trim();
        let history = self.fetcher.fetch_history(ticker, period, interval).await;
        if history.is_empty() {
            info!("No data available for {}", ticker);
            return TickerReport::no_data(ticker);
        }

        let signal = compute_signal(
            &history.closes(),
            self.analysis.window_short,
            self.analysis.window_long,
        );
        debug!("{} signal: {:?}", ticker, signal);

        let prompt = build_prompt(ticker, &history.recent_closes(PROMPT_CLOSES), &signal);
        let insight = self.llm.query(&prompt).await;

        TickerReport {
            ticker: ticker.to_string(),
            history: Some(history),
            signal: Some(signal),
            insight: insight.text,
            insight_source: insight.source,
        }
    }

    /// Analyze tickers one after another with the configured period/interval.
    pub async fn analyze_portfolio(&self, tickers: &[String]) -> Vec<TickerReport> {
        self.analyze_portfolio_with(tickers, self.analysis.period, self.analysis.interval)
            .await
    }

    /// Analyze tickers one after another. Blank entries are skipped.
    pub async fn analyze_portfolio_with(
        &self,
        tickers: &[String],
        period: HistoryPeriod,
        interval: HistoryInterval,
    ) -> Vec<TickerReport> {
        let mut reports = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            if ticker.trim().is_empty() {
                continue;
            }
            reports.push(self.analyze_ticker_with(ticker, period, interval).await);
        }
        info!("Analyzed {} tickers", reports.len());
        reports
    }

    /// Analyze an image on the blocking pool. Decoding and inference are
    /// CPU-bound and must not hold a runtime worker.
    pub async fn analyze_image(&self, bytes: &[u8]) -> ImageReport {
        let analyzer = self.analyzer.clone();
        let bytes = bytes.to_vec();
        match tokio::task::spawn_blocking(move || analyzer.analyze_bytes(&bytes)).await {
            Ok(report) => report,
            Err(e) => {
                warn!("Image analysis task failed: {}", e);
                ImageReport::error(format!("image analysis failed: {}", e))
            }
        }
    }

    /// Describe a chart image and ask for an insight, folding in a ticker's
    /// report when one is given.
    pub async fn analyze_image_and_data(&self, bytes: &[u8], ticker: Option<&str>) -> ImageInsight {
        let image = self.analyze_image(bytes).await;
        let description = image.describe();

        let ticker = ticker.map(str::trim).filter(|t| !t.is_empty());
        let insight: InsightResponse = match ticker {
            Some(t) => {
                let report = self.analyze_ticker(t).await;
                let prompt = build_image_prompt(&description, Some(&report.insight));
                self.llm.query(&prompt).await
            }
            None => self.llm.query(&build_image_prompt(&description, None)).await,
        };

        ImageInsight {
            image,
            ticker: ticker.map(str::to_string),
            insight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    #[test]
    fn test_build_prompt() {
        let signal = SignalResult {
            direction: Direction::Bullish,
            short_ma: Some(10.6667),
            long_ma: Some(10.2857),
            expected_pct_change: Some(-11.111),
        };
        let prompt = build_prompt("AAPL", &[10.0, 12.0], &signal);

        assert!(prompt.starts_with("You are a concise market analyst.\nTicker: AAPL\n"));
        assert!(prompt.contains("Recent closes (last 2): [10.0, 12.0]\n"));
        assert!(prompt.contains("Short MA: 10.6667, Long MA: 10.2857\n"));
        assert!(prompt.contains("Naive expected pct change: -11.111%\n"));
        assert!(prompt.ends_with("Buy/Hold/Sell with confidence score 0-100.\n"));
    }

    #[test]
    fn test_build_prompt_unknown_signal() {
        let prompt = build_prompt("X", &[5.0], &SignalResult::unknown());
        assert!(prompt.contains("Short MA: None, Long MA: None\n"));
    }

    #[test]
    fn test_build_image_prompt() {
        assert_eq!(
            build_image_prompt("Image 1x1", None),
            "Image summary: Image 1x1\nProvide a short insight."
        );
        assert_eq!(
            build_image_prompt("Image 1x1", Some("Hold")),
            "Image summary: Image 1x1\n\nTicker analysis (short): Hold\n\nProvide a short combined insight."
        );
    }
}
