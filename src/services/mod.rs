pub mod fetcher;
pub mod history_cache;
pub mod llm;
pub mod memo;
pub mod pipeline;
pub mod signal;
pub mod symbols;
pub mod vision;

pub use fetcher::HistoryFetcher;
pub use history_cache::HistoryCache;
pub use llm::{fallback_message, parse_completion, LlmClient};
pub use memo::Memo;
pub use pipeline::{build_image_prompt, build_prompt, InsightPipeline};
pub use signal::{compute_signal, signal_for_series, text_summary};
pub use symbols::{read_symbols, read_symbols_from_path};
pub use vision::{load_trend_model, ChartAnalyzer, OnnxTrendModel, TrendModel};
