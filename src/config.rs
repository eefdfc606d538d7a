use crate::types::{HistoryInterval, HistoryPeriod};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Local language model backend configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// HTTP completion endpoint (OpenAI-compatible `/v1/completions`).
    pub endpoint_url: String,
    /// Model listing endpoint used for the availability probe.
    pub models_url: String,
    /// Model name sent to both transports.
    pub model_name: String,
    /// Command-line model runner binary.
    pub cli_binary: String,
    /// Completion length cap for the HTTP transport.
    pub max_tokens: u32,
    /// Timeout for a single HTTP completion request.
    pub timeout_http: Duration,
    /// Timeout for a single CLI invocation.
    pub timeout_cli: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint_url: "http://localhost:11434/v1/completions".to_string(),
            models_url: "http://127.0.0.1:11434/v1/models".to_string(),
            model_name: "llama3:8b".to_string(),
            cli_binary: "ollama".to_string(),
            max_tokens: 200,
            timeout_http: Duration::from_secs(30),
            timeout_cli: Duration::from_secs(20),
        }
    }
}

/// Chart classifier configuration.
#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// Path to the ONNX image-classification model.
    pub model_path: PathBuf,
    /// Square input edge expected by the model.
    pub input_size: u32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/vit-base-patch16-224.onnx"),
            input_size: 224,
        }
    }
}

/// Moving-average signal and history defaults.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub period: HistoryPeriod,
    pub interval: HistoryInterval,
    pub window_short: usize,
    pub window_long: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            period: HistoryPeriod::OneMonth,
            interval: HistoryInterval::OneDay,
            window_short: 3,
            window_long: 7,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Directory for the per-symbol CSV cache.
    pub cache_dir: PathBuf,
    /// How long the API memoizes a fetched series.
    pub history_memo_ttl: Duration,
    pub analysis: AnalysisConfig,
    pub llm: LlmConfig,
    pub vision: VisionConfig,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let llm_defaults = LlmConfig::default();
        let vision_defaults = VisionConfig::default();
        let analysis_defaults = AnalysisConfig::default();

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("PORT").unwrap_or(8000),
            cache_dir: env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            history_memo_ttl: Duration::from_secs(
                env_parse("HISTORY_MEMO_TTL_SECS").unwrap_or(60),
            ),
            analysis: AnalysisConfig {
                period: env::var("HISTORY_PERIOD")
                    .ok()
                    .and_then(|v| HistoryPeriod::from_str(&v))
                    .unwrap_or(analysis_defaults.period),
                interval: env::var("HISTORY_INTERVAL")
                    .ok()
                    .and_then(|v| HistoryInterval::from_str(&v))
                    .unwrap_or(analysis_defaults.interval),
                window_short: env_parse("MA_SHORT_WINDOW").unwrap_or(analysis_defaults.window_short),
                window_long: env_parse("MA_LONG_WINDOW").unwrap_or(analysis_defaults.window_long),
            },
            llm: LlmConfig {
                endpoint_url: env::var("LLM_HTTP_URL").unwrap_or(llm_defaults.endpoint_url),
                models_url: env::var("LLM_MODELS_URL").unwrap_or(llm_defaults.models_url),
                model_name: env::var("LLM_MODEL").unwrap_or(llm_defaults.model_name),
                cli_binary: env::var("LLM_CLI").unwrap_or(llm_defaults.cli_binary),
                max_tokens: env_parse("LLM_MAX_TOKENS").unwrap_or(llm_defaults.max_tokens),
                timeout_http: env_parse("LLM_HTTP_TIMEOUT_SECS")
                    .map(Duration::from_secs)
                    .unwrap_or(llm_defaults.timeout_http),
                timeout_cli: env_parse("LLM_CLI_TIMEOUT_SECS")
                    .map(Duration::from_secs)
                    .unwrap_or(llm_defaults.timeout_cli),
            },
            vision: VisionConfig {
                model_path: env::var("VISION_MODEL_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(vision_defaults.model_path),
                input_size: env_parse("VISION_INPUT_SIZE").unwrap_or(vision_defaults.input_size),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
