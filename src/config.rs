use crate::types::NumericBackend;
use std::env;
use std::path::PathBuf;

/// Encoder model configuration.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Directory holding `model.json`, `scaler.json` and `config.json`.
    pub dir: PathBuf,
    /// Base URL of the inference server.
    pub endpoint: String,
    /// Numeric backend the session is pinned to.
    pub backend: NumericBackend,
    /// Request timeout for a single inference call (ms).
    pub timeout_ms: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./model"),
            endpoint: "http://127.0.0.1:8501".to_string(),
            backend: NumericBackend::Cpu,
            timeout_ms: 30_000,
        }
    }
}

/// Windowing and calibration parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Rows per window (default: 20).
    pub window_size: usize,
    /// Windows per inference batch during calibration (default: 32).
    pub batch_size: usize,
    /// Yield to the runtime after this many batches (default: 8).
    pub yield_every: usize,
    /// Threshold percentile, taken by floor rank (default: 0.95).
    pub percentile: f64,
    /// Minimum window count for a calibration to be reliable (default: 200).
    pub reliable_window_count: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_size: 20,
            batch_size: 32,
            yield_every: 8,
            percentile: 0.95,
            reliable_window_count: 200,
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
    /// Model artifact and inference server settings.
    pub model: ModelConfig,
    /// Pipeline settings.
    pub pipeline: PipelineConfig,
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let model_defaults = ModelConfig::default();
        let pipeline_defaults = PipelineConfig::default();

        let model = ModelConfig {
            dir: env::var("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(model_defaults.dir),
            endpoint: env::var("MODEL_ENDPOINT").unwrap_or(model_defaults.endpoint),
            backend: env::var("MODEL_BACKEND")
                .ok()
                .and_then(|v| NumericBackend::from_str(&v))
                .unwrap_or(model_defaults.backend),
            timeout_ms: parse_env("MODEL_TIMEOUT_MS").unwrap_or(model_defaults.timeout_ms),
        };

        let pipeline = PipelineConfig {
            window_size: parse_env("WINDOW_SIZE")
                .filter(|w: &usize| *w > 0)
                .unwrap_or(pipeline_defaults.window_size),
            batch_size: parse_env("CALIBRATION_BATCH_SIZE")
                .filter(|b: &usize| *b > 0)
                .unwrap_or(pipeline_defaults.batch_size),
            yield_every: parse_env("CALIBRATION_YIELD_EVERY")
                .filter(|y: &usize| *y > 0)
                .unwrap_or(pipeline_defaults.yield_every),
            percentile: parse_env("THRESHOLD_PERCENTILE")
                .filter(|p: &f64| (0.0..=1.0).contains(p))
                .unwrap_or(pipeline_defaults.percentile),
            reliable_window_count: parse_env("RELIABLE_WINDOW_COUNT")
                .unwrap_or(pipeline_defaults.reliable_window_count),
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env("PORT").unwrap_or(3001),
            model,
            pipeline,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
