// Error types for rhgate
// Author: kelexine (https://github.com/kelexine)

use crate::governor::DenialReason;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Gemini API error: {0}")]
    GeminiApi(String),

    #[error("{reason} (retry in {wait_ms} ms)")]
    RateLimited { reason: DenialReason, wait_ms: u64 },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Whether waiting and asking again could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::RateLimited { .. })
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
