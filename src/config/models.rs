//! Configuration data structures for rhgate.
//!
//! This module defines the schema for the application settings: the Gemini
//! connection, the request quotas, the response cache and logging.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Upstream Gemini API settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Quotas applied to outbound AI requests.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Response cache sizing and expiry.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Where the daily quota snapshot is kept.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the upstream Gemini API connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Base URL for the Generative Language API.
    /// Default: `https://generativelanguage.googleapis.com/v1beta`
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// The model used for every request.
    /// Default: `gemini-2.0-flash`
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Request timeout in seconds.
    /// Default: `60`
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// API key. Usually supplied through `GEMINI_API_KEY` instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Quotas enforced by the request governor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LimitsConfig {
    /// Maximum requests in any trailing 60 second window.
    /// Default: `10`
    #[serde(default = "default_per_minute_limit")]
    pub per_minute_limit: u32,

    /// Maximum requests in a rolling 24 hour window.
    /// Default: `100`
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,

    /// Minimum gap between two requests, in milliseconds.
    /// Default: `6000`
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

/// Response cache settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheConfig {
    /// Seconds a cached response stays valid.
    /// Default: `1800` (30 minutes)
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,

    /// Maximum number of cached responses.
    /// Default: `50`
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Characters kept from each input when deriving a cache key.
    /// Default: `100`
    #[serde(default = "default_max_part_chars")]
    pub max_part_chars: usize,
}

/// Durable storage settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// JSON file holding persisted state.
    /// Default: `~/.rhgate/storage.json`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Keep state in memory only, so every run starts with a fresh quota.
    /// Default: `false`
    #[serde(default)]
    pub in_memory: bool,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `warn`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`, `compact`).
    /// Default: `compact`
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Whether to mask API keys in upstream error bodies before logging them.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub sanitize_tokens: bool,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            default_model: default_model(),
            timeout_seconds: default_timeout(),
            api_key: None,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            per_minute_limit: default_per_minute_limit(),
            daily_limit: default_daily_limit(),
            cooldown_ms: default_cooldown_ms(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
            capacity: default_cache_capacity(),
            max_part_chars: default_max_part_chars(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            sanitize_tokens: true,
        }
    }
}

// Helper functions for serde defaults
fn default_api_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_per_minute_limit() -> u32 {
    10
}

fn default_daily_limit() -> u32 {
    100
}

fn default_cooldown_ms() -> u64 {
    6_000
}

fn default_cache_ttl() -> u64 {
    30 * 60
}

fn default_cache_capacity() -> usize {
    50
}

fn default_max_part_chars() -> usize {
    100
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}
