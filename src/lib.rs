// rhgate - Rate limiting and response caching for research-assistant Gemini calls
// Author: kelexine (https://github.com/kelexine)

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod gemini;
pub mod governor;
pub mod metrics;
pub mod security;
pub mod storage;
pub mod utils;
