//! Entry point for every outbound AI request.
//!
//! `ask`, `cite`, `summarize` and `extract_metadata` all run the same fixed
//! sequence: derive a cache key, try the cache, ask the governor for
//! permission, call the generator, cache the answer.
//! A request counts against the quota as soon as it is sent, whether or not
//! the upstream call succeeds.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod metadata;
pub mod prompts;

pub use metadata::{parse_metadata_reply, MIN_SOURCE_CHARS};
pub use prompts::{
    assistant_prompt, citation_prompt, metadata_prompt, summary_prompt, CitationStyle,
    PaperMetadata,
};

use crate::cache::{CacheKeyDeriver, ResponseCache};
use crate::config::AppConfig;
use crate::error::{GatewayError, Result};
use crate::gemini::TextGenerator;
use crate::governor::{Permission, RequestGovernor, UsageStats};
use crate::security::{
    sanitize_input, sanitize_prompt, DEFAULT_INPUT_MAX_CHARS, DEFAULT_PROMPT_MAX_CHARS,
};
use crate::storage::KeyValueStore;
use crate::utils::Clock;
use chrono::{Datelike, TimeZone, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Abstracts are longer than questions; keep enough to be useful as context.
const CONTEXT_MAX_CHARS: usize = 3000;

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Cache,
    Upstream,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiReply {
    pub text: String,
    pub source: ReplySource,
}

/// Rate-limited, cached access to a [`TextGenerator`].
pub struct AiGateway<G> {
    generator: G,
    governor: RequestGovernor,
    cache: ResponseCache,
    keys: CacheKeyDeriver,
    clock: Arc<dyn Clock>,
}

impl<G: TextGenerator> AiGateway<G> {
    pub fn new(
        generator: G,
        governor: RequestGovernor,
        cache: ResponseCache,
        keys: CacheKeyDeriver,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            generator,
            governor,
            cache,
            keys,
            clock,
        }
    }

    /// Build the governor, cache and key deriver from configuration.
    pub fn from_config(
        generator: G,
        config: &AppConfig,
        clock: Arc<dyn Clock>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let governor = RequestGovernor::new(config.limits.clone(), clock.clone(), store);
        let cache = ResponseCache::new(&config.cache, clock.clone());
        let keys = CacheKeyDeriver::with_max_part_chars(config.cache.max_part_chars);
        Self::new(generator, governor, cache, keys, clock)
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn governor(&self) -> &RequestGovernor {
        &self.governor
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Ask the research assistant a question, optionally about a paper.
    pub async fn ask(&self, question: &str, context: Option<&str>) -> Result<AiReply> {
        let question = sanitize_prompt(question, DEFAULT_PROMPT_MAX_CHARS);
        if question.is_empty() {
            return Err(GatewayError::InvalidRequest("question is empty".to_string()));
        }
        let context = context
            .map(|c| sanitize_prompt(c, CONTEXT_MAX_CHARS))
            .unwrap_or_default();

        let key = self.keys.derive(&[question.as_str(), context.as_str()]);
        let prompt = assistant_prompt(&question, Some(&context));
        self.execute(&key, &prompt).await
    }

    /// Generate a citation for `paper` in `style`.
    pub async fn cite(&self, paper: &PaperMetadata, style: CitationStyle) -> Result<AiReply> {
        if paper.title.trim().is_empty() {
            return Err(GatewayError::InvalidRequest("paper title is empty".to_string()));
        }

        // Every field that reaches the prompt takes part in the key
        let year = paper.year.to_string();
        let authors = paper.authors.join(", ");
        let key = self.keys.derive(&[
            style.as_str(),
            paper.title.as_str(),
            authors.as_str(),
            year.as_str(),
            paper.publication.as_str(),
            paper.volume.as_deref().unwrap_or_default(),
            paper.issue.as_deref().unwrap_or_default(),
            paper.pages.as_deref().unwrap_or_default(),
        ]);
        let prompt = citation_prompt(paper, style);
        self.execute(&key, &prompt).await
    }

    /// Condense an abstract into one sentence.
    pub async fn summarize(&self, abstract_text: &str) -> Result<AiReply> {
        let abstract_text = sanitize_prompt(abstract_text, CONTEXT_MAX_CHARS);
        if abstract_text.is_empty() {
            return Err(GatewayError::InvalidRequest("abstract is empty".to_string()));
        }

        let length = abstract_text.chars().count().to_string();
        let key = self
            .keys
            .derive(&["summary", length.as_str(), abstract_text.as_str()]);
        self.execute(&key, &summary_prompt(&abstract_text)).await
    }

    /// Pull bibliographic metadata out of raw paper text, such as the first
    /// page of a PDF.
    ///
    /// Text shorter than [`MIN_SOURCE_CHARS`] after sanitizing is rejected
    /// without touching the quota.
    pub async fn extract_metadata(&self, paper_text: &str) -> Result<PaperMetadata> {
        let text = sanitize_input(paper_text.trim(), DEFAULT_INPUT_MAX_CHARS);
        let length = text.chars().count();
        if length < MIN_SOURCE_CHARS {
            return Err(GatewayError::InvalidRequest(format!(
                "need at least {} characters of paper text, got {}",
                MIN_SOURCE_CHARS, length
            )));
        }

        let excerpt: String = text.chars().take(metadata::SOURCE_MAX_CHARS).collect();
        let length = length.to_string();
        let key = self
            .keys
            .derive(&["metadata", length.as_str(), excerpt.as_str()]);
        let reply = self.execute(&key, &metadata_prompt(&excerpt)).await?;
        parse_metadata_reply(&reply.text, self.current_year())
    }

    /// Daily quota usage.
    pub fn usage(&self) -> UsageStats {
        self.governor.usage_stats()
    }

    fn current_year(&self) -> i32 {
        Utc.timestamp_millis_opt(self.clock.now_millis())
            .single()
            .unwrap_or_else(Utc::now)
            .year()
    }

    async fn execute(&self, key: &str, prompt: &str) -> Result<AiReply> {
        if let Some(text) = self.cache.get(key) {
            debug!("Serving response from cache");
            return Ok(AiReply {
                text,
                source: ReplySource::Cache,
            });
        }

        // Check and record together so concurrent callers cannot overshoot
        if let Permission::Denied { reason, wait_ms } = self.governor.try_acquire() {
            info!("Request blocked: {} (retry in {} ms)", reason, wait_ms);
            return Err(GatewayError::RateLimited { reason, wait_ms });
        }

        match self.generator.generate(prompt).await {
            Ok(text) => {
                self.cache.put(key, text.clone());
                Ok(AiReply {
                    text,
                    source: ReplySource::Upstream,
                })
            }
            Err(e) => {
                warn!("AI request failed: {}", e);
                Err(e)
            }
        }
    }
}
