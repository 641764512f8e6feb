// Gateway flow tests with a scripted generator
// Author: kelexine (https://github.com/kelexine)

use parking_lot::Mutex;
use rhgate::config::AppConfig;
use rhgate::error::{GatewayError, Result};
use rhgate::gateway::{AiGateway, CitationStyle, PaperMetadata, ReplySource};
use rhgate::gemini::TextGenerator;
use rhgate::governor::DenialReason;
use rhgate::storage::MemoryStore;
use rhgate::utils::ManualClock;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Replays canned outcomes and remembers every prompt it was given.
#[derive(Default)]
struct ScriptedGenerator {
    outcomes: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn replying(outcomes: Vec<Result<String>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.prompts.lock().len()
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send {
        self.prompts.lock().push(prompt.to_string());
        let outcome = self
            .outcomes
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok("default reply".to_string()));
        async move { outcome }
    }
}

fn gateway(outcomes: Vec<Result<String>>) -> (AiGateway<ScriptedGenerator>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let gateway = AiGateway::from_config(
        ScriptedGenerator::replying(outcomes),
        &AppConfig::default(),
        clock.clone(),
        Arc::new(MemoryStore::new()),
    );
    (gateway, clock)
}

fn paper() -> PaperMetadata {
    PaperMetadata {
        title: "Deep Residual Learning for Image Recognition".to_string(),
        authors: vec!["He, K.".to_string(), "Zhang, X.".to_string()],
        publication: "CVPR".to_string(),
        year: 2016,
        volume: None,
        issue: None,
        pages: Some("770-778".to_string()),
    }
}

#[tokio::test]
async fn test_repeat_question_is_served_from_cache() {
    let (gateway, _) = gateway(vec![Ok("A transformer is...".to_string())]);

    let first = gateway.ask("What is a transformer?", None).await.unwrap();
    assert_eq!(first.source, ReplySource::Upstream);
    assert_eq!(first.text, "A transformer is...");

    // Inside the cooldown, but the cache answers without asking the governor
    let second = gateway.ask("What is a transformer?", None).await.unwrap();
    assert_eq!(second.source, ReplySource::Cache);
    assert_eq!(second.text, first.text);

    assert_eq!(gateway.generator().calls(), 1);
    assert_eq!(gateway.usage().used, 1);
}

#[tokio::test]
async fn test_context_changes_the_cache_key() {
    let (gateway, clock) = gateway(vec![]);

    gateway.ask("Summarize", Some("Abstract A")).await.unwrap();
    clock.advance(Duration::from_secs(10));
    let reply = gateway.ask("Summarize", Some("Abstract B")).await.unwrap();

    assert_eq!(reply.source, ReplySource::Upstream);
    assert_eq!(gateway.generator().calls(), 2);
    assert!(gateway.generator().prompts.lock()[1].contains("Abstract B"));
}

#[tokio::test]
async fn test_cooldown_blocks_without_calling_upstream() {
    let (gateway, _) = gateway(vec![]);

    gateway.ask("first question", None).await.unwrap();
    let err = gateway.ask("second question", None).await.unwrap_err();

    match err {
        GatewayError::RateLimited { reason, wait_ms } => {
            assert_eq!(reason, DenialReason::Cooldown);
            assert!(wait_ms > 0);
        }
        other => panic!("expected rate limit, got {:?}", other),
    }
    assert_eq!(gateway.generator().calls(), 1);
}

#[tokio::test]
async fn test_failed_call_consumes_quota_and_is_not_cached() {
    let (gateway, clock) = gateway(vec![
        Err(GatewayError::GeminiApi("HTTP 500: boom".to_string())),
        Ok("second try".to_string()),
    ]);

    let err = gateway.ask("Explain p-values", None).await.unwrap_err();
    assert!(matches!(err, GatewayError::GeminiApi(_)));
    assert_eq!(gateway.usage().used, 1);
    assert!(gateway.cache().is_empty());

    clock.advance(Duration::from_secs(6));
    let reply = gateway.ask("Explain p-values", None).await.unwrap();
    assert_eq!(reply.text, "second try");
    assert_eq!(gateway.generator().calls(), 2);
    assert_eq!(gateway.usage().used, 2);
}

#[tokio::test]
async fn test_empty_question_is_rejected() {
    let (gateway, _) = gateway(vec![]);

    let err = gateway.ask("   {{template}}  ", None).await.unwrap_err();
    assert!(matches!(err, GatewayError::InvalidRequest(_)));
    assert_eq!(gateway.generator().calls(), 0);
    assert_eq!(gateway.usage().used, 0);
}

#[tokio::test]
async fn test_question_is_sanitized_before_sending() {
    let (gateway, _) = gateway(vec![]);

    gateway
        .ask("What is ${secret} attention?<script>x()</script>", None)
        .await
        .unwrap();

    let prompt = gateway.generator().prompts.lock()[0].clone();
    assert!(prompt.ends_with("User question: What is  attention?"));
    assert!(!prompt.contains("Current context"));
}

#[tokio::test]
async fn test_citation_is_cached_per_style() {
    let (gateway, clock) = gateway(vec![
        Ok("He, K., & Zhang, X. (2016).".to_string()),
        Ok("[1] K. He and X. Zhang, 2016.".to_string()),
    ]);

    let apa = gateway.cite(&paper(), CitationStyle::Apa7).await.unwrap();
    clock.advance(Duration::from_secs(6));
    let ieee = gateway.cite(&paper(), CitationStyle::Ieee).await.unwrap();
    let apa_again = gateway.cite(&paper(), CitationStyle::Apa7).await.unwrap();

    assert_eq!(apa.source, ReplySource::Upstream);
    assert_eq!(ieee.source, ReplySource::Upstream);
    assert_eq!(apa_again.source, ReplySource::Cache);
    assert_eq!(apa_again.text, apa.text);
    assert_eq!(gateway.generator().calls(), 2);
    assert!(gateway.generator().prompts.lock()[0].contains("**APA7**"));
    assert!(gateway.generator().prompts.lock()[1].contains("Pages: 770-778"));
}

#[tokio::test]
async fn test_cached_reply_expires() {
    let (gateway, clock) = gateway(vec![]);

    gateway.ask("What is RAG?", None).await.unwrap();
    clock.advance(Duration::from_secs(30 * 60));
    let reply = gateway.ask("What is RAG?", None).await.unwrap();

    assert_eq!(reply.source, ReplySource::Upstream);
    assert_eq!(gateway.generator().calls(), 2);
}

#[tokio::test]
async fn test_changed_pages_produce_a_new_citation() {
    let (gateway, clock) = gateway(vec![
        Ok("He, K., & Zhang, X. (2016). CVPR, 770-778.".to_string()),
        Ok("He, K., & Zhang, X. (2016). CVPR, 770-779.".to_string()),
    ]);

    let first = gateway.cite(&paper(), CitationStyle::Apa7).await.unwrap();
    clock.advance(Duration::from_secs(6));

    let corrected = PaperMetadata {
        pages: Some("770-779".to_string()),
        ..paper()
    };
    let second = gateway.cite(&corrected, CitationStyle::Apa7).await.unwrap();

    assert_eq!(second.source, ReplySource::Upstream);
    assert_ne!(second.text, first.text);
    assert_eq!(gateway.generator().calls(), 2);
    assert!(gateway.generator().prompts.lock()[1].contains("Pages: 770-779"));
}

#[tokio::test]
async fn test_summarize_is_cached() {
    let (gateway, _) = gateway(vec![Ok("Residual connections ease training.".to_string())]);
    let abstract_text = "Deeper neural networks are more difficult to train. We present a residual learning framework.";

    let first = gateway.summarize(abstract_text).await.unwrap();
    let second = gateway.summarize(abstract_text).await.unwrap();

    assert_eq!(first.source, ReplySource::Upstream);
    assert_eq!(second.source, ReplySource::Cache);
    assert_eq!(gateway.generator().calls(), 1);
    assert!(gateway.generator().prompts.lock()[0]
        .starts_with("Summarize this academic abstract into one concise sentence:"));

    let err = gateway.summarize("  ").await.unwrap_err();
    assert!(matches!(err, GatewayError::InvalidRequest(_)));
}

const FIRST_PAGE: &str = "Deep Residual Learning for Image Recognition. Kaiming He, Xiangyu Zhang. \
                          Microsoft Research. CVPR 2016, pages 770-778.";

#[tokio::test]
async fn test_extract_metadata_validates_reply() {
    let (gateway, _) = gateway(vec![Ok(r#"```json
{"title": "Deep Residual Learning for Image Recognition", "authors": ["Kaiming He", "Xiangyu Zhang"],
 "year": 1776, "journal": "CVPR", "pages": "770-778"}
```"#
        .to_string())]);

    let metadata = gateway.extract_metadata(FIRST_PAGE).await.unwrap();

    assert_eq!(metadata.title, "Deep Residual Learning for Image Recognition");
    assert_eq!(metadata.authors, vec!["Kaiming He", "Xiangyu Zhang"]);
    assert_eq!(metadata.publication, "CVPR");
    assert_eq!(metadata.pages.as_deref(), Some("770-778"));
    // 1_700_000_000_000 ms is in November 2023
    assert_eq!(metadata.year, 2023);

    let prompt = gateway.generator().prompts.lock()[0].clone();
    assert!(prompt.starts_with("Extract paper metadata as JSON:"));
    assert!(prompt.contains("Kaiming He, Xiangyu Zhang"));
    assert_eq!(gateway.usage().used, 1);
}

#[tokio::test]
async fn test_extract_metadata_rejects_short_text() {
    let (gateway, _) = gateway(vec![]);

    let err = gateway.extract_metadata("Too short <b>x</b>").await.unwrap_err();
    assert!(matches!(err, GatewayError::InvalidRequest(_)));
    assert_eq!(gateway.generator().calls(), 0);
    assert_eq!(gateway.usage().used, 0);
}

#[tokio::test]
async fn test_extract_metadata_is_rate_limited() {
    let (gateway, _) = gateway(vec![]);

    gateway.ask("What is a ResNet?", None).await.unwrap();
    let err = gateway.extract_metadata(FIRST_PAGE).await.unwrap_err();

    assert!(matches!(
        err,
        GatewayError::RateLimited {
            reason: DenialReason::Cooldown,
            ..
        }
    ));
    assert_eq!(gateway.generator().calls(), 1);
}
