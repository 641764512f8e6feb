// Gemini API client
// Author: kelexine (https://github.com/kelexine)

use super::{GenerateContentRequest, GenerateContentResponse, TextGenerator};
use crate::config::GeminiConfig;
use crate::error::{GatewayError, Result};
use crate::utils::logging;
use reqwest::Client;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Client for the Gemini `generateContent` endpoint.
///
/// Sends exactly one HTTP request per call. Retrying is left to the caller so
/// every attempt passes through the request governor.
pub struct GeminiClient {
    http_client: Client,
    config: GeminiConfig,
    api_key: String,
    sanitize_logs: bool,
}

impl GeminiClient {
    /// Create a client authenticated with `api_key`.
    pub fn new(config: &GeminiConfig, api_key: impl Into<String>, sanitize_logs: bool) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .use_rustls_tls()
            .build()
            .map_err(|e| GatewayError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config: config.clone(),
            api_key: api_key.into(),
            sanitize_logs,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.default_model
    }

    /// Call `generateContent` and return the raw response.
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.default_model
        );
        debug!("Calling generateContent API for model: {}", self.config.default_model);

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| GatewayError::GeminiApi(format!("HTTP error: {}", self.scrub(&e.to_string()))))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| GatewayError::GeminiApi(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            error!(
                "Gemini API error: HTTP {} - Response body: {}",
                status,
                self.scrub(&response_text)
            );
            let message = Self::extract_error_message(&response_text)
                .unwrap_or_else(|| response_text.clone());
            return Err(GatewayError::GeminiApi(format!(
                "HTTP {}: {}",
                status.as_u16(),
                self.scrub(&message)
            )));
        }

        serde_json::from_str(&response_text).map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            GatewayError::GeminiApi(format!("Response parsing error: {}", e))
        })
    }

    fn extract_error_message(response_text: &str) -> Option<String> {
        #[derive(serde::Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(serde::Deserialize)]
        struct ErrorDetail {
            message: Option<String>,
            status: Option<String>,
        }

        if let Ok(error_resp) = serde_json::from_str::<ErrorResponse>(response_text) {
            if let Some(error) = error_resp.error {
                return error.message.or(error.status);
            }
        }
        None
    }

    fn scrub(&self, text: &str) -> String {
        if self.sanitize_logs {
            logging::redact(text)
        } else {
            text.to_string()
        }
    }
}

impl TextGenerator for GeminiClient {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send {
        let request = GenerateContentRequest::user_prompt(prompt);
        async move {
            let started = Instant::now();
            let outcome = self.generate_content(&request).await;
            let elapsed = started.elapsed().as_secs_f64();

            let response = match outcome {
                Ok(response) => response,
                Err(e) => {
                    crate::metrics::record_gemini_call(self.model(), false, elapsed);
                    return Err(e);
                }
            };

            let text = response.text();
            if text.trim().is_empty() {
                crate::metrics::record_gemini_call(self.model(), false, elapsed);
                let message = match response.finish_reason() {
                    Some(reason) => format!("empty response (finish reason: {})", reason),
                    None => "empty response".to_string(),
                };
                return Err(GatewayError::GeminiApi(message));
            }

            crate::metrics::record_gemini_call(self.model(), true, elapsed);
            Ok(text.trim().to_string())
        }
    }
}
