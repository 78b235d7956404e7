//! OpenAI-compatible chat completion client and its rate-limited wrapper

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use shared::rate_limit::DEFAULT_CACHE_CAPACITY;
use shared::{RateLimitedCache, SlidingWindowLimiter};

use crate::error::LlmFailure;
use crate::traits::LlmClient;
use crate::types::{Completion, CompletionRequest};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat completion client speaking the OpenAI wire format
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), api_key)
    }

    /// Share an existing connection pool
    pub fn with_http_client(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmFailure> {
        let request_start = std::time::Instant::now();

        let request_body = serde_json::json!({
            "model": request.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user }
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LlmFailure::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                401 | 403 => LlmFailure::AuthenticationFailed,
                429 => LlmFailure::RateLimitExceeded {
                    retry_after: retry_after_header(response.headers()),
                },
                503 => LlmFailure::ServiceUnavailable,
                _ => LlmFailure::ServerError(status.to_string()),
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmFailure::InvalidResponse(format!("Failed to parse response: {e}")))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmFailure::InvalidResponse("No content in response".to_string()))?;

        let usage = body.usage.unwrap_or_default();
        debug!(
            "🤖 Completion in {:?} ({} prompt / {} completion tokens)",
            request_start.elapsed(),
            usage.prompt_tokens,
            usage.completion_tokens
        );

        Ok(Completion {
            content,
            model: body.model.unwrap_or_else(|| request.model.clone()),
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
        })
    }
}

/// Seconds from a `Retry-After` header
pub fn retry_after_header(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Language model client whose calls pass through a limiter and a TTL cache
pub struct RateLimitedLlmClient {
    inner: Arc<dyn LlmClient>,
    completions: RateLimitedCache<Completion>,
}

impl RateLimitedLlmClient {
    pub fn new(inner: Arc<dyn LlmClient>, limiter: Arc<SlidingWindowLimiter>, ttl: Duration) -> Self {
        Self {
            inner,
            completions: RateLimitedCache::new(limiter, ttl, DEFAULT_CACHE_CAPACITY),
        }
    }
}

#[async_trait]
impl LlmClient for RateLimitedLlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmFailure> {
        self.completions
            .get_or_fetch(request, || self.inner.complete(request))
            .await
    }
}
