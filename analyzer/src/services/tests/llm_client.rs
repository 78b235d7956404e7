//! Tests for the OpenAI client and its rate-limited wrapper

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use shared::SlidingWindowLimiter;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::completion;
use crate::error::LlmFailure;
use crate::services::llm_client::{OpenAiClient, RateLimitedLlmClient};
use crate::traits::{LlmClient, MockLlmClient};
use crate::types::CompletionRequest;

fn request(user: &str) -> CompletionRequest {
    CompletionRequest {
        model: "gpt-4o-mini".to_string(),
        system: "extract".to_string(),
        user: user.to_string(),
        temperature: 0.0,
        max_tokens: 2000,
    }
}

#[tokio::test]
async fn test_openai_completion_parsing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model": "gpt-4o-mini",
            "choices": [{ "message": { "role": "assistant", "content": "Can - Ege Bamyasi" } }],
            "usage": { "prompt_tokens": 42, "completion_tokens": 7, "total_tokens": 49 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiClient::new("test-key").with_base_url(server.uri());

    let completion = client.complete(&request("text")).await.unwrap();

    assert_eq!(completion.content, "Can - Ege Bamyasi");
    assert_eq!(completion.prompt_tokens, 42);
    assert_eq!(completion.completion_tokens, 7);
}

#[tokio::test]
async fn test_openai_status_mapping() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "12"))
        .mount(&server)
        .await;

    let client = OpenAiClient::new("test-key").with_base_url(server.uri());

    let result = client.complete(&request("text")).await;

    assert_eq!(
        result.unwrap_err(),
        LlmFailure::RateLimitExceeded {
            retry_after: Some(Duration::from_secs(12))
        }
    );
}

#[tokio::test]
async fn test_openai_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = OpenAiClient::new("bad-key").with_base_url(server.uri());

    assert_matches!(
        client.complete(&request("text")).await,
        Err(LlmFailure::AuthenticationFailed)
    );
}

#[tokio::test]
async fn test_openai_missing_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
        .mount(&server)
        .await;

    let client = OpenAiClient::new("test-key").with_base_url(server.uri());

    assert_matches!(
        client.complete(&request("text")).await,
        Err(LlmFailure::InvalidResponse(_))
    );
}

#[tokio::test]
async fn test_rate_limited_client_caches_identical_requests() {
    let mut inner = MockLlmClient::new();
    inner
        .expect_complete()
        .times(2)
        .returning(|request| Ok(completion(&format!("echo {}", request.user))));

    let limiter = Arc::new(SlidingWindowLimiter::new(50, Duration::from_secs(60)));
    let client = RateLimitedLlmClient::new(Arc::new(inner), limiter.clone(), Duration::from_secs(3600));

    let first = client.complete(&request("a")).await.unwrap();
    let again = client.complete(&request("a")).await.unwrap();
    let other = client.complete(&request("b")).await.unwrap();

    assert_eq!(first, again);
    assert_eq!(other.content, "echo b");
    assert_eq!(limiter.recent_calls().await, 2);
}
