//! Analyzer trait definitions for dependency injection

use async_trait::async_trait;

use crate::error::{AnalyzerResult, LlmFailure};
use crate::types::{Completion, CompletionRequest};

/// Fetches the fully rendered markup of a page
#[mockall::automock]
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Navigate to `url` and return the rendered HTML
    async fn extract(&self, url: &str) -> AnalyzerResult<String>;

    /// Release the browser; a later `extract` starts a new one
    async fn cleanup(&self) -> AnalyzerResult<()>;
}

/// Chat-completion style language model client
#[mockall::automock]
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmFailure>;
}
