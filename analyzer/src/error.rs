//! Analyzer error types

use std::time::Duration;
use thiserror::Error;

use shared::Retryable;

/// Result type for analyzer operations
pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

/// Analyzer error types
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Extraction failed for {url}: {reason}")]
    ExtractionError { url: String, reason: String },

    #[error("Navigation to {url} timed out after {timeout:?}")]
    NavigationTimeout { url: String, timeout: Duration },

    #[error("{url} responded with HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("No renderable content on {url} after {timeout:?}")]
    ContentTimeout { url: String, timeout: Duration },

    #[error("Page {url} rendered no content")]
    EmptyContent { url: String },

    #[error("Browser error: {message}")]
    BrowserError { message: String },

    #[error("Analysis of chunk {chunk} failed: {reason}")]
    AnalysisError { chunk: usize, reason: String },

    #[error("LLM request failed: {0}")]
    LlmError(#[from] LlmFailure),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

impl AnalyzerError {
    pub fn browser(err: impl std::fmt::Display) -> Self {
        AnalyzerError::BrowserError {
            message: err.to_string(),
        }
    }

    /// Errors raised while fetching the page, as opposed to analysing it
    pub fn is_extraction(&self) -> bool {
        matches!(
            self,
            AnalyzerError::ExtractionError { .. }
                | AnalyzerError::NavigationTimeout { .. }
                | AnalyzerError::HttpStatus { .. }
                | AnalyzerError::ContentTimeout { .. }
                | AnalyzerError::EmptyContent { .. }
                | AnalyzerError::BrowserError { .. }
        )
    }
}

/// Failure of a single language-model request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmFailure {
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("rate limit exceeded")]
    RateLimitExceeded { retry_after: Option<Duration> },

    #[error("service unavailable")]
    ServiceUnavailable,

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("server error: {0}")]
    ServerError(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl Retryable for LlmFailure {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmFailure::RateLimitExceeded { .. }
                | LlmFailure::ServiceUnavailable
                | LlmFailure::NetworkError(_)
                | LlmFailure::ServerError(_)
        )
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmFailure::RateLimitExceeded { retry_after } => *retry_after,
            _ => None,
        }
    }
}
