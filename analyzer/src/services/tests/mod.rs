//! Tests for analyzer services
//!
//! External services are replaced with mockall mocks or a wiremock server.

pub mod llm_client;

// Re-export test utilities
pub use crate::traits::*;

/// Completion carrying the given model output
pub fn completion(content: &str) -> crate::types::Completion {
    crate::types::Completion {
        content: content.to_string(),
        model: "test-model".to_string(),
        prompt_tokens: 10,
        completion_tokens: 10,
    }
}
