//! Service implementations
//!
//! Real implementations of the analyzer traits plus the text processing that
//! sits between the fetched page and the language model.

pub mod content_extractor;
pub mod link_scanner;
pub mod llm_client;
pub mod reference_extractor;
pub mod text;

#[cfg(test)]
pub mod tests;

// Re-export all service implementations
pub use content_extractor::BrowserContentExtractor;
pub use link_scanner::LinkScanner;
pub use llm_client::{OpenAiClient, RateLimitedLlmClient};
pub use reference_extractor::ReferenceExtractor;
