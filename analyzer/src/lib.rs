//! Analyzer library for the page scanning pipeline
//!
//! Fetches rendered pages through a headless browser and turns their content
//! into deduplicated music references, from catalog links found in the markup
//! and from language-model reading of the cleaned text.

pub mod error;
pub mod services;
pub mod traits;
pub mod types;

// Re-export main types
pub use error::{AnalyzerError, AnalyzerResult, LlmFailure};
pub use services::*;
pub use traits::*;
pub use types::*;
