//! Analyzer configuration and request types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use shared::{ReferenceKind, RetryPolicy};

/// Desktop Chrome on Windows
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Selector that signals the main content has rendered
pub const CONTENT_MARKER: &str = "main, article, [role=main], .article__body";

/// Which strategies feed the reference list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    Links,
    Text,
    #[default]
    Both,
}

impl ExtractionMode {
    pub fn scans_links(&self) -> bool {
        matches!(self, ExtractionMode::Links | ExtractionMode::Both)
    }

    pub fn reads_text(&self) -> bool {
        matches!(self, ExtractionMode::Text | ExtractionMode::Both)
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMode::Links => write!(f, "links"),
            ExtractionMode::Text => write!(f, "text"),
            ExtractionMode::Both => write!(f, "both"),
        }
    }
}

impl std::str::FromStr for ExtractionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "links" | "url" | "urls" => Ok(ExtractionMode::Links),
            "text" | "gpt" | "llm" => Ok(ExtractionMode::Text),
            "both" | "all" => Ok(ExtractionMode::Both),
            _ => Err(format!("Unknown extraction mode: {s}")),
        }
    }
}

/// Reference extraction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub mode: ExtractionMode,
    pub target_kind: ReferenceKind,
    /// Upper bound on characters per chunk
    pub chunk_size: usize,
    /// Chunks analysed at the same time
    pub chunk_concurrency: usize,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub retry: RetryPolicy,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            mode: ExtractionMode::Both,
            target_kind: ReferenceKind::Album,
            chunk_size: 4000,
            chunk_concurrency: 2,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 2000,
            temperature: 0.0,
            retry: RetryPolicy {
                max_attempts: 2,
                ..RetryPolicy::default()
            },
        }
    }
}

/// Headless browser settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserOptions {
    pub headless: bool,
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub navigation_timeout_secs: u64,
    pub content_timeout_secs: u64,
    pub settle_delay_ms: u64,
    pub executable: Option<PathBuf>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            viewport_width: 1920,
            viewport_height: 1080,
            navigation_timeout_secs: 30,
            content_timeout_secs: 30,
            settle_delay_ms: 2000,
            executable: None,
        }
    }
}

impl BrowserOptions {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn content_timeout(&self) -> Duration {
        Duration::from_secs(self.content_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Lifecycle of the browser owned by a content extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorState {
    Uninitialized,
    BrowserLaunched,
    ContextReady,
    PageLoaded,
    Closed,
}

/// One chat completion request; serialized as the cache key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Text returned by the language model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub content: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}
