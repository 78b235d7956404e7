//! Trait definitions with mockall annotations for testing
//!
//! Everything the orchestrator reaches outside the process through is a trait
//! here, so tests can swap in mocks.

use std::path::Path;
use std::sync::Arc;

use analyzer::LlmClient;
use catalog::{CatalogClient, SpotifyCredentials};
use shared::{ScanRecord, ScanResult};

use crate::error::{OrchestratorError, OrchestratorResult};

/// Error when required credentials are missing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredKeyMissing {
    /// Every missing variable, in lookup order
    pub missing: Vec<String>,
    pub message: String,
}

/// Language model service settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmCredentials {
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

/// Everything needed to talk to the external services
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub catalog: SpotifyCredentials,
    /// Absent when no model key is configured; only text reading needs it
    pub llm: Option<LlmCredentials>,
}

impl Credentials {
    pub const LLM_KEY: &'static str = "OPENAI_API_KEY";

    /// Model settings, or a configuration error naming the missing key
    pub fn require_llm(&self) -> OrchestratorResult<&LlmCredentials> {
        self.llm.as_ref().ok_or_else(|| {
            OrchestratorError::config(format!(
                "Missing required keys: {}. Text extraction needs a language model key.",
                Self::LLM_KEY
            ))
        })
    }
}

/// Credential source abstraction for dependency injection
#[mockall::automock]
#[async_trait::async_trait]
pub trait CredentialSource: Send + Sync {
    /// Load and validate credentials
    ///
    /// # Returns
    /// Credentials, or RequiredKeyMissing naming every missing key
    async fn load_credentials(&self) -> Result<Credentials, RequiredKeyMissing>;
}

/// Builds the service clients held by the registry
///
/// Called at most once per client between registry cleanups.
#[mockall::automock]
#[async_trait::async_trait]
pub trait ClientFactory: Send + Sync {
    /// Shared HTTP connection pool
    async fn http_client(&self) -> OrchestratorResult<reqwest::Client>;

    async fn catalog_client(
        &self,
        credentials: &Credentials,
        http: reqwest::Client,
    ) -> OrchestratorResult<Arc<dyn CatalogClient>>;

    async fn llm_client(
        &self,
        credentials: &Credentials,
        http: reqwest::Client,
    ) -> OrchestratorResult<Arc<dyn LlmClient>>;
}

/// File system abstraction for scan snapshots
#[mockall::automock]
#[async_trait::async_trait]
pub trait FileSystem: Send + Sync {
    /// Write the scan artifact, backing up any file already at `path`
    async fn write_snapshot(&self, path: &Path, scan: &ScanResult) -> OrchestratorResult<()>;

    /// Read a previously written artifact
    async fn read_snapshot(&self, path: &Path) -> OrchestratorResult<Vec<ScanRecord>>;
}
