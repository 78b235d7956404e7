//! Orchestrator-specific error types

use thiserror::Error;

use analyzer::AnalyzerError;
use catalog::CatalogError;
use shared::SharedError;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Configuration error: {field}")]
    ConfigurationError { field: String },

    #[error("Content extraction failed: {0}")]
    ExtractionError(#[source] AnalyzerError),

    #[error("Reference analysis failed: {0}")]
    AnalysisError(#[source] AnalyzerError),

    #[error("Catalog service error: {0}")]
    CatalogError(#[from] CatalogError),

    #[error("Snapshot {path} unusable: {reason}")]
    SnapshotError { path: String, reason: String },

    #[error("Run cancelled")]
    Cancelled,

    #[error("Shared component error")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl OrchestratorError {
    pub fn config(field: impl Into<String>) -> Self {
        OrchestratorError::ConfigurationError { field: field.into() }
    }

    /// Errors that end a run in the failed phase rather than as cancelled
    pub fn is_fatal(&self) -> bool {
        !matches!(self, OrchestratorError::Cancelled)
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
