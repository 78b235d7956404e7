//! Catalog error types

use std::time::Duration;
use thiserror::Error;

use shared::Retryable;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Authentication failed: {message}")]
    AuthenticationError { message: String },

    #[error("Rate limited by catalog service")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Catalog API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse catalog response: {message}")]
    ParseError { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Playlist batch {batch} failed: {reason}")]
    MutationError { batch: usize, reason: String },
}

impl Retryable for CatalogError {
    fn is_retryable(&self) -> bool {
        match self {
            CatalogError::NetworkError { .. } | CatalogError::RateLimited { .. } => true,
            CatalogError::ApiError { status, .. } => *status >= 500,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            CatalogError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}
