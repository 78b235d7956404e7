//! Orchestrator library for the page scanning pipeline
//!
//! Wires the content extractor, reference extractor, catalog resolver and
//! playlist builder into one cancellable run that streams progress events.
//! Service clients come from an explicitly owned [`ClientRegistry`].

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod progress;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use config::{PipelineConfig, RateLimits, ServiceLimits};
pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::{Orchestrator, PlaylistOptions, RunOptions, RunSummary};
pub use progress::ProgressReporter;
pub use services::{ClientRegistry, EnvCredentialSource, RealClientFactory, RealFileSystem};
pub use traits::{ClientFactory, CredentialSource, Credentials, FileSystem, LlmCredentials, RequiredKeyMissing};
pub use traits::{MockClientFactory, MockCredentialSource, MockFileSystem};
