//! Service implementations
//!
//! This module contains real implementations of all service traits, plus the
//! client registry built on top of them.

pub mod api_keys;
pub mod client_factory;
pub mod client_registry;
pub mod file_system;

#[cfg(test)]
pub mod tests;

// Re-export all service implementations
pub use api_keys::EnvCredentialSource;
pub use client_factory::RealClientFactory;
pub use client_registry::ClientRegistry;
pub use file_system::RealFileSystem;
