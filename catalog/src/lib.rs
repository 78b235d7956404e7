//! Catalog library for the page scanning pipeline
//!
//! Resolves extracted references against the music catalog service and builds
//! playlists from the matches, with every outbound call rate limited and every
//! read cached.

pub mod error;
pub mod services;
pub mod traits;
pub mod types;

// Re-export main types
pub use error::{CatalogError, CatalogResult};
pub use services::*;
pub use traits::*;
pub use types::*;
