//! Service implementations
//!
//! The Spotify client, its rate-limited wrapper, and the resolver and
//! playlist builder that sit on top of any [`CatalogClient`](crate::traits::CatalogClient).

pub mod playlist_builder;
pub mod rate_limited;
pub mod resolver;
pub mod selection;
pub mod spotify_client;

#[cfg(test)]
pub mod tests;

// Re-export all service implementations
pub use playlist_builder::{default_description, default_playlist_name, to_track_uri, PlaylistBuilder};
pub use rate_limited::RateLimitedCatalogClient;
pub use resolver::CatalogResolver;
pub use selection::{most_popular, select_tracks};
pub use spotify_client::{SpotifyClient, SpotifyCredentials};
