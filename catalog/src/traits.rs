//! Catalog trait definitions for dependency injection

use async_trait::async_trait;

use shared::ReferenceKind;

use crate::error::CatalogResult;
use crate::types::{Album, SearchHit, Track};

/// Music catalog service
///
/// Reads (search and lookups) are safe to cache. Mutations and the current
/// user lookup are only ever rate limited.
#[mockall::automock]
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Search for albums or tracks
    async fn search(&self, query: &str, kind: ReferenceKind, limit: u32) -> CatalogResult<Vec<SearchHit>>;

    /// Full album including its first page of tracks
    async fn get_album(&self, id: &str) -> CatalogResult<Album>;

    async fn get_track(&self, id: &str) -> CatalogResult<Track>;

    /// Batched track lookup, at most 50 ids per call; unknown ids are omitted
    async fn get_tracks(&self, ids: &[String]) -> CatalogResult<Vec<Track>>;

    /// Id of the user that owns created playlists
    async fn current_user_id(&self) -> CatalogResult<String>;

    /// Create an empty playlist and return its id
    async fn create_playlist(&self, user_id: &str, name: &str, description: &str, public: bool) -> CatalogResult<String>;

    /// Append at most 100 track URIs to a playlist
    async fn add_playlist_items(&self, playlist_id: &str, uris: &[String]) -> CatalogResult<()>;
}
