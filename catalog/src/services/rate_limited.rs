//! Catalog client wrapper that rate limits every call and caches reads

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use shared::rate_limit::DEFAULT_CACHE_CAPACITY;
use shared::{RateLimitedCache, ReferenceKind, SlidingWindowLimiter};

use crate::error::CatalogResult;
use crate::traits::CatalogClient;
use crate::types::{Album, SearchHit, Track};

/// Rate-limited, caching front for a [`CatalogClient`]
///
/// All per-operation caches draw from the same limiter, so the window bounds
/// the service as a whole rather than each operation.
pub struct RateLimitedCatalogClient {
    inner: Arc<dyn CatalogClient>,
    searches: RateLimitedCache<Vec<SearchHit>>,
    albums: RateLimitedCache<Album>,
    tracks: RateLimitedCache<Track>,
    track_batches: RateLimitedCache<Vec<Track>>,
    mutations: RateLimitedCache<()>,
}

impl RateLimitedCatalogClient {
    pub fn new(inner: Arc<dyn CatalogClient>, limiter: Arc<SlidingWindowLimiter>, ttl: Duration) -> Self {
        Self {
            inner,
            searches: RateLimitedCache::new(limiter.clone(), ttl, DEFAULT_CACHE_CAPACITY),
            albums: RateLimitedCache::new(limiter.clone(), ttl, DEFAULT_CACHE_CAPACITY),
            tracks: RateLimitedCache::new(limiter.clone(), ttl, DEFAULT_CACHE_CAPACITY),
            track_batches: RateLimitedCache::new(limiter.clone(), ttl, DEFAULT_CACHE_CAPACITY),
            mutations: RateLimitedCache::new(limiter, ttl, 1),
        }
    }

    pub fn limiter(&self) -> &Arc<SlidingWindowLimiter> {
        self.searches.limiter()
    }

    /// Drop every cached read
    pub async fn clear(&self) {
        self.searches.clear().await;
        self.albums.clear().await;
        self.tracks.clear().await;
        self.track_batches.clear().await;
    }
}

#[async_trait]
impl CatalogClient for RateLimitedCatalogClient {
    async fn search(&self, query: &str, kind: ReferenceKind, limit: u32) -> CatalogResult<Vec<SearchHit>> {
        self.searches
            .get_or_fetch(&(query, kind, limit), || self.inner.search(query, kind, limit))
            .await
    }

    async fn get_album(&self, id: &str) -> CatalogResult<Album> {
        self.albums.get_or_fetch(id, || self.inner.get_album(id)).await
    }

    async fn get_track(&self, id: &str) -> CatalogResult<Track> {
        self.tracks.get_or_fetch(id, || self.inner.get_track(id)).await
    }

    async fn get_tracks(&self, ids: &[String]) -> CatalogResult<Vec<Track>> {
        self.track_batches
            .get_or_fetch(ids, || self.inner.get_tracks(ids))
            .await
    }

    async fn current_user_id(&self) -> CatalogResult<String> {
        self.mutations.throttle(|| self.inner.current_user_id()).await
    }

    async fn create_playlist(&self, user_id: &str, name: &str, description: &str, public: bool) -> CatalogResult<String> {
        self.mutations
            .throttle(|| self.inner.create_playlist(user_id, name, description, public))
            .await
    }

    async fn add_playlist_items(&self, playlist_id: &str, uris: &[String]) -> CatalogResult<()> {
        self.mutations
            .throttle(|| self.inner.add_playlist_items(playlist_id, uris))
            .await
    }
}
