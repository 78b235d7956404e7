//! Reference resolution against the catalog service

use std::sync::Arc;
use tracing::{debug, info, warn};

use shared::{CatalogMatch, Reference, ReferenceIdentity, ReferenceKind, TrackRef, TtlCache};

use crate::error::CatalogResult;
use crate::traits::CatalogClient;
use crate::types::{artist_names, Album, Image, ResolverConfig, Track, MAX_TRACK_LOOKUP};

/// Resolves references to catalog entries, caching hits and misses
///
/// Hits live for the positive TTL and misses for the shorter negative TTL.
/// Service failures count as misses for the caller but are never cached, so
/// the next call tries again.
pub struct CatalogResolver {
    client: Arc<dyn CatalogClient>,
    config: ResolverConfig,
    resolutions: TtlCache<(ReferenceKind, ReferenceIdentity), Option<CatalogMatch>>,
    details: TtlCache<(ReferenceKind, String), CatalogMatch>,
}

impl CatalogResolver {
    pub fn new(client: Arc<dyn CatalogClient>, config: ResolverConfig) -> Self {
        Self {
            resolutions: TtlCache::new(config.positive_ttl(), config.cache_capacity),
            details: TtlCache::new(config.positive_ttl(), config.cache_capacity),
            client,
            config,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Catalog entry for `reference`, or `None` when nothing matches
    pub async fn resolve(&self, reference: &Reference) -> Option<CatalogMatch> {
        let key = (reference.kind, reference.identity());
        if let Some(cached) = self.resolutions.get(&key).await {
            debug!("💾 Resolution cache hit for {}", reference);
            return cached;
        }

        match self.lookup(reference).await {
            Ok(resolution) => {
                let ttl = match resolution {
                    Some(_) => self.config.positive_ttl(),
                    None => self.config.negative_ttl(),
                };
                self.resolutions.insert_with_ttl(key, resolution.clone(), ttl).await;
                resolution
            }
            Err(e) => {
                warn!("⚠️ Lookup for {} failed, treating as not found: {}", reference, e);
                None
            }
        }
    }

    /// Resolve a free-text `artist` / `title` pair
    pub async fn resolve_named(&self, kind: ReferenceKind, artist: &str, title: &str) -> Option<CatalogMatch> {
        self.resolve(&Reference::named(kind, artist, title)).await
    }

    async fn lookup(&self, reference: &Reference) -> CatalogResult<Option<CatalogMatch>> {
        if let Some(id) = &reference.catalog_id {
            return Ok(Some(self.get_details(reference.kind, id).await?));
        }

        let hit = match self.search(reference).await? {
            Some(hit) => hit,
            None => {
                info!("🔍 No catalog match for {}", reference);
                return Ok(None);
            }
        };

        Ok(Some(self.get_details(reference.kind, &hit).await?))
    }

    /// Id of the first hit of the exact query, else of the looser query
    async fn search(&self, reference: &Reference) -> CatalogResult<Option<String>> {
        let limit = self.config.search_limit.max(1);

        let exact = exact_query(reference.kind, &reference.artist, &reference.title);
        let hits = self.client.search(&exact, reference.kind, limit).await?;
        if let Some(hit) = hits.into_iter().next() {
            return Ok(Some(hit.id));
        }

        let fuzzy = fuzzy_query(&reference.artist, &reference.title);
        debug!("Exact query empty, trying {:?}", fuzzy);
        let hits = self.client.search(&fuzzy, reference.kind, limit).await?;
        Ok(hits.into_iter().next().map(|hit| hit.id))
    }

    /// Full catalog entry for `id`, cached for the positive TTL
    pub async fn get_details(&self, kind: ReferenceKind, id: &str) -> CatalogResult<CatalogMatch> {
        let key = (kind, id.to_string());
        if let Some(cached) = self.details.get(&key).await {
            return Ok(cached);
        }

        let entry = match kind {
            ReferenceKind::Album => self.album_details(id).await?,
            ReferenceKind::Song => track_match(self.client.get_track(id).await?, id),
        };

        self.details.insert(key, entry.clone()).await;
        Ok(entry)
    }

    async fn album_details(&self, id: &str) -> CatalogResult<CatalogMatch> {
        let album = self.client.get_album(id).await?;

        let listed: Vec<(String, String)> = album
            .tracks
            .as_ref()
            .map(|page| {
                page.items
                    .iter()
                    .filter_map(|track| Some((track.id.clone()?, track.name.clone())))
                    .collect()
            })
            .unwrap_or_default();

        // Album listings carry no popularity, so look the tracks up in batches
        let ids: Vec<String> = listed.iter().map(|(id, _)| id.clone()).collect();
        let mut popularity = std::collections::HashMap::new();
        for batch in ids.chunks(MAX_TRACK_LOOKUP) {
            for track in self.client.get_tracks(batch).await? {
                if let Some(track_id) = track.id {
                    popularity.insert(track_id, track.popularity.unwrap_or(0));
                }
            }
        }

        let tracks = listed
            .into_iter()
            .map(|(catalog_id, name)| TrackRef {
                popularity: popularity.get(&catalog_id).copied().unwrap_or(0),
                catalog_id,
                name,
            })
            .collect();

        Ok(album_match(album, tracks))
    }
}

fn image_urls(images: &[Image]) -> Vec<String> {
    images.iter().map(|image| image.url.clone()).collect()
}

fn album_match(album: Album, tracks: Vec<TrackRef>) -> CatalogMatch {
    CatalogMatch {
        canonical_artist: artist_names(&album.artists),
        popularity: album.popularity.unwrap_or(0),
        images: image_urls(&album.images),
        external_url: album.external_urls.spotify,
        catalog_id: album.id,
        kind: ReferenceKind::Album,
        canonical_title: album.name,
        tracks,
    }
}

fn track_match(track: Track, requested_id: &str) -> CatalogMatch {
    let catalog_id = track.id.clone().unwrap_or_else(|| requested_id.to_string());
    let popularity = track.popularity.unwrap_or(0);

    CatalogMatch {
        canonical_artist: artist_names(&track.artists),
        images: track
            .album
            .as_ref()
            .map(|album| image_urls(&album.images))
            .unwrap_or_default(),
        external_url: track.external_urls.spotify,
        tracks: vec![TrackRef {
            catalog_id: catalog_id.clone(),
            name: track.name.clone(),
            popularity,
        }],
        kind: ReferenceKind::Song,
        canonical_title: track.name,
        catalog_id,
        popularity,
    }
}

/// Make a free-text term safe for the catalog query syntax
pub fn sanitize_term(term: &str) -> String {
    term.replace(['/', '\\'], " ")
        .replace('$', "s")
        .replace('"', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Field-qualified query, e.g. `album:"Homogenic" artist:"Björk"`
pub fn exact_query(kind: ReferenceKind, artist: &str, title: &str) -> String {
    format!(
        "{}:\"{}\" artist:\"{}\"",
        kind.catalog_type(),
        sanitize_term(title),
        sanitize_term(artist)
    )
}

/// Unqualified fallback query
pub fn fuzzy_query(artist: &str, title: &str) -> String {
    format!("{} {}", sanitize_term(artist), sanitize_term(title))
}
