//! Typed catalog records and catalog-side configuration
//!
//! Remote JSON is decoded into these records at the client boundary; nothing
//! past the client sees untyped maps.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use shared::{ReferenceKind, RetryPolicy};

/// Maximum items per playlist mutation accepted by the catalog service
pub const MAX_BATCH_SIZE: usize = 100;

/// Maximum ids per batched track lookup
pub const MAX_TRACK_LOOKUP: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub next: Option<String>,
}

/// Track entry embedded in an album; carries no popularity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumTrack {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

/// Album without its track listing, as embedded in tracks and search results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub images: Vec<Image>,
}

/// Full album record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub tracks: Option<Paging<AlbumTrack>>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

/// Full track record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Local files have no id
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub album: Option<AlbumSummary>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

/// One search result, reduced to what resolution needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub kind: ReferenceKind,
    pub name: String,
    pub artist: String,
}

/// Join artist names the way they are shown to users
pub fn artist_names(artists: &[ArtistRef]) -> String {
    artists
        .iter()
        .map(|artist| artist.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A playlist being built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub description: String,
    pub track_uris: Vec<String>,
}

/// Which tracks of each matched entry go into a playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TrackSelection {
    #[default]
    All,
    MostPopular,
}

impl fmt::Display for TrackSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackSelection::All => write!(f, "all"),
            TrackSelection::MostPopular => write!(f, "most-popular"),
        }
    }
}

impl std::str::FromStr for TrackSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" | "full" => Ok(TrackSelection::All),
            "most-popular" | "most_popular" | "popular" | "sampler" => Ok(TrackSelection::MostPopular),
            _ => Err(format!("Unknown track selection: {s}")),
        }
    }
}

/// Resolution cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub positive_ttl_secs: u64,
    /// "Not found" results expire sooner than hits
    pub negative_ttl_secs: u64,
    pub cache_capacity: usize,
    pub search_limit: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            positive_ttl_secs: 3600,
            negative_ttl_secs: 300,
            cache_capacity: 1000,
            search_limit: 1,
        }
    }
}

impl ResolverConfig {
    pub fn positive_ttl(&self) -> Duration {
        Duration::from_secs(self.positive_ttl_secs)
    }

    pub fn negative_ttl(&self) -> Duration {
        Duration::from_secs(self.negative_ttl_secs)
    }
}

/// Playlist construction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistConfig {
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    pub public: bool,
    pub retry: RetryPolicy,
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            batch_delay_ms: 100,
            public: false,
            retry: RetryPolicy::default(),
        }
    }
}

impl PlaylistConfig {
    /// Batch size clamped to the service ceiling
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.clamp(1, MAX_BATCH_SIZE)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

/// Outcome of one playlist batch, reported as batches complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    /// 1-based
    pub batch: usize,
    pub total_batches: usize,
    pub items: usize,
    pub succeeded: bool,
}

/// Totals of an `add_tracks` call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub added_uris: Vec<String>,
    pub batches_sent: usize,
    pub batches_skipped: usize,
    pub tracks_skipped: usize,
}

impl BatchReport {
    pub fn tracks_added(&self) -> usize {
        self.added_uris.len()
    }
}
