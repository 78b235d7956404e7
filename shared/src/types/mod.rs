//! Core types used throughout the scanning pipeline

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Identifier attached to every log line emitted during one pipeline run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The short form keeps log lines readable
        let full = self.0.simple().to_string();
        write!(f, "run_{}", &full[..8])
    }
}

/// What a reference points at in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Song,
    #[default]
    Album,
}

impl ReferenceKind {
    /// Path segment and search type used by the catalog service
    pub fn catalog_type(&self) -> &'static str {
        match self {
            ReferenceKind::Song => "track",
            ReferenceKind::Album => "album",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Song => write!(f, "song"),
            ReferenceKind::Album => write!(f, "album"),
        }
    }
}

impl std::str::FromStr for ReferenceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "song" | "track" => Ok(ReferenceKind::Song),
            "album" => Ok(ReferenceKind::Album),
            _ => Err(format!("Unknown reference kind: {s}")),
        }
    }
}

/// A music reference found on a page, not yet resolved against the catalog.
///
/// References read from catalog links carry the identifier they were read
/// from and have no artist or title yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub kind: ReferenceKind,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_id: Option<String>,
}

/// Deduplication key of a [`Reference`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReferenceIdentity {
    Linked(ReferenceKind, String),
    Named(String, String),
}

impl Reference {
    pub fn named(kind: ReferenceKind, artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            kind,
            artist: artist.into(),
            title: title.into(),
            catalog_id: None,
        }
    }

    pub fn linked(kind: ReferenceKind, catalog_id: impl Into<String>) -> Self {
        Self {
            kind,
            artist: String::new(),
            title: String::new(),
            catalog_id: Some(catalog_id.into()),
        }
    }

    pub fn is_linked(&self) -> bool {
        self.catalog_id.is_some()
    }

    pub fn identity(&self) -> ReferenceIdentity {
        match &self.catalog_id {
            Some(id) => ReferenceIdentity::Linked(self.kind, id.clone()),
            None => ReferenceIdentity::Named(normalize(&self.artist), normalize(&self.title)),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.catalog_id {
            Some(id) => write!(f, "{}:{}", self.kind.catalog_type(), id),
            None => write!(f, "{} - {}", self.artist, self.title),
        }
    }
}

/// Case-fold and collapse whitespace
pub fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Drop references whose identity was already seen, keeping first-seen order
pub fn dedup_references<I>(references: I) -> Vec<Reference>
where
    I: IntoIterator<Item = Reference>,
{
    let mut seen = HashSet::new();
    references
        .into_iter()
        .filter(|reference| seen.insert(reference.identity()))
        .collect()
}

/// A track as returned by the catalog service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRef {
    pub catalog_id: String,
    pub name: String,
    pub popularity: u32,
}

/// A catalog entry a reference resolved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogMatch {
    pub catalog_id: String,
    pub kind: ReferenceKind,
    pub canonical_artist: String,
    pub canonical_title: String,
    pub popularity: u32,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tracks: Vec<TrackRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
}
