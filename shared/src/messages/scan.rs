//! Scan results and the JSON artifact written from them

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use serde::{Deserialize, Serialize};

use crate::types::{CatalogMatch, Reference, ReferenceKind};

/// One reference and what it resolved to
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ScanItem {
    Matched {
        reference: Reference,
        entry: CatalogMatch,
    },
    Unmatched {
        reference: Reference,
    },
}

impl ScanItem {
    pub fn reference(&self) -> &Reference {
        match self {
            ScanItem::Matched { reference, .. } | ScanItem::Unmatched { reference } => reference,
        }
    }

    pub fn entry(&self) -> Option<&CatalogMatch> {
        match self {
            ScanItem::Matched { entry, .. } => Some(entry),
            ScanItem::Unmatched { .. } => None,
        }
    }
}

/// Ordered outcome of scanning one page
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScanResult {
    pub source_url: String,
    pub timestamp: DateTime<Utc>,
    pub items: Vec<ScanItem>,
}

impl ScanResult {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            timestamp: Utc::now(),
            items: Vec::new(),
        }
    }

    pub fn push_matched(&mut self, reference: Reference, entry: CatalogMatch) {
        self.items.push(ScanItem::Matched { reference, entry });
    }

    pub fn push_unmatched(&mut self, reference: Reference) {
        self.items.push(ScanItem::Unmatched { reference });
    }

    pub fn matches(&self) -> impl Iterator<Item = &CatalogMatch> {
        self.items.iter().filter_map(ScanItem::entry)
    }

    pub fn matched_count(&self) -> usize {
        self.matches().count()
    }

    pub fn unmatched_count(&self) -> usize {
        self.items.len() - self.matched_count()
    }

    /// One artifact record per distinct catalog entry, in scan order
    ///
    /// A page that both links and names the same entry matches it twice;
    /// only the first match is recorded.
    pub fn records(&self) -> Vec<ScanRecord> {
        let mut seen = HashSet::new();
        self.matches()
            .filter(|entry| seen.insert(entry.catalog_id.as_str()))
            .map(|entry| ScanRecord::from_match(entry, &self.source_url, self.timestamp))
            .collect()
    }
}

/// Persisted record of a resolved item
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScanRecord {
    #[serde(rename = "catalogID")]
    pub catalog_id: String,
    #[serde(default)]
    pub kind: ReferenceKind,
    pub artist: String,
    pub title: String,
    pub popularity: u32,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "sourceURL")]
    pub source_url: String,
    pub timestamp: DateTime<Utc>,
}

impl ScanRecord {
    pub fn from_match(entry: &CatalogMatch, source_url: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            catalog_id: entry.catalog_id.clone(),
            kind: entry.kind,
            artist: entry.canonical_artist.clone(),
            title: entry.canonical_title.clone(),
            popularity: entry.popularity,
            images: entry.images.clone(),
            url: entry.external_url.clone(),
            source_url: source_url.to_string(),
            timestamp,
        }
    }
}
