//! Tests for catalog services
//!
//! The catalog service is replaced with mockall mocks or a wiremock server.


use shared::{CatalogMatch, ReferenceKind, TrackRef};

use crate::types::{Album, AlbumSummary, AlbumTrack, ArtistRef, ExternalUrls, Image, Paging, SearchHit, Track};

pub fn artist(name: &str) -> ArtistRef {
    ArtistRef {
        id: None,
        name: name.to_string(),
    }
}

pub fn hit(id: &str, kind: ReferenceKind) -> SearchHit {
    SearchHit {
        id: id.to_string(),
        kind,
        name: "hit".to_string(),
        artist: "artist".to_string(),
    }
}

/// Album listing the given track ids
pub fn album(id: &str, name: &str, artist_name: &str, track_ids: &[String]) -> Album {
    Album {
        id: id.to_string(),
        name: name.to_string(),
        artists: vec![artist(artist_name)],
        popularity: Some(61),
        images: vec![Image {
            url: format!("https://i.scdn.co/image/{id}"),
            width: Some(640),
            height: Some(640),
        }],
        tracks: Some(Paging {
            items: track_ids
                .iter()
                .map(|track_id| AlbumTrack {
                    id: Some(track_id.clone()),
                    name: format!("Track {track_id}"),
                })
                .collect(),
            total: Some(track_ids.len() as u32),
            next: None,
        }),
        external_urls: ExternalUrls {
            spotify: Some(format!("https://open.spotify.com/album/{id}")),
        },
    }
}

pub fn track(id: &str, name: &str, popularity: u32) -> Track {
    Track {
        id: Some(id.to_string()),
        name: name.to_string(),
        artists: vec![artist("Low")],
        popularity: Some(popularity),
        album: Some(AlbumSummary {
            id: "album0000000000000000a".to_string(),
            name: "Things We Lost in the Fire".to_string(),
            artists: vec![artist("Low")],
            images: vec![Image {
                url: "https://i.scdn.co/image/cover".to_string(),
                width: None,
                height: None,
            }],
        }),
        external_urls: ExternalUrls::default(),
    }
}

pub fn track_ref(id: &str, popularity: u32) -> TrackRef {
    TrackRef {
        catalog_id: id.to_string(),
        name: format!("Track {id}"),
        popularity,
    }
}

pub fn catalog_match(id: &str, tracks: Vec<TrackRef>) -> CatalogMatch {
    CatalogMatch {
        catalog_id: id.to_string(),
        kind: ReferenceKind::Album,
        canonical_artist: "Low".to_string(),
        canonical_title: "Long Division".to_string(),
        popularity: 50,
        images: Vec::new(),
        tracks,
        external_url: None,
    }
}

/// `count` distinct track ids
pub fn track_ids(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("track{i:017}")).collect()
}
