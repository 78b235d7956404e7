//! Service-specific tests
//!
//! Each service has its own test file; shared fixtures live here.

mod api_keys;

use catalog::SpotifyCredentials;
use shared::{CatalogMatch, Reference, ReferenceKind, ScanResult, TrackRef};

use crate::traits::{Credentials, LlmCredentials};

pub fn test_credentials() -> Credentials {
    Credentials {
        catalog: SpotifyCredentials {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            redirect_uri: Some("http://localhost:8888/callback".to_string()),
            refresh_token: None,
        },
        llm: Some(LlmCredentials {
            api_key: "sk-test".to_string(),
            base_url: None,
            model: None,
        }),
    }
}

pub fn album_match(id: &str, artist: &str, title: &str) -> CatalogMatch {
    CatalogMatch {
        catalog_id: id.to_string(),
        kind: ReferenceKind::Album,
        canonical_artist: artist.to_string(),
        canonical_title: title.to_string(),
        popularity: 70,
        images: vec![format!("https://i.scdn.co/image/{id}")],
        tracks: vec![TrackRef {
            catalog_id: format!("{id}-1"),
            name: "Opener".to_string(),
            popularity: 55,
        }],
        external_url: Some(format!("https://open.spotify.com/album/{id}")),
    }
}

/// Two matched albums and one miss
pub fn sample_scan() -> ScanResult {
    let mut scan = ScanResult::new("https://example.com/best-of-the-year");
    scan.push_matched(
        Reference::named(ReferenceKind::Album, "Low", "Double Negative"),
        album_match("1xyzAlbumLowDoubleNeg0", "Low", "Double Negative"),
    );
    scan.push_unmatched(Reference::named(ReferenceKind::Album, "Nobody", "Nothing At All"));
    scan.push_matched(
        Reference::named(ReferenceKind::Album, "Björk", "Homogenic"),
        album_match("2xyzAlbumBjorkHomogen0", "Björk", "Homogenic"),
    );
    scan
}
