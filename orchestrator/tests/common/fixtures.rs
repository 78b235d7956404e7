//! Test fixtures: pages, catalog records and model replies

use chrono::{TimeZone, Utc};

use analyzer::Completion;
use catalog::{Album, AlbumSummary, AlbumTrack, ArtistRef, ExternalUrls, Image, Paging, SearchHit, Track};
use shared::{ReferenceKind, ScanRecord};

pub struct TestFixtures;

impl TestFixtures {
    pub const PAGE_URL: &'static str = "https://example.com/features/best-albums";

    pub const ALBUM_A: &'static str = "4aawyAB9vmqN3uQ7FjRGTy";
    pub const ALBUM_C: &'static str = "1BZoqf8Zje5nGdwZhOjAtD";
    pub const TRACK_B: &'static str = "7ouMYWpwJ422jRcDASZB7P";
    pub const DARK_SIDE: &'static str = "4LH4d3cOWNNsVw41Gqt2kv";

    pub const USER_ID: &'static str = "listener";
    pub const PLAYLIST_ID: &'static str = "37i9dQZF1DXcBWIGoYBM5M";

    /// Two valid catalog links and one whose identifier is too long
    pub fn linked_page() -> String {
        format!(
            r#"<html><body><main>
            <p>Start with <a href="https://open.spotify.com/album/{a}">the reissue</a>.</p>
            <iframe data-uri="spotify:track:{b}"></iframe>
            <p>Also <a href="https://open.spotify.com/album/{a}XYZ">this broken link</a>.</p>
            </main></body></html>"#,
            a = Self::ALBUM_A,
            b = Self::TRACK_B,
        )
    }

    pub fn article_page() -> String {
        r#"<html><head><script>var tracking = 1;</script></head><body>
        <nav>Home | Reviews</nav>
        <main><p>Fifty years on, Pink Floyd's The Dark Side of the Moon still sets the bar.</p></main>
        </body></html>"#
            .to_string()
    }

    /// Model reply with a duplicate line and a disallowed one
    pub fn dark_side_reply() -> String {
        "Pink Floyd - The Dark Side of the Moon\nPink Floyd - The Dark Side of the Moon\nArtist - Live EP\n".to_string()
    }

    pub fn completion(content: &str) -> Completion {
        Completion {
            content: content.to_string(),
            model: "gpt-4o-mini".to_string(),
            prompt_tokens: 120,
            completion_tokens: 24,
        }
    }

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
            name: "The Dark Side of the Moon".to_string(),
            artist: "Pink Floyd".to_string(),
        }
    }

    /// `count` track ids belonging to `album_id`
    pub fn track_ids(album_id: &str, count: usize) -> Vec<String> {
        (0..count).map(|i| format!("{}{:02}", &album_id[..20], i)).collect()
    }

    pub fn album(id: &str, name: &str, artist: &str, track_ids: &[String]) -> Album {
        Album {
            id: id.to_string(),
            name: name.to_string(),
            artists: vec![Self::artist(artist)],
            popularity: Some(80),
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

    /// Track whose popularity is derived from its id so albums get a clear favourite
    pub fn track(id: &str) -> Track {
        let popularity = id.bytes().last().map(|b| (b % 10) as u32 * 10).unwrap_or(0);
        Track {
            id: Some(id.to_string()),
            name: format!("Track {id}"),
            artists: vec![Self::artist("Pink Floyd")],
            popularity: Some(popularity),
            album: Some(AlbumSummary {
                id: Self::DARK_SIDE.to_string(),
                name: "The Dark Side of the Moon".to_string(),
                artists: vec![Self::artist("Pink Floyd")],
                images: vec![Image {
                    url: "https://i.scdn.co/image/dark-side".to_string(),
                    width: None,
                    height: None,
                }],
            }),
            external_urls: ExternalUrls {
                spotify: Some(format!("https://open.spotify.com/track/{id}")),
            },
        }
    }

    pub fn record(catalog_id: &str, kind: ReferenceKind, artist: &str, title: &str) -> ScanRecord {
        ScanRecord {
            catalog_id: catalog_id.to_string(),
            kind,
            artist: artist.to_string(),
            title: title.to_string(),
            popularity: 70,
            images: Vec::new(),
            url: None,
            source_url: Self::PAGE_URL.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }
}
