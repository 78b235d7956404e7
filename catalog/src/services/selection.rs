//! Track selection from resolved catalog matches

use std::collections::HashSet;

use shared::{CatalogMatch, TrackRef};

use crate::types::TrackSelection;

/// First track reaching the maximum popularity, in service-returned order
pub fn most_popular(tracks: &[TrackRef]) -> Option<&TrackRef> {
    let mut best: Option<&TrackRef> = None;
    for track in tracks {
        match best {
            Some(current) if track.popularity <= current.popularity => {}
            _ => best = Some(track),
        }
    }
    best
}

/// Track ids to add for `matches`, deduplicated with first-seen order kept
pub fn select_tracks(matches: &[CatalogMatch], selection: TrackSelection) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut selected = Vec::new();

    for entry in matches {
        let picks: Vec<&TrackRef> = match selection {
            TrackSelection::All => entry.tracks.iter().collect(),
            TrackSelection::MostPopular => most_popular(&entry.tracks).into_iter().collect(),
        };

        for track in picks {
            if seen.insert(track.catalog_id.as_str()) {
                selected.push(track.catalog_id.clone());
            }
        }
    }

    selected
}
