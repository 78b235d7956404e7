//! Batched playlist construction

use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use shared::CatalogMatch;

use crate::error::{CatalogError, CatalogResult};
use crate::services::selection::select_tracks;
use crate::traits::CatalogClient;
use crate::types::{BatchProgress, BatchReport, Playlist, PlaylistConfig, TrackSelection};

const TRACK_URI_PREFIX: &str = "spotify:track:";

/// Creates playlists and fills them in batches
pub struct PlaylistBuilder {
    client: Arc<dyn CatalogClient>,
    config: PlaylistConfig,
    user_id: OnceCell<String>,
}

impl PlaylistBuilder {
    pub fn new(client: Arc<dyn CatalogClient>, config: PlaylistConfig) -> Self {
        Self {
            client,
            config,
            user_id: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &PlaylistConfig {
        &self.config
    }

    /// Current user, looked up on first use
    async fn user_id(&self) -> CatalogResult<&str> {
        let id = self
            .user_id
            .get_or_try_init(|| self.client.current_user_id())
            .await?;
        Ok(id.as_str())
    }

    /// Create an empty playlist owned by the current user
    pub async fn create(&self, name: &str, description: &str) -> CatalogResult<Playlist> {
        let user_id = self.user_id().await?;
        let id = self
            .client
            .create_playlist(user_id, name, description, self.config.public)
            .await?;

        info!("🎵 Created playlist '{}' ({})", name, id);
        Ok(Playlist {
            id,
            name: name.to_string(),
            description: description.to_string(),
            track_uris: Vec::new(),
        })
    }

    /// Append tracks in batches, skipping batches that still fail after retries
    ///
    /// `on_batch` is called once per batch, in order, whether or not the batch
    /// went through.
    pub async fn add_tracks<F>(&self, playlist_id: &str, track_ids: &[String], mut on_batch: F) -> BatchReport
    where
        F: FnMut(&BatchProgress) + Send,
    {
        let uris: Vec<String> = track_ids.iter().map(|id| to_track_uri(id)).collect();
        let batches: Vec<&[String]> = uris.chunks(self.config.effective_batch_size()).collect();
        let total_batches = batches.len();
        let mut report = BatchReport::default();

        for (index, batch) in batches.into_iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.batch_delay()).await;
            }

            let label = format!("playlist batch {}/{}", index + 1, total_batches);
            let outcome = self
                .config
                .retry
                .retry(&label, |_| self.client.add_playlist_items(playlist_id, batch))
                .await;

            let succeeded = match outcome {
                Ok(()) => {
                    debug!("➕ Added {} tracks ({})", batch.len(), label);
                    report.batches_sent += 1;
                    report.added_uris.extend(batch.iter().cloned());
                    true
                }
                Err(e) => {
                    let failure = CatalogError::MutationError {
                        batch: index + 1,
                        reason: e.to_string(),
                    };
                    error!("❌ {}; skipping {} tracks", failure, batch.len());
                    report.batches_skipped += 1;
                    report.tracks_skipped += batch.len();
                    false
                }
            };

            on_batch(&BatchProgress {
                batch: index + 1,
                total_batches,
                items: batch.len(),
                succeeded,
            });
        }

        report
    }

    /// Create a playlist and fill it with the tracks selected from `matches`
    pub async fn build<F>(
        &self,
        name: &str,
        description: &str,
        matches: &[CatalogMatch],
        selection: TrackSelection,
        on_batch: F,
    ) -> CatalogResult<(Playlist, BatchReport)>
    where
        F: FnMut(&BatchProgress) + Send,
    {
        let track_ids = select_tracks(matches, selection);
        let mut playlist = self.create(name, description).await?;

        let report = self.add_tracks(&playlist.id, &track_ids, on_batch).await;
        playlist.track_uris = report.added_uris.clone();

        info!(
            "✅ Playlist '{}' has {} tracks ({} skipped)",
            playlist.name,
            report.tracks_added(),
            report.tracks_skipped
        );
        Ok((playlist, report))
    }
}

/// `spotify:track:ID` for a bare id; URIs pass through
pub fn to_track_uri(id: &str) -> String {
    if id.starts_with("spotify:") {
        id.to_string()
    } else {
        format!("{TRACK_URI_PREFIX}{id}")
    }
}

/// e.g. `Sampler Playlist 20240131_142500`
pub fn default_playlist_name(selection: TrackSelection, now: DateTime<Local>) -> String {
    let stamp = now.format("%Y%m%d_%H%M%S");
    match selection {
        TrackSelection::MostPopular => format!("Sampler Playlist {stamp}"),
        TrackSelection::All => format!("Playlist {stamp}"),
    }
}

pub fn default_description(selection: TrackSelection, now: DateTime<Local>) -> String {
    let flavour = match selection {
        TrackSelection::MostPopular => "Sampler",
        TrackSelection::All => "Full",
    };
    format!("{flavour} playlist created by page scan on {}", now.format("%Y-%m-%d"))
}
