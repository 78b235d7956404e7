//! Main orchestrator implementation
//!
//! Drives one scan through `Idle → Extracting → Analyzing → Resolving →
//! (Building) → Complete | Failed`. Extraction and analysis faults end the
//! run; a reference that fails to resolve is reported as unmatched and a
//! playlist batch that keeps failing is skipped.

use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use analyzer::{AnalyzerError, ContentExtractor, LinkScanner, ReferenceExtractor};
use catalog::{
    default_description, default_playlist_name, select_tracks, BatchReport, CatalogClient, CatalogResolver, Playlist,
    PlaylistBuilder, TrackSelection,
};
use shared::{
    dedup_references, logging, run_debug, run_info, run_warn, CatalogMatch, ProgressEvent, Reference, RunId, RunPhase,
    ScanResult,
};

use crate::config::PipelineConfig;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::progress::{ProgressReporter, ANALYZING_AT, BUILDING_AT, EXTRACTING_AT, RESOLVING_AT};
use crate::services::ClientRegistry;
use crate::traits::{Credentials, FileSystem};

/// Last percentage reported before completion
const BUILT_AT: u8 = 99;

/// How the matched tracks become a playlist
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistOptions {
    /// Generated from the selection and current time when absent
    pub name: Option<String>,
    pub description: Option<String>,
    pub selection: TrackSelection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Build a playlist from the matches
    pub playlist: Option<PlaylistOptions>,
    /// Write the scan artifact here
    pub snapshot_path: Option<PathBuf>,
}

/// Outcome of a finished run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: RunId,
    pub phase: RunPhase,
    pub matched: usize,
    pub unmatched: usize,
    /// Tracks in playlist batches that were given up on
    pub skipped: usize,
    pub playlist: Option<Playlist>,
    pub scan: ScanResult,
}

/// Main orchestrator that coordinates the pipeline
pub struct Orchestrator<E, F>
where
    E: ContentExtractor + 'static,
    F: FileSystem + 'static,
{
    extractor: E,
    file_system: F,
    registry: Arc<ClientRegistry>,
    config: PipelineConfig,
}

impl<E, F> Orchestrator<E, F>
where
    E: ContentExtractor + 'static,
    F: FileSystem + 'static,
{
    /// Create new orchestrator with injected dependencies
    pub fn new(extractor: E, file_system: F, registry: Arc<ClientRegistry>, config: PipelineConfig) -> Self {
        Self {
            extractor,
            file_system,
            registry,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Scan `url`, resolve what it references and optionally build a playlist
    ///
    /// The browser is released on every exit path, including cancellation.
    pub async fn run(
        &self,
        url: &str,
        options: &RunOptions,
        progress: mpsc::Sender<ProgressEvent>,
        cancel: CancellationToken,
    ) -> OrchestratorResult<RunSummary> {
        let run_id = RunId::new();
        let mut reporter = ProgressReporter::new(run_id, progress);
        logging::log_startup(&run_id, &format!("scan of {url}"));

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(OrchestratorError::Cancelled),
            result = self.scan(run_id, url, options, &mut reporter) => result,
        };

        if let Err(e) = self.extractor.cleanup().await {
            run_warn!(run_id, "⚠️ Browser cleanup failed: {}", e);
        }

        Self::finish(run_id, outcome, &mut reporter).await
    }

    /// Rebuild a playlist from a previously written scan artifact
    ///
    /// Every entry is looked up again so the playlist reflects the current
    /// catalog; entries that no longer resolve count as unmatched.
    pub async fn build_from_snapshot(
        &self,
        path: &Path,
        options: &PlaylistOptions,
        progress: mpsc::Sender<ProgressEvent>,
        cancel: CancellationToken,
    ) -> OrchestratorResult<RunSummary> {
        let run_id = RunId::new();
        let mut reporter = ProgressReporter::new(run_id, progress);
        logging::log_startup(&run_id, &format!("playlist rebuild from {}", path.display()));

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(OrchestratorError::Cancelled),
            result = self.rebuild(run_id, path, options, &mut reporter) => result,
        };

        Self::finish(run_id, outcome, &mut reporter).await
    }

    async fn finish(
        run_id: RunId,
        outcome: OrchestratorResult<RunSummary>,
        reporter: &mut ProgressReporter,
    ) -> OrchestratorResult<RunSummary> {
        match outcome {
            Ok(summary) => {
                reporter.complete(format!(
                    "Done: {} matched, {} unmatched, {} skipped",
                    summary.matched, summary.unmatched, summary.skipped
                ))
                .await;
                logging::log_success(&run_id, &format!("{} of {} references matched", summary.matched, summary.matched + summary.unmatched));
                Ok(summary)
            }
            Err(e) => {
                reporter.fail(e.to_string()).await;
                if e.is_fatal() {
                    logging::log_error(&run_id, "Run", &e);
                } else {
                    logging::log_shutdown(&run_id, "run cancelled");
                }
                Err(e)
            }
        }
    }

    async fn scan(
        &self,
        run_id: RunId,
        url: &str,
        options: &RunOptions,
        reporter: &mut ProgressReporter,
    ) -> OrchestratorResult<RunSummary> {
        // Missing keys surface before the browser starts
        let credentials = self.registry.credentials().await?;
        if self.config.extraction.mode.reads_text() {
            credentials.require_llm()?;
        }

        reporter.report(EXTRACTING_AT, RunPhase::Extracting, format!("Loading {url}"));
        let content = self
            .extractor
            .extract(url)
            .await
            .map_err(OrchestratorError::ExtractionError)?;
        run_info!(run_id, "📄 Extracted {} bytes from {}", content.len(), url);

        reporter.report(ANALYZING_AT, RunPhase::Analyzing, "Extracting references");
        let references = self.extract_references(&credentials, &content).await?;
        run_info!(run_id, "🔎 Found {} references", references.len());

        let catalog = self.registry.catalog_client().await?;
        let scan = self.resolve_all(run_id, url, references, catalog.clone(), reporter).await;

        if let Some(path) = &options.snapshot_path {
            self.file_system.write_snapshot(path, &scan).await?;
            run_info!(run_id, "💾 Scan written to {}", path.display());
        }

        let (playlist, skipped) = match &options.playlist {
            Some(playlist_options) => {
                let matches: Vec<CatalogMatch> = scan.matches().cloned().collect();
                self.build_playlist(run_id, catalog, &matches, playlist_options, reporter).await?
            }
            None => (None, 0),
        };

        Ok(RunSummary {
            run_id,
            phase: RunPhase::Complete,
            matched: scan.matched_count(),
            unmatched: scan.unmatched_count(),
            skipped,
            playlist,
            scan,
        })
    }

    async fn extract_references(&self, credentials: &Credentials, content: &str) -> OrchestratorResult<Vec<Reference>> {
        if !self.config.extraction.mode.reads_text() {
            return Ok(dedup_references(LinkScanner::new().scan(content)));
        }

        let mut config = self.config.extraction.clone();
        if let Some(model) = credentials.llm.as_ref().and_then(|llm| llm.model.clone()) {
            config.model = model;
        }

        let llm = self.registry.llm_client().await.map_err(|e| {
            OrchestratorError::AnalysisError(AnalyzerError::ConfigError {
                message: e.to_string(),
            })
        })?;
        ReferenceExtractor::new(llm, config)
            .extract(content)
            .await
            .map_err(OrchestratorError::AnalysisError)
    }

    /// Resolve references one at a time, in first-seen order
    async fn resolve_all(
        &self,
        run_id: RunId,
        url: &str,
        references: Vec<Reference>,
        catalog: Arc<dyn CatalogClient>,
        reporter: &mut ProgressReporter,
    ) -> ScanResult {
        let resolver = CatalogResolver::new(catalog, self.config.resolver.clone());
        let total = references.len();
        let mut scan = ScanResult::new(url);

        reporter.report(RESOLVING_AT, RunPhase::Resolving, format!("Resolving {total} references"));

        for (index, reference) in references.into_iter().enumerate() {
            let label = reference.to_string();
            let status = match resolver.resolve(&reference).await {
                Some(entry) => {
                    run_debug!(run_id, "✅ {} → {} - {}", label, entry.canonical_artist, entry.canonical_title);
                    scan.push_matched(reference, entry);
                    "matched"
                }
                None => {
                    scan.push_unmatched(reference);
                    "not found"
                }
            };

            reporter.report_step(
                RESOLVING_AT,
                BUILDING_AT,
                index + 1,
                total,
                RunPhase::Resolving,
                format!("Resolved {}/{}: {} ({})", index + 1, total, label, status),
            );
        }

        scan
    }

    async fn rebuild(
        &self,
        run_id: RunId,
        path: &Path,
        options: &PlaylistOptions,
        reporter: &mut ProgressReporter,
    ) -> OrchestratorResult<RunSummary> {
        self.registry.credentials().await?;

        reporter.report(EXTRACTING_AT, RunPhase::Extracting, format!("Reading {}", path.display()));
        let records = self.file_system.read_snapshot(path).await?;
        let source_url = records
            .first()
            .map(|record| record.source_url.clone())
            .unwrap_or_else(|| path.display().to_string());

        let catalog = self.registry.catalog_client().await?;
        let resolver = CatalogResolver::new(catalog.clone(), self.config.resolver.clone());
        let mut scan = ScanResult::new(source_url);
        let total = records.len();

        reporter.report(RESOLVING_AT, RunPhase::Resolving, format!("Refreshing {total} entries"));
        for (index, record) in records.into_iter().enumerate() {
            let reference = Reference {
                kind: record.kind,
                artist: record.artist,
                title: record.title,
                catalog_id: Some(record.catalog_id.clone()),
            };

            match resolver.get_details(record.kind, &record.catalog_id).await {
                Ok(entry) => scan.push_matched(reference, entry),
                Err(e) => {
                    run_warn!(run_id, "⚠️ {} no longer resolves: {}", record.catalog_id, e);
                    scan.push_unmatched(reference);
                }
            }

            reporter.report_step(
                RESOLVING_AT,
                BUILDING_AT,
                index + 1,
                total,
                RunPhase::Resolving,
                format!("Refreshed {}/{}", index + 1, total),
            );
        }

        let matches: Vec<CatalogMatch> = scan.matches().cloned().collect();
        let (playlist, skipped) = self.build_playlist(run_id, catalog, &matches, options, reporter).await?;

        Ok(RunSummary {
            run_id,
            phase: RunPhase::Complete,
            matched: scan.matched_count(),
            unmatched: scan.unmatched_count(),
            skipped,
            playlist,
            scan,
        })
    }

    /// Playlist and skipped track count; no playlist when nothing was selected
    async fn build_playlist(
        &self,
        run_id: RunId,
        catalog: Arc<dyn CatalogClient>,
        matches: &[CatalogMatch],
        options: &PlaylistOptions,
        reporter: &mut ProgressReporter,
    ) -> OrchestratorResult<(Option<Playlist>, usize)> {
        if select_tracks(matches, options.selection).is_empty() {
            run_warn!(run_id, "⚠️ No tracks selected, skipping playlist creation");
            return Ok((None, 0));
        }

        let now = Local::now();
        let name = options
            .name
            .clone()
            .unwrap_or_else(|| default_playlist_name(options.selection, now));
        let description = options
            .description
            .clone()
            .unwrap_or_else(|| default_description(options.selection, now));

        reporter.report(BUILDING_AT, RunPhase::Building, format!("Building playlist '{name}'"));

        let builder = PlaylistBuilder::new(catalog, self.config.playlist.clone());
        let (playlist, report): (Playlist, BatchReport) = builder
            .build(&name, &description, matches, options.selection, |batch| {
                let outcome = if batch.succeeded { "added" } else { "skipped" };
                reporter.report_step(
                    BUILDING_AT,
                    BUILT_AT,
                    batch.batch,
                    batch.total_batches,
                    RunPhase::Building,
                    format!("Batch {}/{}: {} tracks {}", batch.batch, batch.total_batches, batch.items, outcome),
                );
            })
            .await?;

        run_info!(
            run_id,
            "🎵 Playlist {} has {} tracks ({} batches skipped)",
            playlist.id,
            report.tracks_added(),
            report.batches_skipped
        );
        Ok((Some(playlist), report.tracks_skipped))
    }
}
