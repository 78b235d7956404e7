//! Main entry point for the pagescan binary
//!
//! Wires the real services into the orchestrator and prints progress to the
//! terminal. Ctrl+C cancels the running scan and still closes the browser.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use analyzer::{BrowserContentExtractor, ExtractionMode};
use catalog::TrackSelection;
use orchestrator::{
    ClientRegistry, EnvCredentialSource, Orchestrator, PipelineConfig, PlaylistOptions, RealClientFactory,
    RealFileSystem, RunOptions, RunSummary,
};
use shared::{logging, ProgressEvent, ReferenceKind, RunId};

/// Scan a web page for music references and match them against the catalog
#[derive(Parser)]
#[command(name = "pagescan")]
#[command(about = "Finds albums and tracks mentioned on a web page and turns them into a playlist")]
pub struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// JSON pipeline configuration; unset fields keep their defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Scan a page and resolve every reference found on it
    Scan {
        #[arg(long)]
        url: String,

        /// Write the matched items as a JSON artifact
        #[arg(long)]
        output: Option<PathBuf>,

        /// Build a playlist from the matches, optionally with this name
        #[arg(long, num_args = 0..=1)]
        playlist: Option<Option<String>>,

        /// all | most-popular
        #[arg(long)]
        selection: Option<TrackSelection>,

        /// links | text | both
        #[arg(long)]
        mode: Option<ExtractionMode>,

        /// album | song
        #[arg(long)]
        kind: Option<ReferenceKind>,

        /// Show the browser window
        #[arg(long)]
        headful: bool,
    },

    /// Build a playlist from a previously written artifact
    Playlist {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        name: Option<String>,

        /// all | most-popular
        #[arg(long)]
        selection: Option<TrackSelection>,
    },
}

async fn load_config(path: Option<&PathBuf>) -> anyhow::Result<PipelineConfig> {
    Ok(match path {
        Some(path) => PipelineConfig::from_file(path).await?,
        None => PipelineConfig::default(),
    })
}

/// Print events until the sender side is dropped
async fn print_progress(mut events: mpsc::Receiver<ProgressEvent>) {
    while let Some(event) = events.recv().await {
        println!("[{:>3}%] {:<10} {}", event.progress, event.phase.to_string(), event.message);
    }
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("Matched:   {}", summary.matched);
    println!("Unmatched: {}", summary.unmatched);
    if let Some(playlist) = &summary.playlist {
        println!("Playlist:  {} ({}, {} tracks)", playlist.name, playlist.id, playlist.track_uris.len());
        if summary.skipped > 0 {
            println!("Skipped:   {} tracks", summary.skipped);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_tracing(Some(&args.log_level));

    let mut config = load_config(args.config.as_ref()).await?;

    // Overrides go in before any client is built from the config
    if let Command::Scan { mode, kind, headful, selection, .. } = &args.command {
        if let Some(mode) = mode {
            config.extraction.mode = *mode;
        }
        if let Some(kind) = kind {
            config.extraction.target_kind = *kind;
        }
        if let Some(selection) = selection {
            config.selection = *selection;
        }
        config.browser.headless = !headful;
    }
    config.validate()?;

    let process_run = RunId::new();
    logging::log_startup(&process_run, "pagescan");

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                logging::log_shutdown(&process_run, "Received Ctrl+C signal");
                signal_token.cancel();
            }
            Err(err) => logging::log_error(&process_run, "Signal handling", &err),
        }
    });

    let registry = Arc::new(ClientRegistry::new(
        Arc::new(EnvCredentialSource::new()),
        Arc::new(RealClientFactory::new(config.clone())),
    ));
    let orchestrator = Orchestrator::new(
        BrowserContentExtractor::new(config.browser.clone()),
        RealFileSystem::new(),
        registry.clone(),
        config.clone(),
    );

    let (progress_tx, progress_rx) = mpsc::channel(256);
    let printer = tokio::spawn(print_progress(progress_rx));

    let result = match args.command {
        Command::Scan { url, output, playlist, selection, .. } => {
            let options = RunOptions {
                playlist: playlist.map(|name| PlaylistOptions {
                    name,
                    description: None,
                    selection: selection.unwrap_or(config.selection),
                }),
                snapshot_path: output,
            };
            orchestrator.run(&url, &options, progress_tx, cancel).await
        }
        Command::Playlist { input, name, selection } => {
            let options = PlaylistOptions {
                name,
                description: None,
                selection: selection.unwrap_or(config.selection),
            };
            orchestrator.build_from_snapshot(&input, &options, progress_tx, cancel).await
        }
    };

    registry.cleanup().await;
    printer.await?;

    let summary = result?;
    print_summary(&summary);
    logging::log_success(&process_run, "pagescan finished");
    Ok(())
}
