//! Real file system service implementation
//!
//! Writes the scan artifact as a JSON array of resolved items. An existing
//! artifact is moved aside to a timestamped backup first, and only the newest
//! backups are kept.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use shared::{ScanRecord, ScanResult};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::FileSystem;

/// Backups kept per artifact
pub const MAX_BACKUPS: usize = 5;

/// Real file system implementation
pub struct RealFileSystem {
    max_backups: usize,
}

impl RealFileSystem {
    pub fn new() -> Self {
        Self {
            max_backups: MAX_BACKUPS,
        }
    }

    pub fn with_max_backups(max_backups: usize) -> Self {
        Self { max_backups }
    }

    fn file_name(path: &Path) -> OrchestratorResult<String> {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| OrchestratorError::SnapshotError {
                path: path.display().to_string(),
                reason: "path has no file name".to_string(),
            })
    }

    fn parent_dir(path: &Path) -> PathBuf {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// `<name>.<YYYYMMDD_HHMMSS>.backup` next to the artifact
    pub fn backup_path(path: &Path) -> OrchestratorResult<PathBuf> {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let name = Self::file_name(path)?;
        Ok(Self::parent_dir(path).join(format!("{name}.{stamp}.backup")))
    }

    /// Existing backups of `path`, oldest first
    pub async fn list_backups(path: &Path) -> OrchestratorResult<Vec<PathBuf>> {
        let prefix = format!("{}.", Self::file_name(path)?);
        let mut entries = fs::read_dir(Self::parent_dir(path)).await?;
        let mut backups = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(&prefix) && name.ends_with(".backup") {
                backups.push(entry.path());
            }
        }

        // Timestamps sort lexically
        backups.sort();
        Ok(backups)
    }

    async fn prune_backups(&self, path: &Path) -> OrchestratorResult<()> {
        let backups = Self::list_backups(path).await?;
        let excess = backups.len().saturating_sub(self.max_backups);

        for old in backups.into_iter().take(excess) {
            if let Err(e) = fs::remove_file(&old).await {
                warn!("⚠️ Could not remove old backup {}: {}", old.display(), e);
            } else {
                debug!("🗑️ Removed old backup {}", old.display());
            }
        }
        Ok(())
    }
}

impl Default for RealFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileSystem for RealFileSystem {
    async fn write_snapshot(&self, path: &Path, scan: &ScanResult) -> OrchestratorResult<()> {
        fs::create_dir_all(Self::parent_dir(path)).await?;

        if fs::try_exists(path).await? {
            let backup = Self::backup_path(path)?;
            fs::rename(path, &backup).await?;
            debug!("📦 Backed up {} to {}", path.display(), backup.display());
            self.prune_backups(path).await?;
        }

        let content = serde_json::to_string_pretty(&scan.records())?;

        // Write then rename so a reader never sees half a file
        let staging = Self::parent_dir(path).join(format!(".{}.tmp", Self::file_name(path)?));
        fs::write(&staging, content).await?;
        fs::rename(&staging, path).await?;

        debug!("💾 Wrote {} records to {}", scan.matched_count(), path.display());
        Ok(())
    }

    async fn read_snapshot(&self, path: &Path) -> OrchestratorResult<Vec<ScanRecord>> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| OrchestratorError::SnapshotError {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        serde_json::from_str(&content).map_err(|e| OrchestratorError::SnapshotError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}
