//! Snapshot persistence for the registries

use super::codec::SnapshotFormat;
use super::coalesce::{SaveCoordinator, SaveOutcome, SaveStats};
use crate::core::{Result, WaystoneError};
use log::{info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::NamedTempFile;

// ============================================================================
// Durability Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurabilityMode {
    /// Atomic replace plus fsync of every snapshot.
    Sync,
    /// Atomic replace without fsync.
    #[default]
    Async,
    /// Memory only; nothing is read or written.
    None,
}

// ============================================================================
// Snapshot File
// ============================================================================

/// One full-snapshot document on disk, replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
    format: SnapshotFormat,
    durability: DurabilityMode,
}

impl SnapshotFile {
    pub fn new<P: AsRef<Path>>(path: P, format: SnapshotFormat, durability: DurabilityMode) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            format,
            durability,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn durability(&self) -> DurabilityMode {
        self.durability
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Encodes `document` and swaps it into place through a temp file in the
    /// same directory, so readers see either the old or the new snapshot.
    pub fn write<T: Serialize>(&self, document: &T) -> Result<()> {
        if self.durability == DurabilityMode::None {
            return Ok(());
        }

        let bytes = self.format.encode(document)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| {
            WaystoneError::Io(format!("Failed to create snapshot directory '{}': {}", dir.display(), e))
        })?;

        let mut temp = NamedTempFile::new_in(dir)
            .map_err(|e| WaystoneError::Io(format!("Failed to create temp file in '{}': {}", dir.display(), e)))?;
        temp.write_all(&bytes)
            .map_err(|e| WaystoneError::Io(format!("Failed to write snapshot: {}", e)))?;
        temp.flush()
            .map_err(|e| WaystoneError::Io(format!("Failed to flush snapshot: {}", e)))?;
        if self.durability == DurabilityMode::Sync {
            temp.as_file()
                .sync_all()
                .map_err(|e| WaystoneError::Io(format!("Failed to sync snapshot: {}", e)))?;
        }
        temp.persist(&self.path).map_err(|e| {
            WaystoneError::Io(format!("Failed to replace snapshot '{}': {}", self.path.display(), e.error))
        })?;
        Ok(())
    }

    /// Reads the document; `Ok(None)` when there is no file yet.
    pub fn read<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        if self.durability == DurabilityMode::None {
            return Ok(None);
        }

        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(WaystoneError::Io(format!(
                    "Failed to read snapshot '{}': {}",
                    self.path.display(),
                    e
                )));
            }
        };
        self.format.decode(&bytes).map(Some)
    }
}

// ============================================================================
// Persistence Controller
// ============================================================================

/// Couples a snapshot file with the save coordinator and the loaded flag.
pub struct PersistenceController {
    label: &'static str,
    file: SnapshotFile,
    coordinator: SaveCoordinator,
    loaded: AtomicBool,
}

impl PersistenceController {
    pub fn new(label: &'static str, file: SnapshotFile) -> Self {
        Self {
            label,
            file,
            coordinator: SaveCoordinator::new(),
            loaded: AtomicBool::new(false),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Reads the stored document. A missing file yields `None`; an unreadable
    /// one yields an empty document so the caller starts fresh instead of
    /// failing startup.
    pub fn read_document<T: DeserializeOwned + Default>(&self) -> Option<T> {
        match self.file.read() {
            Ok(Some(document)) => Some(document),
            Ok(None) => {
                info!("No {} file found at {}, starting fresh", self.label, self.path().display());
                None
            }
            Err(err) => {
                warn!(
                    "Failed to load {} from {}: {}; starting fresh",
                    self.label,
                    self.path().display(),
                    err
                );
                Some(T::default())
            }
        }
    }

    /// Requests a coalesced save. `snapshot` is evaluated by whichever caller
    /// ends up writing, so it must read live state.
    pub fn request_save<T, F>(&self, snapshot: F) -> SaveOutcome
    where
        T: Serialize,
        F: Fn() -> T,
    {
        self.coordinator
            .request(self.label, || self.file.write(&snapshot()))
    }

    pub fn mark_loaded(&self) {
        self.loaded.store(true, Ordering::SeqCst);
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> SaveStats {
        self.coordinator.stats()
    }
}
