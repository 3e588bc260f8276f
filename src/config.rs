use crate::core::{Result, WaystoneError};
use crate::storage::{DurabilityMode, SnapshotFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_WAYSTONES_FILE: &str = "waystones.json";
pub const DEFAULT_PLAYERS_FILE: &str = "waystones-players.json";
pub const DEFAULT_MAX_NAME_LEN: usize = 100;

/// Registry configuration
///
/// Where the two snapshot documents live and how they are written.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Directory holding both documents
    pub data_dir: PathBuf,

    /// File name of the waystone document
    pub waystones_file: String,

    /// File name of the discovery document
    pub players_file: String,

    /// Whether snapshots are fsynced, written without sync, or not at all
    pub durability: DurabilityMode,

    /// Snapshot encoding
    pub format: SnapshotFormat,

    /// Longest accepted waystone name, in characters
    pub max_name_len: usize,

    /// Name given to freshly placed waystones before uniquification
    pub default_name: String,

    /// Name used when a rename submits an empty string
    pub fallback_name: String,
}

impl RegistryConfig {
    /// Create a configuration rooted at `data_dir`
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            waystones_file: DEFAULT_WAYSTONES_FILE.to_string(),
            players_file: DEFAULT_PLAYERS_FILE.to_string(),
            durability: DurabilityMode::default(),
            format: SnapshotFormat::default(),
            max_name_len: DEFAULT_MAX_NAME_LEN,
            default_name: "New Waystone".to_string(),
            fallback_name: "Waystone".to_string(),
        }
    }

    /// In-memory configuration that never touches disk
    pub fn in_memory() -> Self {
        Self::new(".").durability(DurabilityMode::None)
    }

    /// Set the waystone document file name
    pub fn waystones_file(mut self, name: &str) -> Self {
        self.waystones_file = name.to_string();
        self
    }

    /// Set the discovery document file name
    pub fn players_file(mut self, name: &str) -> Self {
        self.players_file = name.to_string();
        self
    }

    /// Set the durability mode
    pub fn durability(mut self, mode: DurabilityMode) -> Self {
        self.durability = mode;
        self
    }

    /// Set the snapshot format
    pub fn format(mut self, format: SnapshotFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the maximum name length
    pub fn max_name_len(mut self, max: usize) -> Self {
        self.max_name_len = max;
        self
    }

    /// Set the default name for new waystones
    pub fn default_name(mut self, name: &str) -> Self {
        self.default_name = name.to_string();
        self
    }

    pub fn waystones_path(&self) -> PathBuf {
        self.data_dir.join(&self.waystones_file)
    }

    pub fn players_path(&self) -> PathBuf {
        self.data_dir.join(&self.players_file)
    }

    /// Trimmed name, the fallback for blanks, bounded in length.
    pub fn validate_name(&self, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(self.fallback_name.clone());
        }
        let len = name.chars().count();
        if len > self.max_name_len {
            return Err(WaystoneError::NameTooLong {
                len,
                max: self.max_name_len,
            });
        }
        Ok(name.to_string())
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

pub fn parse_durability(value: &str) -> Result<DurabilityMode> {
    match value.trim().to_ascii_lowercase().as_str() {
        "sync" => Ok(DurabilityMode::Sync),
        "async" => Ok(DurabilityMode::Async),
        "none" | "memory" => Ok(DurabilityMode::None),
        _ => Err(WaystoneError::invalid_value("durability", value)),
    }
}

pub fn parse_format(value: &str) -> Result<SnapshotFormat> {
    match value.trim().to_ascii_lowercase().as_str() {
        "json" => Ok(SnapshotFormat::Json),
        "msgpack" | "messagepack" => Ok(SnapshotFormat::MessagePack),
        _ => Err(WaystoneError::invalid_value("format", value)),
    }
}

/// Runtime switches stored alongside the waystones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Settings {
    /// Raise per-operation log lines from debug to info.
    #[serde(default)]
    pub debug_logs: bool,

    /// Hide undiscovered waystones from player lists.
    #[serde(default)]
    pub require_discover: bool,
}
