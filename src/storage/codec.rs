use crate::core::{Result, WaystoneError};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Encoding used for snapshot documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapshotFormat {
    /// Pretty-printed JSON, readable and hand-editable.
    #[default]
    Json,
    /// MessagePack with named fields.
    MessagePack,
}

impl SnapshotFormat {
    pub fn encode<T: Serialize>(&self, document: &T) -> Result<Vec<u8>> {
        match self {
            Self::Json => serde_json::to_vec_pretty(document)
                .map_err(|e| WaystoneError::Serialization(format!("Failed to encode JSON snapshot: {}", e))),
            Self::MessagePack => rmp_serde::to_vec_named(document).map_err(|e| {
                WaystoneError::Serialization(format!("Failed to encode MessagePack snapshot: {}", e))
            }),
        }
    }

    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        match self {
            Self::Json => serde_json::from_slice(bytes)
                .map_err(|e| WaystoneError::Serialization(format!("Failed to decode JSON snapshot: {}", e))),
            Self::MessagePack => rmp_serde::from_slice(bytes).map_err(|e| {
                WaystoneError::Serialization(format!("Failed to decode MessagePack snapshot: {}", e))
            }),
        }
    }
}
