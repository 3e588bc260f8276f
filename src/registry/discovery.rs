//! Per-player discovery tracking.

use super::waystones::WaystoneRegistry;
use crate::config::RegistryConfig;
use crate::storage::{InMemoryStore, PersistenceController, SaveOutcome, SaveStats, SnapshotFile};
use log::{info, log};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerEntry {
    #[serde(default)]
    pub discovered: BTreeSet<String>,
}

/// On-disk shape of the discovery file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    #[serde(rename = "Players", default)]
    pub players: BTreeMap<String, PlayerEntry>,
}

/// Principal id to the set of waystone ids that principal has found.
pub struct DiscoveryRegistry {
    store: InMemoryStore<BTreeSet<String>>,
    persistence: PersistenceController,
    waystones: Arc<WaystoneRegistry>,
}

impl DiscoveryRegistry {
    pub fn new(config: &RegistryConfig, waystones: Arc<WaystoneRegistry>) -> Self {
        let file = SnapshotFile::new(config.players_path(), config.format, config.durability);
        Self {
            store: InMemoryStore::new(),
            persistence: PersistenceController::new("player discoveries", file),
            waystones,
        }
    }

    /// Replaces memory with the stored document. A missing file keeps the
    /// current entries; a malformed one clears them.
    pub fn load(&self) {
        if let Some(document) = self.persistence.read_document::<DiscoveryDocument>() {
            self.store.replace_all(
                document
                    .players
                    .into_iter()
                    .map(|(principal, entry)| (principal, entry.discovered)),
            );
            log!(
                self.waystones.verbosity(),
                "Loaded discovery data for {} players",
                self.store.count()
            );
        }
        self.persistence.mark_loaded();
    }

    pub fn is_loaded(&self) -> bool {
        self.persistence.is_loaded()
    }

    pub fn save(&self) -> SaveOutcome {
        self.request_save()
    }

    pub fn save_stats(&self) -> SaveStats {
        self.persistence.stats()
    }

    pub fn path(&self) -> &Path {
        self.persistence.path()
    }

    fn request_save(&self) -> SaveOutcome {
        let outcome = self.persistence.request_save(|| self.document());
        if outcome == SaveOutcome::Written {
            log!(
                self.waystones.verbosity(),
                "Saved discovery data for {} players to {}",
                self.store.count(),
                self.path().display()
            );
        }
        outcome
    }

    pub fn document(&self) -> DiscoveryDocument {
        DiscoveryDocument {
            players: self
                .store
                .entries()
                .into_iter()
                .map(|(principal, discovered)| (principal, PlayerEntry { discovered }))
                .collect(),
        }
    }

    /// Creates an empty entry for `principal`. Never saves.
    pub fn ensure_exists(&self, principal: &str) {
        self.store.ensure_with(principal, BTreeSet::new);
    }

    pub fn has_discovered(&self, principal: &str, waystone_id: &str) -> bool {
        self.store
            .get(principal)
            .is_some_and(|discovered| discovered.contains(waystone_id))
    }

    /// Marks a waystone as discovered. Returns true and saves only when the
    /// set grew.
    pub fn discover_waystone(&self, principal: &str, waystone_id: &str) -> bool {
        let added = self
            .store
            .upsert_with(principal, BTreeSet::new, |discovered| discovered.insert(waystone_id.to_string()));
        if added {
            self.request_save();
            log!(
                self.waystones.verbosity(),
                "Player {} discovered waystone {}",
                principal,
                waystone_id
            );
        }
        added
    }

    /// Discovered ids that still exist. Stale ids are pruned from the entry
    /// and the pruning is saved once.
    pub fn get_discovered(&self, principal: &str) -> BTreeSet<String> {
        let pruned = self
            .store
            .update(principal, |discovered| {
                let before = discovered.len();
                discovered.retain(|id| self.waystones.exists(id));
                (before - discovered.len(), discovered.clone())
            });

        match pruned {
            Some((removed, valid)) => {
                if removed > 0 {
                    self.request_save();
                    log!(
                        self.waystones.verbosity(),
                        "Cleaned up {} stale discovery entries for player {}",
                        removed,
                        principal
                    );
                }
                valid
            }
            None => BTreeSet::new(),
        }
    }

    /// Drops a removed waystone from every entry. Saves once if any changed.
    pub fn forget_waystone(&self, waystone_id: &str) -> usize {
        let mut touched = 0;
        self.store.retain(|_, discovered| {
            if discovered.remove(waystone_id) {
                touched += 1;
            }
            true
        });
        if touched > 0 {
            self.request_save();
            log!(
                self.waystones.verbosity(),
                "Removed waystone {} from {} discovery entries",
                waystone_id,
                touched
            );
        }
        touched
    }

    pub fn player_count(&self) -> usize {
        self.store.count()
    }

    pub fn clear(&self) {
        self.store.clear();
        self.request_save();
        info!("Cleared all discovery data");
    }
}
