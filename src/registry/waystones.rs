//! Waystone registry
//!
//! Authoritative in-memory catalog of waystones. Every mutation updates the
//! store first and then requests a coalesced save of the whole document.

use super::edit::{ConfigEdit, WaystoneEdit};
use crate::config::{RegistryConfig, Settings};
use crate::core::{
    BlockPos, PlayerOrientation, Result, TeleportDirection, Waystone, WaystoneColor, WaystoneError, display_order,
    normalize_name,
};
use crate::storage::{InMemoryStore, PersistenceController, SaveOutcome, SaveStats, SnapshotFile};
use crate::world::{BlockSwapper, WorldOracle};
use log::{Level, info, log, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// On-disk shape of the waystone file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaystonesDocument {
    #[serde(rename = "Config", default)]
    pub config: Settings,
    #[serde(rename = "Waystones", default)]
    pub waystones: Vec<Waystone>,
}

pub struct WaystoneRegistry {
    store: InMemoryStore<Waystone>,
    persistence: PersistenceController,
    debug_logs: AtomicBool,
    require_discover: AtomicBool,
    /// Serializes name checks with the writes that depend on them.
    name_lock: Mutex<()>,
    block_swapper: Option<Arc<dyn BlockSwapper>>,
}

impl WaystoneRegistry {
    pub fn new(config: &RegistryConfig) -> Self {
        let file = SnapshotFile::new(config.waystones_path(), config.format, config.durability);
        Self {
            store: InMemoryStore::new(),
            persistence: PersistenceController::new("waystones", file),
            debug_logs: AtomicBool::new(false),
            require_discover: AtomicBool::new(false),
            name_lock: Mutex::new(()),
            block_swapper: None,
        }
    }

    /// Installs the callback run after every color change.
    pub fn with_block_swapper(mut self, swapper: Arc<dyn BlockSwapper>) -> Self {
        self.block_swapper = Some(swapper);
        self
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Reads the document and replaces the in-memory catalog with it.
    ///
    /// A missing file leaves the current contents untouched; a malformed one
    /// empties the catalog and resets the runtime switches.
    pub fn load(&self) {
        if let Some(document) = self.persistence.read_document::<WaystonesDocument>() {
            self.debug_logs.store(document.config.debug_logs, Ordering::SeqCst);
            self.require_discover
                .store(document.config.require_discover, Ordering::SeqCst);
            self.store.replace_all(
                document
                    .waystones
                    .into_iter()
                    .map(|waystone| (waystone.id.clone(), waystone)),
            );
            info!("Loaded {} waystones", self.store.count());
        }
        self.persistence.mark_loaded();
    }

    pub fn is_loaded(&self) -> bool {
        self.persistence.is_loaded()
    }

    /// Flushes the current state, e.g. on shutdown.
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
                self.verbosity(),
                "Saved {} waystones to {}",
                self.store.count(),
                self.path().display()
            );
        }
        outcome
    }

    /// Full snapshot, ordered by creation so successive files diff cleanly.
    pub fn document(&self) -> WaystonesDocument {
        let mut waystones = self.store.values();
        waystones.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        WaystonesDocument {
            config: self.settings(),
            waystones,
        }
    }

    /// Level for chatty per-operation messages.
    pub(crate) fn verbosity(&self) -> Level {
        if self.debug_logs() {
            Level::Info
        } else {
            Level::Debug
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Adds a waystone, rejecting a name already used by another record.
    pub fn register(&self, waystone: Waystone) -> Result<()> {
        let name = waystone.name.clone();
        {
            let _names = self.lock_names();
            if self.is_name_taken(&name, Some(&waystone.id)) {
                return Err(WaystoneError::NameTaken(name));
            }
            self.store.put(waystone.id.clone(), waystone);
        }
        self.request_save();
        info!("Registered waystone: {}", name);
        Ok(())
    }

    /// Adds a waystone, suffixing its name until it is free.
    pub fn register_with_unique_name(&self, mut waystone: Waystone) -> Waystone {
        {
            let _names = self.lock_names();
            waystone.name = self.generate_unique_name(&waystone.name, Some(&waystone.id));
            self.store.put(waystone.id.clone(), waystone.clone());
        }
        self.request_save();
        info!("Registered waystone: {}", waystone.name);
        waystone
    }

    pub fn unregister(&self, id: &str) -> bool {
        match self.store.remove(id) {
            Some(removed) => {
                self.request_save();
                info!("Unregistered waystone: {}", removed.name);
                true
            }
            None => false,
        }
    }

    fn lock_names(&self) -> MutexGuard<'_, ()> {
        self.name_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn get(&self, id: &str) -> Option<Waystone> {
        self.store.get(id)
    }

    pub fn exists(&self, id: &str) -> bool {
        self.store.contains(id)
    }

    /// Every waystone whose block contains the given coordinate, by id.
    pub fn get_all_by_position(&self, world: &str, x: f64, y: f64, z: f64) -> Vec<Waystone> {
        let pos = BlockPos::containing(x, y, z);
        let mut matches = self.store.filter(|w| w.world == world && w.block() == pos);
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        matches
    }

    /// The waystone at a block position. When several records share the
    /// block the one with the smallest id wins and a warning is logged.
    pub fn get_by_position(&self, world: &str, x: f64, y: f64, z: f64) -> Option<Waystone> {
        let mut matches = self.get_all_by_position(world, x, y, z);
        if matches.len() > 1 {
            warn!(
                "{} waystones share block {} in {}; using {}",
                matches.len(),
                BlockPos::containing(x, y, z),
                world,
                matches[0].id
            );
        }
        if matches.is_empty() {
            None
        } else {
            Some(matches.swap_remove(0))
        }
    }

    /// All waystones in list order.
    pub fn get_all(&self) -> Vec<Waystone> {
        let mut all = self.store.values();
        all.sort_by(display_order);
        all
    }

    pub fn get_by_owner(&self, owner_id: &str) -> Vec<Waystone> {
        let mut owned = self.store.filter(|w| w.owner_id == owner_id);
        owned.sort_by(display_order);
        owned
    }

    pub fn count_by_owner(&self, owner_id: &str) -> usize {
        self.store.filter(|w| w.owner_id == owner_id).len()
    }

    /// Public waystones plus those owned by `principal`, in list order.
    pub fn get_visible_to(&self, principal: &str) -> Vec<Waystone> {
        let mut visible = self.store.filter(|w| w.is_visible_to(principal));
        visible.sort_by(display_order);
        visible
    }

    pub fn get_public(&self) -> Vec<Waystone> {
        let mut public = self.store.filter(|w| w.is_public);
        public.sort_by(display_order);
        public
    }

    /// Case-insensitive, whitespace-trimmed name lookup.
    pub fn find_by_name(&self, name: &str) -> Option<Waystone> {
        let key = normalize_name(name);
        self.store
            .filter(|w| w.normalized_name() == key)
            .into_iter()
            .min_by(|a, b| a.id.cmp(&b.id))
    }

    /// Whether another record (not `exclude_id`) already uses `name`.
    pub fn is_name_taken(&self, name: &str, exclude_id: Option<&str>) -> bool {
        let key = normalize_name(name);
        !self
            .store
            .filter(|w| Some(w.id.as_str()) != exclude_id && w.normalized_name() == key)
            .is_empty()
    }

    /// `base` if free, otherwise `base 2`, `base 3`, ...
    pub fn generate_unique_name(&self, base: &str, exclude_id: Option<&str>) -> String {
        let base = base.trim();
        if !self.is_name_taken(base, exclude_id) {
            return base.to_string();
        }
        (2u64..)
            .map(|n| format!("{} {}", base, n))
            .find(|candidate| !self.is_name_taken(candidate, exclude_id))
            .unwrap_or_else(|| base.to_string())
    }

    pub fn count(&self) -> usize {
        self.store.count()
    }

    // ========================================================================
    // Setters
    // ========================================================================

    /// Applies `f` and saves. Returns false without saving when `id` is absent.
    fn mutate<F>(&self, id: &str, what: &str, f: F) -> bool
    where
        F: FnOnce(&mut Waystone),
    {
        let name = self.store.update(id, |waystone| {
            f(waystone);
            waystone.name.clone()
        });
        match name {
            Some(name) => {
                self.request_save();
                log!(self.verbosity(), "Updated {} of waystone '{}'", what, name);
                true
            }
            None => false,
        }
    }

    /// Renames a waystone to the trimmed `name`. `Ok(false)` when absent.
    pub fn update_name(&self, id: &str, name: &str) -> Result<bool> {
        let name = name.trim().to_string();
        {
            let _names = self.lock_names();
            if !self.exists(id) {
                return Ok(false);
            }
            if self.is_name_taken(&name, Some(id)) {
                return Err(WaystoneError::NameTaken(name));
            }
            if self.store.update(id, |w| w.name = name.clone()).is_none() {
                return Ok(false);
            }
        }
        self.request_save();
        info!("Updated waystone name to: {}", name);
        Ok(true)
    }

    pub fn update_visibility(&self, id: &str, is_public: bool) -> bool {
        self.mutate(id, "visibility", |w| w.is_public = is_public)
    }

    pub fn toggle_visibility(&self, id: &str) -> bool {
        let toggled = self.store.update(id, |w| {
            w.is_public = !w.is_public;
            (w.name.clone(), w.is_public)
        });
        match toggled {
            Some((name, is_public)) => {
                self.request_save();
                info!(
                    "Toggled waystone visibility: {} is now {}",
                    name,
                    if is_public { "public" } else { "private" }
                );
                true
            }
            None => false,
        }
    }

    pub fn update_priority(&self, id: &str, priority: i32) -> bool {
        self.mutate(id, "priority", |w| w.priority = priority)
    }

    pub fn update_text_color(&self, id: &str, text_color: &str) -> bool {
        self.mutate(id, "text color", |w| w.text_color = text_color.to_string())
    }

    pub fn update_teleport_direction(&self, id: &str, direction: TeleportDirection) -> bool {
        self.mutate(id, "teleport direction", |w| w.teleport_direction = direction)
    }

    pub fn update_player_orientation(&self, id: &str, orientation: PlayerOrientation) -> bool {
        self.mutate(id, "player orientation", |w| w.player_orientation = orientation)
    }

    pub fn update_server_owned(&self, id: &str, server_owned: bool) -> bool {
        self.mutate(id, "server ownership", |w| w.server_owned = server_owned)
    }

    pub fn update_default_discovered(&self, id: &str, default_discovered: bool) -> bool {
        self.mutate(id, "default discovery", |w| w.default_discovered = default_discovered)
    }

    /// Sets the color variant, then asks the swapper to replace the block.
    pub fn update_color(&self, id: &str, color: WaystoneColor) -> bool {
        if !self.mutate(id, "color", |w| w.color = color) {
            return false;
        }
        if let (Some(swapper), Some(waystone)) = (&self.block_swapper, self.store.get(id)) {
            if !swapper.swap_block(&waystone) {
                warn!("Failed to swap block for waystone '{}' at {}", waystone.name, waystone.block());
            }
        }
        true
    }

    pub fn update_owner_name(&self, id: &str, owner_name: &str) -> bool {
        let changed = self.mutate(id, "owner name", |w| w.owner_name = owner_name.to_string());
        if changed {
            warn!("Owner name of waystone {} overridden to '{}'", id, owner_name);
        }
        changed
    }

    /// Reassigns ownership. Only reachable through an explicit admin edit.
    pub fn update_owner_id(&self, id: &str, owner_id: &str) -> bool {
        let changed = self.mutate(id, "owner", |w| w.owner_id = owner_id.to_string());
        if changed {
            warn!("Owner of waystone {} reassigned to {}", id, owner_id);
        }
        changed
    }

    /// Dispatches a parsed edit to the matching setter.
    pub fn apply_edit(&self, id: &str, edit: &WaystoneEdit) -> Result<bool> {
        let applied = match edit {
            WaystoneEdit::Name(name) => return self.update_name(id, name),
            WaystoneEdit::Public(v) => self.update_visibility(id, *v),
            WaystoneEdit::Priority(v) => self.update_priority(id, *v),
            WaystoneEdit::TextColor(v) => self.update_text_color(id, v),
            WaystoneEdit::TeleportDirection(v) => self.update_teleport_direction(id, *v),
            WaystoneEdit::PlayerOrientation(v) => self.update_player_orientation(id, *v),
            WaystoneEdit::ServerOwned(v) => self.update_server_owned(id, *v),
            WaystoneEdit::OwnerName(v) => self.update_owner_name(id, v),
            WaystoneEdit::OwnerId(v) => self.update_owner_id(id, v),
            WaystoneEdit::DefaultDiscovered(v) => self.update_default_discovered(id, *v),
            WaystoneEdit::Color(v) => self.update_color(id, *v),
        };
        Ok(applied)
    }

    // ========================================================================
    // Editors and viewers
    // ========================================================================

    /// Runs a set change and saves only if the set actually changed.
    fn change_grants<F>(&self, id: &str, what: &str, principal: &str, f: F) -> bool
    where
        F: FnOnce(&mut Waystone) -> bool,
    {
        let changed = self.store.update(id, f).unwrap_or(false);
        if changed {
            self.request_save();
            log!(self.verbosity(), "{} {} on waystone {}", what, principal, id);
        }
        changed
    }

    pub fn add_editor(&self, id: &str, principal: &str) -> bool {
        self.change_grants(id, "Added editor", principal, |w| w.editors.insert(principal.to_string()))
    }

    pub fn remove_editor(&self, id: &str, principal: &str) -> bool {
        self.change_grants(id, "Removed editor", principal, |w| w.editors.remove(principal))
    }

    pub fn add_viewer(&self, id: &str, principal: &str) -> bool {
        self.change_grants(id, "Added viewer", principal, |w| w.viewers.insert(principal.to_string()))
    }

    pub fn remove_viewer(&self, id: &str, principal: &str) -> bool {
        self.change_grants(id, "Removed viewer", principal, |w| w.viewers.remove(principal))
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Drops waystones in `world` whose marker block is gone. Saves once.
    pub fn cleanup_orphaned_waystones(&self, world: &str, oracle: &dyn WorldOracle) -> usize {
        let orphans = self
            .store
            .filter(|w| w.world == world && !oracle.has_marker(world, w.block()));

        let mut removed = 0;
        for orphan in orphans {
            if self.store.remove(&orphan.id).is_some() {
                info!(
                    "Found orphaned waystone '{}' at {} - block no longer exists",
                    orphan.name,
                    orphan.block()
                );
                removed += 1;
            }
        }

        if removed > 0 {
            self.request_save();
            info!("Cleaned up {} orphaned waystones", removed);
        }
        removed
    }

    /// Removes every waystone and saves.
    pub fn clear(&self) {
        self.store.clear();
        self.request_save();
    }

    // ========================================================================
    // Runtime settings
    // ========================================================================

    pub fn settings(&self) -> Settings {
        Settings {
            debug_logs: self.debug_logs(),
            require_discover: self.require_discover(),
        }
    }

    pub fn debug_logs(&self) -> bool {
        self.debug_logs.load(Ordering::SeqCst)
    }

    pub fn set_debug_logs(&self, enabled: bool) {
        self.debug_logs.store(enabled, Ordering::SeqCst);
        self.request_save();
        info!("Config updated: debugLogs = {}", enabled);
    }

    pub fn require_discover(&self) -> bool {
        self.require_discover.load(Ordering::SeqCst)
    }

    pub fn set_require_discover(&self, required: bool) {
        self.require_discover.store(required, Ordering::SeqCst);
        self.request_save();
        info!("Config updated: requireDiscover = {}", required);
    }

    pub fn apply_config(&self, edit: ConfigEdit) {
        match edit {
            ConfigEdit::DebugLogs(enabled) => self.set_debug_logs(enabled),
            ConfigEdit::RequireDiscover(required) => self.set_require_discover(required),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Location;
    use crate::storage::DurabilityMode;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicUsize;
    use tempfile::TempDir;

    fn registry() -> WaystoneRegistry {
        WaystoneRegistry::new(&RegistryConfig::in_memory())
    }

    fn stone(name: &str, owner: &str, is_public: bool) -> Waystone {
        Waystone::new(name, Location::new("overworld", 0.0, 64.0, 0.0), owner, "Owner", is_public)
    }

    fn stone_at(name: &str, x: f64, y: f64, z: f64) -> Waystone {
        Waystone::new(name, Location::new("overworld", x, y, z), "p-1", "Alice", true)
    }

    #[test]
    fn test_register_rejects_taken_names() {
        let registry = registry();
        registry.register(stone("Spawn", "p-1", true)).unwrap();

        let err = registry.register(stone("  spawn ", "p-2", true)).unwrap_err();
        assert_eq!(err, WaystoneError::NameTaken("  spawn ".into()));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_generate_unique_name_skips_taken_suffixes() {
        let registry = registry();
        registry.register(stone("X", "p-1", true)).unwrap();
        registry.register(stone("X 2", "p-1", true)).unwrap();

        assert_eq!(registry.generate_unique_name("X", None), "X 3");
        assert_eq!(registry.generate_unique_name("Y", None), "Y");

        let placed = registry.register_with_unique_name(stone("x", "p-2", true));
        assert_eq!(placed.name(), "x 3");
        assert_eq!(registry.get(placed.id()).unwrap().name(), "x 3");
    }

    #[test]
    fn test_visible_list_order() {
        let registry = registry();
        registry.register(stone("Zeta", "p-2", true)).unwrap();
        registry.register(stone("Beta", "p-1", false)).unwrap();
        registry.register(stone("alpha", "p-2", true)).unwrap();
        registry.register(stone("Hidden", "p-2", false)).unwrap();

        let names: Vec<String> = registry
            .get_visible_to("p-1")
            .iter()
            .map(|w| w.name().to_string())
            .collect();
        assert_eq!(names, vec!["alpha", "Beta", "Zeta"]);
    }

    #[test]
    fn test_priority_sorts_first() {
        let registry = registry();
        registry.register(stone("alpha", "p-1", true)).unwrap();
        registry.register(stone("Zeta", "p-1", true).with_priority(10)).unwrap();

        let names: Vec<String> = registry.get_public().iter().map(|w| w.name().to_string()).collect();
        assert_eq!(names, vec!["Zeta", "alpha"]);
    }

    #[test]
    fn test_position_lookup_floors_coordinates() {
        let registry = registry();
        let placed = stone_at("Well", 10.7, 64.2, -3.5);
        let id = placed.id().to_string();
        registry.register(placed).unwrap();

        assert_eq!(registry.get_by_position("overworld", 10.0, 64.9, -3.01).unwrap().id(), id);
        assert!(registry.get_by_position("overworld", 11.0, 64.0, -3.5).is_none());
        assert!(registry.get_by_position("nether", 10.7, 64.2, -3.5).is_none());
    }

    #[test]
    fn test_shared_block_resolves_to_smallest_id() {
        let registry = registry();
        let a = stone_at("A", 1.0, 1.0, 1.0);
        let b = stone_at("B", 1.2, 1.4, 1.9);
        let smallest = a.id().min(b.id()).to_string();
        registry.register(a).unwrap();
        registry.register(b).unwrap();

        assert_eq!(registry.get_all_by_position("overworld", 1.0, 1.0, 1.0).len(), 2);
        assert_eq!(registry.get_by_position("overworld", 1.0, 1.0, 1.0).unwrap().id(), smallest);
    }

    #[test]
    fn test_setters_on_missing_id_do_not_save() {
        let registry = registry();
        assert!(!registry.update_priority("nope", 3));
        assert!(!registry.toggle_visibility("nope"));
        assert!(!registry.update_name("nope", "Name").unwrap());
        assert!(!registry.add_editor("nope", "p-2"));
        assert_eq!(registry.save_stats().requested, 0);
    }

    #[test]
    fn test_update_name_trims_and_checks_others() {
        let registry = registry();
        let a = stone("Spawn", "p-1", true);
        let a_id = a.id().to_string();
        registry.register(a).unwrap();
        registry.register(stone("Market", "p-1", true)).unwrap();

        assert!(registry.update_name(&a_id, "  SPAWN  ").unwrap());
        assert_eq!(registry.get(&a_id).unwrap().name(), "SPAWN");
        assert!(matches!(
            registry.update_name(&a_id, "market"),
            Err(WaystoneError::NameTaken(_))
        ));
    }

    #[test]
    fn test_grants_save_only_on_change() {
        let registry = registry();
        let placed = stone("Spawn", "p-1", false);
        let id = placed.id().to_string();
        registry.register(placed).unwrap();
        let before = registry.save_stats().requested;

        assert!(registry.add_editor(&id, "p-2"));
        assert!(!registry.add_editor(&id, "p-2"));
        assert!(registry.add_viewer(&id, "p-3"));
        assert!(!registry.remove_viewer(&id, "p-4"));
        assert_eq!(registry.save_stats().requested, before + 2);
        assert!(registry.get(&id).unwrap().can_edit("p-2"));
    }

    struct CountingSwapper(AtomicUsize);

    impl BlockSwapper for CountingSwapper {
        fn swap_block(&self, waystone: &Waystone) -> bool {
            assert_eq!(waystone.color(), WaystoneColor::Red);
            self.0.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    #[test]
    fn test_update_color_runs_block_swapper() {
        let swapper = Arc::new(CountingSwapper(AtomicUsize::new(0)));
        let registry = WaystoneRegistry::new(&RegistryConfig::in_memory()).with_block_swapper(swapper.clone());
        let placed = stone("Spawn", "p-1", true);
        let id = placed.id().to_string();
        registry.register(placed).unwrap();

        assert!(registry.update_color(&id, WaystoneColor::Red));
        assert!(!registry.update_color("missing", WaystoneColor::Red));
        assert_eq!(swapper.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_apply_edit_dispatches() {
        let registry = registry();
        let placed = stone("Spawn", "p-1", true);
        let id = placed.id().to_string();
        registry.register(placed).unwrap();

        assert!(registry.apply_edit(&id, &WaystoneEdit::parse("direction", "south").unwrap()).unwrap());
        assert!(registry.apply_edit(&id, &WaystoneEdit::parse("owneruuid", "p-9").unwrap()).unwrap());
        let edited = registry.get(&id).unwrap();
        assert_eq!(edited.teleport_direction(), TeleportDirection::South);
        assert_eq!(edited.owner_id(), "p-9");
    }

    struct Missing(HashSet<BlockPos>);

    impl WorldOracle for Missing {
        fn has_marker(&self, _world: &str, pos: BlockPos) -> bool {
            !self.0.contains(&pos)
        }

        fn is_passable(&self, _world: &str, _pos: BlockPos) -> bool {
            true
        }
    }

    #[test]
    fn test_orphan_cleanup_saves_once() {
        let registry = registry();
        registry.register(stone_at("A", 1.0, 1.0, 1.0)).unwrap();
        registry.register(stone_at("B", 2.0, 1.0, 1.0)).unwrap();
        registry.register(stone_at("C", 3.0, 1.0, 1.0)).unwrap();
        let before = registry.save_stats().requested;

        let oracle = Missing([BlockPos::new(1, 1, 1), BlockPos::new(2, 1, 1)].into_iter().collect());
        assert_eq!(registry.cleanup_orphaned_waystones("nether", &oracle), 0);
        assert_eq!(registry.cleanup_orphaned_waystones("overworld", &oracle), 2);
        assert_eq!(registry.count(), 1);
        assert_eq!(registry.save_stats().requested, before + 1);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let config = RegistryConfig::new(temp_dir.path()).durability(DurabilityMode::Sync);

        let registry = WaystoneRegistry::new(&config);
        registry.load();
        let placed = stone("Spawn", "p-1", true).with_priority(4);
        let id = placed.id().to_string();
        registry.register(placed).unwrap();
        registry.add_editor(&id, "p-2");
        registry.set_require_discover(true);

        let reloaded = WaystoneRegistry::new(&config);
        assert!(!reloaded.is_loaded());
        reloaded.load();
        assert!(reloaded.is_loaded());
        assert!(reloaded.require_discover());
        assert!(!reloaded.debug_logs());
        assert_eq!(reloaded.get(&id), registry.get(&id));
    }

    #[test]
    fn test_second_load_replaces_memory() {
        let temp_dir = TempDir::new().unwrap();
        let config = RegistryConfig::new(temp_dir.path());

        let writer = WaystoneRegistry::new(&config);
        writer.register(stone("Spawn", "p-1", true)).unwrap();

        let reader = WaystoneRegistry::new(&config);
        reader.load();
        assert_eq!(reader.count(), 1);

        writer.register(stone("Market", "p-1", true)).unwrap();
        reader.load();
        assert_eq!(reader.count(), 2);
    }

    #[test]
    fn test_reload_of_malformed_file_starts_fresh() {
        let temp_dir = TempDir::new().unwrap();
        let config = RegistryConfig::new(temp_dir.path());

        let registry = WaystoneRegistry::new(&config);
        registry.load();
        registry.register(stone("Spawn", "p-1", true)).unwrap();
        registry.set_require_discover(true);

        std::fs::write(config.waystones_path(), "{ \"Waystones\": [").unwrap();
        registry.load();
        assert_eq!(registry.count(), 0);
        assert!(!registry.require_discover());

        // A missing file keeps what is in memory.
        registry.register(stone("Market", "p-1", true)).unwrap();
        std::fs::remove_file(config.waystones_path()).unwrap();
        registry.load();
        assert_eq!(registry.count(), 1);
    }
}
