use crate::access::{self, PrincipalOracle};
use crate::config::RegistryConfig;
use crate::core::{BlockPos, Location, Result, TeleportTarget, Waystone, WaystoneError};
use crate::registry::{ConfigEdit, DiscoveryRegistry, WaystoneEdit, WaystoneRegistry};
use crate::world::{self, BlockSwapper, WorldOracle};
use log::{debug, info, log, warn};
use std::sync::Arc;

/// Result of interacting with a waystone block.
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// A new waystone was registered for the placing principal.
    Created(Waystone),
    /// A waystone already stood at the position.
    Existing(Waystone),
}

impl Placement {
    pub fn waystone(&self) -> &Waystone {
        match self {
            Self::Created(waystone) | Self::Existing(waystone) => waystone,
        }
    }
}

/// Owns both registries and the host collaborators, and runs the player
/// facing flows on top of them.
///
/// Lifecycle: `open` → `load` → operations → `shutdown`.
pub struct WaystoneService {
    config: RegistryConfig,
    waystones: Arc<WaystoneRegistry>,
    discovery: Arc<DiscoveryRegistry>,
    oracle: Arc<dyn PrincipalOracle>,
    world: Arc<dyn WorldOracle>,
}

impl WaystoneService {
    pub fn open(config: RegistryConfig, oracle: Arc<dyn PrincipalOracle>, world: Arc<dyn WorldOracle>) -> Self {
        Self::build(config, oracle, world, None)
    }

    pub fn open_with_block_swapper(
        config: RegistryConfig,
        oracle: Arc<dyn PrincipalOracle>,
        world: Arc<dyn WorldOracle>,
        swapper: Arc<dyn BlockSwapper>,
    ) -> Self {
        Self::build(config, oracle, world, Some(swapper))
    }

    fn build(
        config: RegistryConfig,
        oracle: Arc<dyn PrincipalOracle>,
        world: Arc<dyn WorldOracle>,
        swapper: Option<Arc<dyn BlockSwapper>>,
    ) -> Self {
        let mut registry = WaystoneRegistry::new(&config);
        if let Some(swapper) = swapper {
            registry = registry.with_block_swapper(swapper);
        }
        let waystones = Arc::new(registry);
        let discovery = Arc::new(DiscoveryRegistry::new(&config, Arc::clone(&waystones)));
        Self {
            config,
            waystones,
            discovery,
            oracle,
            world,
        }
    }

    /// Reads both documents. Waystones first, so discovery pruning sees them.
    pub fn load(&self) {
        self.waystones.load();
        self.discovery.load();
        info!(
            "Waystone service ready: {} waystones, {} players",
            self.waystones.count(),
            self.discovery.player_count()
        );
    }

    pub fn is_loaded(&self) -> bool {
        self.waystones.is_loaded() && self.discovery.is_loaded()
    }

    /// Final flush of both registries.
    pub fn shutdown(&self) {
        self.waystones.save();
        self.discovery.save();
        info!("Waystone service shut down");
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn waystones(&self) -> &Arc<WaystoneRegistry> {
        &self.waystones
    }

    pub fn discovery(&self) -> &Arc<DiscoveryRegistry> {
        &self.discovery
    }

    // ========================================================================
    // Placement and removal
    // ========================================================================

    /// Handles a principal using or placing a waystone block at `pos`.
    pub fn place_waystone(&self, principal: &str, principal_name: &str, world: &str, pos: BlockPos) -> Result<Placement> {
        self.waystones
            .cleanup_orphaned_waystones(world, self.world.as_ref());

        let (x, y, z) = (pos.x as f64, pos.y as f64, pos.z as f64);
        if let Some(existing) = self.waystones.get_by_position(world, x, y, z) {
            self.discovery.discover_waystone(principal, existing.id());
            return Ok(Placement::Existing(existing));
        }

        let oracle = self.oracle.as_ref();
        if !access::can_place(oracle, principal) {
            log!(
                self.waystones.verbosity(),
                "Blocked waystone placement for {} at {} {}",
                principal,
                world,
                pos
            );
            return Err(WaystoneError::PermissionDenied("waystone placement is blocked".into()));
        }
        access::check_creation_limit(oracle, principal, self.waystones.count_by_owner(principal))?;

        let is_public = access::can_make_public(oracle, principal);
        let waystone = Waystone::new(
            self.config.default_name.as_str(),
            Location::new(world, x, y, z),
            principal,
            principal_name,
            is_public,
        );
        let waystone = self.waystones.register_with_unique_name(waystone);
        self.discovery.discover_waystone(principal, waystone.id());
        Ok(Placement::Created(waystone))
    }

    /// Handles a principal breaking the block at `pos`. Returns the removed
    /// waystone, or `None` when nothing was registered there.
    pub fn break_waystone(&self, principal: &str, world: &str, pos: BlockPos) -> Result<Option<Waystone>> {
        let existing = self
            .waystones
            .get_by_position(world, pos.x as f64, pos.y as f64, pos.z as f64);

        if let Err(err) = access::check_removal(self.oracle.as_ref(), principal, existing.as_ref()) {
            log!(
                self.waystones.verbosity(),
                "Blocked waystone removal for {} at {} {}: {}",
                principal,
                world,
                pos,
                err
            );
            return Err(err);
        }

        match existing {
            Some(waystone) => {
                self.waystones.unregister(waystone.id());
                self.discovery.forget_waystone(waystone.id());
                Ok(Some(waystone))
            }
            None => {
                debug!("Waystone block broken at {} {} but none was registered", world, pos);
                Ok(None)
            }
        }
    }

    // ========================================================================
    // Listing and travel
    // ========================================================================

    /// Waystones the principal may pick from, in list order.
    pub fn list_for(&self, principal: &str, search: Option<&str>) -> Vec<Waystone> {
        let oracle = self.oracle.as_ref();
        let see_all = access::can_see_all_private(oracle, principal);
        let filter_undiscovered =
            self.waystones.require_discover() && !access::can_show_undiscovered(oracle, principal);
        let discovered = if filter_undiscovered {
            self.discovery.get_discovered(principal)
        } else {
            Default::default()
        };
        let needle = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        self.waystones
            .get_all()
            .into_iter()
            .filter(|w| see_all || w.can_view(principal))
            .filter(|w| {
                !filter_undiscovered
                    || w.is_owned_by(principal)
                    || w.is_default_discovered()
                    || discovered.contains(w.id())
            })
            .filter(|w| match &needle {
                Some(needle) => {
                    w.name().to_lowercase().contains(needle.as_str())
                        || w.owner_name().to_lowercase().contains(needle.as_str())
                }
                None => true,
            })
            .collect()
    }

    /// List opened from a command rather than a waystone block.
    pub fn list_menu_for(&self, principal: &str, search: Option<&str>) -> Result<Vec<Waystone>> {
        if !access::can_open_list(self.oracle.as_ref(), principal) {
            return Err(WaystoneError::PermissionDenied("the waystone list".into()));
        }
        Ok(self.list_for(principal, search))
    }

    /// Arrival point for travelling to `id`; marks it discovered.
    pub fn teleport_target_for(&self, principal: &str, id: &str) -> Result<TeleportTarget> {
        let waystone = self
            .waystones
            .get(id)
            .ok_or_else(|| WaystoneError::NotFound(id.to_string()))?;

        if !waystone.can_view(principal) && !access::can_see_all_private(self.oracle.as_ref(), principal) {
            return Err(WaystoneError::PermissionDenied(format!("'{}' is private", waystone.name())));
        }
        if !world::is_safe_destination(self.world.as_ref(), &waystone) {
            return Err(WaystoneError::UnsafeDestination(waystone.name().to_string()));
        }

        self.discovery.discover_waystone(principal, waystone.id());
        let target = waystone.teleport_target();
        log!(
            self.waystones.verbosity(),
            "Teleporting {} to '{}' in {} ({:.2}, {:.2}, {:.2})",
            principal,
            waystone.name(),
            target.world,
            target.x,
            target.y,
            target.z
        );
        Ok(target)
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Renames a waystone the principal may edit.
    pub fn rename(&self, principal: &str, id: &str, name: &str) -> Result<Waystone> {
        let name = self.config.validate_name(name)?;
        let waystone = self
            .waystones
            .get(id)
            .ok_or_else(|| WaystoneError::NotFound(id.to_string()))?;
        if !access::can_edit(self.oracle.as_ref(), principal, &waystone) {
            return Err(WaystoneError::PermissionDenied(format!("cannot rename '{}'", waystone.name())));
        }
        self.apply_checked(id, WaystoneEdit::Name(name))
    }

    /// Settings change from the waystone's own settings page.
    pub fn update_settings(&self, principal: &str, id: &str, edit: WaystoneEdit) -> Result<Waystone> {
        let oracle = self.oracle.as_ref();
        let waystone = self
            .waystones
            .get(id)
            .ok_or_else(|| WaystoneError::NotFound(id.to_string()))?;
        if !access::can_edit(oracle, principal, &waystone) {
            return Err(WaystoneError::PermissionDenied(format!("cannot edit '{}'", waystone.name())));
        }
        if edit.requires_admin() && !access::can_edit_all(oracle, principal) {
            return Err(WaystoneError::PermissionDenied(format!("{} is admin only", edit.property())));
        }
        if edit == WaystoneEdit::Public(true) && !access::can_make_public(oracle, principal) {
            return Err(WaystoneError::PermissionDenied("public waystones are blocked".into()));
        }
        let edit = edit.validated(&self.config)?;
        self.apply_checked(id, edit)
    }

    /// Admin edit of any waystone, looked up by name.
    pub fn edit(&self, principal: &str, name: &str, property: &str, value: &str) -> Result<Waystone> {
        if !access::can_edit_all(self.oracle.as_ref(), principal) {
            return Err(WaystoneError::PermissionDenied("editing waystones".into()));
        }
        let waystone = self
            .waystones
            .find_by_name(name)
            .ok_or_else(|| WaystoneError::NotFound(name.trim().to_string()))?;
        let edit = WaystoneEdit::parse(property, value)?.validated(&self.config)?;
        if edit.is_risky() {
            warn!(
                "{} changed {} of waystone '{}'; ownership checks follow the new value",
                principal,
                edit.property(),
                waystone.name()
            );
        }
        self.apply_checked(waystone.id(), edit)
    }

    /// Admin change of a persisted runtime switch.
    pub fn configure(&self, principal: &str, property: &str, value: &str) -> Result<ConfigEdit> {
        if !access::can_edit_all(self.oracle.as_ref(), principal) {
            return Err(WaystoneError::PermissionDenied("editing configuration".into()));
        }
        let edit = ConfigEdit::parse(property, value)?;
        self.waystones.apply_config(edit);
        Ok(edit)
    }

    fn apply_checked(&self, id: &str, edit: WaystoneEdit) -> Result<Waystone> {
        if !self.waystones.apply_edit(id, &edit)? {
            return Err(WaystoneError::NotFound(id.to_string()));
        }
        self.waystones
            .get(id)
            .ok_or_else(|| WaystoneError::NotFound(id.to_string()))
    }
}
