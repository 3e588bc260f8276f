// ============================================================================
// Waystones Library
// ============================================================================

pub mod access;
pub mod config;
pub mod core;
pub mod facade;
pub mod registry;
pub mod storage;
pub mod world;

// Re-export main types for convenience
pub use access::{PermissionProvider, PermissionTable, PrincipalOracle, permissions};
pub use config::{RegistryConfig, Settings};
pub use self::core::{
    BlockPos, Location, PlayerOrientation, Result, TeleportDirection, TeleportTarget, Waystone, WaystoneColor,
    WaystoneError,
};
pub use facade::{Placement, WaystoneService};
pub use registry::{ConfigEdit, DiscoveryRegistry, WaystoneEdit, WaystoneRegistry};
pub use storage::{DurabilityMode, SaveOutcome, SaveStats, SnapshotFormat};
pub use world::{BlockSwapper, WorldOracle, is_safe_destination};

// ============================================================================
// Quick start
// ============================================================================

/// Opens a registry pair without any world or permission hooks.
///
/// Useful for tools that only inspect or repair the data files.
///
/// # Examples
///
/// ```
/// use waystones::{Location, RegistryConfig, Waystone};
///
/// let (registry, discovery) = waystones::open_registries(&RegistryConfig::in_memory());
/// let spawn = Waystone::new("Spawn", Location::new("overworld", 0.0, 64.0, 0.0), "p-1", "Alice", true);
/// let id = spawn.id().to_string();
/// registry.register(spawn).unwrap();
///
/// assert!(discovery.discover_waystone("p-2", &id));
/// assert_eq!(registry.get_visible_to("p-2").len(), 1);
/// ```
pub fn open_registries(config: &RegistryConfig) -> (std::sync::Arc<WaystoneRegistry>, DiscoveryRegistry) {
    let registry = std::sync::Arc::new(WaystoneRegistry::new(config));
    let discovery = DiscoveryRegistry::new(config, std::sync::Arc::clone(&registry));
    registry.load();
    discovery.load();
    (registry, discovery)
}
