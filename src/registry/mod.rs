pub mod discovery;
pub mod edit;
pub mod waystones;

pub use discovery::{DiscoveryDocument, DiscoveryRegistry, PlayerEntry};
pub use edit::{CONFIG_PROPERTIES, ConfigEdit, EDITABLE_PROPERTIES, WaystoneEdit};
pub use waystones::{WaystoneRegistry, WaystonesDocument};
