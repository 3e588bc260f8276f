pub mod error;
pub mod types;
pub mod waystone;

pub use error::{Result, WaystoneError};
pub use types::{BlockPos, Location, PlayerOrientation, TeleportDirection, TeleportTarget, WaystoneColor};
pub use waystone::{DEFAULT_TEXT_COLOR, Waystone, display_order, normalize_name};
