//! World-side collaborators: block queries and block swapping.

use crate::core::{BlockPos, Waystone};

/// Read-only view of the host world's blocks.
pub trait WorldOracle: Send + Sync {
    /// Whether the waystone marker block still stands at `pos`.
    ///
    /// Implementations return `true` when the area is not loaded or cannot
    /// be inspected, so an unknown chunk never looks like an orphan.
    fn has_marker(&self, world: &str, pos: BlockPos) -> bool;

    /// Whether a traveller's body can occupy the cell at `pos`.
    fn is_passable(&self, world: &str, pos: BlockPos) -> bool;
}

/// Swaps the placed block to match a waystone's color variant.
pub trait BlockSwapper: Send + Sync {
    /// Returns false when the block could not be swapped.
    fn swap_block(&self, waystone: &Waystone) -> bool;
}

/// Feet and head cells above the waystone must both be free.
///
/// A waystone at the top of the coordinate range has no cells above it and
/// is never safe.
pub fn is_safe_destination(oracle: &dyn WorldOracle, waystone: &Waystone) -> bool {
    let base = waystone.block();
    [1, 2].into_iter().all(|dy| match base.above(dy) {
        Some(cell) => oracle.is_passable(waystone.world(), cell),
        None => false,
    })
}
