pub mod codec;
pub mod coalesce;
pub mod memory;
pub mod persistence;

pub use codec::SnapshotFormat;
pub use coalesce::{SaveCoordinator, SaveOutcome, SaveStats};
pub use memory::InMemoryStore;
pub use persistence::{DurabilityMode, PersistenceController, SnapshotFile};
