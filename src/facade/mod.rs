pub mod service;

pub use service::{Placement, WaystoneService};
