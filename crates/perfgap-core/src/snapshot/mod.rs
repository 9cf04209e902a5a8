//! Input snapshots and direction resolution.

mod directions;
mod parser;

pub use directions::{normalize_component_type, DirectionTable};
pub use parser::{Snapshot, SnapshotEntry, SnapshotError};
