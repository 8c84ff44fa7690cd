//! gridsnap scheduling snapshot: a per-cycle, read-only view of the cluster.
//!
//! At the start of each scheduling cycle the engine captures the cache's
//! nodes and pods into a [`Snapshot`]. Every filter and score evaluation in
//! that cycle reads the same snapshot, while the live cache keeps changing
//! underneath. The snapshot is dropped or replaced at the next cycle; it is
//! never updated in place.
//!
//! # Components
//!
//! - **`snapshot`**: Store with the name index, ordered list, affinity list, generation
//! - **`listers`**: Pod and node-aggregate query facades (`PodLister`, `NodeInfoLister`)
//! - **`config`**: Capture options (orphaned pods, aggregate isolation)
//! - **`generation`**: Process-wide generation counter

pub mod config;
pub mod error;
pub mod generation;
pub mod listers;
pub mod snapshot;

pub use config::SnapshotConfig;
pub use error::{SnapshotError, SnapshotResult};
pub use generation::next_generation;
pub use listers::{
    NodeInfoLister, PodFilter, PodLister, SharedLister, SnapshotNodeInfoLister, SnapshotPodLister,
};
pub use snapshot::Snapshot;
