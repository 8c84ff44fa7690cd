//! gridsnap-state: cluster domain types for gridsnap.
//!
//! Provides the records a scheduling snapshot is built from: nodes, the
//! pods assigned to them, label selectors for querying pods, and the
//! per-node aggregate (`NodeInfo`) that ties a node to its pods.
//!
//! # Architecture
//!
//! Raw `Pod` and `Node` records are grouped by node name into `NodeInfo`
//! aggregates via [`create_node_name_to_info_map`]. Aggregates are meant to
//! be wrapped in `Arc` and shared read-only with snapshots.

pub mod error;
pub mod labels;
pub mod node_info;
pub mod types;

pub use error::{StateError, StateResult};
pub use labels::{LabelSelector, Operator, Requirement};
pub use node_info::{NodeInfo, OrphanPolicy, create_node_name_to_info_map};
pub use types::*;
