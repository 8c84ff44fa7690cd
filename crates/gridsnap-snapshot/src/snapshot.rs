//! The per-cycle snapshot store.
//!
//! A [`Snapshot`] is built once from a capture of the cluster cache and is
//! never mutated afterwards. It indexes node aggregates by name, keeps them
//! in name order, and keeps a second list of the aggregates hosting pods
//! with inter-pod affinity.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use tracing::{debug, warn};

use gridsnap_state::{Node, NodeInfo, NodeName, Pod, create_node_name_to_info_map};

use crate::config::SnapshotConfig;
use crate::generation::next_generation;
use crate::listers::{SnapshotNodeInfoLister, SnapshotPodLister};

/// Immutable view of node aggregates for one scheduling cycle.
///
/// `Send + Sync`: share it across readers with `&Snapshot` or
/// `Arc<Snapshot>`.
#[derive(Debug, Default)]
pub struct Snapshot {
    /// Node name → aggregate.
    node_info_map: BTreeMap<NodeName, Arc<NodeInfo>>,
    /// All aggregates, in node name order.
    node_info_list: Vec<Arc<NodeInfo>>,
    /// Aggregates with at least one affinity-bearing pod, in node name order.
    have_pods_with_affinity_list: Vec<Arc<NodeInfo>>,
    generation: u64,
}

impl Snapshot {
    /// Snapshot with no nodes and generation 0, used before the first capture.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from raw pods and nodes with the default config.
    pub fn new(
        pods: impl IntoIterator<Item = impl Into<Arc<Pod>>>,
        nodes: impl IntoIterator<Item = Node>,
    ) -> Self {
        Self::with_config(pods, nodes, &SnapshotConfig::default())
    }

    /// Build a snapshot from raw pods and nodes.
    ///
    /// Every node gets an aggregate. Pods bound to unknown node names are
    /// handled per `config.orphan_policy`.
    pub fn with_config(
        pods: impl IntoIterator<Item = impl Into<Arc<Pod>>>,
        nodes: impl IntoIterator<Item = Node>,
        config: &SnapshotConfig,
    ) -> Self {
        let map = create_node_name_to_info_map(
            pods.into_iter().map(Into::into),
            nodes,
            config.orphan_policy,
        );
        let index = map
            .into_iter()
            .map(|(name, info)| (name, Arc::new(info)))
            .collect();
        Self::from_index(index)
    }

    /// Build a snapshot from aggregates already maintained by a cache.
    ///
    /// Aggregates are shared with the caller unless
    /// `config.isolate_node_infos` is set. If two aggregates carry the same
    /// name, the later one wins.
    pub fn from_node_infos(
        node_infos: impl IntoIterator<Item = Arc<NodeInfo>>,
        config: &SnapshotConfig,
    ) -> Self {
        let mut index: BTreeMap<NodeName, Arc<NodeInfo>> = BTreeMap::new();
        for info in node_infos {
            let info = if config.isolate_node_infos {
                Arc::new(NodeInfo::clone(&info))
            } else {
                info
            };
            match index.entry(info.name().to_string()) {
                Entry::Occupied(mut e) => {
                    warn!(node = %info.name(), "duplicate node aggregate in capture, keeping the last");
                    e.insert(info);
                }
                Entry::Vacant(e) => {
                    e.insert(info);
                }
            }
        }
        Self::from_index(index)
    }

    /// Derive the ordered and affinity lists in one pass over the index.
    fn from_index(node_info_map: BTreeMap<NodeName, Arc<NodeInfo>>) -> Self {
        let mut node_info_list = Vec::with_capacity(node_info_map.len());
        let mut have_pods_with_affinity_list = Vec::new();
        for info in node_info_map.values() {
            node_info_list.push(Arc::clone(info));
            if info.has_pods_with_affinity() {
                have_pods_with_affinity_list.push(Arc::clone(info));
            }
        }

        let generation = next_generation();
        debug!(
            generation,
            nodes = node_info_list.len(),
            affinity_nodes = have_pods_with_affinity_list.len(),
            "snapshot built"
        );

        Self {
            node_info_map,
            node_info_list,
            have_pods_with_affinity_list,
            generation,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of node aggregates.
    pub fn len(&self) -> usize {
        self.node_info_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_info_list.is_empty()
    }

    /// Total pods across all aggregates.
    pub fn num_pods(&self) -> usize {
        self.node_info_list.iter().map(|n| n.pods().len()).sum()
    }

    pub fn node_info_map(&self) -> &BTreeMap<NodeName, Arc<NodeInfo>> {
        &self.node_info_map
    }

    pub(crate) fn node_info_list(&self) -> &[Arc<NodeInfo>] {
        &self.node_info_list
    }

    pub(crate) fn have_pods_with_affinity_list(&self) -> &[Arc<NodeInfo>] {
        &self.have_pods_with_affinity_list
    }

    /// Pod queries across every node in this snapshot.
    pub fn pods(&self) -> SnapshotPodLister<'_> {
        SnapshotPodLister::new(self)
    }

    /// Node aggregate queries.
    pub fn node_infos(&self) -> SnapshotNodeInfoLister<'_> {
        SnapshotNodeInfoLister::new(self)
    }

    /// Descriptors of every node still known to the cache, in name order.
    ///
    /// Placeholder aggregates (no descriptor) are skipped.
    pub fn list_nodes(&self) -> Vec<&Node> {
        let mut nodes = Vec::with_capacity(self.node_info_map.len());
        nodes.extend(self.node_info_list.iter().filter_map(|n| n.node()));
        nodes
    }
}
