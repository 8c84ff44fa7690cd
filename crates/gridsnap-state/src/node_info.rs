//! Per-node aggregates.
//!
//! A [`NodeInfo`] combines a node's name, its descriptor (if the node is
//! still known), and the pods bound to it. The cache builds these and
//! shares them with snapshots behind `Arc`.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::types::{Node, NodeName, Pod};

/// A node together with the pods assigned to it.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    name: NodeName,
    /// `None` when pods still reference a node the cache no longer knows.
    node: Option<Node>,
    pods: Vec<Arc<Pod>>,
    /// Subset of `pods` declaring inter-pod affinity or anti-affinity.
    pods_with_affinity: Vec<Arc<Pod>>,
}

impl NodeInfo {
    /// Create an aggregate with no descriptor and no pods.
    pub fn new(name: impl Into<NodeName>) -> Self {
        Self {
            name: name.into(),
            node: None,
            pods: Vec::new(),
            pods_with_affinity: Vec::new(),
        }
    }

    /// Create an aggregate for a known node.
    pub fn with_node(node: Node) -> Self {
        let mut info = Self::new(node.name.clone());
        info.node = Some(node);
        info
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node(&self) -> Option<&Node> {
        self.node.as_ref()
    }

    pub fn pods(&self) -> &[Arc<Pod>] {
        &self.pods
    }

    pub fn pods_with_affinity(&self) -> &[Arc<Pod>] {
        &self.pods_with_affinity
    }

    pub fn has_pods_with_affinity(&self) -> bool {
        !self.pods_with_affinity.is_empty()
    }

    /// Replace the node descriptor. The descriptor's name must match.
    pub fn set_node(&mut self, node: Node) {
        debug_assert_eq!(node.name, self.name, "node descriptor name mismatch");
        self.node = Some(node);
    }

    /// Drop the node descriptor while keeping pod bookkeeping.
    pub fn remove_node(&mut self) -> Option<Node> {
        self.node.take()
    }

    pub fn add_pod(&mut self, pod: Arc<Pod>) {
        if pod.has_affinity() {
            self.pods_with_affinity.push(Arc::clone(&pod));
        }
        self.pods.push(pod);
    }

    /// Remove a pod by namespace and name. Returns whether it was present.
    pub fn remove_pod(&mut self, namespace: &str, name: &str) -> bool {
        let is_target = |p: &Arc<Pod>| p.namespace == namespace && p.name == name;
        let before = self.pods.len();
        self.pods.retain(|p| !is_target(p));
        self.pods_with_affinity.retain(|p| !is_target(p));
        self.pods.len() != before
    }
}

/// What to do with a pod bound to a node name missing from the node list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Create a placeholder aggregate with no node descriptor.
    #[default]
    Synthesize,
    /// Discard the pod.
    Drop,
}

/// Group pods by assigned node name into one aggregate per node.
///
/// Every node in `nodes` gets an entry. Pods with no assigned node are
/// skipped; pods assigned to unknown node names are handled per `policy`.
/// A repeated node name replaces the earlier descriptor.
pub fn create_node_name_to_info_map(
    pods: impl IntoIterator<Item = Arc<Pod>>,
    nodes: impl IntoIterator<Item = Node>,
    policy: OrphanPolicy,
) -> BTreeMap<NodeName, NodeInfo> {
    let mut map: BTreeMap<NodeName, NodeInfo> = BTreeMap::new();

    for node in nodes {
        match map.entry(node.name.clone()) {
            Entry::Occupied(mut e) => {
                warn!(node = %node.name, "duplicate node in capture, keeping the last descriptor");
                e.get_mut().set_node(node);
            }
            Entry::Vacant(e) => {
                e.insert(NodeInfo::with_node(node));
            }
        }
    }

    let mut orphaned = 0usize;
    for pod in pods {
        if !pod.is_assigned() {
            trace!(pod = %pod.key(), "skipping unassigned pod");
            continue;
        }
        if let Some(info) = map.get_mut(&pod.node_name) {
            info.add_pod(pod);
            continue;
        }

        orphaned += 1;
        match policy {
            OrphanPolicy::Synthesize => {
                debug!(pod = %pod.key(), node = %pod.node_name, "pod bound to unknown node, adding placeholder");
                let mut info = NodeInfo::new(pod.node_name.clone());
                info.add_pod(pod);
                map.insert(info.name.clone(), info);
            }
            OrphanPolicy::Drop => {
                debug!(pod = %pod.key(), node = %pod.node_name, "pod bound to unknown node, dropping");
            }
        }
    }

    if orphaned > 0 && policy == OrphanPolicy::Drop {
        warn!(orphaned, "dropped pods bound to unknown nodes");
    }

    map
}
