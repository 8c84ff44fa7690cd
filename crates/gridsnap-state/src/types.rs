//! Domain types for cluster state.
//!
//! These types are the raw node and pod records produced by the cluster
//! cache. All types are serializable to/from JSON so captures can be
//! replayed from fixtures.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::labels::LabelSelector;

/// Unique identifier for a node in the cluster.
pub type NodeName = String;

/// Label set attached to a node or pod.
pub type Labels = BTreeMap<String, String>;

// ── Node ──────────────────────────────────────────────────────────

/// A cluster node as known to the cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Node {
    pub name: NodeName,
    #[serde(default)]
    pub labels: Labels,
}

impl Node {
    pub fn new(name: impl Into<NodeName>) -> Self {
        Self {
            name: name.into(),
            labels: Labels::new(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

// ── Pod ───────────────────────────────────────────────────────────

/// A pod and the node it has been assigned to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pod {
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Assigned node. Empty when the pod has not been bound yet.
    #[serde(default)]
    pub node_name: NodeName,
    #[serde(default)]
    pub labels: Labels,
    /// Inter-pod affinity and anti-affinity terms.
    #[serde(default)]
    pub affinity: Option<Affinity>,
}

fn default_namespace() -> String {
    "default".to_string()
}

impl Pod {
    /// Create an unassigned pod in the `default` namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: default_namespace(),
            node_name: NodeName::new(),
            labels: Labels::new(),
            affinity: None,
        }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn on_node(mut self, node_name: impl Into<NodeName>) -> Self {
        self.node_name = node_name.into();
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_affinity(mut self, affinity: Affinity) -> Self {
        self.affinity = Some(affinity);
        self
    }

    /// Whether the pod has been bound to a node.
    pub fn is_assigned(&self) -> bool {
        !self.node_name.is_empty()
    }

    /// Whether the pod declares at least one pod-affinity or
    /// pod-anti-affinity term.
    pub fn has_affinity(&self) -> bool {
        self.affinity.as_ref().is_some_and(Affinity::has_terms)
    }

    /// `{namespace}/{name}` key, unique within a cluster.
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

// ── Affinity ──────────────────────────────────────────────────────

/// Inter-pod scheduling constraints carried by a pod.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Affinity {
    /// Co-locate with pods matching these terms.
    #[serde(default)]
    pub pod_affinity: Vec<PodAffinityTerm>,
    /// Keep away from pods matching these terms.
    #[serde(default)]
    pub pod_anti_affinity: Vec<PodAffinityTerm>,
}

impl Affinity {
    pub fn has_terms(&self) -> bool {
        !self.pod_affinity.is_empty() || !self.pod_anti_affinity.is_empty()
    }
}

/// A single affinity term: pods matching `label_selector` within the
/// topology domain named by `topology_key`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PodAffinityTerm {
    pub label_selector: LabelSelector,
    pub topology_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone_term(app: &str) -> PodAffinityTerm {
        PodAffinityTerm {
            label_selector: LabelSelector::everything().with_equals("app", app),
            topology_key: "zone".to_string(),
        }
    }

    #[test]
    fn new_pod_is_unassigned() {
        let pod = Pod::new("web-0");
        assert!(!pod.is_assigned());
        assert_eq!(pod.namespace, "default");
        assert_eq!(pod.key(), "default/web-0");
    }

    #[test]
    fn empty_affinity_is_not_affinity() {
        let pod = Pod::new("web-0").with_affinity(Affinity::default());
        assert!(!pod.has_affinity());
    }

    #[test]
    fn affinity_or_anti_affinity_term_counts() {
        let with_affinity = Pod::new("a").with_affinity(Affinity {
            pod_affinity: vec![zone_term("db")],
            pod_anti_affinity: Vec::new(),
        });
        let with_anti = Pod::new("b").with_affinity(Affinity {
            pod_affinity: Vec::new(),
            pod_anti_affinity: vec![zone_term("web")],
        });

        assert!(with_affinity.has_affinity());
        assert!(with_anti.has_affinity());
    }

    #[test]
    fn pod_deserializes_with_defaults() {
        let pod: Pod = serde_json::from_str(r#"{"name": "p1", "node_name": "n1"}"#).unwrap();

        assert_eq!(pod.namespace, "default");
        assert_eq!(pod.node_name, "n1");
        assert!(pod.labels.is_empty());
        assert!(pod.affinity.is_none());
    }

    #[test]
    fn node_builder_sets_labels() {
        let node = Node::new("n1").with_label("zone", "a");
        assert_eq!(node.labels.get("zone"), Some(&"a".to_string()));
    }
}
