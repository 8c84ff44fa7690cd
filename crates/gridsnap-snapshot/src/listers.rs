//! Read-only query facades over a [`Snapshot`].
//!
//! The traits here are the interfaces scheduling plugins program against;
//! the `Snapshot*Lister` structs implement them by borrowing a snapshot,
//! so a facade can never outlive the snapshot it reads.
//!
//! Listing methods return `SnapshotResult` to keep one shape across all
//! listers, but only [`NodeInfoLister::get`] can fail.

use std::sync::Arc;

use gridsnap_state::{LabelSelector, NodeInfo, Pod};

use crate::error::{SnapshotError, SnapshotResult};
use crate::snapshot::Snapshot;

/// Predicate applied to each pod by [`PodLister::filtered_list`].
pub type PodFilter<'a> = dyn Fn(&Pod) -> bool + 'a;

/// Pod queries across every node.
pub trait PodLister {
    /// Pods whose labels match `selector`.
    fn list(&self, selector: &LabelSelector) -> SnapshotResult<Vec<Arc<Pod>>> {
        self.filtered_list(&|_: &Pod| true, selector)
    }

    /// Pods accepted by `filter` whose labels match `selector`.
    fn filtered_list(
        &self,
        filter: &PodFilter<'_>,
        selector: &LabelSelector,
    ) -> SnapshotResult<Vec<Arc<Pod>>>;
}

/// Node aggregate queries.
///
/// Returned references borrow from the underlying store for `'a`, not from
/// the lister value.
pub trait NodeInfoLister<'a> {
    /// All aggregates, in node name order.
    fn list(&self) -> SnapshotResult<&'a [Arc<NodeInfo>]>;

    /// Aggregates hosting at least one pod with inter-pod affinity.
    fn have_pods_with_affinity_list(&self) -> SnapshotResult<&'a [Arc<NodeInfo>]>;

    /// The aggregate for `node_name`.
    fn get(&self, node_name: &str) -> SnapshotResult<&'a Arc<NodeInfo>>;
}

/// Access to both listers from one source.
pub trait SharedLister {
    fn pods(&self) -> Box<dyn PodLister + '_>;
    fn node_infos(&self) -> Box<dyn NodeInfoLister<'_> + '_>;
}

/// [`PodLister`] backed by a snapshot.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotPodLister<'a> {
    snapshot: &'a Snapshot,
}

impl<'a> SnapshotPodLister<'a> {
    pub(crate) fn new(snapshot: &'a Snapshot) -> Self {
        Self { snapshot }
    }
}

impl PodLister for SnapshotPodLister<'_> {
    fn filtered_list(
        &self,
        filter: &PodFilter<'_>,
        selector: &LabelSelector,
    ) -> SnapshotResult<Vec<Arc<Pod>>> {
        // Filters are expected to accept most pods, so size for all of them
        // up front instead of growing.
        let mut pods = Vec::with_capacity(self.snapshot.num_pods());
        for info in self.snapshot.node_info_list() {
            for pod in info.pods() {
                if filter(pod) && selector.matches(&pod.labels) {
                    pods.push(Arc::clone(pod));
                }
            }
        }
        Ok(pods)
    }
}

/// [`NodeInfoLister`] backed by a snapshot.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotNodeInfoLister<'a> {
    snapshot: &'a Snapshot,
}

impl<'a> SnapshotNodeInfoLister<'a> {
    pub(crate) fn new(snapshot: &'a Snapshot) -> Self {
        Self { snapshot }
    }
}

impl<'a> NodeInfoLister<'a> for SnapshotNodeInfoLister<'a> {
    fn list(&self) -> SnapshotResult<&'a [Arc<NodeInfo>]> {
        Ok(self.snapshot.node_info_list())
    }

    fn have_pods_with_affinity_list(&self) -> SnapshotResult<&'a [Arc<NodeInfo>]> {
        Ok(self.snapshot.have_pods_with_affinity_list())
    }

    fn get(&self, node_name: &str) -> SnapshotResult<&'a Arc<NodeInfo>> {
        self.snapshot
            .node_info_map()
            .get(node_name)
            .ok_or_else(|| SnapshotError::NotFound(node_name.to_string()))
    }
}

impl SharedLister for Snapshot {
    fn pods(&self) -> Box<dyn PodLister + '_> {
        Box::new(Snapshot::pods(self))
    }

    fn node_infos(&self) -> Box<dyn NodeInfoLister<'_> + '_> {
        Box::new(Snapshot::node_infos(self))
    }
}
