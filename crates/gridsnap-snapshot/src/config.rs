//! Snapshot capture configuration.
//!
//! ```toml
//! orphan_policy = "drop"
//! isolate_node_infos = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use gridsnap_state::OrphanPolicy;

/// Knobs controlling how a capture is turned into a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SnapshotConfig {
    /// Handling of pods bound to node names missing from the node list.
    pub orphan_policy: OrphanPolicy,
    /// Deep-copy producer aggregates instead of sharing them.
    pub isolate_node_infos: bool,
}

impl SnapshotConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
