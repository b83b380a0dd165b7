//! Node-pool and cluster data model.
//!
//! Field names serialize in camelCase to match the form object the
//! presentation layer binds to.

use std::collections::BTreeMap;

use gkepool_scopes::ScopeSelection;
use gkepool_version::{KubeVersion, VersionChoice};
use serde::{Deserialize, Serialize};

/// Initial node count GKE uses when none is given.
pub const DEFAULT_INITIAL_NODE_COUNT: u32 = 3;

// =============================================================================
// Node Pool
// =============================================================================

/// The editable node-pool configuration.
///
/// Owned by a single edit session and mutated in place by the reconciler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub version: Option<KubeVersion>,

    #[serde(default)]
    pub config: NodeConfig,

    #[serde(default)]
    pub autoscaling: Autoscaling,

    #[serde(default)]
    pub management: Management,

    #[serde(default)]
    pub initial_node_count: Option<u32>,

    /// True until the pool has been created upstream.
    #[serde(default)]
    pub is_new: bool,
}

impl NodePoolConfig {
    /// A pool that does not exist upstream yet, with GKE defaults.
    #[must_use]
    pub fn new_pool() -> Self {
        Self {
            initial_node_count: Some(DEFAULT_INITIAL_NODE_COUNT),
            management: Management {
                auto_repair: true,
                auto_upgrade: true,
            },
            is_new: true,
            ..Self::default()
        }
    }
}

/// Per-node settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    #[serde(default)]
    pub machine_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_size_gb: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,

    /// Raw scope URLs. Always the expansion of the session's scope selection.
    #[serde(default)]
    pub oauth_scopes: Vec<String>,

    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// Autoscaling settings. Bounds are present iff autoscaling is enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Autoscaling {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub min_node_count: Option<u32>,

    #[serde(default)]
    pub max_node_count: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Management {
    #[serde(default)]
    pub auto_repair: bool,

    #[serde(default)]
    pub auto_upgrade: bool,
}

// =============================================================================
// Cluster Context
// =============================================================================

/// The owning cluster as seen by the node-pool form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterContext {
    #[serde(default)]
    pub control_plane_version: Option<KubeVersion>,

    /// The cluster as last persisted, absent while creating a cluster.
    #[serde(default)]
    pub original_cluster: Option<OriginalCluster>,

    #[serde(default)]
    pub location_type: LocationType,

    /// Additional node locations offered by the form.
    #[serde(default)]
    pub location_content: Vec<Location>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    #[default]
    Zonal,
    Regional,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub name: String,

    #[serde(default)]
    pub checked: bool,
}

impl Location {
    pub fn new(name: impl Into<String>, checked: bool) -> Self {
        Self {
            name: name.into(),
            checked,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginalCluster {
    #[serde(default)]
    pub gke_status: Option<GkeStatus>,

    #[serde(default)]
    pub gke_config: Option<GkeConfig>,
}

impl OriginalCluster {
    /// True if the upstream status reports the cluster as imported.
    pub fn is_imported(&self) -> bool {
        self.upstream_spec().is_some_and(|spec| spec.imported)
    }

    pub fn upstream_spec(&self) -> Option<&UpstreamSpec> {
        self.gke_status.as_ref()?.upstream_spec.as_ref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GkeStatus {
    #[serde(default)]
    pub upstream_spec: Option<UpstreamSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamSpec {
    #[serde(default)]
    pub imported: bool,

    #[serde(default)]
    pub kubernetes_version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GkeConfig {
    #[serde(default)]
    pub kubernetes_version: Option<String>,
}

// =============================================================================
// Catalog Entries
// =============================================================================

/// A raw machine-type catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineType {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_cpus: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<u64>,
}

impl MachineType {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Self::default()
        }
    }
}

// =============================================================================
// Session Inputs
// =============================================================================

/// Everything an edit session starts from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInputs {
    #[serde(default)]
    pub cluster: ClusterContext,

    /// The pool being edited. `None` starts a fresh pool.
    #[serde(default)]
    pub node_pool: Option<NodePoolConfig>,

    /// Scope selection carried over from the form, if any.
    #[serde(default)]
    pub scope_selection: Option<ScopeSelection>,

    /// Set when the user asked to upgrade the pool to the control-plane version.
    #[serde(default)]
    pub upgrade_requested: bool,

    #[serde(default)]
    pub machine_types: Vec<MachineType>,

    /// Selectable versions, newest first.
    #[serde(default)]
    pub version_choices: Vec<VersionChoice>,
}
