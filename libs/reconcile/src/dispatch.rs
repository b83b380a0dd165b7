//! Edits, observed fields, and the reactions that depend on them.
//!
//! Every edit marks the fields it actually changed. A reaction runs when any
//! field in its dependency set is dirty; reactions may dirty further fields.
//! The dependency graph is acyclic, so evaluation reaches a fixpoint.

use std::collections::{BTreeMap, BTreeSet};

use gkepool_scopes::{OauthScopesSelection, ScopeConfig};
use gkepool_version::{KubeVersion, VersionChoice};
use serde::{Deserialize, Serialize};

use crate::model::{Location, LocationType, MachineType};

/// An observable field of the edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Version,
    IsNew,
    UpgradeRequested,
    ControlPlaneVersion,
    VersionChoices,
    ScopeSelection,
    ScopeConfig,
    OauthScopes,
    AutoscalingEnabled,
    MinNodeCount,
    MaxNodeCount,
    MachineType,
    MachineTypes,
    DiskType,
    ImageType,
    InitialNodeCount,
    LocationType,
    Locations,
    Management,
    Labels,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::IsNew => "is_new",
            Self::UpgradeRequested => "upgrade_requested",
            Self::ControlPlaneVersion => "control_plane_version",
            Self::VersionChoices => "version_choices",
            Self::ScopeSelection => "scope_selection",
            Self::ScopeConfig => "scope_config",
            Self::OauthScopes => "oauth_scopes",
            Self::AutoscalingEnabled => "autoscaling_enabled",
            Self::MinNodeCount => "min_node_count",
            Self::MaxNodeCount => "max_node_count",
            Self::MachineType => "machine_type",
            Self::MachineTypes => "machine_types",
            Self::DiskType => "disk_type",
            Self::ImageType => "image_type",
            Self::InitialNodeCount => "initial_node_count",
            Self::LocationType => "location_type",
            Self::Locations => "locations",
            Self::Management => "management",
            Self::Labels => "labels",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of fields changed during a batch.
pub type FieldSet = BTreeSet<Field>;

/// A single user edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "camelCase")]
pub enum Edit {
    SetVersion(Option<KubeVersion>),
    SetIsNew(bool),
    SetUpgradeRequested(bool),
    SetControlPlaneVersion(Option<KubeVersion>),
    SetVersionChoices(Vec<VersionChoice>),
    SetScopeSelection(OauthScopesSelection),
    SetScopeConfig(ScopeConfig),
    SetAutoscalingEnabled(bool),
    SetMinNodeCount(Option<u32>),
    SetMaxNodeCount(Option<u32>),
    SetMachineType(Option<String>),
    SetMachineTypes(Vec<MachineType>),
    SetDiskType(Option<String>),
    SetImageType(Option<String>),
    SetInitialNodeCount(Option<u32>),
    SetLocationType(LocationType),
    SetLocations(Vec<Location>),
    SetAutoRepair(bool),
    SetAutoUpgrade(bool),
    SetLabels(BTreeMap<String, String>),
}

impl Edit {
    /// The field this edit writes.
    pub fn field(&self) -> Field {
        match self {
            Self::SetVersion(_) => Field::Version,
            Self::SetIsNew(_) => Field::IsNew,
            Self::SetUpgradeRequested(_) => Field::UpgradeRequested,
            Self::SetControlPlaneVersion(_) => Field::ControlPlaneVersion,
            Self::SetVersionChoices(_) => Field::VersionChoices,
            Self::SetScopeSelection(_) => Field::ScopeSelection,
            Self::SetScopeConfig(_) => Field::ScopeConfig,
            Self::SetAutoscalingEnabled(_) => Field::AutoscalingEnabled,
            Self::SetMinNodeCount(_) => Field::MinNodeCount,
            Self::SetMaxNodeCount(_) => Field::MaxNodeCount,
            Self::SetMachineType(_) => Field::MachineType,
            Self::SetMachineTypes(_) => Field::MachineTypes,
            Self::SetDiskType(_) => Field::DiskType,
            Self::SetImageType(_) => Field::ImageType,
            Self::SetInitialNodeCount(_) => Field::InitialNodeCount,
            Self::SetLocationType(_) => Field::LocationType,
            Self::SetLocations(_) => Field::Locations,
            Self::SetAutoRepair(_) | Self::SetAutoUpgrade(_) => Field::Management,
            Self::SetLabels(_) => Field::Labels,
        }
    }
}

/// Synchronous reactions, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reaction {
    RefreshMachineChoices,
    SyncNewPoolVersion,
    SyncRequestedUpgrade,
    Autoscaling,
    ScheduleScopeRemap,
}

impl Reaction {
    pub(crate) const ALL: [Reaction; 5] = [
        Reaction::RefreshMachineChoices,
        Reaction::SyncNewPoolVersion,
        Reaction::SyncRequestedUpgrade,
        Reaction::Autoscaling,
        Reaction::ScheduleScopeRemap,
    ];

    pub(crate) fn dependencies(&self) -> &'static [Field] {
        match self {
            Self::RefreshMachineChoices => &[Field::MachineTypes],
            Self::SyncNewPoolVersion => &[
                Field::IsNew,
                Field::ControlPlaneVersion,
                Field::VersionChoices,
            ],
            Self::SyncRequestedUpgrade => &[
                Field::UpgradeRequested,
                Field::ControlPlaneVersion,
                Field::VersionChoices,
            ],
            Self::Autoscaling => &[Field::AutoscalingEnabled],
            Self::ScheduleScopeRemap => &[Field::ScopeSelection, Field::ScopeConfig],
        }
    }

    pub(crate) fn is_triggered_by(&self, dirty: &FieldSet) -> bool {
        self.dependencies().iter().any(|field| dirty.contains(field))
    }
}
