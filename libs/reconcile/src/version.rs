//! Node version rules relative to the control plane.
//!
//! A pool's version is either auto-synced (new pool, or an upgrade was
//! requested) or user-controlled. Sync rules only ever move the node version
//! up to the control-plane version, and only when that version is within the
//! selectable bound.

use gkepool_version::{newest, offers, KubeVersion, VersionChoice};

use crate::model::OriginalCluster;

/// Upper bound of selectable versions.
///
/// The newest offered choice, or the control-plane version when nothing is
/// offered.
pub fn max_version<'a>(
    choices: &'a [VersionChoice],
    control_plane: Option<&'a KubeVersion>,
) -> Option<&'a KubeVersion> {
    newest(choices).or(control_plane)
}

/// True if the control-plane version is within the selectable bound.
pub fn cluster_version_is_less_than_max(
    choices: &[VersionChoice],
    control_plane: Option<&KubeVersion>,
) -> bool {
    let Some(control_plane) = control_plane else {
        return false;
    };

    max_version(choices, Some(control_plane)).is_some_and(|max| control_plane <= max)
}

/// True if the pool can be upgraded to the control-plane version.
pub fn upgrade_available(
    node: Option<&KubeVersion>,
    control_plane: Option<&KubeVersion>,
    choices: &[VersionChoice],
) -> bool {
    let (Some(node), Some(control_plane)) = (node, control_plane) else {
        return false;
    };

    node < control_plane && cluster_version_is_less_than_max(choices, Some(control_plane))
}

/// The version a sync rule should move the pool to, if any.
///
/// Returns `None` when the pool already matches, when the move would be a
/// downgrade, when the control-plane version is out of bound, or when a
/// non-empty choice list does not offer it.
pub fn sync_target(
    node: Option<&KubeVersion>,
    control_plane: Option<&KubeVersion>,
    choices: &[VersionChoice],
) -> Option<KubeVersion> {
    let control_plane = control_plane?;

    if node.is_some_and(|node| node >= control_plane) {
        return None;
    }

    if !cluster_version_is_less_than_max(choices, Some(control_plane)) {
        return None;
    }

    if !is_offered(choices, control_plane) {
        return None;
    }

    Some(control_plane.clone())
}

/// True if a version may be held against the choice list.
///
/// An empty list places no restriction.
pub fn is_offered(choices: &[VersionChoice], version: &KubeVersion) -> bool {
    choices.is_empty() || offers(choices, version)
}

/// The cluster version as originally configured, for display.
///
/// Prefers the configured version over the upstream-observed one. Empty
/// values count as absent.
pub fn original_cluster_version(original: Option<&OriginalCluster>) -> String {
    let Some(original) = original else {
        return String::new();
    };

    let configured = original
        .gke_config
        .as_ref()
        .and_then(|config| config.kubernetes_version.as_deref());
    let observed = original
        .upstream_spec()
        .and_then(|spec| spec.kubernetes_version.as_deref());

    configured
        .filter(|v| !v.is_empty())
        .or(observed.filter(|v| !v.is_empty()))
        .unwrap_or_default()
        .to_string()
}
