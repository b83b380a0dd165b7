//! Node count estimates and the management warning.

use crate::model::{ClusterContext, LocationType, Management, OriginalCluster};

/// Total nodes across all failure domains.
///
/// Zonal clusters get one extra location: the cluster's own zone is added to
/// the locations list when the cluster is saved, so it is not checked yet.
pub fn regional_total_node_counts(cluster: &ClusterContext, initial_node_count: Option<u32>) -> u64 {
    let Some(per_location) = initial_node_count.filter(|count| *count > 0) else {
        return 0;
    };

    let mut locations = cluster
        .location_content
        .iter()
        .filter(|location| location.checked)
        .count() as u64;

    if cluster.location_type == LocationType::Zonal {
        locations += 1;
    }

    u64::from(per_location) * locations
}

/// True if an imported cluster's pool lacks auto-repair or auto-upgrade.
pub fn show_management_warning(
    original: Option<&OriginalCluster>,
    management: &Management,
) -> bool {
    let imported = original.is_some_and(OriginalCluster::is_imported);
    imported && (!management.auto_repair || !management.auto_upgrade)
}
