//! End-to-end behavior of a node-pool edit session.

use std::collections::BTreeMap;

use gkepool_reconcile::{
    Edit, Field, LocationType, NodePoolConfig, OauthScopesSelection, Reconciler, Rejection,
    ScopeSelection, SessionInputs, DEFAULT_MAX_NODE_COUNT, DEFAULT_MIN_NODE_COUNT,
};
use gkepool_scopes::{GoogleCatalog, ScopeMapper, SCOPE_URL_PREFIX};
use gkepool_testing::{init_tracing, machine_catalog, original_cluster, v, version_choices, SessionBuilder};
use proptest::prelude::*;

fn url(short: &str) -> String {
    format!("{SCOPE_URL_PREFIX}{short}")
}

fn bounds(reconciler: &Reconciler) -> (Option<u32>, Option<u32>) {
    let autoscaling = &reconciler.node_pool().autoscaling;
    (autoscaling.min_node_count, autoscaling.max_node_count)
}

// =============================================================================
// Version reconciliation
// =============================================================================

#[test]
fn new_pool_adopts_control_plane_version() {
    init_tracing();
    let reconciler = SessionBuilder::new()
        .control_plane("1.24.0")
        .choices(&["1.24.0", "1.23.9"])
        .new_pool()
        .reconciler();

    assert_eq!(reconciler.node_pool().version, Some(v("1.24.0")));
    assert!(reconciler.is_new_node_pool());
    assert!(!reconciler.upgrade_available());
}

#[test]
fn missing_pool_starts_as_new_pool() {
    let reconciler = SessionBuilder::new()
        .control_plane("1.24.0")
        .choices(&["1.24.0"])
        .reconciler();

    let pool = reconciler.node_pool();
    assert!(pool.is_new);
    assert_eq!(pool.version, Some(v("1.24.0")));
    assert_eq!(
        reconciler.scope_selection().oauth_scopes_selection,
        OauthScopesSelection::Default
    );
    assert_eq!(pool.config.oauth_scopes, GoogleCatalog::new().default_scopes());
}

#[test]
fn new_pool_ignores_out_of_bound_control_plane() {
    let reconciler = SessionBuilder::new()
        .control_plane("1.29.0")
        .choices(&["1.28.3", "1.27.9"])
        .new_pool()
        .reconciler();

    assert_eq!(reconciler.node_pool().version, None);
    assert!(!reconciler.cluster_version_is_less_than_max());
}

#[test]
fn new_pool_follows_control_plane_changes() {
    let mut reconciler = SessionBuilder::new()
        .control_plane("1.27.3")
        .choices(&["1.28.1", "1.27.3"])
        .new_pool()
        .reconciler();

    let outcome = reconciler.apply([Edit::SetControlPlaneVersion(Some(v("1.28.1")))]);
    assert_eq!(reconciler.node_pool().version, Some(v("1.28.1")));
    assert!(outcome.changed.contains(&Field::Version));

    // Lowering the control plane never downgrades the pool.
    reconciler.apply([Edit::SetControlPlaneVersion(Some(v("1.27.3")))]);
    assert_eq!(reconciler.node_pool().version, Some(v("1.28.1")));
}

#[test]
fn existing_pool_keeps_user_controlled_version() {
    let mut reconciler = SessionBuilder::new()
        .control_plane("1.27.3")
        .choices(&["1.28.1", "1.27.3", "1.26.5"])
        .existing_pool(Some("1.26.5"))
        .reconciler();

    assert_eq!(reconciler.node_pool().version, Some(v("1.26.5")));
    assert!(reconciler.upgrade_available());

    reconciler.apply([Edit::SetControlPlaneVersion(Some(v("1.28.1")))]);
    assert_eq!(reconciler.node_pool().version, Some(v("1.26.5")));
}

#[test]
fn existing_pool_without_version_is_seeded() {
    let reconciler = SessionBuilder::new()
        .control_plane("1.27.3")
        .choices(&["1.27.3"])
        .existing_pool(None)
        .reconciler();

    assert_eq!(reconciler.node_pool().version, Some(v("1.27.3")));
}

#[test]
fn upgrade_flag_applies_at_initialization() {
    let reconciler = SessionBuilder::new()
        .control_plane("1.27.3")
        .choices(&["1.27.3", "1.26.5"])
        .existing_pool(Some("1.26.5"))
        .upgrade_requested(true)
        .reconciler();

    assert_eq!(reconciler.node_pool().version, Some(v("1.27.3")));
    assert!(!reconciler.upgrade_available());
}

#[test]
fn upgrade_flag_applies_on_later_changes() {
    let mut reconciler = SessionBuilder::new()
        .control_plane("1.27.3")
        .choices(&["1.28.1", "1.27.3", "1.26.5"])
        .existing_pool(Some("1.26.5"))
        .reconciler();

    reconciler.apply([Edit::SetUpgradeRequested(true)]);
    assert_eq!(reconciler.node_pool().version, Some(v("1.27.3")));

    reconciler.apply([Edit::SetControlPlaneVersion(Some(v("1.28.1")))]);
    assert_eq!(reconciler.node_pool().version, Some(v("1.28.1")));

    // Clearing the flag hands control back to the user; nothing is reverted.
    reconciler.apply([Edit::SetUpgradeRequested(false)]);
    assert_eq!(reconciler.node_pool().version, Some(v("1.28.1")));
}

#[test]
fn upgrade_flag_respects_bound() {
    let mut reconciler = SessionBuilder::new()
        .control_plane("1.29.0")
        .choices(&["1.28.1", "1.26.5"])
        .existing_pool(Some("1.26.5"))
        .reconciler();

    let outcome = reconciler.apply([Edit::SetUpgradeRequested(true)]);
    assert_eq!(reconciler.node_pool().version, Some(v("1.26.5")));
    assert!(!outcome.changed.contains(&Field::Version));
    assert!(!reconciler.upgrade_available());
}

#[test]
fn version_edits_must_be_offered() {
    let mut reconciler = SessionBuilder::new()
        .control_plane("1.27.3")
        .choices(&["1.27.3", "1.26.5"])
        .existing_pool(Some("1.26.5"))
        .reconciler();

    let outcome = reconciler.apply([Edit::SetVersion(Some(v("1.25.0")))]);
    assert_eq!(
        outcome.rejected,
        vec![Rejection::VersionNotOffered { version: v("1.25.0") }]
    );
    assert_eq!(reconciler.node_pool().version, Some(v("1.26.5")));

    let outcome = reconciler.apply([Edit::SetVersion(Some(v("1.27.3")))]);
    assert!(outcome.rejected.is_empty());
    assert_eq!(reconciler.node_pool().version, Some(v("1.27.3")));
}

#[test]
fn new_pool_skips_control_plane_version_that_is_not_offered() {
    let mut reconciler = SessionBuilder::new()
        .control_plane("1.27.3")
        .choices(&["1.28.1", "1.26.5"])
        .new_pool()
        .reconciler();

    assert_eq!(reconciler.node_pool().version, None);
    assert!(reconciler.version_is_offered());

    let outcome = reconciler.apply([Edit::SetVersionChoices(version_choices(&[
        "1.28.1", "1.27.3",
    ]))]);
    assert_eq!(reconciler.node_pool().version, Some(v("1.27.3")));
    assert_eq!(outcome.unoffered_version, None);
}

#[test]
fn dropping_the_current_version_from_choices_is_reported() {
    let mut reconciler = SessionBuilder::new()
        .control_plane("1.27.3")
        .choices(&["1.28.1", "1.27.3", "1.26.5"])
        .existing_pool(Some("1.26.5"))
        .reconciler();

    let outcome = reconciler.apply([Edit::SetVersionChoices(version_choices(&[
        "1.28.1", "1.27.3",
    ]))]);
    assert!(outcome.changed.contains(&Field::VersionChoices));
    assert_eq!(outcome.unoffered_version, Some(v("1.26.5")));
    assert_eq!(reconciler.node_pool().version, Some(v("1.26.5")));
    assert!(!reconciler.version_is_offered());
    assert!(!reconciler.derived().version_is_offered);

    // Picking an offered version clears the report.
    let outcome = reconciler.apply([Edit::SetVersion(Some(v("1.27.3")))]);
    assert_eq!(outcome.unoffered_version, None);
    assert!(reconciler.version_is_offered());
}

#[test]
fn empty_choices_fall_back_to_control_plane() {
    let reconciler = SessionBuilder::new()
        .control_plane("1.27.3")
        .existing_pool(Some("1.26.0"))
        .reconciler();

    assert_eq!(reconciler.max_version(), Some(&v("1.27.3")));
    assert!(reconciler.cluster_version_is_less_than_max());
    assert!(reconciler.upgrade_available());
}

#[test]
fn missing_control_plane_degrades_to_defaults() {
    let reconciler = SessionBuilder::new().existing_pool(Some("1.26.0")).reconciler();

    assert_eq!(reconciler.max_version(), None);
    assert!(!reconciler.cluster_version_is_less_than_max());
    assert!(!reconciler.upgrade_available());
    assert_eq!(reconciler.original_cluster_version(), "");
}

// =============================================================================
// Autoscaling
// =============================================================================

#[test]
fn enabling_autoscaling_sets_defaults_synchronously() {
    let mut reconciler = SessionBuilder::new().existing_pool(None).reconciler();

    let outcome = reconciler.stage([Edit::SetAutoscalingEnabled(true)]);
    assert_eq!(bounds(&reconciler), (Some(1), Some(3)));
    assert!(outcome.changed.contains(&Field::MinNodeCount));
    assert_eq!(reconciler.pending_tasks(), 0);
}

#[test]
fn disabling_autoscaling_clears_bounds_after_the_batch() {
    let mut reconciler = SessionBuilder::new().existing_pool(None).reconciler();
    reconciler.apply([Edit::SetAutoscalingEnabled(true)]);

    reconciler.stage([Edit::SetAutoscalingEnabled(false)]);
    assert_eq!(bounds(&reconciler), (Some(1), Some(3)));
    assert_eq!(reconciler.pending_tasks(), 1);

    let outcome = reconciler.drain();
    assert_eq!(bounds(&reconciler), (None, None));
    assert_eq!(outcome.deferred_ran, 1);
    assert!(outcome.changed.contains(&Field::MaxNodeCount));
}

#[test]
fn toggling_autoscaling_round_trips_to_defaults() {
    let mut reconciler = SessionBuilder::new().existing_pool(None).reconciler();

    reconciler.apply([Edit::SetAutoscalingEnabled(true)]);
    reconciler.apply([Edit::SetAutoscalingEnabled(false)]);
    reconciler.apply([Edit::SetAutoscalingEnabled(true)]);
    assert_eq!(
        bounds(&reconciler),
        (Some(DEFAULT_MIN_NODE_COUNT), Some(DEFAULT_MAX_NODE_COUNT))
    );
}

#[test]
fn disable_then_enable_in_one_batch_keeps_defaults() {
    let mut reconciler = SessionBuilder::new().existing_pool(None).reconciler();
    reconciler.apply([Edit::SetAutoscalingEnabled(true), Edit::SetMaxNodeCount(Some(9))]);
    assert_eq!(bounds(&reconciler), (Some(1), Some(9)));

    reconciler.apply([
        Edit::SetAutoscalingEnabled(false),
        Edit::SetAutoscalingEnabled(true),
    ]);
    assert_eq!(bounds(&reconciler), (Some(1), Some(3)));
}

#[test]
fn bound_edits_follow_enabled_state() {
    let mut reconciler = SessionBuilder::new().existing_pool(None).reconciler();

    let outcome = reconciler.apply([Edit::SetMinNodeCount(Some(2))]);
    assert_eq!(
        outcome.rejected,
        vec![Rejection::AutoscalingDisabled {
            field: Field::MinNodeCount
        }]
    );
    assert_eq!(bounds(&reconciler), (None, None));

    reconciler.apply([Edit::SetAutoscalingEnabled(true)]);
    let outcome = reconciler.apply([Edit::SetMaxNodeCount(None)]);
    assert_eq!(
        outcome.rejected,
        vec![Rejection::BoundRequired {
            field: Field::MaxNodeCount
        }]
    );
    assert_eq!(bounds(&reconciler), (Some(1), Some(3)));
}

#[test]
fn loaded_pool_is_normalized() {
    let mut pool = NodePoolConfig::default();
    pool.autoscaling.enabled = false;
    pool.autoscaling.min_node_count = Some(4);

    let reconciler = SessionBuilder::new().pool(pool).reconciler();
    assert_eq!(bounds(&reconciler), (None, None));
}

// =============================================================================
// OAuth scopes
// =============================================================================

#[test]
fn existing_scopes_are_unmapped_at_initialization() {
    let mut pool = NodePoolConfig::default();
    pool.config.oauth_scopes = vec![url("cloud-platform")];

    let (reconciler, calls) = SessionBuilder::new().pool(pool).counted_reconciler();
    assert_eq!(calls.unmaps(), 1);
    assert_eq!(calls.maps(), 1);
    assert_eq!(
        reconciler.scope_selection().oauth_scopes_selection,
        OauthScopesSelection::Full
    );
    assert_eq!(reconciler.node_pool().config.oauth_scopes, vec![url("cloud-platform")]);
}

#[test]
fn supplied_selection_wins_over_pool_scopes() {
    let mut pool = NodePoolConfig::default();
    pool.config.oauth_scopes = vec![url("cloud-platform")];

    let selection = ScopeSelection::custom([("bigQuery", "bigquery")]);
    let (reconciler, calls) = SessionBuilder::new()
        .pool(pool)
        .selection(selection)
        .counted_reconciler();

    assert_eq!(calls.unmaps(), 0);
    assert_eq!(reconciler.node_pool().config.oauth_scopes, vec![url("bigquery")]);
}

#[test]
fn scope_edits_remap_once_per_batch_after_it_settles() {
    let (mut reconciler, calls) = SessionBuilder::new().new_pool().counted_reconciler();
    let maps_at_start = calls.maps();

    let mut config = BTreeMap::new();
    config.insert("storage".to_string(), vec!["devstorage.read_write".to_string()]);
    config.insert("bigQuery".to_string(), vec!["bigquery".to_string()]);

    reconciler.stage([
        Edit::SetScopeSelection(OauthScopesSelection::Custom),
        Edit::SetScopeConfig(config.clone()),
        Edit::SetScopeSelection(OauthScopesSelection::Custom),
    ]);
    assert_eq!(calls.maps(), maps_at_start);
    assert_eq!(reconciler.pending_tasks(), 1);

    let outcome = reconciler.drain();
    assert_eq!(calls.maps(), maps_at_start + 1);
    assert!(outcome.changed.contains(&Field::OauthScopes));
    assert_eq!(
        reconciler.node_pool().config.oauth_scopes,
        vec![url("devstorage.read_write"), url("bigquery")]
    );
}

#[test]
fn full_selection_maps_to_cloud_platform() {
    let mut reconciler = SessionBuilder::new().new_pool().reconciler();
    reconciler.apply([Edit::SetScopeSelection(OauthScopesSelection::Full)]);
    assert_eq!(reconciler.node_pool().config.oauth_scopes, vec![url("cloud-platform")]);
}

// =============================================================================
// Teardown
// =============================================================================

#[test]
fn teardown_drops_deferred_work() {
    let mut reconciler = SessionBuilder::new().existing_pool(None).reconciler();
    reconciler.apply([Edit::SetAutoscalingEnabled(true)]);
    let scopes_before = reconciler.node_pool().config.oauth_scopes.clone();

    reconciler.stage([
        Edit::SetAutoscalingEnabled(false),
        Edit::SetScopeSelection(OauthScopesSelection::Full),
    ]);
    assert_eq!(reconciler.pending_tasks(), 2);

    reconciler.teardown();
    let outcome = reconciler.drain();

    assert_eq!(outcome.deferred_dropped, 2);
    assert_eq!(outcome.deferred_ran, 0);
    assert_eq!(bounds(&reconciler), (Some(1), Some(3)));
    assert_eq!(reconciler.node_pool().config.oauth_scopes, scopes_before);
}

#[test]
fn edits_after_teardown_are_ignored() {
    let mut reconciler = SessionBuilder::new().existing_pool(None).reconciler();
    reconciler.teardown();

    let mut labels = BTreeMap::new();
    labels.insert("team".to_string(), "infra".to_string());
    let outcome = reconciler.set_node_labels(labels);

    assert!(outcome.is_noop());
    assert!(reconciler.node_pool().config.labels.is_empty());
    assert!(reconciler.is_torn_down());
}

// =============================================================================
// Catalog-derived values
// =============================================================================

#[test]
fn machine_choices_are_sorted_and_refreshed() {
    let mut reconciler = SessionBuilder::new()
        .existing_pool(None)
        .machine_types(machine_catalog())
        .reconciler();

    let names: Vec<_> = reconciler
        .machine_choices()
        .iter()
        .map(|c| c.name.clone())
        .collect();
    assert_eq!(
        names,
        vec![
            "e2-medium",
            "n1-standard-1",
            "n1-standard-2",
            "n1-standard-16",
            "n2-highmem-8"
        ]
    );

    reconciler.apply([Edit::SetMachineType(Some("n1-standard-16".to_string()))]);
    let edited = reconciler.edited_machine_choice().unwrap();
    assert_eq!(edited.display_name, "n1-standard-16 (16 vCPUs, 60 GB RAM)");
    assert_eq!(edited.group, "n1");

    reconciler.apply([Edit::SetMachineTypes(vec![])]);
    assert!(reconciler.machine_choices().is_empty());
    assert!(reconciler.edited_machine_choice().is_none());
}

#[test]
fn node_counts_follow_locations() {
    let mut reconciler = SessionBuilder::new()
        .existing_pool(None)
        .locations(LocationType::Zonal, 2)
        .reconciler();
    assert_eq!(reconciler.regional_total_node_counts(), 9);

    reconciler.apply([Edit::SetLocationType(LocationType::Regional)]);
    assert_eq!(reconciler.regional_total_node_counts(), 6);

    reconciler.apply([Edit::SetInitialNodeCount(None)]);
    assert_eq!(reconciler.regional_total_node_counts(), 0);
}

#[test]
fn management_warning_only_for_imported_clusters() {
    let mut reconciler = SessionBuilder::new()
        .existing_pool(None)
        .original(original_cluster(true, Some("1.27.3")))
        .reconciler();
    reconciler.apply([Edit::SetAutoRepair(false), Edit::SetAutoUpgrade(true)]);
    assert!(reconciler.show_management_warning());
    assert_eq!(reconciler.original_cluster_version(), "1.27.3");

    let mut reconciler = SessionBuilder::new()
        .existing_pool(None)
        .original(original_cluster(false, None))
        .reconciler();
    reconciler.apply([Edit::SetAutoRepair(false), Edit::SetAutoUpgrade(true)]);
    assert!(!reconciler.show_management_warning());
}

#[test]
fn derived_view_serializes_for_presentation() {
    let reconciler = SessionBuilder::new()
        .control_plane("1.27.3")
        .choices(&["1.28.1", "1.27.3", "1.26.5"])
        .existing_pool(Some("1.26.5"))
        .locations(LocationType::Regional, 3)
        .reconciler();

    let derived = reconciler.derived();
    assert!(derived.upgrade_available);
    assert_eq!(derived.max_version, Some(v("1.28.1")));
    assert_eq!(derived.regional_total_node_counts, 9);
    assert!(!derived.disk_type_content.is_empty());

    let json = serde_json::to_value(&derived).unwrap();
    assert_eq!(json["maxVersion"], "1.28.1");
    assert_eq!(json["clusterVersionIsLessThanMax"], true);
}

#[test]
fn into_node_pool_returns_edited_pool() {
    let inputs = SessionInputs {
        version_choices: version_choices(&["1.27.3"]),
        ..SessionInputs::default()
    };
    let mut reconciler = Reconciler::with_google_catalog(inputs);
    reconciler.apply([Edit::SetInitialNodeCount(Some(5))]);

    let pool = reconciler.into_node_pool();
    assert_eq!(pool.initial_node_count, Some(5));
}

// =============================================================================
// Properties
// =============================================================================

fn arb_toggles() -> impl Strategy<Value = Vec<bool>> {
    proptest::collection::vec(any::<bool>(), 1..12)
}

proptest! {
    #[test]
    fn bounds_present_iff_enabled_after_every_batch(toggles in arb_toggles()) {
        let mut reconciler = SessionBuilder::new().existing_pool(None).reconciler();
        for enabled in toggles {
            reconciler.apply([Edit::SetAutoscalingEnabled(enabled)]);
            let (min, max) = bounds(&reconciler);
            prop_assert_eq!(min.is_some(), enabled);
            prop_assert_eq!(max.is_some(), enabled);
        }
    }

    #[test]
    fn scopes_always_match_selection(selections in proptest::collection::vec(0u8..3, 1..6)) {
        let mut reconciler = SessionBuilder::new().new_pool().reconciler();
        let catalog = GoogleCatalog::new();
        for choice in selections {
            let selection = match choice {
                0 => OauthScopesSelection::Default,
                1 => OauthScopesSelection::Full,
                _ => OauthScopesSelection::Custom,
            };
            reconciler.apply([Edit::SetScopeSelection(selection)]);
            let current = reconciler.scope_selection();
            prop_assert_eq!(
                &reconciler.node_pool().config.oauth_scopes,
                &catalog.map_oauth_scopes(current.oauth_scopes_selection, &current.scope_config)
            );
        }
    }
}
