//! The node-pool reconciler.
//!
//! Edits arrive in batches. Each edit is applied and its synchronous
//! reactions run to a fixpoint before the next edit is looked at. Deferred
//! tasks queued along the way run once, after the whole batch, unless the
//! session has been torn down by then.

use std::collections::BTreeMap;

use gkepool_scopes::{GoogleCatalog, OptionCatalog, ScopeMapper, ScopeSelection};
use gkepool_version::{KubeVersion, VersionChoice};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::autoscaling;
use crate::dispatch::{Edit, Field, FieldSet, Reaction};
use crate::error::Rejection;
use crate::machine::{derive_machine_choices, find_machine_choice, MachineChoice};
use crate::model::{ClusterContext, MachineType, NodePoolConfig, SessionInputs};
use crate::nodes;
use crate::queue::{DeferredTask, TaskQueue};
use crate::version;

/// Upper bound on reaction rounds per edit or drain.
const MAX_REACTION_ROUNDS: usize = 16;

/// What a batch (or one half of it) did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    /// Every field that ended up with a new value, including reaction writes.
    pub changed: FieldSet,

    pub rejected: Vec<Rejection>,

    pub deferred_ran: usize,

    /// Deferred tasks discarded because the session was torn down.
    pub deferred_dropped: usize,

    /// The pool's version, when the batch left it outside a non-empty
    /// choice list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unoffered_version: Option<KubeVersion>,
}

impl BatchOutcome {
    pub fn merge(&mut self, other: BatchOutcome) {
        self.changed.extend(other.changed);
        self.rejected.extend(other.rejected);
        self.deferred_ran += other.deferred_ran;
        self.deferred_dropped += other.deferred_dropped;
        if other.unoffered_version.is_some() {
            self.unoffered_version = other.unoffered_version;
        }
    }

    pub fn is_noop(&self) -> bool {
        self.changed.is_empty() && self.rejected.is_empty()
    }
}

/// Snapshot of every derived value, for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedView {
    pub upgrade_available: bool,
    pub max_version: Option<KubeVersion>,
    pub cluster_version_is_less_than_max: bool,
    pub version_is_offered: bool,
    pub original_cluster_version: String,
    pub is_new_node_pool: bool,
    pub machine_choices: Vec<MachineChoice>,
    pub edited_machine_choice: Option<MachineChoice>,
    pub regional_total_node_counts: u64,
    pub show_management_warning: bool,
    pub disk_type_content: Vec<String>,
    pub image_type_content: Vec<String>,
}

/// Keeps one node pool's configuration consistent while it is edited.
pub struct Reconciler {
    node_pool: NodePoolConfig,
    cluster: ClusterContext,
    selection: ScopeSelection,
    upgrade_requested: bool,
    machine_types: Vec<MachineType>,
    version_choices: Vec<VersionChoice>,
    machine_choices: Vec<MachineChoice>,
    disk_type_content: Vec<String>,
    image_type_content: Vec<String>,
    mapper: Box<dyn ScopeMapper + Send>,
    queue: TaskQueue,
    torn_down: bool,
}

impl Reconciler {
    /// Start an edit session.
    ///
    /// Without a pool, a fresh pool is created. Without a selection, one is
    /// derived from the pool's current scopes, or taken from the mapper's
    /// defaults for a new pool that has none.
    pub fn new(
        inputs: SessionInputs,
        mapper: Box<dyn ScopeMapper + Send>,
        catalog: &dyn OptionCatalog,
    ) -> Self {
        let SessionInputs {
            cluster,
            node_pool,
            scope_selection,
            upgrade_requested,
            machine_types,
            version_choices,
        } = inputs;

        let node_pool = node_pool.unwrap_or_else(NodePoolConfig::new_pool);

        // Fresh pools without scopes start from the catalog defaults.
        let unscoped_new_pool = node_pool.is_new && node_pool.config.oauth_scopes.is_empty();
        let selection = match scope_selection {
            Some(selection) => selection,
            None if unscoped_new_pool => mapper.default_selection(),
            None => mapper.unmap_oauth_scopes(&node_pool.config.oauth_scopes),
        };

        let machine_choices = derive_machine_choices(&machine_types);

        let mut reconciler = Self {
            node_pool,
            cluster,
            selection,
            upgrade_requested,
            machine_types,
            version_choices,
            machine_choices,
            disk_type_content: catalog.disk_types(),
            image_type_content: catalog.image_types(),
            mapper,
            queue: TaskQueue::new(),
            torn_down: false,
        };
        reconciler.initialize();
        reconciler
    }

    /// Start an edit session backed by the built-in GKE catalog.
    pub fn with_google_catalog(inputs: SessionInputs) -> Self {
        let catalog = GoogleCatalog::new();
        Self::new(inputs, Box::new(catalog), &catalog)
    }

    fn initialize(&mut self) {
        let seeds_version = self.node_pool.version.is_none()
            || self.node_pool.is_new
            || self.upgrade_requested;
        if seeds_version {
            self.sync_version_to_control_plane("initialize");
        }

        if autoscaling::normalize(&mut self.node_pool.autoscaling) {
            debug!(
                enabled = self.node_pool.autoscaling.enabled,
                "Normalized autoscaling bounds"
            );
        }

        self.node_pool.config.oauth_scopes = self.mapper.map_oauth_scopes(
            self.selection.oauth_scopes_selection,
            &self.selection.scope_config,
        );

        if !self.version_is_offered() {
            warn!(
                version = ?self.node_pool.version.as_ref().map(ToString::to_string),
                "Node pool version is not offered by the version choices"
            );
        }

        debug!(
            is_new = self.node_pool.is_new,
            version = ?self.node_pool.version.as_ref().map(ToString::to_string),
            selection = %self.selection.oauth_scopes_selection,
            machine_choices = self.machine_choices.len(),
            "Initialized node pool session"
        );
    }

    // =========================================================================
    // Batches
    // =========================================================================

    /// Apply one batch of edits and drain the deferred work it produced.
    pub fn apply<I>(&mut self, edits: I) -> BatchOutcome
    where
        I: IntoIterator<Item = Edit>,
    {
        let mut outcome = self.stage(edits);
        outcome.merge(self.drain());
        outcome
    }

    /// Apply edits and their synchronous reactions, leaving deferred work queued.
    pub fn stage<I>(&mut self, edits: I) -> BatchOutcome
    where
        I: IntoIterator<Item = Edit>,
    {
        let mut outcome = BatchOutcome::default();

        if self.torn_down {
            debug!("Session torn down, ignoring edits");
            return outcome;
        }

        for edit in edits {
            let field = edit.field();
            match self.apply_edit(edit) {
                Ok(true) => {
                    outcome.changed.insert(field);
                    self.settle(FieldSet::from([field]), &mut outcome.changed);
                }
                Ok(false) => {}
                Err(rejection) => {
                    warn!(%rejection, "Rejected node pool edit");
                    outcome.rejected.push(rejection);
                }
            }
        }

        let touches_version = outcome.changed.contains(&Field::Version)
            || outcome.changed.contains(&Field::VersionChoices);
        if touches_version && !self.version_is_offered() {
            warn!(
                version = ?self.node_pool.version.as_ref().map(ToString::to_string),
                choices = self.version_choices.len(),
                "Node pool version is no longer offered"
            );
            outcome.unoffered_version = self.node_pool.version.clone();
        }

        info!(
            changed = outcome.changed.len(),
            rejected = outcome.rejected.len(),
            pending = self.queue.len(),
            "Staged edit batch"
        );

        outcome
    }

    /// Run queued deferred tasks.
    ///
    /// After [`teardown`](Self::teardown), pending tasks are dropped instead.
    pub fn drain(&mut self) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for _ in 0..MAX_REACTION_ROUNDS {
            let tasks = self.queue.take_all();
            if tasks.is_empty() {
                break;
            }

            if self.torn_down {
                debug!(dropped = tasks.len(), "Session torn down, dropping deferred tasks");
                outcome.deferred_dropped += tasks.len();
                continue;
            }

            let mut dirty = FieldSet::new();
            for task in tasks {
                outcome.deferred_ran += 1;
                dirty.extend(self.run_deferred(task));
            }

            outcome.changed.extend(dirty.iter().copied());
            self.settle(dirty, &mut outcome.changed);
        }

        if !self.queue.is_empty() {
            warn!(pending = self.queue.len(), "Deferred tasks still pending after drain");
        }

        outcome
    }

    /// Replace the pool's labels.
    pub fn set_node_labels(&mut self, labels: BTreeMap<String, String>) -> BatchOutcome {
        self.apply([Edit::SetLabels(labels)])
    }

    /// End the session. Later edits and deferred tasks become no-ops.
    pub fn teardown(&mut self) {
        if !self.torn_down {
            debug!(pending = self.queue.len(), "Tearing down node pool session");
            self.torn_down = true;
        }
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Number of deferred tasks waiting for the next drain.
    pub fn pending_tasks(&self) -> usize {
        self.queue.len()
    }

    // =========================================================================
    // Edits and reactions
    // =========================================================================

    /// Write an edit. Returns whether the value changed.
    fn apply_edit(&mut self, edit: Edit) -> Result<bool, Rejection> {
        let pool = &mut self.node_pool;

        let changed = match edit {
            Edit::SetVersion(version) => {
                if let Some(requested) = &version {
                    if !version::is_offered(&self.version_choices, requested) {
                        return Err(Rejection::VersionNotOffered {
                            version: requested.clone(),
                        });
                    }
                }
                replace(&mut pool.version, version)
            }
            Edit::SetIsNew(is_new) => replace(&mut pool.is_new, is_new),
            Edit::SetUpgradeRequested(requested) => {
                replace(&mut self.upgrade_requested, requested)
            }
            Edit::SetControlPlaneVersion(version) => {
                replace(&mut self.cluster.control_plane_version, version)
            }
            Edit::SetVersionChoices(choices) => replace(&mut self.version_choices, choices),
            Edit::SetScopeSelection(selection) => {
                replace(&mut self.selection.oauth_scopes_selection, selection)
            }
            Edit::SetScopeConfig(config) => replace(&mut self.selection.scope_config, config),
            Edit::SetAutoscalingEnabled(enabled) => {
                replace(&mut pool.autoscaling.enabled, enabled)
            }
            Edit::SetMinNodeCount(count) => {
                check_bound(pool.autoscaling.enabled, Field::MinNodeCount, count)?;
                replace(&mut pool.autoscaling.min_node_count, count)
            }
            Edit::SetMaxNodeCount(count) => {
                check_bound(pool.autoscaling.enabled, Field::MaxNodeCount, count)?;
                replace(&mut pool.autoscaling.max_node_count, count)
            }
            Edit::SetMachineType(machine_type) => {
                replace(&mut pool.config.machine_type, machine_type)
            }
            Edit::SetMachineTypes(machine_types) => replace(&mut self.machine_types, machine_types),
            Edit::SetDiskType(disk_type) => replace(&mut pool.config.disk_type, disk_type),
            Edit::SetImageType(image_type) => replace(&mut pool.config.image_type, image_type),
            Edit::SetInitialNodeCount(count) => replace(&mut pool.initial_node_count, count),
            Edit::SetLocationType(location_type) => {
                replace(&mut self.cluster.location_type, location_type)
            }
            Edit::SetLocations(locations) => {
                replace(&mut self.cluster.location_content, locations)
            }
            Edit::SetAutoRepair(enabled) => replace(&mut pool.management.auto_repair, enabled),
            Edit::SetAutoUpgrade(enabled) => replace(&mut pool.management.auto_upgrade, enabled),
            Edit::SetLabels(labels) => replace(&mut pool.config.labels, labels),
        };

        Ok(changed)
    }

    /// Run reactions until no dirty fields remain.
    fn settle(&mut self, mut dirty: FieldSet, changed: &mut FieldSet) {
        for _ in 0..MAX_REACTION_ROUNDS {
            if dirty.is_empty() {
                return;
            }

            let mut next = FieldSet::new();
            for reaction in Reaction::ALL {
                if reaction.is_triggered_by(&dirty) {
                    next.extend(self.run_reaction(reaction));
                }
            }

            changed.extend(next.iter().copied());
            dirty = next;
        }

        warn!(dirty = ?dirty, "Reactions did not settle");
    }

    fn run_reaction(&mut self, reaction: Reaction) -> FieldSet {
        match reaction {
            Reaction::RefreshMachineChoices => {
                self.machine_choices = derive_machine_choices(&self.machine_types);
                debug!(count = self.machine_choices.len(), "Refreshed machine choices");
                FieldSet::new()
            }
            Reaction::SyncNewPoolVersion if self.node_pool.is_new => {
                self.sync_version_to_control_plane("new_pool")
            }
            Reaction::SyncRequestedUpgrade if self.upgrade_requested => {
                self.sync_version_to_control_plane("upgrade_requested")
            }
            Reaction::SyncNewPoolVersion | Reaction::SyncRequestedUpgrade => FieldSet::new(),
            Reaction::Autoscaling => self.react_to_autoscaling(),
            Reaction::ScheduleScopeRemap => {
                self.queue.push(DeferredTask::RemapScopes);
                FieldSet::new()
            }
        }
    }

    fn react_to_autoscaling(&mut self) -> FieldSet {
        let scaling = &mut self.node_pool.autoscaling;

        if scaling.enabled {
            if autoscaling::apply_enabled_defaults(scaling) {
                debug!("Applied autoscaling defaults");
                return FieldSet::from([Field::MinNodeCount, Field::MaxNodeCount]);
            }
        } else {
            self.queue.push(DeferredTask::ClearAutoscalingBounds);
        }

        FieldSet::new()
    }

    fn sync_version_to_control_plane(&mut self, reason: &'static str) -> FieldSet {
        let target = version::sync_target(
            self.node_pool.version.as_ref(),
            self.cluster.control_plane_version.as_ref(),
            &self.version_choices,
        );

        let Some(target) = target else {
            return FieldSet::new();
        };

        debug!(
            from = ?self.node_pool.version.as_ref().map(ToString::to_string),
            to = %target,
            reason,
            "Syncing node pool version to control plane"
        );
        self.node_pool.version = Some(target);
        FieldSet::from([Field::Version])
    }

    fn run_deferred(&mut self, task: DeferredTask) -> FieldSet {
        match task {
            DeferredTask::RemapScopes => {
                let scopes = self.mapper.map_oauth_scopes(
                    self.selection.oauth_scopes_selection,
                    &self.selection.scope_config,
                );
                debug!(count = scopes.len(), "Remapped OAuth scopes");

                if replace(&mut self.node_pool.config.oauth_scopes, scopes) {
                    FieldSet::from([Field::OauthScopes])
                } else {
                    FieldSet::new()
                }
            }
            DeferredTask::ClearAutoscalingBounds => {
                let cleared = autoscaling::clear_disabled_bounds(&mut self.node_pool.autoscaling);
                let mut fields = FieldSet::new();
                if cleared.min {
                    fields.insert(Field::MinNodeCount);
                }
                if cleared.max {
                    fields.insert(Field::MaxNodeCount);
                }
                fields
            }
        }
    }

    // =========================================================================
    // State and derived values
    // =========================================================================

    pub fn node_pool(&self) -> &NodePoolConfig {
        &self.node_pool
    }

    /// Consume the session and hand back the edited pool.
    pub fn into_node_pool(self) -> NodePoolConfig {
        self.node_pool
    }

    pub fn cluster(&self) -> &ClusterContext {
        &self.cluster
    }

    pub fn scope_selection(&self) -> &ScopeSelection {
        &self.selection
    }

    pub fn upgrade_requested(&self) -> bool {
        self.upgrade_requested
    }

    pub fn version_choices(&self) -> &[VersionChoice] {
        &self.version_choices
    }

    pub fn max_version(&self) -> Option<&KubeVersion> {
        version::max_version(
            &self.version_choices,
            self.cluster.control_plane_version.as_ref(),
        )
    }

    pub fn cluster_version_is_less_than_max(&self) -> bool {
        version::cluster_version_is_less_than_max(
            &self.version_choices,
            self.cluster.control_plane_version.as_ref(),
        )
    }

    /// True unless the pool holds a version a non-empty choice list does not offer.
    pub fn version_is_offered(&self) -> bool {
        self.node_pool
            .version
            .as_ref()
            .is_none_or(|current| version::is_offered(&self.version_choices, current))
    }

    pub fn upgrade_available(&self) -> bool {
        version::upgrade_available(
            self.node_pool.version.as_ref(),
            self.cluster.control_plane_version.as_ref(),
            &self.version_choices,
        )
    }

    pub fn original_cluster_version(&self) -> String {
        version::original_cluster_version(self.cluster.original_cluster.as_ref())
    }

    pub fn is_new_node_pool(&self) -> bool {
        self.node_pool.is_new
    }

    pub fn machine_choices(&self) -> &[MachineChoice] {
        &self.machine_choices
    }

    pub fn edited_machine_choice(&self) -> Option<&MachineChoice> {
        find_machine_choice(
            &self.machine_choices,
            self.node_pool.config.machine_type.as_deref(),
        )
    }

    pub fn regional_total_node_counts(&self) -> u64 {
        nodes::regional_total_node_counts(&self.cluster, self.node_pool.initial_node_count)
    }

    pub fn show_management_warning(&self) -> bool {
        nodes::show_management_warning(
            self.cluster.original_cluster.as_ref(),
            &self.node_pool.management,
        )
    }

    pub fn disk_type_content(&self) -> &[String] {
        &self.disk_type_content
    }

    pub fn image_type_content(&self) -> &[String] {
        &self.image_type_content
    }

    /// Snapshot all derived values.
    pub fn derived(&self) -> DerivedView {
        DerivedView {
            upgrade_available: self.upgrade_available(),
            max_version: self.max_version().cloned(),
            cluster_version_is_less_than_max: self.cluster_version_is_less_than_max(),
            version_is_offered: self.version_is_offered(),
            original_cluster_version: self.original_cluster_version(),
            is_new_node_pool: self.is_new_node_pool(),
            machine_choices: self.machine_choices.clone(),
            edited_machine_choice: self.edited_machine_choice().cloned(),
            regional_total_node_counts: self.regional_total_node_counts(),
            show_management_warning: self.show_management_warning(),
            disk_type_content: self.disk_type_content.clone(),
            image_type_content: self.image_type_content.clone(),
        }
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("node_pool", &self.node_pool)
            .field("cluster", &self.cluster)
            .field("selection", &self.selection)
            .field("upgrade_requested", &self.upgrade_requested)
            .field("pending_tasks", &self.queue.len())
            .field("torn_down", &self.torn_down)
            .finish_non_exhaustive()
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn check_bound(enabled: bool, field: Field, count: Option<u32>) -> Result<(), Rejection> {
    match (enabled, count) {
        (false, Some(_)) => Err(Rejection::AutoscalingDisabled { field }),
        (true, None) => Err(Rejection::BoundRequired { field }),
        _ => Ok(()),
    }
}
