//! Test fixtures for node-pool reconciliation.
//!
//! Provides a [`SessionBuilder`] for assembling session inputs, a small
//! machine catalog, and a [`CountingMapper`] that records how often the scope
//! mapper is called.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use gkepool_reconcile::{
    ClusterContext, GkeConfig, GkeStatus, Location, LocationType, MachineType, NodePoolConfig,
    OriginalCluster, Reconciler, SessionInputs, UpstreamSpec,
};
use gkepool_scopes::{GoogleCatalog, OauthScopesSelection, ScopeConfig, ScopeMapper, ScopeSelection};
use gkepool_version::{KubeVersion, VersionChoice};

/// Install a test-friendly tracing subscriber. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gkepool=debug".into()),
        )
        .try_init();
}

/// Parse a version, panicking on bad fixtures.
pub fn v(s: &str) -> KubeVersion {
    KubeVersion::parse(s).unwrap_or_else(|e| panic!("bad fixture version {s}: {e}"))
}

pub fn version_choices(versions: &[&str]) -> Vec<VersionChoice> {
    versions.iter().map(|s| VersionChoice::new(v(s))).collect()
}

/// A handful of machine types in catalog (unsorted) order.
pub fn machine_catalog() -> Vec<MachineType> {
    vec![
        MachineType::new("n1-standard-2", "2 vCPUs, 7.5 GB RAM"),
        MachineType::new("n1-standard-16", "16 vCPUs, 60 GB RAM"),
        MachineType::new("n1-standard-1", "1 vCPU, 3.75 GB RAM"),
        MachineType::new("e2-medium", "2 shared vCPUs, 4 GB RAM"),
        MachineType::new("n2-highmem-8", "8 vCPUs, 64 GB RAM"),
    ]
}

pub fn original_cluster(imported: bool, configured_version: Option<&str>) -> OriginalCluster {
    OriginalCluster {
        gke_status: Some(GkeStatus {
            upstream_spec: Some(UpstreamSpec {
                imported,
                kubernetes_version: configured_version.map(String::from),
            }),
        }),
        gke_config: Some(GkeConfig {
            kubernetes_version: configured_version.map(String::from),
        }),
    }
}

/// Builder for [`SessionInputs`].
#[derive(Debug, Clone, Default)]
pub struct SessionBuilder {
    inputs: SessionInputs,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn control_plane(mut self, version: &str) -> Self {
        self.inputs.cluster.control_plane_version = Some(v(version));
        self
    }

    pub fn choices(mut self, versions: &[&str]) -> Self {
        self.inputs.version_choices = version_choices(versions);
        self
    }

    pub fn pool(mut self, pool: NodePoolConfig) -> Self {
        self.inputs.node_pool = Some(pool);
        self
    }

    /// An existing pool at the given version (or none).
    pub fn existing_pool(self, version: Option<&str>) -> Self {
        let pool = NodePoolConfig {
            version: version.map(v),
            initial_node_count: Some(3),
            ..NodePoolConfig::default()
        };
        self.pool(pool)
    }

    pub fn new_pool(self) -> Self {
        self.pool(NodePoolConfig::new_pool())
    }

    pub fn upgrade_requested(mut self, requested: bool) -> Self {
        self.inputs.upgrade_requested = requested;
        self
    }

    pub fn selection(mut self, selection: ScopeSelection) -> Self {
        self.inputs.scope_selection = Some(selection);
        self
    }

    pub fn locations(mut self, location_type: LocationType, checked: usize) -> Self {
        self.inputs.cluster.location_type = location_type;
        self.inputs.cluster.location_content = (0..checked)
            .map(|i| Location::new(format!("zone-{i}"), true))
            .chain(std::iter::once(Location::new("zone-unchecked", false)))
            .collect();
        self
    }

    pub fn machine_types(mut self, machine_types: Vec<MachineType>) -> Self {
        self.inputs.machine_types = machine_types;
        self
    }

    pub fn original(mut self, original: OriginalCluster) -> Self {
        self.inputs.cluster.original_cluster = Some(original);
        self
    }

    pub fn cluster(mut self, cluster: ClusterContext) -> Self {
        self.inputs.cluster = cluster;
        self
    }

    pub fn build(self) -> SessionInputs {
        self.inputs
    }

    /// Build a reconciler backed by the built-in catalog.
    pub fn reconciler(self) -> Reconciler {
        Reconciler::with_google_catalog(self.inputs)
    }

    /// Build a reconciler whose mapper calls are counted.
    pub fn counted_reconciler(self) -> (Reconciler, MapperCalls) {
        let mapper = CountingMapper::new();
        let calls = mapper.calls();
        let reconciler = Reconciler::new(self.inputs, Box::new(mapper), &GoogleCatalog::new());
        (reconciler, calls)
    }
}

/// Shared call counters of a [`CountingMapper`].
#[derive(Debug, Clone, Default)]
pub struct MapperCalls {
    maps: Arc<AtomicUsize>,
    unmaps: Arc<AtomicUsize>,
}

impl MapperCalls {
    pub fn maps(&self) -> usize {
        self.maps.load(Ordering::SeqCst)
    }

    pub fn unmaps(&self) -> usize {
        self.unmaps.load(Ordering::SeqCst)
    }
}

/// Scope mapper that delegates to [`GoogleCatalog`] and counts calls.
#[derive(Debug, Default)]
pub struct CountingMapper {
    inner: GoogleCatalog,
    calls: MapperCalls,
}

impl CountingMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> MapperCalls {
        self.calls.clone()
    }
}

impl ScopeMapper for CountingMapper {
    fn map_oauth_scopes(
        &self,
        selection: OauthScopesSelection,
        config: &ScopeConfig,
    ) -> Vec<String> {
        self.calls.maps.fetch_add(1, Ordering::SeqCst);
        self.inner.map_oauth_scopes(selection, config)
    }

    fn unmap_oauth_scopes(&self, scopes: &[String]) -> ScopeSelection {
        self.calls.unmaps.fetch_add(1, Ordering::SeqCst);
        self.inner.unmap_oauth_scopes(scopes)
    }

    fn default_selection(&self) -> ScopeSelection {
        self.inner.default_selection()
    }
}
