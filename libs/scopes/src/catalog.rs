//! Built-in GKE catalog: scope option tables, disk types, image types.

use std::collections::BTreeSet;

use tracing::debug;

use crate::{
    scope_url, short_scope_name, OauthScopesSelection, OptionCatalog, ScopeConfig, ScopeMapper,
    ScopeSelection, OTHER_SCOPES_KEY, SCOPE_URL_PREFIX,
};

// =============================================================================
// Option Tables
// =============================================================================

/// The scopes one API offers, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiScopes {
    /// Key used in [`ScopeConfig`].
    pub key: &'static str,
    pub label: &'static str,
    pub options: &'static [&'static str],
}

/// Per-API scope options. Table order is the canonical scope order.
pub const SCOPE_APIS: &[ApiScopes] = &[
    ApiScopes {
        key: "userInfo",
        label: "User Info",
        options: &["userinfo.email"],
    },
    ApiScopes {
        key: "computeEngine",
        label: "Compute Engine",
        options: &["compute.readonly", "compute"],
    },
    ApiScopes {
        key: "storage",
        label: "Storage",
        options: &[
            "devstorage.read_only",
            "devstorage.write_only",
            "devstorage.read_write",
            "devstorage.full_control",
        ],
    },
    ApiScopes {
        key: "taskQueue",
        label: "Task Queue",
        options: &["taskqueue"],
    },
    ApiScopes {
        key: "bigQuery",
        label: "BigQuery",
        options: &["bigquery"],
    },
    ApiScopes {
        key: "cloudSql",
        label: "Cloud SQL",
        options: &["sqlservice.admin"],
    },
    ApiScopes {
        key: "cloudDatastore",
        label: "Cloud Datastore",
        options: &["datastore"],
    },
    ApiScopes {
        key: "loggingApi",
        label: "Stackdriver Logging API",
        options: &["logging.write", "logging.read", "logging.admin"],
    },
    ApiScopes {
        key: "monitoringApi",
        label: "Stackdriver Monitoring API",
        options: &["monitoring.write", "monitoring.read", "monitoring"],
    },
    ApiScopes {
        key: "cloudPlatform",
        label: "Cloud Platform",
        options: &["cloud-platform"],
    },
    ApiScopes {
        key: "bigtableData",
        label: "Bigtable Data",
        options: &["bigtable.data.readonly", "bigtable.data"],
    },
    ApiScopes {
        key: "bigtableAdmin",
        label: "Bigtable Admin",
        options: &["bigtable.admin.table", "bigtable.admin"],
    },
    ApiScopes {
        key: "pubSub",
        label: "Cloud Pub/Sub",
        options: &["pubsub"],
    },
    ApiScopes {
        key: "serviceControl",
        label: "Service Control",
        options: &["servicecontrol"],
    },
    ApiScopes {
        key: "serviceManagement",
        label: "Service Management",
        options: &["service.management.readonly", "service.management"],
    },
    ApiScopes {
        key: "trace",
        label: "Stackdriver Trace",
        options: &["trace.readonly", "trace.append"],
    },
    ApiScopes {
        key: "sourceRepositories",
        label: "Cloud Source Repositories",
        options: &["source.read_only", "source.read_write", "source.full_control"],
    },
    ApiScopes {
        key: "debugger",
        label: "Stackdriver Debugger",
        options: &["cloud_debugger"],
    },
];

/// The scopes GKE grants a node pool by default, as `(api, scope)`.
pub const DEFAULT_SCOPES: &[(&str, &str)] = &[
    ("storage", "devstorage.read_only"),
    ("loggingApi", "logging.write"),
    ("monitoringApi", "monitoring"),
    ("serviceControl", "servicecontrol"),
    ("serviceManagement", "service.management.readonly"),
    ("trace", "trace.append"),
];

/// The scope granted by the `full` selection.
pub const FULL_ACCESS_SCOPE: &str = "cloud-platform";

pub const DISK_TYPES: &[&str] = &["pd-standard", "pd-ssd", "pd-balanced"];

pub const IMAGE_TYPES: &[&str] = &[
    "COS_CONTAINERD",
    "COS",
    "UBUNTU_CONTAINERD",
    "UBUNTU",
    "WINDOWS_LTSC_CONTAINERD",
    "WINDOWS_SAC_CONTAINERD",
];

/// Look up the API a short scope name belongs to.
pub fn api_for_scope(short_name: &str) -> Option<&'static ApiScopes> {
    SCOPE_APIS
        .iter()
        .find(|api| api.options.contains(&short_name))
}

/// Canonical position of a scope URL. Unknown scopes sort after all known ones.
fn scope_rank(url: &str) -> (usize, usize) {
    let Some(short) = url.strip_prefix(SCOPE_URL_PREFIX) else {
        return (usize::MAX, usize::MAX);
    };

    SCOPE_APIS
        .iter()
        .enumerate()
        .find_map(|(api_idx, api)| {
            api.options
                .iter()
                .position(|opt| *opt == short)
                .map(|opt_idx| (api_idx, opt_idx))
        })
        .unwrap_or((usize::MAX, usize::MAX))
}

/// Deduplicate and sort scope URLs into canonical order.
fn canonicalize<I>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let unique: BTreeSet<String> = urls.into_iter().collect();
    let mut out: Vec<String> = unique.into_iter().collect();
    out.sort_by(|a, b| scope_rank(a).cmp(&scope_rank(b)).then_with(|| a.cmp(b)));
    out
}

// =============================================================================
// GoogleCatalog
// =============================================================================

/// The built-in GKE catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoogleCatalog;

impl GoogleCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// The per-API option tables.
    #[must_use]
    pub fn scope_apis(&self) -> &'static [ApiScopes] {
        SCOPE_APIS
    }

    /// The configuration equivalent of the GKE default scopes.
    #[must_use]
    pub fn default_scope_config(&self) -> ScopeConfig {
        let mut config = ScopeConfig::new();
        for (api, scope) in DEFAULT_SCOPES {
            config
                .entry((*api).to_string())
                .or_default()
                .push((*scope).to_string());
        }
        config
    }

    /// The GKE default scopes as canonical URLs.
    #[must_use]
    pub fn default_scopes(&self) -> Vec<String> {
        canonicalize(DEFAULT_SCOPES.iter().filter_map(|(_, scope)| scope_url(scope)))
    }

    fn full_scopes(&self) -> Vec<String> {
        canonicalize(scope_url(FULL_ACCESS_SCOPE))
    }
}

impl ScopeMapper for GoogleCatalog {
    fn map_oauth_scopes(
        &self,
        selection: OauthScopesSelection,
        config: &ScopeConfig,
    ) -> Vec<String> {
        match selection {
            OauthScopesSelection::Default => self.default_scopes(),
            OauthScopesSelection::Full => self.full_scopes(),
            OauthScopesSelection::Custom => canonicalize(
                config
                    .values()
                    .flatten()
                    .filter_map(|scope| scope_url(scope)),
            ),
        }
    }

    fn unmap_oauth_scopes(&self, scopes: &[String]) -> ScopeSelection {
        let urls = canonicalize(scopes.iter().filter_map(|s| scope_url(s)));

        if urls == self.default_scopes() {
            return self.default_selection();
        }

        if urls == self.full_scopes() {
            return ScopeSelection::new(OauthScopesSelection::Full, ScopeConfig::new());
        }

        let mut config = ScopeConfig::new();
        for url in &urls {
            let short = short_scope_name(url);
            let (key, value) = match api_for_scope(short) {
                Some(api) => (api.key, short),
                // Keep the full URL when the short name would not map back to it.
                None if scope_url(short).as_deref() == Some(url.as_str()) => {
                    (OTHER_SCOPES_KEY, short)
                }
                None => (OTHER_SCOPES_KEY, url.as_str()),
            };
            config
                .entry(key.to_string())
                .or_default()
                .push(value.to_string());
        }

        debug!(
            scopes = urls.len(),
            apis = config.len(),
            "Unmapped scopes into custom selection"
        );

        ScopeSelection::new(OauthScopesSelection::Custom, config)
    }

    fn default_selection(&self) -> ScopeSelection {
        ScopeSelection::new(OauthScopesSelection::Default, self.default_scope_config())
    }
}

impl OptionCatalog for GoogleCatalog {
    fn disk_types(&self) -> Vec<String> {
        DISK_TYPES.iter().map(|s| (*s).to_string()).collect()
    }

    fn image_types(&self) -> Vec<String> {
        IMAGE_TYPES.iter().map(|s| (*s).to_string()).collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
