//! Scope selection model and the collaborator traits the reconciler consumes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ScopeError;

/// Prefix applied to short scope names.
pub const SCOPE_URL_PREFIX: &str = "https://www.googleapis.com/auth/";

/// Catalog key for scopes that match no known API.
pub const OTHER_SCOPES_KEY: &str = "other";

/// Value meaning "no access" for an API in the custom configuration.
pub const NO_ACCESS: &str = "none";

/// Per-API scope configuration: API key to selected short scope names.
pub type ScopeConfig = BTreeMap<String, Vec<String>>;

/// Top-level scope selection mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OauthScopesSelection {
    /// GKE default scopes.
    #[default]
    Default,
    /// Full access to all cloud APIs.
    Full,
    /// Per-API custom configuration.
    Custom,
}

impl OauthScopesSelection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Full => "full",
            Self::Custom => "custom",
        }
    }
}

impl std::fmt::Display for OauthScopesSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OauthScopesSelection {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "full" => Ok(Self::Full),
            "custom" => Ok(Self::Custom),
            _ => Err(ScopeError::UnknownSelection(s.to_string())),
        }
    }
}

/// The compact, user-facing form of a scope list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeSelection {
    pub oauth_scopes_selection: OauthScopesSelection,
    #[serde(default)]
    pub scope_config: ScopeConfig,
}

impl ScopeSelection {
    #[must_use]
    pub fn new(oauth_scopes_selection: OauthScopesSelection, scope_config: ScopeConfig) -> Self {
        Self {
            oauth_scopes_selection,
            scope_config,
        }
    }

    /// A `custom` selection with the given `(api, scope)` pairs.
    #[must_use]
    pub fn custom<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut scope_config = ScopeConfig::new();
        for (api, scope) in pairs {
            scope_config
                .entry(api.to_string())
                .or_default()
                .push(scope.to_string());
        }
        Self::new(OauthScopesSelection::Custom, scope_config)
    }
}

/// Maps between scope selections and raw scope lists.
pub trait ScopeMapper {
    /// Expand a selection into a raw scope list.
    fn map_oauth_scopes(&self, selection: OauthScopesSelection, config: &ScopeConfig)
        -> Vec<String>;

    /// Derive a selection from a raw scope list.
    fn unmap_oauth_scopes(&self, scopes: &[String]) -> ScopeSelection;

    /// Selection used to seed a pool that has no scopes yet.
    fn default_selection(&self) -> ScopeSelection;
}

/// Static option lists offered alongside the scope catalog.
pub trait OptionCatalog {
    fn disk_types(&self) -> Vec<String>;

    fn image_types(&self) -> Vec<String>;
}

/// Expand a short scope name into its full URL.
///
/// Values that already look like URLs are kept as-is. Returns `None` for
/// blank values and the `none` marker.
pub fn scope_url(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value == NO_ACCESS {
        return None;
    }

    if value.contains("://") {
        Some(value.to_string())
    } else {
        Some(format!("{SCOPE_URL_PREFIX}{value}"))
    }
}

/// Strip the scope URL prefix, if present.
pub fn short_scope_name(url: &str) -> &str {
    url.strip_prefix(SCOPE_URL_PREFIX).unwrap_or(url)
}

/// Parse a `api=scope` assignment as given on a command line.
pub fn parse_scope_assignment(s: &str) -> Result<(String, String), ScopeError> {
    let Some((api, scope)) = s.split_once('=') else {
        return Err(ScopeError::InvalidAssignment(s.to_string()));
    };

    let (api, scope) = (api.trim(), scope.trim());
    if api.is_empty() || scope.is_empty() {
        return Err(ScopeError::InvalidAssignment(s.to_string()));
    }

    Ok((api.to_string(), scope.to_string()))
}
