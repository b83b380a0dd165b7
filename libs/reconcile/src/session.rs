//! Edit session documents.
//!
//! A session document holds the inputs a form session starts from plus an
//! optional list of edit batches to replay. Documents are TOML or JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dispatch::Edit;
use crate::error::ReconcileError;
use crate::model::SessionInputs;

/// Document formats a session can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFormat {
    Json,
    Toml,
}

impl SessionFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ReconcileError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(ReconcileError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

/// One batch of edits, applied together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditBatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default)]
    pub edits: Vec<Edit>,
}

/// A session document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFile {
    #[serde(flatten)]
    pub inputs: SessionInputs,

    #[serde(default)]
    pub batches: Vec<EditBatch>,
}

impl SessionFile {
    pub fn parse(contents: &str, format: SessionFormat) -> Result<Self, ReconcileError> {
        let file: Self = match format {
            SessionFormat::Json => serde_json::from_str(contents)?,
            SessionFormat::Toml => toml::from_str(contents)?,
        };
        file.validate()?;
        Ok(file)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ReconcileError> {
        Self::parse(contents, SessionFormat::Json)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ReconcileError> {
        Self::parse(contents, SessionFormat::Toml)
    }

    /// Reject inputs no form could have produced.
    pub fn validate(&self) -> Result<(), ReconcileError> {
        let Some(pool) = &self.inputs.node_pool else {
            return Ok(());
        };

        let autoscaling = &pool.autoscaling;
        if let (true, Some(min), Some(max)) = (
            autoscaling.enabled,
            autoscaling.min_node_count,
            autoscaling.max_node_count,
        ) {
            if min > max {
                return Err(ReconcileError::InvalidBounds { min, max });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LocationType;
    use gkepool_scopes::OauthScopesSelection;

    const SESSION_TOML: &str = r#"
upgradeRequested = false

[cluster]
controlPlaneVersion = "1.27.3"
locationType = "zonal"
locationContent = [
    { name = "us-central1-b", checked = true },
    { name = "us-central1-c", checked = false },
]

[nodePool]
version = "1.26.5"
initialNodeCount = 3

[nodePool.config]
machineType = "n1-standard-2"
oauthScopes = ["https://www.googleapis.com/auth/cloud-platform"]

[[machineTypes]]
name = "n1-standard-2"
description = "2 vCPUs, 7.5 GB RAM"

[[versionChoices]]
value = "1.27.3"
label = "1.27.3 (default)"

[[batches]]
label = "enable autoscaling"
edits = [
    { op = "setAutoscalingEnabled", value = true },
    { op = "setScopeSelection", value = "default" },
]
"#;

    #[test]
    fn test_parse_toml_session() {
        let file = SessionFile::from_toml_str(SESSION_TOML).unwrap();
        let cluster = &file.inputs.cluster;
        assert_eq!(cluster.control_plane_version.as_ref().unwrap().to_string(), "1.27.3");
        assert_eq!(cluster.location_type, LocationType::Zonal);
        assert_eq!(cluster.location_content.len(), 2);

        let pool = file.inputs.node_pool.as_ref().unwrap();
        assert_eq!(pool.initial_node_count, Some(3));
        assert_eq!(file.inputs.version_choices[0].label, "1.27.3 (default)");

        assert_eq!(file.batches.len(), 1);
        assert_eq!(
            file.batches[0].edits[1],
            Edit::SetScopeSelection(OauthScopesSelection::Default)
        );
    }

    #[test]
    fn test_parse_json_session() {
        let json = r#"{
            "cluster": {"controlPlaneVersion": "1.24.0"},
            "batches": [{"edits": [{"op": "setInitialNodeCount", "value": 4}]}]
        }"#;

        let file = SessionFile::from_json_str(json).unwrap();
        assert!(file.inputs.node_pool.is_none());
        assert_eq!(file.batches[0].edits, vec![Edit::SetInitialNodeCount(Some(4))]);
    }

    #[test]
    fn test_invalid_version_is_a_parse_error() {
        let json = r#"{"cluster": {"controlPlaneVersion": "latest"}}"#;
        assert!(matches!(
            SessionFile::from_json_str(json),
            Err(ReconcileError::Parse { format: "json", .. })
        ));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let json = r#"{
            "nodePool": {"autoscaling": {"enabled": true, "minNodeCount": 5, "maxNodeCount": 2}}
        }"#;
        assert!(matches!(
            SessionFile::from_json_str(json),
            Err(ReconcileError::InvalidBounds { min: 5, max: 2 })
        ));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            SessionFormat::from_path(Path::new("pool.toml")).unwrap(),
            SessionFormat::Toml
        );
        assert_eq!(
            SessionFormat::from_path(Path::new("pool.json")).unwrap(),
            SessionFormat::Json
        );
        assert!(SessionFormat::from_path(Path::new("pool.yaml")).is_err());
    }
}
