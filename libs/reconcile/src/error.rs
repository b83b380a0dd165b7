//! Error and rejection types.

use gkepool_version::KubeVersion;
use serde::Serialize;
use thiserror::Error;

use crate::dispatch::Field;

/// Errors loading session input.
///
/// Reconciliation itself never fails; these only arise at the input boundary.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The session document could not be parsed.
    #[error("invalid {format} session: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    /// The session document's format could not be determined.
    #[error("unsupported session format: {0}")]
    UnsupportedFormat(String),

    /// Autoscaling bounds are inverted.
    #[error("invalid autoscaling bounds: min {min} > max {max}")]
    InvalidBounds { min: u32, max: u32 },
}

impl From<serde_json::Error> for ReconcileError {
    fn from(err: serde_json::Error) -> Self {
        ReconcileError::Parse {
            format: "json",
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ReconcileError {
    fn from(err: toml::de::Error) -> Self {
        ReconcileError::Parse {
            format: "toml",
            message: err.to_string(),
        }
    }
}

/// An edit the reconciler refused to apply.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    /// The version is not in the current version-choice list.
    #[error("version {version} is not offered")]
    VersionNotOffered { version: KubeVersion },

    /// Bounds cannot be set while autoscaling is disabled.
    #[error("{field} cannot be set while autoscaling is disabled")]
    AutoscalingDisabled { field: Field },

    /// Bounds cannot be cleared while autoscaling is enabled.
    #[error("{field} is required while autoscaling is enabled")]
    BoundRequired { field: Field },
}
