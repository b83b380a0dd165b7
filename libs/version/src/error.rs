//! Error types for version parsing.

use thiserror::Error;

/// Errors that can occur when parsing a Kubernetes version.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// The version string is empty.
    #[error("version cannot be empty")]
    Empty,

    /// The version string is not a valid semantic version.
    #[error("invalid version '{input}': {message}")]
    InvalidSemver { input: String, message: String },
}

impl VersionError {
    /// Returns true if this error indicates the input was empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, VersionError::Empty)
    }
}
