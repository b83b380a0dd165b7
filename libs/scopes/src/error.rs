//! Error types for scope selection parsing.

use thiserror::Error;

/// Errors that can occur when parsing scope selections from user input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// The selection name is not one of `default`, `full`, `custom`.
    #[error("unknown scope selection '{0}': expected default, full, or custom")]
    UnknownSelection(String),

    /// A `key=value` scope assignment could not be parsed.
    #[error("invalid scope assignment '{0}': expected <api>=<scope>")]
    InvalidAssignment(String),
}
