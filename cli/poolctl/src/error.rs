//! Error handling and display for the CLI.

use std::path::PathBuf;

use colored::Colorize;
use gkepool_reconcile::ReconcileError;
use gkepool_scopes::ScopeError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Session file not found: {}", .0.display())]
    SessionNotFound(PathBuf),

    #[error(transparent)]
    Session(#[from] ReconcileError),

    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error("Unknown output format: {0}")]
    UnknownFormat(String),
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    let Some(cli_err) = err.chain().find_map(|e| e.downcast_ref::<CliError>()) else {
        return;
    };

    let hint = match cli_err {
        CliError::SessionNotFound(_) => Some("Check the path, or run from the session's directory."),
        CliError::Session(ReconcileError::UnsupportedFormat(_)) => {
            Some("Session files must end in .toml or .json.")
        }
        CliError::Session(ReconcileError::InvalidBounds { .. }) => {
            Some("Set minNodeCount at or below maxNodeCount.")
        }
        CliError::Session(ReconcileError::Parse { .. }) => {
            Some("Field names are camelCase, e.g. `controlPlaneVersion`.")
        }
        CliError::Scope(ScopeError::InvalidAssignment(_)) => {
            Some("Scopes are given as api=scope, e.g. `--scope storage=devstorage.read_only`.")
        }
        CliError::Scope(ScopeError::UnknownSelection(_)) => {
            Some("Valid selections are default, full, and custom.")
        }
        CliError::UnknownFormat(_) => Some("Valid formats are table and json."),
    };

    if let Some(hint) = hint {
        eprintln!("\n{}", format!("Hint: {hint}").yellow());
    }
}
