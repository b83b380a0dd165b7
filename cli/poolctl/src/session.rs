//! Session document loading.

use std::path::Path;

use anyhow::{Context, Result};
use gkepool_reconcile::{Reconciler, SessionFile, SessionFormat};
use tracing::info;

use crate::error::CliError;

/// Read and validate a session document. The format follows the extension.
pub fn load_session(path: &Path) -> Result<SessionFile> {
    if !path.exists() {
        return Err(CliError::SessionNotFound(path.to_path_buf()).into());
    }

    let format = SessionFormat::from_path(path).map_err(CliError::from)?;
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read session: {}", path.display()))?;

    let file = SessionFile::parse(&contents, format)
        .map_err(CliError::from)
        .with_context(|| format!("failed to load session: {}", path.display()))?;

    info!(
        path = %path.display(),
        batches = file.batches.len(),
        "Loaded session"
    );
    Ok(file)
}

/// Start a reconciler from a session's inputs, returning the unapplied batches.
pub fn open_session(path: &Path) -> Result<(Reconciler, SessionFile)> {
    let file = load_session(path)?;
    let reconciler = Reconciler::with_google_catalog(file.inputs.clone());
    Ok((reconciler, file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_session_file() {
        let err = load_session(Path::new("/nonexistent/session.toml")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::SessionNotFound(_))
        ));
    }
}
