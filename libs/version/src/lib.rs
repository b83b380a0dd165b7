//! # gkepool-version
//!
//! Kubernetes version handling for node-pool editing.
//!
//! ## Design Principles
//!
//! - Versions are parsed once at the input boundary; everything past that
//!   point works with the typed [`KubeVersion`]
//! - Ordering is semver precedence, prerelease-aware
//! - Build metadata is preserved for display but never affects comparison
//!
//! ## Accepted Formats
//!
//! - `1.27.3`
//! - `v1.27.3` (leading `v` is stripped)
//! - `1.27.3-gke.100` (GKE patch suffixes are prereleases, so they sort
//!   before the bare release)
//! - `1.27` (missing patch defaults to `0`)

mod error;
mod types;

pub use error::VersionError;
pub use types::*;
