//! Typed Kubernetes versions and version choices.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::VersionError;

// =============================================================================
// KubeVersion
// =============================================================================

/// A Kubernetes version ordered by semver precedence.
///
/// Equality, ordering, and hashing consider `major.minor.patch` and the
/// prerelease. Build metadata is carried along for display only.
#[derive(Debug, Clone)]
pub struct KubeVersion(semver::Version);

impl KubeVersion {
    /// Creates a release version with no prerelease or build metadata.
    #[must_use]
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(semver::Version::new(major, minor, patch))
    }

    /// Parses a version string.
    ///
    /// Surrounding whitespace and a leading `v` are ignored. A version with
    /// only `major.minor` gets a `0` patch.
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(VersionError::Empty);
        }

        let unprefixed = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        let normalized = pad_missing_patch(unprefixed);

        semver::Version::parse(&normalized)
            .map(Self)
            .map_err(|e| VersionError::InvalidSemver {
                input: s.to_string(),
                message: e.to_string(),
            })
    }

    #[must_use]
    pub fn major(&self) -> u64 {
        self.0.major
    }

    #[must_use]
    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    #[must_use]
    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    fn precedence(&self) -> (u64, u64, u64, &semver::Prerelease) {
        (self.0.major, self.0.minor, self.0.patch, &self.0.pre)
    }
}

fn pad_missing_patch(s: &str) -> String {
    let core_end = s.find(['-', '+']).unwrap_or(s.len());
    let (core, rest) = s.split_at(core_end);

    if core.matches('.').count() == 1 {
        format!("{core}.0{rest}")
    } else {
        s.to_string()
    }
}

impl PartialEq for KubeVersion {
    fn eq(&self, other: &Self) -> bool {
        self.precedence() == other.precedence()
    }
}

impl Eq for KubeVersion {}

impl PartialOrd for KubeVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KubeVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.precedence().cmp(&other.precedence())
    }
}

impl Hash for KubeVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.precedence().hash(state);
    }
}

impl std::fmt::Display for KubeVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for KubeVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<semver::Version> for KubeVersion {
    fn from(version: semver::Version) -> Self {
        Self(version)
    }
}

impl Serialize for KubeVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for KubeVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Version Choices
// =============================================================================

/// A selectable version as offered by the version-choice listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionChoice {
    pub value: KubeVersion,

    #[serde(default)]
    pub label: String,
}

impl VersionChoice {
    /// Creates a choice labelled with the version itself.
    #[must_use]
    pub fn new(value: KubeVersion) -> Self {
        let label = value.to_string();
        Self { value, label }
    }

    #[must_use]
    pub fn with_label(value: KubeVersion, label: impl Into<String>) -> Self {
        Self {
            value,
            label: label.into(),
        }
    }
}

/// Returns the newest version in a choice list.
///
/// Listings arrive newest-first, but the maximum is taken explicitly so an
/// unsorted listing still yields the right bound.
#[must_use]
pub fn newest(choices: &[VersionChoice]) -> Option<&KubeVersion> {
    choices.iter().map(|c| &c.value).max()
}

/// Returns true if `version` is offered by the choice list.
#[must_use]
pub fn offers(choices: &[VersionChoice], version: &KubeVersion) -> bool {
    choices.iter().any(|c| &c.value == version)
}

// =============================================================================
// Tests
// =============================================================================
