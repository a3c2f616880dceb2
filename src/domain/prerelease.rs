//! Prerelease identifiers offered when cutting a prerelease.
//!
//! See semver.org: https://semver.org/#spec-item-9

use crate::error::{ReleaseError, Result};
use std::fmt;
use std::str::FromStr;

/// Recognized prerelease identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PreReleaseType {
    /// Internal testing
    Alpha,
    /// Public testing
    Beta,
    /// Release candidate
    ReleaseCandidate,
    /// Next major line
    Next,
    /// Experimental builds
    Experimental,
}

impl PreReleaseType {
    /// All identifiers, in prompt order
    pub const ALL: [PreReleaseType; 5] = [
        PreReleaseType::Alpha,
        PreReleaseType::Beta,
        PreReleaseType::ReleaseCandidate,
        PreReleaseType::Next,
        PreReleaseType::Experimental,
    ];

    /// The identifier as written in a version string
    pub fn as_str(&self) -> &'static str {
        match self {
            PreReleaseType::Alpha => "alpha",
            PreReleaseType::Beta => "beta",
            PreReleaseType::ReleaseCandidate => "rc",
            PreReleaseType::Next => "next",
            PreReleaseType::Experimental => "experimental",
        }
    }

    /// Short description shown in the prompt
    pub fn intro(&self) -> &'static str {
        match self {
            PreReleaseType::Alpha => "Internal testing (alpha)",
            PreReleaseType::Beta => "Public testing (beta)",
            PreReleaseType::ReleaseCandidate => "Release candidate (rc)",
            PreReleaseType::Next => "Next (next)",
            PreReleaseType::Experimental => "Experimental (experimental)",
        }
    }

    /// Find the first recognized identifier among the dot-separated parts of a
    /// prerelease string such as `beta.1`
    pub fn detect(prerelease: &str) -> Option<Self> {
        prerelease
            .split('.')
            .find_map(|part| part.parse::<PreReleaseType>().ok())
    }
}

impl FromStr for PreReleaseType {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        PreReleaseType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                ReleaseError::invalid_version(format!("Unknown pre-release identifier: '{}'", s))
            })
    }
}

impl fmt::Display for PreReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
