//! Version planning: candidate versions per bump kind and resolution of the
//! user's final choice.

use std::collections::BTreeMap;
use std::fmt;

use semver::{Prerelease, Version};
use tracing::debug;

use crate::domain::PreReleaseType;
use crate::error::{ReleaseError, Result};

/// The kind of increment applied to the current version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BumpKind {
    Major,
    Minor,
    Patch,
    Prerelease,
}

impl BumpKind {
    pub const ALL: [BumpKind; 4] = [
        BumpKind::Major,
        BumpKind::Minor,
        BumpKind::Patch,
        BumpKind::Prerelease,
    ];

    /// Short description shown in the prompt
    pub fn intro(&self) -> &'static str {
        match self {
            BumpKind::Major => "Major release, may contain incompatible changes",
            BumpKind::Minor => "Minor release, new features or improvements",
            BumpKind::Patch => "Patch release, backwards compatible bug fixes",
            BumpKind::Prerelease => "Prerelease",
        }
    }
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BumpKind::Major => "major",
            BumpKind::Minor => "minor",
            BumpKind::Patch => "patch",
            BumpKind::Prerelease => "prerelease",
        };
        f.write_str(name)
    }
}

/// What the user picked in the release-type prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseType {
    Bump(BumpKind),
    Custom,
}

/// The fully answered version selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseChoice {
    /// Use the precomputed candidate for a major/minor/patch bump
    Bump(BumpKind),
    /// Prerelease increment of the current version with the chosen identifier
    Prerelease(PreReleaseType),
    /// A user-supplied version string
    Custom(String),
}

/// Current version, per-kind candidates, and the rules to settle on one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionPlan {
    pub current: Version,
    pub candidates: BTreeMap<BumpKind, Version>,
}

impl VersionPlan {
    /// Build a plan from the manifest's version string
    pub fn new(current: &str) -> Result<Self> {
        let current = parse_lenient(current).map_err(|e| {
            ReleaseError::invalid_version(format!("current version '{}': {}", current, e))
        })?;
        let candidates = compute_candidates(&current);
        Ok(VersionPlan {
            current,
            candidates,
        })
    }

    /// Candidate version for a bump kind
    pub fn candidate(&self, kind: BumpKind) -> Result<&Version> {
        self.candidates.get(&kind).ok_or_else(|| {
            ReleaseError::invalid_version(format!("no {} candidate for {}", kind, self.current))
        })
    }

    /// Default offered in the custom-version prompt.
    ///
    /// Continues the prerelease line when the current version is on a recognized
    /// identifier, otherwise the next patch.
    pub fn suggested_custom(&self) -> Result<Version> {
        let on_prerelease = PreReleaseType::detect(self.current.pre.as_str()).is_some();
        let kind = if on_prerelease {
            BumpKind::Prerelease
        } else {
            BumpKind::Patch
        };
        increment(&self.current, kind, None)
    }

    /// Resolve the final version for this run
    pub fn resolve(&self, choice: &ReleaseChoice) -> Result<Version> {
        let resolved = match choice {
            ReleaseChoice::Bump(BumpKind::Prerelease) => {
                increment(&self.current, BumpKind::Prerelease, None)?
            }
            ReleaseChoice::Bump(kind) => self.candidate(*kind)?.clone(),
            ReleaseChoice::Prerelease(identifier) => increment(
                &self.current,
                BumpKind::Prerelease,
                Some(identifier.as_str()),
            )?,
            ReleaseChoice::Custom(input) => {
                let version = parse_custom_version(input)?;
                if version <= self.current {
                    debug!(current = %self.current, custom = %version, "custom version does not move forward");
                }
                version
            }
        };
        debug!(current = %self.current, resolved = %resolved, ?choice, "version resolved");
        Ok(resolved)
    }
}

/// Compute the candidate for every bump kind (prerelease without identifier).
///
/// A kind whose increment would overflow a version component has no candidate.
pub fn compute_candidates(current: &Version) -> BTreeMap<BumpKind, Version> {
    BumpKind::ALL
        .iter()
        .filter_map(|kind| match increment(current, *kind, None) {
            Ok(next) => Some((*kind, next)),
            Err(e) => {
                debug!(%current, %kind, error = %e, "no candidate");
                None
            }
        })
        .collect()
}

/// Validate a user-supplied version, accepting a leading `v` or `=`
pub fn parse_custom_version(input: &str) -> Result<Version> {
    parse_lenient(input).map_err(|e| {
        ReleaseError::invalid_version(format!("'{}' is not a valid semantic version: {}", input, e))
    })
}

fn parse_lenient(input: &str) -> std::result::Result<Version, semver::Error> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix('=')
        .unwrap_or(trimmed)
        .trim_start_matches(['v', 'V']);
    Version::parse(trimmed)
}

/// Increment a version the way npm's semver does.
///
/// - **Major/Minor/Patch** on a prerelease graduate it when the lower components
///   are already zero (`1.0.0-rc.1` -> major -> `1.0.0`).
/// - **Prerelease** bumps the last numeric prerelease component, or starts at
///   `<patch+1>-0`; with an identifier the result is `<id>.0`, or `<id>.<n+1>`
///   when already on that identifier.
pub fn increment(current: &Version, kind: BumpKind, identifier: Option<&str>) -> Result<Version> {
    let is_pre = !current.pre.is_empty();
    let mut next = Version::new(current.major, current.minor, current.patch);

    match kind {
        BumpKind::Major => {
            if !(is_pre && current.minor == 0 && current.patch == 0) {
                next.major = bump(current.major, "major")?;
                next.minor = 0;
                next.patch = 0;
            }
        }
        BumpKind::Minor => {
            if !(is_pre && current.patch == 0) {
                next.minor = bump(current.minor, "minor")?;
                next.patch = 0;
            }
        }
        BumpKind::Patch => {
            if !is_pre {
                next.patch = bump(current.patch, "patch")?;
            }
        }
        BumpKind::Prerelease => {
            let mut parts: Vec<String> = if is_pre {
                current.pre.as_str().split('.').map(String::from).collect()
            } else {
                next.patch = bump(current.patch, "patch")?;
                Vec::new()
            };

            match parts.iter().rposition(|p| p.parse::<u64>().is_ok()) {
                Some(idx) => {
                    let n: u64 = parts[idx].parse().unwrap_or_default();
                    parts[idx] = bump(n, "prerelease")?.to_string();
                }
                None => parts.push("0".to_string()),
            }

            if let Some(id) = identifier {
                let continues_line = parts.first().map(String::as_str) == Some(id)
                    && parts.get(1).is_some_and(|p| p.parse::<u64>().is_ok());
                if !continues_line {
                    parts = vec![id.to_string(), "0".to_string()];
                }
            }

            next.pre = Prerelease::new(&parts.join(".")).map_err(|e| {
                ReleaseError::invalid_version(format!("prerelease '{}': {}", parts.join("."), e))
            })?;
        }
    }

    Ok(next)
}

/// `component + 1`, or an error when the component is already at its maximum
fn bump(component: u64, name: &str) -> Result<u64> {
    component.checked_add(1).ok_or_else(|| {
        ReleaseError::invalid_version(format!("{} component {} cannot be incremented", name, component))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn inc(s: &str, kind: BumpKind, id: Option<&str>) -> String {
        increment(&v(s), kind, id).unwrap().to_string()
    }

    #[test]
    fn test_release_increments() {
        assert_eq!(inc("1.2.3", BumpKind::Major, None), "2.0.0");
        assert_eq!(inc("1.2.3", BumpKind::Minor, None), "1.3.0");
        assert_eq!(inc("1.2.3", BumpKind::Patch, None), "1.2.4");
    }

    #[test]
    fn test_release_increments_graduate_prereleases() {
        assert_eq!(inc("2.0.0-rc.1", BumpKind::Major, None), "2.0.0");
        assert_eq!(inc("1.2.0-beta.1", BumpKind::Major, None), "2.0.0");
        assert_eq!(inc("1.3.0-beta.1", BumpKind::Minor, None), "1.3.0");
        assert_eq!(inc("1.3.1-beta.1", BumpKind::Minor, None), "1.4.0");
        assert_eq!(inc("1.2.4-alpha.0", BumpKind::Patch, None), "1.2.4");
    }

    #[test]
    fn test_prerelease_without_identifier() {
        assert_eq!(inc("1.2.3", BumpKind::Prerelease, None), "1.2.4-0");
        assert_eq!(inc("1.2.4-0", BumpKind::Prerelease, None), "1.2.4-1");
        assert_eq!(inc("1.2.4-beta.3", BumpKind::Prerelease, None), "1.2.4-beta.4");
        assert_eq!(inc("1.0.0-rc", BumpKind::Prerelease, None), "1.0.0-rc.0");
    }

    #[test]
    fn test_prerelease_with_identifier() {
        assert_eq!(inc("1.0.0", BumpKind::Prerelease, Some("beta")), "1.0.1-beta.0");
        assert_eq!(inc("1.0.1-beta.0", BumpKind::Prerelease, Some("beta")), "1.0.1-beta.1");
        assert_eq!(inc("1.0.1-alpha.3", BumpKind::Prerelease, Some("beta")), "1.0.1-beta.0");
        assert_eq!(inc("1.0.0-rc", BumpKind::Prerelease, Some("rc")), "1.0.0-rc.0");
    }

    #[test]
    fn test_build_metadata_is_dropped() {
        assert_eq!(inc("1.2.3+build.7", BumpKind::Patch, None), "1.2.4");
    }

    #[test]
    fn test_candidates_cover_every_kind() {
        let plan = VersionPlan::new("1.0.0").unwrap();
        assert_eq!(plan.candidates.len(), 4);
        assert_eq!(plan.candidate(BumpKind::Major).unwrap(), &v("2.0.0"));
        assert_eq!(plan.candidate(BumpKind::Minor).unwrap(), &v("1.1.0"));
        assert_eq!(plan.candidate(BumpKind::Patch).unwrap(), &v("1.0.1"));
        assert_eq!(plan.candidate(BumpKind::Prerelease).unwrap(), &v("1.0.1-0"));
    }

    #[test]
    fn test_release_bumps_move_forward() {
        for current in ["0.0.0", "0.1.9", "1.2.3", "1.0.0-rc.1", "3.4.0-beta.2", "9.9.9"] {
            let plan = VersionPlan::new(current).unwrap();
            for kind in [BumpKind::Major, BumpKind::Minor, BumpKind::Patch] {
                let resolved = plan.resolve(&ReleaseChoice::Bump(kind)).unwrap();
                assert!(resolved > plan.current, "{} {} -> {}", current, kind, resolved);
            }
        }
    }

    #[test]
    fn test_resolve_prerelease_uses_identifier() {
        let plan = VersionPlan::new("1.0.0").unwrap();
        let resolved = plan
            .resolve(&ReleaseChoice::Prerelease(PreReleaseType::Beta))
            .unwrap();
        assert_eq!(resolved, v("1.0.1-beta.0"));
    }

    #[test]
    fn test_resolve_custom() {
        let plan = VersionPlan::new("1.0.0").unwrap();
        assert_eq!(
            plan.resolve(&ReleaseChoice::Custom("v3.0.0".to_string())).unwrap(),
            v("3.0.0")
        );
        assert_eq!(
            plan.resolve(&ReleaseChoice::Custom("=1.5.0".to_string())).unwrap(),
            v("1.5.0")
        );
    }

    #[test]
    fn test_resolve_custom_rejects_garbage() {
        let plan = VersionPlan::new("1.0.0").unwrap();
        let err = plan
            .resolve(&ReleaseChoice::Custom("1.0".to_string()))
            .unwrap_err();
        assert!(matches!(err, ReleaseError::InvalidVersion(_)));
    }

    #[test]
    fn test_suggested_custom() {
        assert_eq!(
            VersionPlan::new("1.0.0").unwrap().suggested_custom().unwrap(),
            v("1.0.1")
        );
        assert_eq!(
            VersionPlan::new("1.0.1-beta.2").unwrap().suggested_custom().unwrap(),
            v("1.0.1-beta.3")
        );
        assert_eq!(
            VersionPlan::new("1.0.1-0").unwrap().suggested_custom().unwrap(),
            v("1.0.1")
        );
    }

    #[test]
    fn test_invalid_current_version() {
        assert!(matches!(
            VersionPlan::new("not-a-version"),
            Err(ReleaseError::InvalidVersion(_))
        ));
    }

    #[test]
    fn test_increment_overflow_is_error() {
        let max = u64::MAX;
        for (current, kind) in [
            (format!("{}.0.0", max), BumpKind::Major),
            (format!("1.{}.0", max), BumpKind::Minor),
            (format!("1.0.{}", max), BumpKind::Patch),
            (format!("1.0.{}", max), BumpKind::Prerelease),
            (format!("1.0.0-{}", max), BumpKind::Prerelease),
        ] {
            let err = increment(&v(&current), kind, None).unwrap_err();
            assert!(matches!(err, ReleaseError::InvalidVersion(_)), "{} {}", current, kind);
        }
    }

    #[test]
    fn test_plan_drops_overflowing_candidates() {
        let plan = VersionPlan::new(&format!("{}.0.0", u64::MAX)).unwrap();
        assert!(!plan.candidates.contains_key(&BumpKind::Major));
        assert_eq!(
            plan.candidate(BumpKind::Patch).unwrap().to_string(),
            format!("{}.0.1", u64::MAX)
        );
        assert!(matches!(
            plan.resolve(&ReleaseChoice::Bump(BumpKind::Major)),
            Err(ReleaseError::InvalidVersion(_))
        ));
    }
}
