//! Precondition checks run before anything is written.
//!
//! Each check either passes or fails the run with a dedicated error; the
//! registry check alone degrades to a warning when the registry cannot answer.

use std::path::{Path, PathBuf};

use semver::Version;
use tracing::debug;

use crate::boundary::BoundaryWarning;
use crate::domain::{BranchContext, BranchRule};
use crate::error::{ReleaseError, Result};
use crate::git::Repository;
use crate::manifest::Manifest;
use crate::registry::Registry;

/// The version manifest must exist in `root`
pub fn check_manifest(root: &Path) -> Result<PathBuf> {
    let path = Manifest::path_in(root);
    if !path.is_file() {
        return Err(ReleaseError::ManifestMissing(path.display().to_string()));
    }
    Ok(path)
}

/// The project must be inside a git working tree with a branch checked out
pub fn check_repository<R: Repository + ?Sized>(repo: &R) -> Result<BranchContext> {
    match repo.current_branch() {
        Ok(name) => {
            debug!(branch = %name, "current branch");
            Ok(BranchContext::new(name))
        }
        Err(ReleaseError::NotAGitRepo(reason)) => Err(ReleaseError::NotAGitRepo(reason)),
        Err(e) => Err(ReleaseError::NotAGitRepo(e.to_string())),
    }
}

/// The branch must not match any blacklist rule
pub fn check_branch(branch: &BranchContext, blacklist: &[BranchRule]) -> Result<()> {
    if branch.is_blacklisted(blacklist) {
        return Err(ReleaseError::BranchBlacklisted(branch.name.clone()));
    }
    Ok(())
}

/// The working tree must have no uncommitted changes
pub fn check_clean<R: Repository + ?Sized>(repo: &R) -> Result<()> {
    let changes = repo.status_short()?;
    if !changes.is_empty() {
        return Err(ReleaseError::DirtyWorkingTree(changes.join("\n")));
    }
    Ok(())
}

/// The version must not already be published.
///
/// Only a confirmed match fails. A lookup that cannot complete, or a manifest
/// without a package name, yields a warning and lets the run continue.
pub fn check_not_published<G: Registry + ?Sized>(
    registry: &G,
    registry_url: &str,
    package: Option<&str>,
    version: &Version,
) -> Result<Option<BoundaryWarning>> {
    let Some(package) = package else {
        return Ok(Some(BoundaryWarning::MissingPackageName));
    };

    match registry.is_published(registry_url, package, version) {
        Ok(true) => Err(ReleaseError::VersionAlreadyPublished {
            package: package.to_string(),
            version: version.to_string(),
        }),
        Ok(false) => Ok(None),
        Err(e) => {
            debug!(package, error = %e, "registry lookup failed");
            let reason = match e {
                ReleaseError::RegistryLookup(reason) => reason,
                other => other.to_string(),
            };
            Ok(Some(BoundaryWarning::RegistryLookupFailed {
                package: package.to_string(),
                reason,
            }))
        }
    }
}
