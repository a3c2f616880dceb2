use std::fmt;

/// Non-fatal conditions met during a release.
/// The run continues; each one is reported to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// The registry could not be asked whether the version exists
    RegistryLookupFailed { package: String, reason: String },
    /// The manifest has no `name`, so there is nothing to look up
    MissingPackageName,
    /// Configuration key the schema does not know
    UnknownConfigKey { key: String },
    /// The chosen version does not move past the current one
    VersionNotIncreased { current: String, requested: String },
    /// No commit since the previous release made it into the changelog
    NoNewCommits { previous_tag: Option<String> },
    /// Neither the manifest nor `origin` gives a repository URL
    NoRepositoryUrl,
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::RegistryLookupFailed { package, reason } => write!(
                f,
                "Cannot check published versions of '{}' ({}), continuing",
                package, reason
            ),
            BoundaryWarning::MissingPackageName => {
                write!(f, "Manifest has no package name, skipping registry check")
            }
            BoundaryWarning::UnknownConfigKey { key } => {
                write!(f, "Unknown config key '{}' is ignored", key)
            }
            BoundaryWarning::VersionNotIncreased { current, requested } => write!(
                f,
                "Version {} is not greater than current version {}",
                requested, current
            ),
            BoundaryWarning::NoNewCommits { previous_tag } => match previous_tag {
                Some(tag) => write!(f, "No changelog-worthy commits since tag '{}'", tag),
                None => write!(f, "No changelog-worthy commits found"),
            },
            BoundaryWarning::NoRepositoryUrl => write!(
                f,
                "No repository URL found, changelog is written without links"
            ),
        }
    }
}
