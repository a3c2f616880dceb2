use thiserror::Error;

/// Unified error type for release-cli operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Version manifest not found: {0}")]
    ManifestMissing(String),

    #[error("Not inside a git repository: {0}")]
    NotAGitRepo(String),

    #[error("Releasing from branch '{0}' is not allowed, switch to another branch")]
    BranchBlacklisted(String),

    #[error("Working tree has uncommitted changes, commit or stash them first:\n{0}")]
    DirtyWorkingTree(String),

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Version {version} of package {package} is already published")]
    VersionAlreadyPublished { package: String, version: String },

    #[error("Config validation failed:\n{0}")]
    ConfigValidationFailed(String),

    #[error("Changelog generation failed: {0}")]
    ChangelogGenerationFailed(String),

    #[error("Command `{command}` failed: {reason}")]
    SubprocessFailed { command: String, reason: String },

    #[error("Registry lookup failed: {0}")]
    RegistryLookup(String),

    #[error("Malformed manifest: {0}")]
    Manifest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in release-cli
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a manifest error with context
    pub fn manifest(msg: impl Into<String>) -> Self {
        ReleaseError::Manifest(msg.into())
    }

    /// Create an invalid-version error with context
    pub fn invalid_version(msg: impl Into<String>) -> Self {
        ReleaseError::InvalidVersion(msg.into())
    }

    /// Create a changelog error with context
    pub fn changelog(msg: impl Into<String>) -> Self {
        ReleaseError::ChangelogGenerationFailed(msg.into())
    }

    /// Create a subprocess error for the given command line
    pub fn subprocess(command: impl Into<String>, reason: impl Into<String>) -> Self {
        ReleaseError::SubprocessFailed {
            command: command.into(),
            reason: reason.into(),
        }
    }
}
