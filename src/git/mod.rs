//! Git operations abstraction layer
//!
//! The release workflow talks to git only through the [Repository] trait, so the
//! orchestration can run against a recording mock in tests.
//!
//! - [repository::Git2Repository]: the real implementation using the `git2` crate
//! - [mock::MockRepository]: records every side effect instead of performing it
//!
//! ```rust,no_run
//! # use release_cli::git::{Git2Repository, Repository};
//! # fn example() -> release_cli::Result<()> {
//! let repo = Git2Repository::discover(".");
//! let branch = repo.current_branch()?;
//! let commits = repo.commits_since(Some("v1.0.0"))?;
//! println!("{} commits on {} since v1.0.0", commits.len(), branch);
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;

/// Remote every push goes to
pub const DEFAULT_REMOTE: &str = "origin";

/// Commit information for changelog generation
#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    /// Full commit hash
    pub hash: String,
    /// The complete commit message
    pub message: String,
    /// The commit author
    pub author: String,
}

impl CommitInfo {
    pub fn new(hash: impl Into<String>, message: impl Into<String>) -> Self {
        CommitInfo {
            hash: hash.into(),
            message: message.into(),
            author: String::new(),
        }
    }
}

/// Git operations used by the release workflow
///
/// All methods return [crate::error::Result]. Implementations report a missing
/// repository as [crate::error::ReleaseError::NotAGitRepo] and a failed push as
/// [crate::error::ReleaseError::SubprocessFailed].
pub trait Repository {
    /// Name of the checked-out branch
    ///
    /// Fails with `NotAGitRepo` outside a repository or on a detached HEAD.
    fn current_branch(&self) -> Result<String>;

    /// Uncommitted changes in short status form (`XY path`), untracked files included.
    /// Empty for a clean working tree.
    fn status_short(&self) -> Result<Vec<String>>;

    /// Tags pointing at commits reachable from HEAD, nearest first
    fn reachable_tags(&self) -> Result<Vec<String>>;

    /// Commits reachable from HEAD but not from `tag`, oldest first.
    /// All reachable commits when `tag` is `None`.
    fn commits_since(&self, tag: Option<&str>) -> Result<Vec<CommitInfo>>;

    /// Configured URL of a remote, `None` when the remote does not exist
    fn remote_url(&self, remote: &str) -> Result<Option<String>>;

    /// Stage every change, including deletions and untracked files
    fn stage_all(&self) -> Result<()>;

    /// Commit the index on top of HEAD, returning the new commit hash
    fn commit(&self, message: &str) -> Result<String>;

    /// Push a local branch to the same-named branch on `remote`
    fn push_branch(&self, remote: &str, branch: &str) -> Result<()>;

    /// Create an annotated tag on HEAD
    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<()>;

    /// Push a tag to `remote`
    fn push_tag(&self, remote: &str, tag: &str) -> Result<()>;
}
