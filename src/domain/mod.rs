//! Domain logic - pure rules independent of git, files and prompts

pub mod branch;
pub mod commit_kind;
pub mod prerelease;
pub mod tag;

pub use branch::{BranchContext, BranchRule};
pub use commit_kind::{CommitKind, CommitLabels, CommitType};
pub use prerelease::PreReleaseType;
pub use tag::TagFormat;
