use std::cell::RefCell;

use crate::error::{ReleaseError, Result};
use crate::git::{CommitInfo, Repository};

/// Mock repository that records side effects instead of performing them
///
/// Recorded calls read like the git commands they stand for, e.g.
/// `commit chore: v1.0.1 changelog [ci skip]` or `push origin develop`.
pub struct MockRepository {
    branch: Option<String>,
    status: Vec<String>,
    tags: Vec<String>,
    commits: Vec<CommitInfo>,
    remote_url: Option<String>,
    fail_push: bool,
    calls: RefCell<Vec<String>>,
}

impl MockRepository {
    /// A clean repository with `branch` checked out and no history
    pub fn on_branch(branch: impl Into<String>) -> Self {
        MockRepository {
            branch: Some(branch.into()),
            status: Vec::new(),
            tags: Vec::new(),
            commits: Vec::new(),
            remote_url: None,
            fail_push: false,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// A directory that is not a repository
    pub fn not_a_repo() -> Self {
        MockRepository {
            branch: None,
            ..Self::on_branch("")
        }
    }

    /// Report uncommitted changes
    pub fn with_status(mut self, lines: &[&str]) -> Self {
        self.status = lines.iter().map(|l| l.to_string()).collect();
        self
    }

    /// Reachable tags, nearest first
    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Add a commit after the most recent tag
    pub fn with_commit(mut self, hash: &str, message: &str) -> Self {
        self.commits.push(CommitInfo::new(hash, message));
        self
    }

    pub fn with_remote_url(mut self, url: &str) -> Self {
        self.remote_url = Some(url.to_string());
        self
    }

    /// Make every push fail
    pub fn failing_push(mut self) -> Self {
        self.fail_push = true;
        self
    }

    /// Every recorded call, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Messages of the commits created
    pub fn commits_made(&self) -> Vec<String> {
        self.recorded("commit ")
    }

    /// Names of the tags created
    pub fn tags_created(&self) -> Vec<String> {
        self.recorded("tag ")
            .into_iter()
            .map(|entry| entry.split(' ').next().unwrap_or_default().to_string())
            .collect()
    }

    /// Whether any write to the repository was recorded
    pub fn has_side_effects(&self) -> bool {
        self.calls
            .borrow()
            .iter()
            .any(|call| !call.starts_with("commits_since"))
    }

    fn recorded(&self, prefix: &str) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| call.strip_prefix(prefix).map(str::to_string))
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn branch(&self) -> Result<&str> {
        self.branch
            .as_deref()
            .ok_or_else(|| ReleaseError::NotAGitRepo("mock repository".to_string()))
    }

    fn push(&self, command: String) -> Result<()> {
        if self.fail_push {
            return Err(ReleaseError::subprocess(command, "remote rejected the push"));
        }
        self.record(command.replacen("git ", "", 1));
        Ok(())
    }
}

impl Repository for MockRepository {
    fn current_branch(&self) -> Result<String> {
        self.branch().map(str::to_string)
    }

    fn status_short(&self) -> Result<Vec<String>> {
        self.branch()?;
        Ok(self.status.clone())
    }

    fn reachable_tags(&self) -> Result<Vec<String>> {
        Ok(self.tags.clone())
    }

    fn commits_since(&self, tag: Option<&str>) -> Result<Vec<CommitInfo>> {
        self.record(format!("commits_since {}", tag.unwrap_or("<root>")));
        Ok(self.commits.clone())
    }

    fn remote_url(&self, _remote: &str) -> Result<Option<String>> {
        Ok(self.remote_url.clone())
    }

    fn stage_all(&self) -> Result<()> {
        self.record("stage_all".to_string());
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<String> {
        self.record(format!("commit {}", message));
        Ok(format!("{:040}", self.commits_made().len()))
    }

    fn push_branch(&self, remote: &str, branch: &str) -> Result<()> {
        self.push(format!("git push {} {}", remote, branch))
    }

    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<()> {
        self.record(format!("tag {} {}", name, message));
        Ok(())
    }

    fn push_tag(&self, remote: &str, tag: &str) -> Result<()> {
        self.push(format!("git push {} {}", remote, tag))
    }
}
