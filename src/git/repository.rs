use std::collections::HashMap;
use std::path::{Path, PathBuf};

use git2::{
    ErrorCode, IndexAddOption, Oid, Repository as Git2Repo, Sort, Status, StatusOptions,
};
use tracing::{debug, info};

use crate::error::{ReleaseError, Result};
use crate::git::CommitInfo;

/// Wrapper around git2::Repository with our trait interface
///
/// Discovery never fails; a directory outside any repository is reported by the
/// first operation, so precondition checks run in their usual order.
pub struct Git2Repository {
    path: PathBuf,
    repo: Option<Git2Repo>,
}

impl Git2Repository {
    /// Discover the repository containing `path`
    pub fn discover<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let repo = match Git2Repo::discover(&path) {
            Ok(repo) => Some(repo),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no git repository found");
                None
            }
        };
        Git2Repository { path, repo }
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        let path = repo
            .workdir()
            .unwrap_or_else(|| repo.path())
            .to_path_buf();
        Git2Repository {
            path,
            repo: Some(repo),
        }
    }

    fn repo(&self) -> Result<&Git2Repo> {
        self.repo
            .as_ref()
            .ok_or_else(|| ReleaseError::NotAGitRepo(self.path.display().to_string()))
    }

    /// HEAD commit, `None` on an unborn branch
    fn head_oid(&self) -> Result<Option<Oid>> {
        match self.repo()?.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?.id())),
            Err(e) if e.code() == ErrorCode::UnbornBranch => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn push_refspec(&self, remote_name: &str, refspec: &str) -> Result<()> {
        let command = format!("git push {} {}", remote_name, refspec);
        let mut remote = self
            .repo()?
            .find_remote(remote_name)
            .map_err(|e| ReleaseError::subprocess(&command, e.message()))?;

        let config = self.repo()?.config()?;
        let mut attempts = 0;

        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(|url, username_from_url, allowed_types| {
            attempts += 1;
            if attempts > MAX_CREDENTIAL_ATTEMPTS {
                return Err(git2::Error::from_str("authentication failed"));
            }
            let username = username_from_url.unwrap_or("git");

            for source in credential_sources(allowed_types) {
                let cred = match source {
                    CredentialSource::SshAgent => git2::Cred::ssh_key_from_agent(username).ok(),
                    CredentialSource::SshKeyFile => ssh_key_file(username),
                    CredentialSource::Helper => {
                        git2::Cred::credential_helper(&config, url, username_from_url).ok()
                    }
                    CredentialSource::Username => git2::Cred::username(username).ok(),
                    CredentialSource::Default => git2::Cred::default().ok(),
                };
                if let Some(cred) = cred {
                    debug!(?source, url, "answering credential request");
                    return Ok(cred);
                }
            }

            Err(git2::Error::from_str(&format!("no credentials available for {}", url)))
        });

        // The remote may reject a single ref while the push itself succeeds
        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => Err(git2::Error::from_str(&format!(
                "remote rejected {}: {}",
                refname, status
            ))),
            None => Ok(()),
        });

        let mut push_options = git2::PushOptions::new();
        push_options.remote_callbacks(callbacks);

        remote
            .push(&[refspec], Some(&mut push_options))
            .map_err(|e| ReleaseError::subprocess(&command, e.message()))?;

        info!(remote = remote_name, refspec, "pushed");
        Ok(())
    }
}

impl super::Repository for Git2Repository {
    fn current_branch(&self) -> Result<String> {
        let repo = self.repo()?;

        match repo.head() {
            Ok(head) if head.is_branch() => head
                .shorthand()
                .map(str::to_string)
                .ok_or_else(|| ReleaseError::NotAGitRepo("branch name is not UTF-8".to_string())),
            Ok(_) => Err(ReleaseError::NotAGitRepo(
                "HEAD is detached, check out a branch first".to_string(),
            )),
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                // A fresh repository: HEAD still names the branch it will create
                let head = repo.find_reference("HEAD")?;
                head.symbolic_target()
                    .and_then(|target| target.strip_prefix("refs/heads/"))
                    .map(str::to_string)
                    .ok_or_else(|| ReleaseError::NotAGitRepo("HEAD names no branch".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn status_short(&self) -> Result<Vec<String>> {
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self.repo()?.statuses(Some(&mut options))?;
        Ok(statuses
            .iter()
            .filter(|entry| entry.status() != Status::CURRENT)
            .filter(|entry| !entry.status().contains(Status::IGNORED))
            .map(|entry| format!("{} {}", short_code(entry.status()), entry.path().unwrap_or("?")))
            .collect())
    }

    fn reachable_tags(&self) -> Result<Vec<String>> {
        let repo = self.repo()?;
        let Some(head) = self.head_oid()? else {
            return Ok(Vec::new());
        };

        let mut by_commit: HashMap<Oid, Vec<String>> = HashMap::new();
        for name in repo.tag_names(None)?.iter().flatten() {
            let target = repo
                .find_reference(&format!("refs/tags/{}", name))
                .and_then(|reference| reference.peel_to_commit());
            if let Ok(commit) = target {
                by_commit.entry(commit.id()).or_default().push(name.to_string());
            }
        }

        let mut revwalk = repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(head)?;

        let mut tags = Vec::new();
        for oid in revwalk {
            if let Some(mut names) = by_commit.remove(&oid?) {
                names.sort_by(|a, b| b.cmp(a));
                tags.extend(names);
            }
        }
        Ok(tags)
    }

    fn commits_since(&self, tag: Option<&str>) -> Result<Vec<CommitInfo>> {
        let repo = self.repo()?;
        let Some(head) = self.head_oid()? else {
            return Ok(Vec::new());
        };

        let mut revwalk = repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;
        revwalk.push(head)?;

        if let Some(tag) = tag {
            let boundary = repo
                .find_reference(&format!("refs/tags/{}", tag))?
                .peel_to_commit()?;
            revwalk.hide(boundary.id())?;
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = repo.find_commit(oid?)?;
            commits.push(CommitInfo {
                hash: commit.id().to_string(),
                message: commit.message().unwrap_or("(empty message)").to_string(),
                author: commit.author().name().unwrap_or("unknown").to_string(),
            });
        }
        Ok(commits)
    }

    fn remote_url(&self, remote: &str) -> Result<Option<String>> {
        match self.repo()?.find_remote(remote) {
            Ok(remote) => Ok(remote.url().map(str::to_string)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn stage_all(&self) -> Result<()> {
        let mut index = self.repo()?.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;
        debug!("all changes staged");
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<String> {
        let repo = self.repo()?;
        let signature = repo.signature()?;

        let mut index = repo.index()?;
        let tree = repo.find_tree(index.write_tree()?)?;

        let parent = match self.head_oid()? {
            Some(oid) => Some(repo.find_commit(oid)?),
            None => None,
        };
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let oid = repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        info!(commit = %oid, message, "committed");
        Ok(oid.to_string())
    }

    fn push_branch(&self, remote: &str, branch: &str) -> Result<()> {
        self.push_refspec(remote, &format!("refs/heads/{0}:refs/heads/{0}", branch))
    }

    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<()> {
        let repo = self.repo()?;
        let head = repo.head()?.peel_to_commit()?;
        let signature = repo.signature()?;
        repo.tag(name, head.as_object(), &signature, message, false)?;
        info!(tag = name, "annotated tag created");
        Ok(())
    }

    fn push_tag(&self, remote: &str, tag: &str) -> Result<()> {
        self.push_refspec(remote, &format!("refs/tags/{0}:refs/tags/{0}", tag))
    }
}

/// libgit2 asks again after rejected credentials; give up after this many requests
const MAX_CREDENTIAL_ATTEMPTS: usize = 5;

/// Where an answer to a credential request can come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CredentialSource {
    SshAgent,
    SshKeyFile,
    /// The credential helper configured for git, as `git push` would use
    Helper,
    Username,
    Default,
}

/// Sources to try, in order, for the credential types a remote accepts
fn credential_sources(allowed: git2::CredentialType) -> Vec<CredentialSource> {
    let mut sources = Vec::new();
    if allowed.contains(git2::CredentialType::USERNAME) {
        sources.push(CredentialSource::Username);
    }
    if allowed.contains(git2::CredentialType::SSH_KEY) {
        sources.push(CredentialSource::SshAgent);
        sources.push(CredentialSource::SshKeyFile);
    }
    if allowed.contains(git2::CredentialType::USER_PASS_PLAINTEXT) {
        sources.push(CredentialSource::Helper);
    }
    if allowed.contains(git2::CredentialType::DEFAULT) {
        sources.push(CredentialSource::Default);
    }
    sources
}

fn ssh_key_file(username: &str) -> Option<git2::Cred> {
    let home = std::env::var("HOME").ok()?;
    ["id_ed25519", "id_rsa", "id_ecdsa"]
        .iter()
        .map(|key| Path::new(&home).join(".ssh").join(key))
        .filter(|path| path.exists())
        .find_map(|path| git2::Cred::ssh_key(username, None, &path, None).ok())
}

/// Two-letter code as printed by `git status --short`
fn short_code(status: Status) -> String {
    if status.contains(Status::CONFLICTED) {
        return "UU".to_string();
    }
    if status.contains(Status::WT_NEW) {
        return "??".to_string();
    }

    let index = if status.contains(Status::INDEX_NEW) {
        'A'
    } else if status.contains(Status::INDEX_MODIFIED) {
        'M'
    } else if status.contains(Status::INDEX_DELETED) {
        'D'
    } else if status.contains(Status::INDEX_RENAMED) {
        'R'
    } else if status.contains(Status::INDEX_TYPECHANGE) {
        'T'
    } else {
        ' '
    };

    let worktree = if status.contains(Status::WT_MODIFIED) {
        'M'
    } else if status.contains(Status::WT_DELETED) {
        'D'
    } else if status.contains(Status::WT_RENAMED) {
        'R'
    } else if status.contains(Status::WT_TYPECHANGE) {
        'T'
    } else {
        ' '
    };

    format!("{}{}", index, worktree)
}
