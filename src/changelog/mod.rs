//! Changelog generation: commits since the last release are parsed, relabeled,
//! link-rewritten, grouped, ordered and rendered into one release entry.
//!
//! Every stage is a pure function over immutable records, so each can be tested
//! without a repository. [`generate`] wires them to a [`Repository`] and
//! [`write_changelog`] puts the result on disk.

pub mod link;
pub mod render;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use semver::Version;
use tracing::{debug, info, instrument};

use crate::config::ChangelogMode;
use crate::conventional::{self, Note, ParsedCommit, Reference};
use crate::domain::{CommitKind, CommitLabels, TagFormat};
use crate::error::{ReleaseError, Result};
use crate::git::{CommitInfo, Repository};

pub use link::{normalize_repo_url, RepoUrl};
pub use render::render_entry;

/// File name of the changelog, next to the manifest
pub const CHANGELOG_FILE: &str = "CHANGELOG.md";

/// Banner every breaking-change note is filed under
pub const BREAKING_CHANGES_TITLE: &str = "BREAKING CHANGES";

const SHORT_HASH_LEN: usize = 7;

static ISSUE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\d+)").expect("Invalid regex"));

static MENTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\B@([\da-z](?:-?[\da-z]){0,38})").expect("Invalid regex"));

/// A commit ready to be rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub hash: String,
    pub short_hash: String,
    /// Section label the commit is grouped under
    pub title: String,
    /// Empty when the commit had no scope or the wildcard scope
    pub scope: String,
    /// Subject with issue and mention links, or the header when there is no subject
    pub subject: String,
    pub notes: Vec<Note>,
    /// References not already linked in the subject
    pub references: Vec<Reference>,
}

/// Commits sharing a section label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitGroup {
    pub title: String,
    pub commits: Vec<Commit>,
}

/// A breaking-change note with the scope of the commit that carried it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakingNote {
    pub scope: String,
    pub text: String,
}

/// Everything the renderer needs besides the commits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogContext {
    pub version: Version,
    /// Tag name the release will carry
    pub tag: String,
    /// Tag of the previous release, when there is one
    pub previous_tag: Option<String>,
    pub repo: Option<RepoUrl>,
    /// Release date as `YYYY-MM-DD`
    pub date: String,
}

impl ChangelogContext {
    /// Context dated today
    pub fn new(
        version: Version,
        tag: impl Into<String>,
        previous_tag: Option<String>,
        repo: Option<RepoUrl>,
    ) -> Self {
        ChangelogContext {
            version,
            tag: tag.into(),
            previous_tag,
            repo,
            date: chrono::Local::now().format("%Y-%m-%d").to_string(),
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }
}

/// Commits that belong to the next release
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseRange {
    /// Nearest reachable release tag
    pub previous_tag: Option<String>,
    /// Commits after that tag, oldest first
    pub commits: Vec<CommitInfo>,
}

/// A rendered release entry
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseNotes {
    pub entry: String,
    pub previous_tag: Option<String>,
    /// Commits that made it into a section
    pub included: usize,
}

/// Relabel and link-rewrite one parsed commit.
///
/// Returns `None` for commits without a type (merges, free-form messages),
/// which do not appear in the changelog.
pub fn transform(
    parsed: &ParsedCommit,
    labels: &CommitLabels,
    repo: Option<&RepoUrl>,
) -> Option<Commit> {
    let notes: Vec<Note> = parsed
        .notes
        .iter()
        .map(|note| Note {
            title: BREAKING_CHANGES_TITLE.to_string(),
            text: note.text.clone(),
        })
        .collect();

    let raw_type = if parsed.revert.is_some() {
        Some(labels.kind_label(CommitKind::Revert))
    } else {
        parsed.r#type.clone()
    };
    let title = labels.label(&raw_type?);

    let scope = match parsed.scope.as_deref() {
        Some("*") | None => String::new(),
        Some(scope) => scope.to_string(),
    };

    let short_hash: String = parsed.hash.chars().take(SHORT_HASH_LEN).collect();

    let mut subject = parsed
        .subject
        .clone()
        .unwrap_or_else(|| parsed.header.clone());
    let mut linked_issues = Vec::new();

    if let Some(repo) = repo {
        subject = ISSUE_REGEX
            .replace_all(&subject, |caps: &Captures| {
                let issue = &caps[1];
                linked_issues.push(issue.to_string());
                format!("[#{}]({})", issue, repo.issue(issue))
            })
            .into_owned();

        subject = MENTION_REGEX
            .replace_all(&subject, |caps: &Captures| {
                let rest = &subject[caps.get(0).map_or(subject.len(), |m| m.end())..];
                link_mention(&caps[0], &caps[1], rest, repo)
            })
            .into_owned();
    }

    let references = parsed
        .references
        .iter()
        .filter(|reference| !linked_issues.contains(&reference.issue))
        .cloned()
        .collect();

    Some(Commit {
        hash: parsed.hash.clone(),
        short_hash,
        title,
        scope,
        subject,
        notes,
        references,
    })
}

/// `@name` becomes a profile link only when the whole handle is a valid
/// GitHub login. Handles that run on into `_`, upper case, a longer name
/// or a dotted name (a package or a file) stay as written.
fn link_mention(matched: &str, name: &str, rest: &str, repo: &RepoUrl) -> String {
    let mut following = rest.chars();
    let continues = match following.next() {
        Some(c) if c.is_alphanumeric() || c == '_' || c == '-' => true,
        Some('.') => following
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    };
    if continues {
        return matched.to_string();
    }
    format!("[@{}]({})", name, repo.user(name))
}

/// Group commits by section label and put groups and commits in release order.
///
/// Groups follow the kind priority table. Labels outside the table come last,
/// ordered alphabetically. Commits inside a group are ordered by scope, then
/// subject.
pub fn group_commits(commits: Vec<Commit>, labels: &CommitLabels) -> Vec<CommitGroup> {
    let mut by_title: BTreeMap<String, Vec<Commit>> = BTreeMap::new();
    for commit in commits {
        by_title.entry(commit.title.clone()).or_default().push(commit);
    }

    let mut groups: Vec<CommitGroup> = by_title
        .into_iter()
        .map(|(title, mut commits)| {
            commits.sort_by(|a, b| (&a.scope, &a.subject).cmp(&(&b.scope, &b.subject)));
            CommitGroup { title, commits }
        })
        .collect();

    groups.sort_by(|a, b| compare_titles(&a.title, &b.title, labels));
    groups
}

fn compare_titles(a: &str, b: &str, labels: &CommitLabels) -> Ordering {
    match (labels.priority_of(a), labels.priority_of(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Breaking-change notes across all groups, in group order
pub fn collect_notes(groups: &[CommitGroup]) -> Vec<BreakingNote> {
    groups
        .iter()
        .flat_map(|group| &group.commits)
        .flat_map(|commit| {
            commit.notes.iter().map(move |note| BreakingNote {
                scope: commit.scope.clone(),
                text: note.text.clone(),
            })
        })
        .collect()
}

/// Parse, transform, group and render a list of raw commits
pub fn render_release(
    commits: &[CommitInfo],
    labels: &CommitLabels,
    context: &ChangelogContext,
) -> (String, usize) {
    let transformed: Vec<Commit> = commits
        .iter()
        .map(|info| conventional::parse_commit(&info.hash, &info.message))
        .filter_map(|parsed| transform(&parsed, labels, context.repo.as_ref()))
        .collect();
    let included = transformed.len();

    let groups = group_commits(transformed, labels);
    let notes = collect_notes(&groups);
    (render_entry(context, &groups, &notes), included)
}

/// Commits since the nearest reachable release tag
pub fn release_range<R: Repository + ?Sized>(
    repo: &R,
    tag_format: &TagFormat,
) -> Result<ReleaseRange> {
    let previous_tag = repo
        .reachable_tags()?
        .into_iter()
        .find(|tag| tag_format.matches(tag));
    let commits = repo.commits_since(previous_tag.as_deref())?;
    debug!(
        previous_tag = previous_tag.as_deref().unwrap_or("<none>"),
        commits = commits.len(),
        "release range resolved"
    );
    Ok(ReleaseRange {
        previous_tag,
        commits,
    })
}

/// Build the release entry for `version` from the repository history
#[instrument(skip_all, fields(version = %version))]
pub fn generate<R: Repository + ?Sized>(
    repo: &R,
    version: &Version,
    tag_format: &TagFormat,
    labels: &CommitLabels,
    repo_url: Option<RepoUrl>,
) -> Result<ReleaseNotes> {
    let range = release_range(repo, tag_format)
        .map_err(|e| ReleaseError::changelog(format!("cannot read commit history: {}", e)))?;

    let context = ChangelogContext::new(
        version.clone(),
        tag_format.format(version),
        range.previous_tag.clone(),
        repo_url,
    );
    let (entry, included) = render_release(&range.commits, labels, &context);

    Ok(ReleaseNotes {
        entry,
        previous_tag: range.previous_tag,
        included,
    })
}

/// Changelog location inside a project directory
pub fn changelog_path(dir: &Path) -> PathBuf {
    dir.join(CHANGELOG_FILE)
}

/// Combine a new entry with the current file content according to `mode`
pub fn merge_entry(entry: &str, existing: Option<&str>, mode: ChangelogMode) -> String {
    let existing = existing.map(str::trim).filter(|s| !s.is_empty());
    match (mode, existing) {
        (ChangelogMode::Overwrite, _) | (_, None) => entry.to_string(),
        (ChangelogMode::Prepend, Some(old)) => format!("{}\n{}\n", entry, old),
        (ChangelogMode::Append, Some(old)) => format!("{}\n\n{}", old, entry),
    }
}

/// Write the changelog through a temporary file so a failed write leaves the
/// previous file untouched.
pub fn write_changelog(path: &Path, entry: &str, mode: ChangelogMode) -> Result<()> {
    let write_err =
        |e: std::io::Error| ReleaseError::changelog(format!("cannot write {}: {}", path.display(), e));

    let existing = match mode {
        ChangelogMode::Overwrite => None,
        _ if path.exists() => Some(fs::read_to_string(path).map_err(write_err)?),
        _ => None,
    };
    let content = merge_entry(entry, existing.as_deref(), mode);

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| CHANGELOG_FILE.to_string());
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    fs::write(&tmp, content).map_err(write_err)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(e));
    }

    info!(path = %path.display(), ?mode, "changelog written");
    Ok(())
}
