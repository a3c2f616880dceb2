use std::fs;

use git2::Repository as Git2Repo;
use release_cli::changelog::{self, normalize_repo_url, ChangelogContext};
use release_cli::config::ChangelogMode;
use release_cli::domain::{CommitLabels, TagFormat};
use release_cli::git::{CommitInfo, Git2Repository, Repository};
use semver::Version;
use std::collections::BTreeMap;
use tempfile::TempDir;

fn init_repo() -> (TempDir, Git2Repository) {
    let temp = TempDir::new().unwrap();
    let repo = Git2Repo::init(temp.path()).unwrap();
    {
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
    }
    (temp, Git2Repository::from_git2(repo))
}

fn commit(temp: &TempDir, repo: &Git2Repository, file: &str, message: &str) -> String {
    fs::write(temp.path().join(file), message).unwrap();
    repo.stage_all().unwrap();
    repo.commit(message).unwrap()
}

fn position(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("'{}' not found in:\n{}", needle, haystack))
}

#[test]
fn test_generate_from_repository_history() {
    let (temp, repo) = init_repo();
    commit(&temp, &repo, "a.txt", "feat: first feature");
    repo.create_annotated_tag("v1.0.0", "chore: v1.0.0 changelog [ci skip]")
        .unwrap();

    commit(&temp, &repo, "b.txt", "fix(parser): crash on empty input #42\n\nCloses #42");
    commit(&temp, &repo, "c.txt", "feat(api): add search thanks @alice");
    commit(&temp, &repo, "d.txt", "chore: bump deps");
    commit(&temp, &repo, "e.txt", "wip: experimenting");
    commit(&temp, &repo, "f.txt", "Merge branch 'topic'");

    let notes = changelog::generate(
        &repo,
        &Version::new(1, 1, 0),
        &TagFormat::default(),
        &CommitLabels::default(),
        normalize_repo_url("git+https://github.com/acme/widget.git"),
    )
    .unwrap();

    assert_eq!(notes.previous_tag.as_deref(), Some("v1.0.0"));
    assert_eq!(notes.included, 4);

    let entry = &notes.entry;
    assert!(entry.starts_with(
        "## [v1.1.0](https://github.com/acme/widget/compare/v1.0.0...v1.1.0) ("
    ));
    assert!(!entry.contains("first feature"));
    assert!(!entry.contains("Merge branch"));

    let features = position(entry, "### ✨ Features");
    let fixes = position(entry, "### 🐛 Bug Fixes");
    let chores = position(entry, "### 🔧 Chores");
    let custom = position(entry, "### Wip");
    assert!(features < fixes && fixes < chores && chores < custom);

    assert!(entry.contains(
        "* **parser:** crash on empty input [#42](https://github.com/acme/widget/issues/42) ("
    ));
    assert!(!entry.contains(", closes"));
    assert!(entry.contains("thanks [@alice](https://github.com/alice)"));
}

#[test]
fn test_generate_without_tags_uses_all_commits() {
    let (temp, repo) = init_repo();
    commit(&temp, &repo, "a.txt", "feat: first feature");
    commit(&temp, &repo, "b.txt", "docs: readme");

    let notes = changelog::generate(
        &repo,
        &Version::new(0, 1, 0),
        &TagFormat::default(),
        &CommitLabels::default(),
        None,
    )
    .unwrap();

    assert_eq!(notes.previous_tag, None);
    assert_eq!(notes.included, 2);
    assert!(notes.entry.starts_with("## v0.1.0 ("));
    assert!(notes.entry.contains("* first feature ("));
    assert!(notes.entry.contains("### 📝 Documentation"));
}

#[test]
fn test_tags_of_other_formats_are_skipped() {
    let (temp, repo) = init_repo();
    commit(&temp, &repo, "a.txt", "feat: old");
    repo.create_annotated_tag("v1.0.0-stable", "release").unwrap();
    commit(&temp, &repo, "b.txt", "fix: newer");
    repo.create_annotated_tag("nightly", "not a release").unwrap();
    commit(&temp, &repo, "c.txt", "fix: newest");

    let range = changelog::release_range(&repo, &TagFormat::new("v", "-stable")).unwrap();

    assert_eq!(range.previous_tag.as_deref(), Some("v1.0.0-stable"));
    let messages: Vec<&str> = range.commits.iter().map(|c| c.message.trim()).collect();
    assert_eq!(messages, vec!["fix: newer", "fix: newest"]);
}

#[test]
fn test_custom_labels_and_order() {
    let mut overrides = BTreeMap::new();
    overrides.insert("feat".to_string(), "New Stuff".to_string());
    overrides.insert("infra".to_string(), "Infrastructure".to_string());
    let labels = CommitLabels::new(overrides);

    let commits = vec![
        CommitInfo::new("1111111111", "infra: move to new cluster"),
        CommitInfo::new("2222222222", "fix(b): second"),
        CommitInfo::new("3333333333", "fix(a): first"),
        CommitInfo::new("4444444444", "feat: shiny"),
    ];
    let context = ChangelogContext::new(Version::new(1, 0, 0), "v1.0.0", None, None)
        .with_date("2026-01-01");

    let (entry, included) = changelog::render_release(&commits, &labels, &context);

    assert_eq!(included, 4);
    assert_eq!(
        entry,
        "## v1.0.0 (2026-01-01)\n\
         \n### New Stuff\n\n\
         * shiny (4444444)\n\
         \n### 🐛 Bug Fixes\n\n\
         * **a:** first (3333333)\n\
         * **b:** second (2222222)\n\
         \n### Infrastructure\n\n\
         * move to new cluster (1111111)\n"
    );
}

#[test]
fn test_write_changelog_modes() {
    let temp = TempDir::new().unwrap();
    let path = changelog::changelog_path(temp.path());

    changelog::write_changelog(&path, "## v1.0.0\n", ChangelogMode::Overwrite).unwrap();
    changelog::write_changelog(&path, "## v1.1.0\n", ChangelogMode::Prepend).unwrap();
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "## v1.1.0\n\n## v1.0.0\n"
    );

    changelog::write_changelog(&path, "## v2.0.0\n", ChangelogMode::Overwrite).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "## v2.0.0\n");

    let leftovers: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(leftovers.len(), 1);
}
