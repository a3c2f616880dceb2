//! Markdown rendering of a release entry.

use tracing::{debug, instrument};

use super::{BreakingNote, ChangelogContext, Commit, CommitGroup, BREAKING_CHANGES_TITLE};

/// Render one release entry: header, one section per group, then breaking changes
#[instrument(skip_all, fields(version = %context.version, groups = groups.len()))]
pub fn render_entry(
    context: &ChangelogContext,
    groups: &[CommitGroup],
    notes: &[BreakingNote],
) -> String {
    let mut output = String::new();

    let title = format!("v{}", context.version);
    match (&context.repo, &context.previous_tag) {
        (Some(repo), Some(previous)) => output.push_str(&format!(
            "## [{}]({}) ({})\n",
            title,
            repo.compare(previous, &context.tag),
            context.date
        )),
        _ => output.push_str(&format!("## {} ({})\n", title, context.date)),
    }

    for group in groups {
        output.push_str(&format!("\n### {}\n\n", group.title));
        for commit in &group.commits {
            output.push_str(&render_commit(commit, context));
            output.push('\n');
        }
    }

    if !notes.is_empty() {
        output.push_str(&format!("\n### {}\n\n", BREAKING_CHANGES_TITLE));
        for note in notes {
            output.push_str("* ");
            if !note.scope.is_empty() {
                output.push_str(&format!("**{}:** ", note.scope));
            }
            output.push_str(&note.text);
            output.push('\n');
        }
    }

    debug!(output_len = output.len(), "release entry rendered");
    output
}

fn render_commit(commit: &Commit, context: &ChangelogContext) -> String {
    let mut line = String::from("* ");

    if !commit.scope.is_empty() {
        line.push_str(&format!("**{}:** ", commit.scope));
    }
    line.push_str(&commit.subject);

    match &context.repo {
        Some(repo) => line.push_str(&format!(
            " ([{}]({}))",
            commit.short_hash,
            repo.commit(&commit.hash)
        )),
        None => line.push_str(&format!(" ({})", commit.short_hash)),
    }

    if !commit.references.is_empty() {
        line.push_str(", closes");
        for reference in &commit.references {
            match &context.repo {
                Some(repo) => line.push_str(&format!(
                    " [#{}]({})",
                    reference.issue,
                    repo.issue(&reference.issue)
                )),
                None => line.push_str(&format!(" #{}", reference.issue)),
            }
        }
    }

    line
}
