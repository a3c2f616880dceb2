//! Pure formatting functions for UI output.
//!
//! Display logic lives here, apart from user interaction. Functions either
//! print a single styled line or build strings that callers print.

use console::style;

use crate::boundary::BoundaryWarning;
use crate::cli::orchestration::ReleaseSummary;
use crate::version::{BumpKind, ReleaseType, VersionPlan};

/// Error line, `ERROR:` in bold red.
pub fn format_error(message: &str) -> String {
    format!("{} {}", style("ERROR:").red().bold(), message)
}

/// Success line with a green checkmark.
pub fn format_success(message: &str) -> String {
    format!("{} {}", style("✓").green(), message)
}

/// Status line with a yellow arrow.
pub fn format_status(message: &str) -> String {
    format!("{} {}", style("→").yellow(), message)
}

pub fn format_boundary_warning(warning: &BoundaryWarning) -> String {
    format!("{} {}", style("⚠ WARNING:").yellow(), warning)
}

/// The three lines announcing the version change
pub fn format_version_change(current: &str, next: &str) -> String {
    format!(
        "\n{}\n  From: {}\n  To:   {}",
        style("Version Change:").bold(),
        style(current).red(),
        style(next).green()
    )
}

pub fn display_error(message: &str) {
    eprintln!("{}", format_error(message));
}

pub fn display_success(message: &str) {
    println!("{}", format_success(message));
}

pub fn display_status(message: &str) {
    println!("{}", format_status(message));
}

/// Display a boundary warning to the user.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{}", format_boundary_warning(warning));
}

/// Display the version change about to be released.
pub fn display_version_change(current: &str, next: &str) {
    println!("{}", format_version_change(current, next));
}

/// Display what a finished release did.
pub fn display_release_summary(summary: &ReleaseSummary) {
    display_success(&format!(
        "Released {} from branch '{}'",
        summary.version, summary.branch
    ));
    if let Some(tag) = &summary.tag {
        display_success(&format!("Tag {} pushed", tag));
    }
    if summary.built {
        display_success("Build finished");
    }
}

/// Choices of the release-type prompt, in display order
pub fn release_type_items(plan: &VersionPlan) -> Vec<(ReleaseType, String)> {
    let mut items: Vec<(ReleaseType, String)> = BumpKind::ALL
        .iter()
        .map(|kind| {
            let label = match (kind, plan.candidates.get(kind)) {
                (BumpKind::Prerelease, _) | (_, None) => kind.intro().to_string(),
                (_, Some(candidate)) => format!("{} ({})", kind.intro(), candidate),
            };
            (ReleaseType::Bump(*kind), label)
        })
        .collect();
    items.push((ReleaseType::Custom, "Custom version".to_string()));
    items
}
