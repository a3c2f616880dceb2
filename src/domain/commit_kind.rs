//! Conventional commit kinds and their changelog section labels.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Commit kinds with a built-in changelog section.
///
/// The declaration order is the order sections appear in the changelog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommitKind {
    Feat,
    Fix,
    Perf,
    Refactor,
    Test,
    Build,
    Ci,
    Revert,
    Docs,
    Style,
    Ui,
    Chore,
    Security,
    Types,
    I18n,
    Accessibility,
    Deps,
}

impl CommitKind {
    /// All kinds, in section priority order.
    pub const ALL: [CommitKind; 17] = [
        CommitKind::Feat,
        CommitKind::Fix,
        CommitKind::Perf,
        CommitKind::Refactor,
        CommitKind::Test,
        CommitKind::Build,
        CommitKind::Ci,
        CommitKind::Revert,
        CommitKind::Docs,
        CommitKind::Style,
        CommitKind::Ui,
        CommitKind::Chore,
        CommitKind::Security,
        CommitKind::Types,
        CommitKind::I18n,
        CommitKind::Accessibility,
        CommitKind::Deps,
    ];

    /// The raw conventional-commit type string
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitKind::Feat => "feat",
            CommitKind::Fix => "fix",
            CommitKind::Perf => "perf",
            CommitKind::Refactor => "refactor",
            CommitKind::Test => "test",
            CommitKind::Build => "build",
            CommitKind::Ci => "ci",
            CommitKind::Revert => "revert",
            CommitKind::Docs => "docs",
            CommitKind::Style => "style",
            CommitKind::Ui => "ui",
            CommitKind::Chore => "chore",
            CommitKind::Security => "security",
            CommitKind::Types => "types",
            CommitKind::I18n => "i18n",
            CommitKind::Accessibility => "accessibility",
            CommitKind::Deps => "deps",
        }
    }

    /// Built-in section label
    pub fn default_label(&self) -> &'static str {
        match self {
            CommitKind::Feat => "✨ Features",
            CommitKind::Fix => "🐛 Bug Fixes",
            CommitKind::Perf => "⚡ Performance Improvements",
            CommitKind::Refactor => "♻️ Code Refactoring",
            CommitKind::Test => "✅ Tests",
            CommitKind::Build => "📦 Build System",
            CommitKind::Ci => "👷 Continuous Integration",
            CommitKind::Revert => "⏪ Reverts",
            CommitKind::Docs => "📝 Documentation",
            CommitKind::Style => "🎨 Code Styles",
            CommitKind::Ui => "💄 UI",
            CommitKind::Chore => "🔧 Chores",
            CommitKind::Security => "🔒 Security",
            CommitKind::Types => "🏷️ Types",
            CommitKind::I18n => "🌐 Internationalization",
            CommitKind::Accessibility => "♿️ Accessibility",
            CommitKind::Deps => "⬆️ Dependencies",
        }
    }

    /// Position in the section priority table
    pub fn priority(&self) -> usize {
        *self as usize
    }
}

impl FromStr for CommitKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        CommitKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown commit kind '{}'", s))
    }
}

impl fmt::Display for CommitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A commit type as it appears in a commit header: a known kind or anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitType {
    Known(CommitKind),
    Other(String),
}

impl CommitType {
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<CommitKind>() {
            Ok(kind) => CommitType::Known(kind),
            Err(_) => CommitType::Other(raw.to_string()),
        }
    }
}

/// Maps commit types to changelog section labels.
///
/// Built-in labels can be overridden, and labels for custom types added, through
/// `commitTypeDisplayName`. Lookup is total: unmapped types get their raw name
/// with the first letter capitalized, and a value that already is a label maps to
/// itself, so relabeling twice yields the same title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitLabels {
    overrides: BTreeMap<String, String>,
}

impl CommitLabels {
    pub fn new(overrides: BTreeMap<String, String>) -> Self {
        CommitLabels { overrides }
    }

    /// Label for a known kind, honoring overrides
    pub fn kind_label(&self, kind: CommitKind) -> String {
        self.overrides
            .get(kind.as_str())
            .cloned()
            .unwrap_or_else(|| kind.default_label().to_string())
    }

    /// Relabel a raw commit type
    pub fn label(&self, raw: &str) -> String {
        match CommitType::parse(raw) {
            CommitType::Known(kind) => self.kind_label(kind),
            CommitType::Other(other) => {
                if let Some(label) = self.overrides.get(&other) {
                    label.clone()
                } else if self.is_label(&other) {
                    other
                } else {
                    capitalize(&other)
                }
            }
        }
    }

    /// Priority of a section title, `None` for titles outside the table
    pub fn priority_of(&self, title: &str) -> Option<usize> {
        CommitKind::ALL
            .iter()
            .find(|kind| self.kind_label(**kind) == title)
            .map(CommitKind::priority)
    }

    fn is_label(&self, value: &str) -> bool {
        self.overrides.values().any(|label| label == value)
            || CommitKind::ALL
                .iter()
                .any(|kind| self.kind_label(*kind) == value)
    }
}

fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels_with(pairs: &[(&str, &str)]) -> CommitLabels {
        CommitLabels::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_known_kind_uses_default_label() {
        let labels = CommitLabels::default();
        assert_eq!(labels.label("feat"), "✨ Features");
        assert_eq!(labels.label("deps"), "⬆️ Dependencies");
    }

    #[test]
    fn test_override_replaces_default_label() {
        let labels = labels_with(&[("feat", "New Stuff")]);
        assert_eq!(labels.label("feat"), "New Stuff");
        assert_eq!(labels.priority_of("New Stuff"), Some(0));
        assert_eq!(labels.priority_of("✨ Features"), None);
    }

    #[test]
    fn test_unknown_type_is_capitalized() {
        let labels = CommitLabels::default();
        assert_eq!(labels.label("wip"), "Wip");
        assert_eq!(labels.priority_of("Wip"), None);
    }

    #[test]
    fn test_custom_type_label() {
        let labels = labels_with(&[("wip", "🚧 Work In Progress")]);
        assert_eq!(labels.label("wip"), "🚧 Work In Progress");
    }

    #[test]
    fn test_relabel_is_idempotent() {
        let labels = labels_with(&[("feat", "features"), ("wip", "in progress")]);
        for raw in ["feat", "fix", "wip", "custom", "revert"] {
            let once = labels.label(raw);
            assert_eq!(labels.label(&once), once, "relabeling '{}' twice", raw);
        }
    }

    #[test]
    fn test_priority_follows_declaration_order() {
        let labels = CommitLabels::default();
        let feat = labels.priority_of("✨ Features").unwrap();
        let fix = labels.priority_of("🐛 Bug Fixes").unwrap();
        let chore = labels.priority_of("🔧 Chores").unwrap();
        assert!(feat < fix && fix < chore);
    }

    #[test]
    fn test_commit_kind_round_trip() {
        for kind in CommitKind::ALL {
            assert_eq!(kind.as_str().parse::<CommitKind>().unwrap(), kind);
        }
        assert!("feature".parse::<CommitKind>().is_err());
    }
}
