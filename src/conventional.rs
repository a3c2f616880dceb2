//! Conventional commit parsing with the angular conventions.
//!
//! Parsing never fails: a message that does not follow the conventions yields a
//! [`ParsedCommit`] without a type, which the changelog later leaves out.

use std::sync::LazyLock;

use regex::Regex;

/// `type(scope)!: subject`
static HEADER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w*)(?:\((.*)\))?(!?): (.*)$").expect("Invalid regex"));

/// `Revert "<header>"` followed by `This reverts commit <hash>.`
static REVERT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^(?:Revert|revert:)\s"?([\s\S]+?)"?\s*This reverts commit (\w*)\."#)
        .expect("Invalid regex")
});

static NOTE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(BREAKING CHANGE|BREAKING-CHANGE):\s*([\s\S]*)$").expect("Invalid regex")
});

static REFERENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\b(close[sd]?|fix(?:e[sd])?|resolve[sd]?)\s+)?#(\d+)")
        .expect("Invalid regex")
});

/// Title given to every breaking-change note
pub const BREAKING_CHANGE_TITLE: &str = "BREAKING CHANGE";

/// A breaking-change note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub title: String,
    pub text: String,
}

/// An issue reference such as `closes #12`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// The closing keyword, if one preceded the issue number
    pub action: Option<String>,
    pub issue: String,
}

/// What a revert commit reverts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revert {
    pub header: String,
    pub hash: String,
}

/// A commit message split into its conventional parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommit {
    pub hash: String,
    pub header: String,
    pub r#type: Option<String>,
    pub scope: Option<String>,
    pub subject: Option<String>,
    pub notes: Vec<Note>,
    pub references: Vec<Reference>,
    pub revert: Option<Revert>,
}

/// Parse a raw commit message
pub fn parse_commit(hash: &str, message: &str) -> ParsedCommit {
    let message = message.trim();
    let mut lines = message.lines();
    let header = lines.next().unwrap_or_default().trim().to_string();
    let body: Vec<&str> = lines.collect();

    let mut commit = ParsedCommit {
        hash: hash.to_string(),
        header: header.clone(),
        r#type: None,
        scope: None,
        subject: None,
        notes: parse_notes(&body),
        references: parse_references(message),
        revert: parse_revert(message),
    };

    if let Some(caps) = HEADER_REGEX.captures(&header) {
        commit.r#type = caps
            .get(1)
            .map(|m| m.as_str().to_string())
            .filter(|t| !t.is_empty());
        commit.scope = caps
            .get(2)
            .map(|m| m.as_str().to_string())
            .filter(|s| !s.is_empty());
        commit.subject = caps.get(4).map(|m| m.as_str().to_string());

        let breaking_header = caps.get(3).is_some_and(|m| m.as_str() == "!");
        if breaking_header && commit.notes.is_empty() {
            commit.notes.push(Note {
                title: BREAKING_CHANGE_TITLE.to_string(),
                text: commit.subject.clone().unwrap_or_default(),
            });
        }
    }

    commit
}

fn parse_notes(body: &[&str]) -> Vec<Note> {
    let mut notes: Vec<Note> = Vec::new();
    let mut open = false;

    for line in body {
        if let Some(caps) = NOTE_REGEX.captures(line) {
            notes.push(Note {
                title: BREAKING_CHANGE_TITLE.to_string(),
                text: caps[2].trim().to_string(),
            });
            open = true;
        } else if line.trim().is_empty() {
            open = false;
        } else if open {
            if let Some(note) = notes.last_mut() {
                if !note.text.is_empty() {
                    note.text.push('\n');
                }
                note.text.push_str(line.trim_end());
            }
        }
    }

    notes
}

fn parse_references(message: &str) -> Vec<Reference> {
    let mut references: Vec<Reference> = Vec::new();

    for caps in REFERENCE_REGEX.captures_iter(message) {
        let issue = caps[2].to_string();
        let action = caps.get(1).map(|m| capitalize(m.as_str()));

        match references.iter_mut().find(|r| r.issue == issue) {
            Some(existing) => {
                if existing.action.is_none() {
                    existing.action = action;
                }
            }
            None => references.push(Reference { action, issue }),
        }
    }

    references
}

fn parse_revert(message: &str) -> Option<Revert> {
    let caps = REVERT_REGEX.captures(message)?;
    Some(Revert {
        header: caps[1].trim().to_string(),
        hash: caps[2].to_string(),
    })
}

fn capitalize(raw: &str) -> String {
    let lower = raw.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
