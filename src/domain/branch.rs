use regex::Regex;

/// A branch blacklist entry, decided once when the config is validated.
///
/// Raw entries of the form `/pattern/` become [`BranchRule::Pattern`], anything
/// else is compared literally.
#[derive(Debug, Clone)]
pub enum BranchRule {
    Literal(String),
    Pattern(Regex),
}

impl BranchRule {
    /// Parse a raw blacklist entry
    pub fn parse(raw: &str) -> std::result::Result<Self, regex::Error> {
        if raw.len() >= 2 && raw.starts_with('/') && raw.ends_with('/') {
            let pattern = &raw[1..raw.len() - 1];
            Ok(BranchRule::Pattern(Regex::new(pattern)?))
        } else {
            Ok(BranchRule::Literal(raw.to_string()))
        }
    }

    /// Check whether a branch name is caught by this rule
    pub fn matches(&self, branch: &str) -> bool {
        match self {
            BranchRule::Literal(name) => name == branch,
            BranchRule::Pattern(re) => re.is_match(branch),
        }
    }
}

impl PartialEq for BranchRule {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (BranchRule::Literal(a), BranchRule::Literal(b)) => a == b,
            (BranchRule::Pattern(a), BranchRule::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

/// The branch a release is being cut from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchContext {
    pub name: String,
}

impl BranchContext {
    /// Create a new branch context
    pub fn new(name: impl Into<String>) -> Self {
        BranchContext { name: name.into() }
    }

    /// Check if any blacklist rule forbids releasing from this branch
    pub fn is_blacklisted(&self, rules: &[BranchRule]) -> bool {
        rules.iter().any(|rule| rule.matches(&self.name))
    }
}
