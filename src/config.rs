//! Release configuration: schema, defaults, validation and loading.
//!
//! Configuration arrives as an untyped value (the manifest's embedded
//! `releaseCliConfig` object, or a file given with `--config`) and is validated
//! once into a [`Config`] where every field has a concrete value.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::{BranchRule, CommitLabels, TagFormat};
use crate::error::{ReleaseError, Result};
use crate::manifest::Manifest;

/// Registry queried for already-published versions unless configured otherwise
pub const DEFAULT_NPM_REGISTRY: &str = "https://registry.npmmirror.com";

const KNOWN_KEYS: [&str; 10] = [
    "autoBuild",
    "autoTag",
    "tagPrefix",
    "tagSuffix",
    "branchBlacklist",
    "commitTypeDisplayName",
    "packageJsonFileIndent",
    "npmRegistry",
    "buildScript",
    "changelogMode",
];

/// How a freshly rendered release entry is combined with an existing changelog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangelogMode {
    /// Replace the file with the new entry
    #[default]
    Overwrite,
    /// New entry first, previous content after it
    Prepend,
    /// Previous content first, new entry after it
    Append,
}

impl ChangelogMode {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "overwrite" => Some(ChangelogMode::Overwrite),
            "prepend" => Some(ChangelogMode::Prepend),
            "append" => Some(ChangelogMode::Append),
            _ => None,
        }
    }
}

/// Validated release configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Run the build script after pushing
    pub auto_build: bool,
    /// Create and push an annotated release tag
    pub auto_tag: bool,
    pub tag_prefix: String,
    pub tag_suffix: String,
    /// Branches releases may not be cut from
    pub branch_blacklist: Vec<BranchRule>,
    /// Changelog section labels
    pub commit_type_display_name: CommitLabels,
    /// Indentation used when rewriting the manifest
    pub package_json_file_indent: usize,
    pub npm_registry: String,
    /// Package script run by auto-build
    pub build_script: String,
    pub changelog_mode: ChangelogMode,
}

impl Config {
    /// Tag naming derived from prefix and suffix
    pub fn tag_format(&self) -> TagFormat {
        TagFormat::new(self.tag_prefix.clone(), self.tag_suffix.clone())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            auto_build: true,
            auto_tag: false,
            tag_prefix: "v".to_string(),
            tag_suffix: String::new(),
            branch_blacklist: vec![
                BranchRule::Literal("master".to_string()),
                BranchRule::Literal("main".to_string()),
            ],
            commit_type_display_name: CommitLabels::default(),
            package_json_file_indent: 4,
            npm_registry: DEFAULT_NPM_REGISTRY.to_string(),
            build_script: "build".to_string(),
            changelog_mode: ChangelogMode::Overwrite,
        }
    }
}

/// A single schema violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Dotted path of the offending field, `root` for the top-level value
    pub path: String,
    pub message: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  - {}: {}", self.path, self.message)
    }
}

/// Outcome of [`safe_validate`]
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    Success(Config),
    /// One bullet per violated field, joined by newlines
    Failure(String),
}

impl ValidationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ValidationResult::Success(_))
    }
}

/// Validate a raw configuration value, applying defaults for omitted fields.
///
/// Fails with [`ReleaseError::ConfigValidationFailed`] listing every violation.
pub fn validate(raw: &Value) -> Result<Config> {
    check(raw).map_err(|violations| ReleaseError::ConfigValidationFailed(join(&violations)))
}

/// Like [`validate`], but reports failure as a value instead of an error
pub fn safe_validate(raw: &Value) -> ValidationResult {
    match check(raw) {
        Ok(config) => ValidationResult::Success(config),
        Err(violations) => {
            ValidationResult::Failure(format!("Config validation failed:\n{}", join(&violations)))
        }
    }
}

/// Top-level keys the schema does not know about
pub fn unknown_keys(raw: &Value) -> Vec<String> {
    match raw {
        Value::Object(obj) => obj
            .keys()
            .filter(|key| !KNOWN_KEYS.contains(&key.as_str()))
            .cloned()
            .collect(),
        _ => Vec::new(),
    }
}

/// Load the raw configuration.
///
/// Uses the file at `config_path` when given (TOML for `.toml`, JSON otherwise),
/// else the manifest's embedded object, else an empty object.
pub fn load_raw_config(config_path: Option<&Path>, manifest: &Manifest) -> Result<Value> {
    let Some(path) = config_path else {
        debug!("using configuration embedded in the manifest");
        return Ok(manifest
            .embedded_config()
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new())));
    };

    let content = fs::read_to_string(path)
        .map_err(|e| ReleaseError::config(format!("cannot read {}: {}", path.display(), e)))?;

    let is_toml = path.extension().is_some_and(|ext| ext == "toml");
    let value = if is_toml {
        toml::from_str::<Value>(&content)
            .map_err(|e| ReleaseError::config(format!("cannot parse {}: {}", path.display(), e)))?
    } else {
        serde_json::from_str::<Value>(&content)
            .map_err(|e| ReleaseError::config(format!("cannot parse {}: {}", path.display(), e)))?
    };

    debug!(path = %path.display(), "configuration loaded from file");
    Ok(value)
}

fn join(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

fn check(raw: &Value) -> std::result::Result<Config, Vec<FieldViolation>> {
    let Value::Object(obj) = raw else {
        return Err(vec![FieldViolation {
            path: "root".to_string(),
            message: format!("expected an object, received {}", raw),
        }]);
    };

    for key in unknown_keys(raw) {
        debug!(key = %key, "ignoring unknown configuration key");
    }

    let defaults = Config::default();
    let mut fields = Fields {
        obj,
        violations: Vec::new(),
    };

    let config = Config {
        auto_build: fields.boolean("autoBuild", defaults.auto_build),
        auto_tag: fields.boolean("autoTag", defaults.auto_tag),
        tag_prefix: fields.string("tagPrefix", &defaults.tag_prefix),
        tag_suffix: fields.string("tagSuffix", &defaults.tag_suffix),
        branch_blacklist: fields.branch_rules("branchBlacklist", defaults.branch_blacklist),
        commit_type_display_name: fields.labels("commitTypeDisplayName"),
        package_json_file_indent: fields
            .positive_integer("packageJsonFileIndent", defaults.package_json_file_indent),
        npm_registry: fields.string("npmRegistry", &defaults.npm_registry),
        build_script: fields.string("buildScript", &defaults.build_script),
        changelog_mode: fields.changelog_mode("changelogMode", defaults.changelog_mode),
    };

    if fields.violations.is_empty() {
        Ok(config)
    } else {
        Err(fields.violations)
    }
}

struct Fields<'a> {
    obj: &'a Map<String, Value>,
    violations: Vec<FieldViolation>,
}

impl Fields<'_> {
    fn violation(&mut self, path: impl Into<String>, expected: &str, received: &Value) {
        self.violations.push(FieldViolation {
            path: path.into(),
            message: format!("expected {}, received {}", expected, received),
        });
    }

    fn boolean(&mut self, key: &str, default: bool) -> bool {
        match self.obj.get(key) {
            None => default,
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                self.violation(key, "a boolean", other);
                default
            }
        }
    }

    fn string(&mut self, key: &str, default: &str) -> String {
        match self.obj.get(key) {
            None => default.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                self.violation(key, "a string", other);
                default.to_string()
            }
        }
    }

    fn positive_integer(&mut self, key: &str, default: usize) -> usize {
        match self.obj.get(key) {
            None => default,
            Some(value) => match whole_number(value).filter(|n| *n > 0) {
                Some(n) => usize::try_from(n).unwrap_or(usize::MAX),
                None => {
                    self.violation(key, "a positive integer", value);
                    default
                }
            },
        }
    }

    fn branch_rules(&mut self, key: &str, default: Vec<BranchRule>) -> Vec<BranchRule> {
        let items = match self.obj.get(key) {
            None => return default,
            Some(Value::Array(items)) => items,
            Some(other) => {
                self.violation(key, "an array of strings", other);
                return default;
            }
        };

        let mut rules = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let path = format!("{}.{}", key, index);
            match item {
                Value::String(raw) => match BranchRule::parse(raw) {
                    Ok(rule) => rules.push(rule),
                    Err(e) => self.violations.push(FieldViolation {
                        path,
                        message: format!("invalid branch pattern {}: {}", raw, e),
                    }),
                },
                other => self.violation(path, "a string", other),
            }
        }
        rules
    }

    fn labels(&mut self, key: &str) -> CommitLabels {
        let entries = match self.obj.get(key) {
            None => return CommitLabels::default(),
            Some(Value::Object(entries)) => entries,
            Some(other) => {
                self.violation(key, "an object of strings", other);
                return CommitLabels::default();
            }
        };

        let mut overrides = BTreeMap::new();
        for (kind, label) in entries {
            match label {
                Value::String(label) => {
                    overrides.insert(kind.clone(), label.clone());
                }
                other => self.violation(format!("{}.{}", key, kind), "a string", other),
            }
        }
        CommitLabels::new(overrides)
    }

    fn changelog_mode(&mut self, key: &str, default: ChangelogMode) -> ChangelogMode {
        match self.obj.get(key) {
            None => default,
            Some(value) => match value.as_str().and_then(ChangelogMode::parse) {
                Some(mode) => mode,
                None => {
                    self.violation(key, "one of \"overwrite\", \"prepend\", \"append\"", value);
                    default
                }
            },
        }
    }
}

/// Integer value of a JSON number, accepting floats with no fractional
/// part (`4.0`) the way JavaScript does.
fn whole_number(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    if f.fract() == 0.0 && (0.0..=u64::MAX as f64).contains(&f) {
        Some(f as u64)
    } else {
        None
    }
}
