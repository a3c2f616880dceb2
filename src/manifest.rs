//! The version manifest (`package.json`): source of the current version, the
//! package name and the embedded configuration.

use std::fs;
use std::path::{Path, PathBuf};

use semver::Version;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ReleaseError, Result};

/// File name of the version manifest
pub const MANIFEST_FILE: &str = "package.json";

/// Key of the configuration object embedded in the manifest
pub const EMBEDDED_CONFIG_KEY: &str = "releaseCliConfig";

/// JSON serializers conventionally cap indentation at ten spaces
const MAX_INDENT: usize = 10;

/// A loaded manifest. Key order is preserved across a load/save cycle.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    content: Map<String, Value>,
}

impl Manifest {
    /// Manifest location inside a project directory
    pub fn path_in(root: &Path) -> PathBuf {
        root.join(MANIFEST_FILE)
    }

    /// Read and parse a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_str_at(path, &raw)
    }

    /// Parse manifest text that belongs at `path`
    pub fn from_str_at(path: &Path, raw: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(raw)? {
            Value::Object(content) => Ok(Manifest {
                path: path.to_path_buf(),
                content,
            }),
            other => Err(ReleaseError::manifest(format!(
                "{} must contain a JSON object, found {}",
                path.display(),
                json_kind(&other)
            ))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the manifest, where builds run
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// The `version` field
    pub fn version(&self) -> Result<&str> {
        self.content
            .get("version")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ReleaseError::manifest(format!(
                    "{} has no string \"version\" field",
                    self.path.display()
                ))
            })
    }

    /// The `name` field, if any
    pub fn name(&self) -> Option<&str> {
        self.content.get("name").and_then(Value::as_str)
    }

    /// The embedded configuration object, if any
    pub fn embedded_config(&self) -> Option<&Value> {
        self.content.get(EMBEDDED_CONFIG_KEY)
    }

    /// The `repository` field, either a plain string or `{ "url": ... }`
    pub fn repository_url(&self) -> Option<&str> {
        match self.content.get("repository")? {
            Value::String(url) => Some(url.as_str()),
            Value::Object(repo) => repo.get("url").and_then(Value::as_str),
            _ => None,
        }
    }

    /// Replace the version field, leaving every other key where it was
    pub fn set_version(&mut self, version: &Version) {
        self.content
            .insert("version".to_string(), Value::String(version.to_string()));
    }

    /// Render the manifest with the given indentation and a trailing newline
    pub fn render(&self, indent: usize) -> Result<String> {
        let indent = " ".repeat(indent.clamp(1, MAX_INDENT));
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.content.serialize(&mut serializer)?;

        let mut rendered = String::from_utf8(buf)
            .map_err(|e| ReleaseError::manifest(format!("non UTF-8 output: {}", e)))?;
        rendered.push('\n');
        Ok(rendered)
    }

    /// Write the manifest back to its file
    pub fn save(&self, indent: usize) -> Result<()> {
        let rendered = self.render(indent)?;
        fs::write(&self.path, rendered)?;
        debug!(path = %self.path.display(), indent, "manifest written");
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
