//! Package registry lookups, used to refuse re-publishing an existing version.

use std::io::Read;
use std::process::{Command, Stdio};
use std::time::Duration;

use semver::Version;
use tracing::{debug, instrument};
use wait_timeout::ChildExt;

use crate::error::{ReleaseError, Result};

/// Upper bound for a single registry query
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Answers whether a package version already exists in a registry
pub trait Registry {
    /// `Ok(true)` only when `registry` confirms the version exists.
    /// Any failure to get an answer is an error.
    fn is_published(&self, registry: &str, package: &str, version: &Version) -> Result<bool>;
}

/// Queries npm registries through `npm view`
pub struct NpmRegistry {
    program: String,
    timeout: Duration,
}

impl NpmRegistry {
    pub fn new() -> Self {
        NpmRegistry {
            program: "npm".to_string(),
            timeout: LOOKUP_TIMEOUT,
        }
    }

    /// Use another executable in place of `npm`
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Bound each lookup by `timeout` instead of [`LOOKUP_TIMEOUT`]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn args(&self, registry: &str, package: &str, version: &Version) -> Vec<String> {
        vec![
            "view".to_string(),
            format!("{}@{}", package, version),
            "version".to_string(),
            format!("--registry={}", registry),
        ]
    }
}

impl Default for NpmRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry for NpmRegistry {
    #[instrument(skip(self))]
    fn is_published(&self, registry: &str, package: &str, version: &Version) -> Result<bool> {
        let args = self.args(registry, package, version);
        let command = format!("{} {}", self.program, args.join(" "));

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ReleaseError::RegistryLookup(format!("cannot run `{}`: {}", command, e)))?;

        let status = match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ReleaseError::RegistryLookup(format!(
                    "`{}` timed out after {:?}",
                    command, self.timeout
                )));
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ReleaseError::RegistryLookup(format!(
                    "waiting for `{}` failed: {}",
                    command, e
                )));
            }
        };

        if !status.success() {
            return Err(ReleaseError::RegistryLookup(format!(
                "`{}` exited with code {}",
                command,
                status.code().unwrap_or(-1)
            )));
        }

        let mut stdout = String::new();
        if let Some(mut out) = child.stdout.take() {
            out.read_to_string(&mut stdout)
                .map_err(|e| ReleaseError::RegistryLookup(e.to_string()))?;
        }

        let published = lists_version(&stdout, version);
        debug!(published, "registry answered");
        Ok(published)
    }
}

/// Whether `npm view` output names `version`. Versions may be quoted, and a
/// range query prints `name@version 'version'` pairs.
fn lists_version(output: &str, version: &Version) -> bool {
    output
        .split_whitespace()
        .map(|token| token.trim_matches(|c: char| c == '\'' || c == '"' || c == ','))
        .filter_map(|token| Version::parse(token).ok())
        .any(|found| &found == version)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY: &str = "https://registry.example.com";

    #[test]
    fn test_lists_version() {
        let version = Version::new(1, 0, 1);
        assert!(lists_version("1.0.1\n", &version));
        assert!(lists_version("'1.0.1'", &version));
        assert!(lists_version("demo@1.0.1 '1.0.1'\n", &version));
        assert!(!lists_version("", &version));
        assert!(!lists_version("1.0.10\n", &version));
    }

    #[test]
    fn test_query_arguments() {
        let registry = NpmRegistry::new();
        assert_eq!(
            registry.args("https://registry.example.com", "demo", &Version::new(1, 0, 1)),
            vec![
                "view",
                "demo@1.0.1",
                "version",
                "--registry=https://registry.example.com"
            ]
        );
    }

    #[test]
    fn test_missing_program_is_lookup_error() {
        let registry = NpmRegistry::new().with_program("release-cli-no-such-program");
        let err = registry
            .is_published(REGISTRY, "demo", &Version::new(1, 0, 1))
            .unwrap_err();
        assert!(matches!(err, ReleaseError::RegistryLookup(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_program_is_lookup_error() {
        let registry = NpmRegistry::new().with_program("false");
        let err = registry
            .is_published(REGISTRY, "demo", &Version::new(1, 0, 1))
            .unwrap_err();
        assert!(err.to_string().contains("exited with code"));
    }

    #[cfg(unix)]
    #[test]
    fn test_empty_output_is_not_published() {
        let registry = NpmRegistry::new().with_program("true");
        assert!(!registry.is_published(REGISTRY, "demo", &Version::new(1, 0, 1)).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_slow_program_times_out() {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("slow-npm");
        let mut file = std::fs::File::create(&script).unwrap();
        file.write_all(b"#!/bin/sh\nsleep 5\necho 1.0.1\n").unwrap();
        drop(file);
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let registry = NpmRegistry::new()
            .with_program(script.to_string_lossy())
            .with_timeout(Duration::from_millis(200));
        let err = registry
            .is_published(REGISTRY, "demo", &Version::new(1, 0, 1))
            .unwrap_err();
        assert!(matches!(err, ReleaseError::RegistryLookup(_)));
        assert!(err.to_string().contains("timed out after 200ms"), "got: {}", err);
    }
}
