//! Post-release build step.

use std::path::Path;
use std::process::Command;

use tracing::info;

use crate::error::{ReleaseError, Result};

/// Runs the project build after a release
pub trait BuildRunner {
    /// Run `script` in `dir`. A non-zero exit is an error.
    fn run(&self, script: &str, dir: &Path) -> Result<()>;
}

/// Runs a package script through `npm run`, sharing the terminal with the user
pub struct NpmBuildRunner {
    program: String,
}

impl NpmBuildRunner {
    pub fn new() -> Self {
        NpmBuildRunner {
            program: "npm".to_string(),
        }
    }

    /// Use another executable in place of `npm`
    pub fn with_program(program: impl Into<String>) -> Self {
        NpmBuildRunner {
            program: program.into(),
        }
    }
}

impl Default for NpmBuildRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildRunner for NpmBuildRunner {
    fn run(&self, script: &str, dir: &Path) -> Result<()> {
        let command = format!("{} run {}", self.program, script);

        if !dir.is_dir() {
            return Err(ReleaseError::subprocess(
                command,
                format!("directory not found: {}", dir.display()),
            ));
        }

        info!(command = %command, dir = %dir.display(), "running build");

        // stdio is inherited so build output streams straight to the terminal
        let status = Command::new(&self.program)
            .args(["run", script])
            .current_dir(dir)
            .status()
            .map_err(|e| ReleaseError::subprocess(&command, e.to_string()))?;

        if !status.success() {
            return Err(ReleaseError::subprocess(
                command,
                format!("exit code {}", status.code().unwrap_or(-1)),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_directory_fails() {
        let runner = NpmBuildRunner::new();
        let err = runner
            .run("build", Path::new("/nonexistent/path/to/project"))
            .unwrap_err();
        assert!(err.to_string().contains("directory not found"));
    }

    #[test]
    fn test_missing_program_fails() {
        let temp = TempDir::new().unwrap();
        let runner = NpmBuildRunner::with_program("release-cli-no-such-program");
        let err = runner.run("build", temp.path()).unwrap_err();
        assert!(matches!(err, ReleaseError::SubprocessFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_fails() {
        let temp = TempDir::new().unwrap();
        let runner = NpmBuildRunner::with_program("false");
        let err = runner.run("build", temp.path()).unwrap_err();
        assert_eq!(err.to_string(), "Command `false run build` failed: exit code 1");
    }

    #[cfg(unix)]
    #[test]
    fn test_zero_exit_succeeds() {
        let temp = TempDir::new().unwrap();
        let runner = NpmBuildRunner::with_program("true");
        assert!(runner.run("build", temp.path()).is_ok());
    }
}
