//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - Interactive prompts behind the [Prompter] trait

use dialoguer::{Confirm, Input, Select};
use semver::Version;

use crate::domain::PreReleaseType;
use crate::error::Result;
use crate::version::{parse_custom_version, ReleaseType, VersionPlan};

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_boundary_warning, display_error, display_release_summary, display_status,
    display_success, display_version_change, format_boundary_warning, format_error,
    format_status, format_success, format_version_change, release_type_items,
};

/// Questions the release workflow asks
pub trait Prompter {
    /// Pick a bump kind or a custom version
    fn select_release_type(&self, plan: &VersionPlan) -> Result<ReleaseType>;

    /// Pick the identifier of a prerelease
    fn select_prerelease(&self) -> Result<PreReleaseType>;

    /// Ask for a version, offering `default`. The answer must be valid semver.
    fn input_custom_version(&self, default: &Version) -> Result<String>;

    /// Yes/no question, defaulting to no
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// Interactive prompts on the terminal
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn select_release_type(&self, plan: &VersionPlan) -> Result<ReleaseType> {
        let items = release_type_items(plan);
        let labels: Vec<&str> = items.iter().map(|(_, label)| label.as_str()).collect();

        let selection = Select::new()
            .with_prompt("Select the release type")
            .items(&labels)
            .default(2)
            .interact()?;

        Ok(items[selection].0)
    }

    fn select_prerelease(&self) -> Result<PreReleaseType> {
        let labels: Vec<&str> = PreReleaseType::ALL.iter().map(|p| p.intro()).collect();

        let selection = Select::new()
            .with_prompt("Select the prerelease type")
            .items(&labels)
            .default(0)
            .interact()?;

        Ok(PreReleaseType::ALL[selection])
    }

    fn input_custom_version(&self, default: &Version) -> Result<String> {
        let input = Input::<String>::new()
            .with_prompt("Enter the version")
            .default(default.to_string())
            .validate_with(|input: &String| -> std::result::Result<(), String> {
                parse_custom_version(input)
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            })
            .interact_text()?;

        Ok(input)
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        Ok(Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?)
    }
}
