//! Main workflow orchestration logic
//!
//! The release workflow runs precondition checks, asks for the version, then
//! writes the manifest and changelog and finishes with commit, push, optional
//! tag and optional build. Every external effect goes through
//! [`ReleaseEffects`], so the whole sequence runs against test doubles.

use std::path::PathBuf;

use semver::Version;
use tracing::{debug, info, instrument};

use crate::boundary::BoundaryWarning;
use crate::build::BuildRunner;
use crate::changelog::{self, RepoUrl};
use crate::config;
use crate::error::{ReleaseError, Result};
use crate::git::{Repository, DEFAULT_REMOTE};
use crate::guard;
use crate::manifest::Manifest;
use crate::registry::Registry;
use crate::ui::{self, Prompter};
use crate::version::{BumpKind, ReleaseChoice, ReleaseType, VersionPlan};

/// Arguments for the release workflow
///
/// Mirrors the CLI arguments without depending on clap.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseWorkflowArgs {
    /// Project directory holding the manifest
    pub root: PathBuf,

    /// Configuration file, relative paths resolved against `root`
    pub config_path: Option<PathBuf>,
}

impl ReleaseWorkflowArgs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ReleaseWorkflowArgs {
            root: root.into(),
            config_path: None,
        }
    }

    pub fn with_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }
}

/// The collaborators the workflow acts through
pub struct ReleaseEffects<'a> {
    pub repo: &'a dyn Repository,
    pub registry: &'a dyn Registry,
    pub builder: &'a dyn BuildRunner,
    pub prompter: &'a dyn Prompter,
}

/// What a completed release did
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseSummary {
    pub version: Version,
    pub branch: String,
    /// The tag that was created and pushed, if auto-tag is on
    pub tag: Option<String>,
    pub built: bool,
    pub warnings: Vec<BoundaryWarning>,
}

/// How a workflow run ended
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowOutcome {
    Released(ReleaseSummary),
    /// The user declined the confirmation; nothing was changed
    Cancelled,
}

/// Message used for the release commit and the annotated tag
pub fn release_commit_message(version: &Version) -> String {
    format!("chore: v{} changelog [ci skip]", version)
}

/// Main release workflow
///
/// 1. Manifest exists, repository and branch are usable, tree is clean
/// 2. Ask for the version and confirm it
/// 3. Check the registry, write manifest and changelog
/// 4. Commit, push, tag and build
#[instrument(skip_all, fields(root = %args.root.display()))]
pub fn run_release_workflow(
    args: &ReleaseWorkflowArgs,
    effects: &ReleaseEffects<'_>,
) -> Result<WorkflowOutcome> {
    let mut warnings = Vec::new();

    let manifest_path = guard::check_manifest(&args.root)?;
    let branch = guard::check_repository(effects.repo)?;

    let mut manifest = Manifest::load(&manifest_path)?;
    let config_path = args.config_path.as_ref().map(|path| args.root.join(path));
    let raw_config = config::load_raw_config(config_path.as_deref(), &manifest)?;
    for key in config::unknown_keys(&raw_config) {
        report(&mut warnings, BoundaryWarning::UnknownConfigKey { key });
    }
    let config = config::validate(&raw_config)?;

    guard::check_branch(&branch, &config.branch_blacklist)?;
    guard::check_clean(effects.repo)?;
    debug!(branch = %branch.name, "preconditions passed");

    let plan = VersionPlan::new(manifest.version()?)?;
    let choice = ask_release_choice(effects.prompter, &plan)?;
    let version = plan.resolve(&choice)?;
    if version <= plan.current {
        report(
            &mut warnings,
            BoundaryWarning::VersionNotIncreased {
                current: plan.current.to_string(),
                requested: version.to_string(),
            },
        );
    }

    ui::display_version_change(&plan.current.to_string(), &version.to_string());
    if !effects
        .prompter
        .confirm(&format!("Release version {}?", version))?
    {
        info!(%version, "release cancelled by user");
        return Ok(WorkflowOutcome::Cancelled);
    }

    if let Some(warning) = guard::check_not_published(
        effects.registry,
        &config.npm_registry,
        manifest.name(),
        &version,
    )? {
        report(&mut warnings, warning);
    }

    manifest.set_version(&version);
    manifest.save(config.package_json_file_indent)?;
    ui::display_success(&format!("Updated {} to {}", manifest.path().display(), version));

    let repo_url = resolve_repo_url(&manifest, effects.repo);
    if repo_url.is_none() {
        report(&mut warnings, BoundaryWarning::NoRepositoryUrl);
    }

    let tag_format = config.tag_format();
    let notes = changelog::generate(
        effects.repo,
        &version,
        &tag_format,
        &config.commit_type_display_name,
        repo_url,
    )?;
    if notes.included == 0 {
        report(
            &mut warnings,
            BoundaryWarning::NoNewCommits {
                previous_tag: notes.previous_tag.clone(),
            },
        );
    }
    let changelog_path = changelog::changelog_path(manifest.dir());
    changelog::write_changelog(&changelog_path, &notes.entry, config.changelog_mode)?;
    ui::display_success(&format!("Wrote {}", changelog_path.display()));

    let message = release_commit_message(&version);
    effects
        .repo
        .stage_all()
        .map_err(|e| git_failure("git add -A", e))?;
    effects
        .repo
        .commit(&message)
        .map_err(|e| git_failure(&format!("git commit -m \"{}\"", message), e))?;
    ui::display_status(&format!("Pushing {} to {}", branch.name, DEFAULT_REMOTE));
    effects.repo.push_branch(DEFAULT_REMOTE, &branch.name)?;

    let tag = if config.auto_tag {
        let tag = tag_format.format(&version);
        effects
            .repo
            .create_annotated_tag(&tag, &message)
            .map_err(|e| git_failure(&format!("git tag -a {}", tag), e))?;
        effects.repo.push_tag(DEFAULT_REMOTE, &tag)?;
        Some(tag)
    } else {
        None
    };

    if config.auto_build {
        ui::display_status(&format!("Running build script '{}'", config.build_script));
        effects.builder.run(&config.build_script, manifest.dir())?;
    }

    info!(%version, tag = tag.as_deref().unwrap_or("<none>"), "release finished");
    Ok(WorkflowOutcome::Released(ReleaseSummary {
        version,
        branch: branch.name,
        tag,
        built: config.auto_build,
        warnings,
    }))
}

/// Turn the release-type answer into a complete choice, asking follow-up
/// questions for prereleases and custom versions
pub fn ask_release_choice(prompter: &dyn Prompter, plan: &VersionPlan) -> Result<ReleaseChoice> {
    match prompter.select_release_type(plan)? {
        ReleaseType::Bump(BumpKind::Prerelease) => {
            Ok(ReleaseChoice::Prerelease(prompter.select_prerelease()?))
        }
        ReleaseType::Bump(kind) => Ok(ReleaseChoice::Bump(kind)),
        ReleaseType::Custom => {
            let suggested = plan.suggested_custom()?;
            Ok(ReleaseChoice::Custom(
                prompter.input_custom_version(&suggested)?,
            ))
        }
    }
}

/// Repository links come from the manifest, else from the `origin` remote
fn resolve_repo_url(manifest: &Manifest, repo: &dyn Repository) -> Option<RepoUrl> {
    if let Some(url) = manifest.repository_url().and_then(changelog::normalize_repo_url) {
        return Some(url);
    }
    match repo.remote_url(DEFAULT_REMOTE) {
        Ok(remote) => remote.as_deref().and_then(changelog::normalize_repo_url),
        Err(e) => {
            debug!(error = %e, "cannot read origin URL");
            None
        }
    }
}

fn git_failure(command: &str, error: ReleaseError) -> ReleaseError {
    match error {
        ReleaseError::Git(e) => ReleaseError::subprocess(command, e.message()),
        other => other,
    }
}

fn report(warnings: &mut Vec<BoundaryWarning>, warning: BoundaryWarning) {
    ui::display_boundary_warning(&warning);
    warnings.push(warning);
}
