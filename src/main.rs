use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use release_cli::build::NpmBuildRunner;
use release_cli::cli::{run_release_workflow, ReleaseEffects, ReleaseWorkflowArgs, WorkflowOutcome};
use release_cli::git::Git2Repository;
use release_cli::registry::NpmRegistry;
use release_cli::ui::{self, TerminalPrompter};

#[derive(clap::Parser)]
#[command(
    name = "release-cli",
    about = "Bump the package version, write the changelog, then commit, tag and push",
    disable_version_flag = true
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(short = 'v', long, short_alias = 'V', help = "Print version information")]
    version: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(filter),
        )
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.version {
        println!("release-cli {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    init_tracing();

    let root = std::env::current_dir()?;
    let mut workflow_args = ReleaseWorkflowArgs::new(&root);
    if let Some(path) = args.config {
        workflow_args = workflow_args.with_config(path);
    }

    let repo = Git2Repository::discover(&root);
    let registry = NpmRegistry::new();
    let builder = NpmBuildRunner::new();
    let prompter = TerminalPrompter;
    let effects = ReleaseEffects {
        repo: &repo,
        registry: &registry,
        builder: &builder,
        prompter: &prompter,
    };

    match run_release_workflow(&workflow_args, &effects) {
        Ok(WorkflowOutcome::Released(summary)) => {
            ui::display_release_summary(&summary);
            Ok(())
        }
        Ok(WorkflowOutcome::Cancelled) => {
            ui::display_status("Release cancelled, nothing was changed");
            Ok(())
        }
        Err(e) => {
            ui::display_error(&e.to_string());
            std::process::exit(1);
        }
    }
}
