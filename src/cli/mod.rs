//! Command-line workflow, separated from argument parsing in `main`

pub mod orchestration;

pub use orchestration::{
    run_release_workflow, ReleaseEffects, ReleaseSummary, ReleaseWorkflowArgs, WorkflowOutcome,
};
