mod backup;
mod config;
mod pull;
mod push;
mod reset;
mod restore;
mod setup;
mod status;
mod validate;

pub use backup::run_backup;
pub use config::run_config;
pub use pull::run_pull;
pub use push::run_push;
pub use reset::run_reset;
pub use restore::run_restore;
pub use setup::run_setup;
pub use status::run_status;
pub use validate::run_validate;

use crate::output::UserOutput;
use supabase_git_sync::{StepStatus, SyncOutcome};

fn marker(status: &StepStatus) -> &'static str {
    match status {
        StepStatus::Completed => "+",
        StepStatus::Skipped(_) => "o",
        StepStatus::Planned(_) => "~",
        StepStatus::Warned(_) => "!",
        StepStatus::Failed(_) => "x",
    }
}

/// Print the step table and the notes a run produced.
pub(crate) fn print_outcome(outcome: &SyncOutcome, out: &dyn UserOutput) {
    let report = outcome.report();

    out.blank();
    for record in &report.steps {
        out.status(&format!(
            "  {} {:<24} {}",
            marker(&record.status),
            record.step,
            record.status
        ));
    }

    if let Some(ref conflicts) = report.conflicts {
        out.blank();
        out.status(&format!(
            "Resolved {} conflict(s): {} local, {} remote",
            conflicts.resolved_count(),
            conflicts.local.len(),
            conflicts.remote.len()
        ));
    }

    if let Some(ref health) = report.health {
        out.status(&format!(
            "Local stack: api {}, db {}",
            if health.api_reachable { "up" } else { "down" },
            if health.db_reachable { "up" } else { "down" }
        ));
    }

    if let Some(ref commit) = report.last_commit {
        out.status(&format!("HEAD: {}", commit));
    }

    if !report.warnings.is_empty() {
        out.blank();
        for warning in &report.warnings {
            out.warning(&format!("Warning: {}", warning));
        }
    }

    if let Some(ref rollback) = report.rollback_point {
        out.status(&format!("Rollback point: {}", rollback.display()));
    }

    out.blank();
    match outcome {
        SyncOutcome::Cancelled(_) => out.status("Cancelled; nothing after the prompt was run."),
        SyncOutcome::Completed(_) if report.dry_run => {
            out.status("Dry run: no changes were made.")
        }
        SyncOutcome::Completed(_) => out.success(&format!("{} complete", report.verb)),
    }
}
