use super::print_outcome;
use crate::output::UserOutput;
use supabase_git_sync::SyncEngine;

pub async fn run_push(engine: &SyncEngine, out: &dyn UserOutput) -> anyhow::Result<()> {
    let git = &engine.config().git;
    out.status(&format!(
        "Pushing {} to {}/{}{}",
        engine.config().project_root.display(),
        git.remote,
        git.branch,
        if engine.session().dry_run { " (dry run)" } else { "" }
    ));

    let outcome = engine.push().await?;
    print_outcome(&outcome, out);
    Ok(())
}
