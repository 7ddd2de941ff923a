use super::print_outcome;
use crate::output::UserOutput;
use supabase_git_sync::SyncEngine;

pub async fn run_pull(engine: &SyncEngine, out: &dyn UserOutput) -> anyhow::Result<()> {
    let git = &engine.config().git;
    out.status(&format!(
        "Pulling {}/{} into {}{}",
        git.remote,
        git.branch,
        engine.config().project_root.display(),
        if engine.session().dry_run { " (dry run)" } else { "" }
    ));

    let outcome = engine.pull().await?;
    print_outcome(&outcome, out);
    Ok(())
}
