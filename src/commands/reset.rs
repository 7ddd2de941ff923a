use super::print_outcome;
use crate::output::UserOutput;
use supabase_git_sync::SyncEngine;

pub async fn run_reset(engine: &SyncEngine, out: &dyn UserOutput) -> anyhow::Result<()> {
    out.status(&format!(
        "Resetting local Supabase stack to the schema of project {}{}",
        engine.config().supabase.project_id,
        if engine.session().dry_run { " (dry run)" } else { "" }
    ));
    if !engine.session().force && !engine.session().dry_run {
        out.warning("All local database data will be discarded.");
    }

    let outcome = engine.reset().await?;
    print_outcome(&outcome, out);
    Ok(())
}
