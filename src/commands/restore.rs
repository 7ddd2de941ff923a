use super::print_outcome;
use crate::output::UserOutput;
use supabase_git_sync::SyncEngine;

pub async fn run_restore(engine: &SyncEngine, out: &dyn UserOutput) -> anyhow::Result<()> {
    let outcome = engine.restore().await?;
    print_outcome(&outcome, out);
    Ok(())
}
