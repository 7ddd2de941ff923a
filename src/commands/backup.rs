use super::print_outcome;
use crate::output::UserOutput;
use supabase_git_sync::SyncEngine;

pub async fn run_backup(engine: &SyncEngine, out: &dyn UserOutput) -> anyhow::Result<()> {
    out.status(&format!(
        "Writing backups to {}",
        engine.backups().directory().display()
    ));

    let outcome = engine.backup().await?;
    for path in &outcome.report().backups {
        out.status(&format!("  {}", path.display()));
    }
    print_outcome(&outcome, out);
    Ok(())
}
