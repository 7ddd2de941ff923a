use crate::output::UserOutput;
use supabase_git_sync::SyncEngine;

pub async fn run_status(engine: &SyncEngine, json: bool, out: &dyn UserOutput) -> anyhow::Result<()> {
    let report = engine.status().await?;

    if json {
        out.status(&serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    out.status("Repository:");
    out.status(&format!("{:-<50}", ""));
    out.status(&format!("  Branch:      {}", report.branch));
    if let (Some(ahead), Some(behind)) = (report.ahead, report.behind) {
        out.status(&format!("  Tracking:    {} ahead, {} behind", ahead, behind));
    }
    if let Some(ref commit) = report.last_commit {
        out.status(&format!("  Last commit: {}", commit));
    }
    if report.dirty_files.is_empty() {
        out.status("  Working tree clean");
    } else {
        out.status(&format!("  {} uncommitted change(s):", report.dirty_files.len()));
        for line in &report.dirty_files {
            out.status(&format!("    {}", line));
        }
    }

    out.blank();
    out.status("Local Supabase:");
    out.status(&format!("{:-<50}", ""));
    out.status(&format!("  State: {}", report.runtime));
    let up = |ok: bool| if ok { "+ reachable" } else { "x unreachable" };
    out.status(&format!("  API:   {}", up(report.health.api_reachable)));
    out.status(&format!("  DB:    {}", up(report.health.db_reachable)));
    for port in &report.ports {
        out.status(&format!(
            "  {:<9} {:>5}  {}",
            port.role,
            port.port,
            if port.in_use { "in use" } else { "free" }
        ));
    }

    out.blank();
    out.status("Backups:");
    out.status(&format!("{:-<50}", ""));
    if report.recent_backups.is_empty() {
        out.status("  No backups yet");
    } else {
        for record in &report.recent_backups {
            out.status(&format!(
                "  {}  {:<9} {:<6} {}",
                record.created_at.format("%Y-%m-%d %H:%M:%S"),
                record.kind.to_string(),
                record.source.to_string(),
                record.file_name()
            ));
        }
    }
    if !report.past_retention.is_empty() {
        out.warning(&format!(
            "  {} backup(s) older than {} days; remove them manually if no longer needed",
            report.past_retention.len(),
            report.retention_days
        ));
    }

    Ok(())
}
