use crate::output::UserOutput;
use std::path::PathBuf;
use std::sync::Arc;
use supabase_git_sync::config::{CONFIG_FILE_NAME, STARTER_CONFIG};
use supabase_git_sync::{Parser as ConfigParser, SyncEngine, SyncSession, Verb};

/// Write a starter config if there is none, create the backup directory and
/// link the Supabase project once the config is complete.
pub async fn run_setup(
    config_path: Option<PathBuf>,
    force: bool,
    dry_run: bool,
    out: &dyn UserOutput,
) -> anyhow::Result<()> {
    let config_path = match config_path {
        Some(path) => path,
        None => std::env::current_dir()?.join(CONFIG_FILE_NAME),
    };

    if config_path.exists() && !force {
        out.status(&format!("Using existing {}", config_path.display()));
    } else if dry_run {
        out.status(&format!("Would write starter config to {}", config_path.display()));
        return Ok(());
    } else {
        std::fs::write(&config_path, STARTER_CONFIG)?;
        out.success(&format!("Wrote starter config to {}", config_path.display()));
    }

    let config = ConfigParser::new().load_config(&config_path)?;
    let backup_dir = config.backup_dir();
    if dry_run {
        out.status(&format!("Would create {}", backup_dir.display()));
    } else {
        std::fs::create_dir_all(&backup_dir)?;
        out.status(&format!("Backups go to {}", backup_dir.display()));
    }

    let issues = config.validate();
    let engine = SyncEngine::builder(
        Arc::new(config),
        SyncSession::new(Verb::Status).dry_run(dry_run).force(force),
    )
    .build()?;

    out.blank();
    out.status("Tools:");
    let mut tools_ok = true;
    for check in engine.check_tools().await {
        out.progress(&format!("  {:<9}", check.tool));
        if check.available {
            out.finish_progress(&format!("+ {}", check.detail));
        } else {
            tools_ok &= !check.required;
            out.finish_progress(if check.required { "x not found" } else { "o not found" });
        }
    }

    out.blank();
    if !issues.is_empty() {
        out.warning("Fill in these entries, then run `sbsync setup` again to link the project:");
        for issue in &issues {
            out.status(&format!("  - {}", issue));
        }
        return Ok(());
    }
    if !tools_ok {
        out.warning("Install the missing tools, then run `sbsync setup` again");
        return Ok(());
    }

    let project_ref = &engine.config().supabase.project_id;
    if dry_run {
        out.status(&format!("Would run: supabase link --project-ref {}", project_ref));
        return Ok(());
    }
    out.progress(&format!("Linking Supabase project {}...", project_ref));
    engine.link_project().await?;
    out.finish_progress("done");
    out.success("Setup complete. Try `sbsync status`.");
    Ok(())
}
