use crate::output::UserOutput;
use std::path::PathBuf;
use std::sync::Arc;
use supabase_git_sync::{Error, Parser as ConfigParser, SyncEngine, SyncSession, Verb};

pub async fn run_validate(config_path: Option<PathBuf>, out: &dyn UserOutput) -> anyhow::Result<()> {
    let parser = ConfigParser::new();
    let config_path = match config_path {
        Some(path) => path,
        None => match parser.find_config_file() {
            Ok(path) => path,
            Err(e) => {
                out.error("No configuration file found");
                out.status(&format!(
                    "\nSearched for supabase-sync.yaml in:\n  - Current directory: {}\n  - Parent directories up to root",
                    std::env::current_dir()?.display()
                ));
                return Err(e.into());
            }
        },
    };

    out.status(&format!("Validating {}...", config_path.display()));
    let config = parser.load_config(&config_path)?;
    let issues = config.validate();

    if issues.is_empty() {
        out.success("Configuration is valid");
    } else {
        out.error(&format!("{} configuration issue(s):", issues.len()));
        for issue in &issues {
            out.status(&format!("  - {}", issue));
        }
    }

    out.blank();
    out.status("Tools:");
    let engine = SyncEngine::builder(Arc::new(config), SyncSession::new(Verb::Status)).build()?;
    let mut missing = Vec::new();
    for check in engine.check_tools().await {
        out.progress(&format!("  {:<9}", check.tool));
        if check.available {
            out.finish_progress(&format!("+ {}", check.detail));
        } else if check.required {
            out.finish_progress("x not found");
            missing.push(check.tool);
        } else {
            out.finish_progress("o not found (optional, needed for data import and restore)");
        }
    }

    if !issues.is_empty() {
        return Err(Error::InvalidConfig(issues.iter().map(ToString::to_string).collect()).into());
    }
    if !missing.is_empty() {
        return Err(Error::Precondition(format!(
            "missing required tool(s): {}",
            missing.join(", ")
        ))
        .into());
    }
    Ok(())
}
