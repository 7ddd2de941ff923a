use super::SyncEngine;
use crate::backup::BackupRecord;
use crate::error::Result;
use crate::exec::CommandSpec;
use crate::health::{PortStatus, RuntimeState, ServiceHealthStatus};
use serde::Serialize;

/// Backups shown in the status summary.
const RECENT_BACKUPS: usize = 5;

/// Read-only summary of the working tree, the local stack and the backups.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub branch: String,
    pub dirty_files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ahead: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub behind: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_commit: Option<String>,
    pub runtime: RuntimeState,
    pub health: ServiceHealthStatus,
    pub ports: Vec<PortStatus>,
    pub recent_backups: Vec<BackupRecord>,
    pub past_retention: Vec<BackupRecord>,
    pub retention_days: u32,
}

/// Result of probing one external tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCheck {
    pub tool: &'static str,
    /// Version line, or the error that prevented reading it.
    pub detail: String,
    pub available: bool,
    /// Required tools fail `validate`; optional ones only warn.
    pub required: bool,
}

impl SyncEngine {
    /// Gather the status summary. Issues no mutating command.
    pub async fn status(&self) -> Result<StatusReport> {
        let git_config = &self.config.git;
        let branch = self
            .git
            .current_branch()
            .await
            .unwrap_or_else(|_| "(unknown)".to_string());
        let dirty_files = self.git.status_porcelain().await?;
        let (ahead, behind) = match self
            .git
            .ahead_behind(&git_config.remote, &git_config.branch)
            .await?
        {
            Some((ahead, behind)) => (Some(ahead), Some(behind)),
            None => (None, None),
        };
        let last_commit = self.git.last_commit().await?;

        let health = self.health.check_health().await;
        let ports = self.health.port_occupancy().await;

        let mut recent_backups = self.backups.list_backups()?;
        recent_backups.truncate(RECENT_BACKUPS);
        let past_retention = self.backups.retention_report()?;

        Ok(StatusReport {
            branch,
            dirty_files,
            ahead,
            behind,
            last_commit,
            runtime: self.health.state(),
            health,
            ports,
            recent_backups,
            past_retention,
            retention_days: self.config.backup.retention_days,
        })
    }

    /// Version of every external tool the sync flow relies on.
    pub async fn check_tools(&self) -> Vec<ToolCheck> {
        let tools: [(&'static str, &[&str], bool); 4] = [
            ("git", &["--version"], true),
            ("supabase", &["--version"], true),
            ("docker", &["--version"], true),
            ("psql", &["--version"], false),
        ];

        let mut checks = Vec::with_capacity(tools.len());
        for (tool, args, required) in tools {
            let spec = CommandSpec::new(tool, args.iter().copied());
            let (available, detail) = match self.supabase.runner().run_checked(&spec).await {
                Ok(out) => (true, out.stdout.lines().next().unwrap_or("").trim().to_string()),
                Err(e) => (false, e.to_string()),
            };
            checks.push(ToolCheck {
                tool,
                detail,
                available,
                required,
            });
        }
        checks
    }
}
