//! Supabase CLI wrapper.
//!
//! Every backend operation is a `supabase` (or `psql`) invocation through the
//! [`CommandRunner`]. Commands run from the directory that contains the
//! backend project folder, with the configured access token exported.

pub mod docker;

pub use docker::OrphanCleaner;

use crate::config::{ProjectConfig, ENV_ACCESS_TOKEN};
use crate::error::Result;
use crate::exec::{CommandOutput, CommandRunner, CommandSpec};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Which database a dump or restore talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DbTarget {
    Local,
    Remote,
}

impl fmt::Display for DbTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DbTarget::Local => "local",
            DbTarget::Remote => "remote",
        })
    }
}

/// `supabase` verbs used by the sync engine.
#[derive(Clone)]
pub struct Supabase {
    runner: Arc<dyn CommandRunner>,
    config: Arc<ProjectConfig>,
}

impl Supabase {
    pub fn new(runner: Arc<dyn CommandRunner>, config: Arc<ProjectConfig>) -> Self {
        Self { runner, config }
    }

    pub fn runner(&self) -> &Arc<dyn CommandRunner> {
        &self.runner
    }

    /// Directory holding the backend project folder.
    fn workdir(&self) -> PathBuf {
        let backend = self.config.backend_dir();
        backend
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.project_root.clone())
    }

    pub(crate) fn spec<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let spec = CommandSpec::new("supabase", args).current_dir(&self.workdir());
        match self.config.credential() {
            Some(token) => spec.env(ENV_ACCESS_TOKEN, token),
            None => spec,
        }
    }

    async fn checked(&self, spec: CommandSpec) -> Result<CommandOutput> {
        Ok(self.runner.run_checked(&spec).await?)
    }

    /// `supabase --version`, used as a tool precondition.
    pub async fn version(&self) -> Result<String> {
        let out = self.checked(CommandSpec::new("supabase", ["--version"])).await?;
        Ok(out.stdout.trim().to_string())
    }

    /// True when `supabase status` reports a running local stack.
    pub async fn is_running(&self) -> Result<bool> {
        let out = self.runner.run(&self.spec(["status"])).await?;
        Ok(out.success())
    }

    pub async fn start(&self) -> Result<()> {
        let spec = self
            .spec(["start"])
            .timeout(self.config.health.start_command_timeout());
        self.checked(spec).await?;
        Ok(())
    }

    /// Stop the local stack, keeping its volumes.
    pub async fn stop(&self) -> Result<()> {
        self.checked(self.spec(["stop"])).await?;
        Ok(())
    }

    /// Stop the local stack and discard its volumes.
    pub async fn stop_no_backup(&self) -> Result<()> {
        self.checked(self.spec(["stop", "--no-backup"])).await?;
        Ok(())
    }

    /// Recreate the local database from migrations and seed data.
    pub async fn db_reset(&self) -> Result<()> {
        self.checked(self.spec(["db", "reset"])).await?;
        Ok(())
    }

    /// Apply local migrations to the linked remote project.
    pub async fn db_push(&self) -> Result<()> {
        self.checked(self.spec(["db", "push"])).await?;
        Ok(())
    }

    /// Capture the remote schema as a new local migration.
    pub async fn db_pull(&self) -> Result<()> {
        self.checked(self.spec(["db", "pull"])).await?;
        Ok(())
    }

    pub async fn link(&self, project_ref: &str) -> Result<()> {
        self.checked(self.spec(["link", "--project-ref", project_ref]))
            .await?;
        Ok(())
    }

    /// Dump `conn` into `file`. Data-only dumps are plain INSERT statements.
    pub async fn dump(&self, conn: &str, data_only: bool, file: &Path) -> Result<()> {
        let file = file.to_string_lossy().into_owned();
        let mut args = vec!["db", "dump", "--db-url", conn];
        if data_only {
            args.push("--data-only");
        }
        args.extend(["-f", file.as_str()]);
        self.checked(self.spec(args)).await?;
        Ok(())
    }

    /// Connection string of the local database.
    ///
    /// Read from `supabase status -o env`; falls back to the conventional
    /// local URL when the stack does not report one.
    pub async fn local_db_url(&self) -> String {
        match self.runner.run(&self.spec(["status", "-o", "env"])).await {
            Ok(out) if out.success() => parse_status_db_url(&out.stdout),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("Could not read local status: {}", e);
                None
            }
        }
        .unwrap_or_else(|| self.config.default_local_db_url())
    }

    /// Connection string for `target`, if one can be resolved.
    pub async fn connection_for(&self, target: DbTarget) -> Option<String> {
        match target {
            DbTarget::Local => Some(self.local_db_url().await),
            DbTarget::Remote => self.config.remote_db_url().map(str::to_string),
        }
    }

    /// Pipe an SQL file into `conn`, stopping at the first error.
    pub async fn psql_file(&self, conn: &str, file: &Path) -> Result<CommandOutput> {
        let file = file.to_string_lossy().into_owned();
        let spec = CommandSpec::new(
            "psql",
            [conn, "-v", "ON_ERROR_STOP=1", "-f", file.as_str()],
        )
        .current_dir(&self.config.project_root);
        Ok(self.runner.run(&spec).await?)
    }
}

fn db_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^\s*DB_URL\s*=\s*"?([^"\r\n]+)"?\s*$"#).expect("static regex is valid")
    })
}

/// Extract `DB_URL` from `supabase status -o env` output.
pub fn parse_status_db_url(env_output: &str) -> Option<String> {
    db_url_regex()
        .captures(env_output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}
