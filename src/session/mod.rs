use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// The operation requested for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Push,
    Pull,
    Status,
    Backup,
    Restore,
    Reset,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verb::Push => "push",
            Verb::Pull => "pull",
            Verb::Status => "status",
            Verb::Backup => "backup",
            Verb::Restore => "restore",
            Verb::Reset => "reset",
        })
    }
}

/// Per-invocation options. Created by the dispatcher, discarded after the run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSession {
    pub verb: Verb,
    /// Record mutating steps without running them.
    pub dry_run: bool,
    /// Answer every confirmation with yes.
    pub force: bool,
    pub restore_target: Option<PathBuf>,
    pub started_at: DateTime<Utc>,
}

impl SyncSession {
    pub fn new(verb: Verb) -> Self {
        Self {
            verb,
            dry_run: false,
            force: false,
            restore_target: None,
            started_at: Utc::now(),
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn restore_target(mut self, path: impl Into<PathBuf>) -> Self {
        self.restore_target = Some(path.into());
        self
    }
}
