// thiserror struct variants trip unused_assignments on fields read only by Display.
#![allow(unused_assignments)]

use crate::exec::ExecError;
use crate::sync::Step;
use miette::Diagnostic;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Precondition failed: {0}")]
    #[diagnostic(
        code(sbsync::precondition),
        help("Run `sbsync validate` to check tools and credentials")
    )]
    Precondition(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    #[diagnostic(
        code(sbsync::config::validation),
        help("Fix every listed entry in supabase-sync.yaml, then run `sbsync validate`")
    )]
    InvalidConfig(Vec<String>),

    #[error("Supabase runtime did not become ready after {attempts} attempts ({}s)", .waited.as_secs())]
    #[diagnostic(
        code(sbsync::runtime::unavailable),
        help("Check that Docker is running with `docker ps`, then try `supabase start` manually")
    )]
    RuntimeUnavailable { attempts: u32, waited: Duration },

    #[error("Backup unavailable: {0}")]
    #[diagnostic(code(sbsync::backup::unavailable))]
    BackupUnavailable(String),

    #[error("Restore of '{}' failed: {reason}", .file.display())]
    #[diagnostic(
        code(sbsync::restore::failed),
        help("The target may be partially restored. Inspect it before retrying")
    )]
    RestoreFailed {
        file: PathBuf,
        reason: String,
        /// Snapshot of the local database taken just before the replay.
        safety_backup: Option<PathBuf>,
    },

    #[error("No restore target: {0}")]
    #[diagnostic(
        code(sbsync::restore::target_missing),
        help("Start the local stack with `supabase start` so its connection can be resolved")
    )]
    RestoreTargetMissing(String),

    #[error("Backup file not found: {}", .0.display())]
    #[diagnostic(
        code(sbsync::restore::not_found),
        help("List available backups with `sbsync status`")
    )]
    BackupFileNotFound(PathBuf),

    #[error("Unresolved merge conflicts require manual resolution:\n{}", .paths.iter().map(|p| format!("  - {}", p)).collect::<Vec<_>>().join("\n"))]
    #[diagnostic(
        code(sbsync::conflict::unresolved),
        help("Resolve the listed files, `git add` them and commit, then re-run `sbsync pull`")
    )]
    UnresolvedConflict { paths: Vec<String> },

    #[error(
        "{} failed after {} completed step(s) [{}]: {cause}",
        .failed_step,
        .completed.len(),
        .completed.iter().map(|s| s.name()).collect::<Vec<_>>().join(", ")
    )]
    #[diagnostic(code(sbsync::sync::partial))]
    PartialSyncFailure {
        failed_step: Step,
        completed: Vec<Step>,
        cause: Box<Error>,
        last_backup: Option<PathBuf>,
        /// Stash still holding the user's uncommitted changes.
        stash: Option<String>,
    },

    #[error("{0}")]
    Command(#[from] ExecError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns a helpful suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Error::Precondition(msg) if msg.contains("SUPABASE_ACCESS_TOKEN") => Some(
                "Export a personal access token:\n\n    export SUPABASE_ACCESS_TOKEN=sbp_...".to_string(),
            ),
            Error::Precondition(_) => {
                Some("Install the missing tool, then run `sbsync validate`".to_string())
            }
            Error::Config(msg) if msg.contains("Could not find") => {
                Some("Create a starter configuration with: sbsync setup".to_string())
            }
            Error::Config(_) | Error::InvalidConfig(_) => {
                Some("Validate your config with: sbsync validate".to_string())
            }
            Error::RuntimeUnavailable { .. } => Some(
                "Check that Docker is running (docker ps). If ports are busy, stop other Supabase projects with `supabase stop --project-id <id>`".to_string(),
            ),
            Error::RestoreTargetMissing(_) => {
                Some("Start the local stack with: supabase start".to_string())
            }
            Error::BackupFileNotFound(_) => {
                Some("Run `sbsync status` to list available backups".to_string())
            }
            Error::UnresolvedConflict { .. } => Some(
                "Edit the conflicted files, `git add` them, commit, then re-run `sbsync pull`".to_string(),
            ),
            Error::RestoreFailed {
                safety_backup: Some(backup),
                ..
            } => Some(format!(
                "The local database may be partially restored. To roll back to the snapshot taken before the restore:\n    sbsync restore {}",
                backup.display()
            )),
            Error::RestoreFailed { .. } => Some(
                "The local database may be partially restored; no safety snapshot was taken. Inspect it before retrying".to_string(),
            ),
            Error::PartialSyncFailure {
                cause,
                last_backup,
                stash,
                ..
            } => {
                let mut lines: Vec<String> = cause.suggestion().into_iter().collect();
                if let Some(stash) = stash {
                    lines.push(format!(
                        "Your uncommitted changes are in stash '{}'; run `git stash pop` to restore them",
                        stash
                    ));
                }
                if let Some(backup) = last_backup {
                    lines.push(format!(
                        "Most recent backup for manual recovery: {}\n    sbsync restore {}",
                        backup.display(),
                        backup.display()
                    ));
                }
                if lines.is_empty() {
                    None
                } else {
                    Some(lines.join("\n"))
                }
            }
            Error::Command(e) if e.is_not_found() => Some(format!(
                "'{}' is not installed or not on PATH",
                e.command().split_whitespace().next().unwrap_or_default()
            )),
            _ => None,
        }
    }

    /// Formats the error with its suggestion (if any) for user-friendly display.
    pub fn with_suggestion(&self) -> String {
        match self.suggestion() {
            Some(suggestion) => format!("{}\n\nHint: {}", self, suggestion),
            None => self.to_string(),
        }
    }

    /// The innermost cause, unwrapping `PartialSyncFailure`.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::PartialSyncFailure { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}
