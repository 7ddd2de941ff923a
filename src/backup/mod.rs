//! Database and Git-state snapshots.
//!
//! Snapshots are plain files in the backup directory, named
//! `<prefix>_<YYYYMMDD_HHMMSS>[_<n>].<ext>`; the name is the only metadata.
//! The manager never deletes a snapshot. [`BackupManager::retention_report`]
//! only lists what is past the configured retention.

use crate::backend::{DbTarget, Supabase};
use crate::config::{BackupStrategy, ProjectConfig};
use crate::error::{Error, Result};
use crate::vcs::Git;
use chrono::{Duration as ChronoDuration, Local, NaiveDateTime};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Source of the current time, replaceable in tests.
pub type Clock = fn() -> NaiveDateTime;

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackupKind {
    /// Schema and data.
    Full,
    /// Rows only, as INSERT statements.
    DataOnly,
    /// Recent commits, branch and working tree status.
    GitState,
}

impl BackupKind {
    pub fn from_strategy(strategy: BackupStrategy) -> Self {
        match strategy {
            BackupStrategy::Full => BackupKind::Full,
            BackupStrategy::DataOnly => BackupKind::DataOnly,
        }
    }
}

impl fmt::Display for BackupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackupKind::Full => "full",
            BackupKind::DataOnly => "data-only",
            BackupKind::GitState => "git-state",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupSource {
    Local,
    Remote,
    Git,
}

impl fmt::Display for BackupSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackupSource::Local => "local",
            BackupSource::Remote => "remote",
            BackupSource::Git => "git",
        })
    }
}

impl From<DbTarget> for BackupSource {
    fn from(target: DbTarget) -> Self {
        match target {
            DbTarget::Local => BackupSource::Local,
            DbTarget::Remote => BackupSource::Remote,
        }
    }
}

/// One snapshot on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupRecord {
    pub kind: BackupKind,
    pub source: BackupSource,
    pub created_at: NaiveDateTime,
    pub path: PathBuf,
    /// Collision counter from the file name; 0 when absent.
    #[serde(skip)]
    sequence: u32,
}

impl BackupRecord {
    /// True for SQL snapshots that `restore` can replay.
    pub fn is_restorable(&self) -> bool {
        self.kind != BackupKind::GitState
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

fn prefix(kind: BackupKind, source: BackupSource) -> Option<&'static str> {
    match (kind, source) {
        (BackupKind::Full, BackupSource::Local) => Some("full_local"),
        (BackupKind::DataOnly, BackupSource::Local) => Some("data_local"),
        (BackupKind::Full, BackupSource::Remote) => Some("full_remote"),
        (BackupKind::DataOnly, BackupSource::Remote) => Some("data_remote"),
        (BackupKind::GitState, _) => Some("git_state"),
        (_, BackupSource::Git) => None,
    }
}

fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(full_local|data_local|full_remote|data_remote|git_state)_(\d{8}_\d{6})(?:_(\d+))?\.(sql|txt)$",
        )
        .expect("static regex pattern is valid")
    })
}

/// Parse a snapshot file name back into its parts.
pub fn parse_backup_name(path: &Path) -> Option<BackupRecord> {
    let name = path.file_name()?.to_str()?;
    let caps = name_regex().captures(name)?;
    let (kind, source) = match &caps[1] {
        "full_local" => (BackupKind::Full, BackupSource::Local),
        "data_local" => (BackupKind::DataOnly, BackupSource::Local),
        "full_remote" => (BackupKind::Full, BackupSource::Remote),
        "data_remote" => (BackupKind::DataOnly, BackupSource::Remote),
        _ => (BackupKind::GitState, BackupSource::Git),
    };
    let created_at = NaiveDateTime::parse_from_str(&caps[2], TIMESTAMP_FORMAT).ok()?;
    let sequence = caps
        .get(3)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    Some(BackupRecord {
        kind,
        source,
        created_at,
        path: path.to_path_buf(),
        sequence,
    })
}

pub struct BackupManager {
    config: Arc<ProjectConfig>,
    supabase: Supabase,
    git: Git,
    clock: Clock,
}

impl BackupManager {
    pub fn new(config: Arc<ProjectConfig>, supabase: Supabase, git: Git) -> Self {
        Self {
            config,
            supabase,
            git,
            clock: local_now,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn directory(&self) -> PathBuf {
        self.config.backup_dir()
    }

    /// Take a snapshot. Every failure is reported as [`Error::BackupUnavailable`].
    pub async fn create_snapshot(
        &self,
        kind: BackupKind,
        source: BackupSource,
    ) -> Result<BackupRecord> {
        let result = match kind {
            BackupKind::GitState => self.git_snapshot().await,
            BackupKind::Full | BackupKind::DataOnly => {
                let target = match source {
                    BackupSource::Local => DbTarget::Local,
                    BackupSource::Remote => DbTarget::Remote,
                    BackupSource::Git => {
                        return Err(Error::BackupUnavailable(format!(
                            "a {} snapshot needs a database source",
                            kind
                        )))
                    }
                };
                self.db_snapshot(kind, target).await
            }
        };

        match result {
            Ok(record) => {
                tracing::info!("Created {} backup: {}", record.kind, record.path.display());
                Ok(record)
            }
            Err(Error::BackupUnavailable(msg)) => Err(Error::BackupUnavailable(msg)),
            Err(e) => Err(Error::BackupUnavailable(format!(
                "{} {} snapshot failed: {}",
                source, kind, e
            ))),
        }
    }

    /// Reserve a fresh file name, creating the backup directory if needed.
    fn reserve(&self, prefix: &str, extension: &str) -> Result<(PathBuf, NaiveDateTime)> {
        let dir = self.directory();
        fs::create_dir_all(&dir)?;

        let now = (self.clock)();
        let stem = format!("{}_{}", prefix, now.format(TIMESTAMP_FORMAT));
        let mut counter = 0u32;
        loop {
            let name = if counter == 0 {
                format!("{}.{}", stem, extension)
            } else {
                format!("{}_{}.{}", stem, counter, extension)
            };
            let path = dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok((path, now)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => counter += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn db_snapshot(&self, kind: BackupKind, target: DbTarget) -> Result<BackupRecord> {
        let source = BackupSource::from(target);
        let conn = self.supabase.connection_for(target).await.ok_or_else(|| {
            Error::BackupUnavailable(format!(
                "no {} database connection configured (set SUPABASE_DB_URL)",
                target
            ))
        })?;

        let prefix = prefix(kind, source).unwrap_or("full_local");
        let (path, created_at) = self.reserve(prefix, "sql")?;

        if let Err(e) = self
            .supabase
            .dump(&conn, kind == BackupKind::DataOnly, &path)
            .await
        {
            let _ = fs::remove_file(&path);
            return Err(e);
        }

        Ok(BackupRecord {
            kind,
            source,
            created_at,
            path,
            sequence: 0,
        })
    }

    async fn git_snapshot(&self) -> Result<BackupRecord> {
        let branch = self
            .git
            .current_branch()
            .await
            .unwrap_or_else(|_| "unknown".to_string());
        // A repository without commits has no log yet.
        let log = self
            .git
            .log_oneline(self.config.backup.git_log_depth)
            .await
            .unwrap_or_default();
        let status = self.git.status_porcelain().await?;

        let (path, created_at) = self.reserve("git_state", "txt")?;
        let mut file = OpenOptions::new().write(true).truncate(true).open(&path)?;
        writeln!(file, "# branch: {}", branch)?;
        writeln!(file, "# taken: {}", created_at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(file)?;
        writeln!(file, "## last {} commits", self.config.backup.git_log_depth)?;
        for line in &log {
            writeln!(file, "{}", line)?;
        }
        writeln!(file)?;
        writeln!(file, "## status")?;
        if status.is_empty() {
            writeln!(file, "(clean)")?;
        }
        for line in &status {
            writeln!(file, "{}", line)?;
        }

        Ok(BackupRecord {
            kind: BackupKind::GitState,
            source: BackupSource::Git,
            created_at,
            path,
            sequence: 0,
        })
    }

    /// Replay an SQL snapshot into `target`. Not transactional.
    pub async fn restore_snapshot(&self, path: &Path, target: DbTarget) -> Result<()> {
        if !path.is_file() {
            return Err(Error::BackupFileNotFound(path.to_path_buf()));
        }

        let conn = self.supabase.connection_for(target).await.ok_or_else(|| {
            Error::RestoreTargetMissing(format!(
                "no {} database connection configured (set SUPABASE_DB_URL)",
                target
            ))
        })?;

        tracing::info!("Restoring {} into {} database", path.display(), target);
        let output = self
            .supabase
            .psql_file(&conn, path)
            .await
            .map_err(|e| Error::RestoreFailed {
                file: path.to_path_buf(),
                reason: e.to_string(),
                safety_backup: None,
            })?;

        if !output.success() {
            let reason = if output.stderr.trim().is_empty() {
                format!("psql exited with {:?}", output.exit_code)
            } else {
                output.stderr.trim().to_string()
            };
            return Err(Error::RestoreFailed {
                file: path.to_path_buf(),
                reason,
                safety_backup: None,
            });
        }
        Ok(())
    }

    /// Snapshots in the backup directory, newest first.
    pub fn list_backups(&self) -> Result<Vec<BackupRecord>> {
        let dir = self.directory();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records: Vec<BackupRecord> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| parse_backup_name(&entry.path()))
            .collect();
        records.sort_by(|a, b| {
            (b.created_at, b.sequence)
                .cmp(&(a.created_at, a.sequence))
                .then_with(|| a.path.cmp(&b.path))
        });
        Ok(records)
    }

    /// Snapshots older than `backup.retention_days`. Nothing is deleted.
    pub fn retention_report(&self) -> Result<Vec<BackupRecord>> {
        let cutoff =
            (self.clock)() - ChronoDuration::days(i64::from(self.config.backup.retention_days));
        Ok(self
            .list_backups()?
            .into_iter()
            .filter(|r| r.created_at < cutoff)
            .collect())
    }

    /// Most recent snapshot that `restore` can replay.
    pub fn latest_backup(&self) -> Option<BackupRecord> {
        self.list_backups()
            .ok()?
            .into_iter()
            .find(BackupRecord::is_restorable)
    }
}
