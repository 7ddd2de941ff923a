//! Push, pull and reset state machines.
//!
//! Each run records its [`Step`]s in a [`SyncReport`]. Runs are fail-stop:
//! the first fatal step error ends the run with
//! [`Error::PartialSyncFailure`] naming the failed step, the steps that
//! completed, and the most recent backup. Best-effort steps (backups, data
//! export/import, stash restore) are downgraded to warnings instead.
//!
//! Pre-flight failures (missing tools or credential, a missing restore file)
//! surface directly since nothing has changed yet.
//!
//! In dry-run mode read-only steps still run; every mutating step is recorded
//! as [`StepStatus::Planned`] and its command is never issued.

pub mod confirm;
mod status;
mod step;

pub use confirm::{AssumeYes, Confirm, FixedAnswer, TerminalConfirm};
pub use status::{StatusReport, ToolCheck};
pub use step::{Step, StepRecord, StepStatus, SyncOutcome, SyncReport};

use crate::backend::{DbTarget, Supabase};
use crate::backup::{BackupKind, BackupManager, BackupSource, Clock};
use crate::config::{DataStrategy, MigrationStrategy, ProjectConfig};
use crate::conflict::ConflictResolver;
use crate::error::{Error, Result};
use crate::exec::{CommandRunner, ExecError, SystemRunner};
use crate::health::{HealthMonitor, NetworkProbe, PortProbe, ServiceProbe, SystemPortProbe};
use crate::session::{SyncSession, Verb};
use crate::vcs::Git;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Message attached to the stash made before a pull.
pub const STASH_MESSAGE: &str = "sbsync: auto-stash before pull";

/// Builder for [`SyncEngine`]. Every seam defaults to its production implementation.
pub struct SyncEngineBuilder {
    config: Arc<ProjectConfig>,
    session: SyncSession,
    runner: Option<Arc<dyn CommandRunner>>,
    ports: Option<Arc<dyn PortProbe>>,
    probe: Option<Arc<dyn ServiceProbe>>,
    confirm: Option<Arc<dyn Confirm>>,
    clock: Option<Clock>,
}

impl SyncEngineBuilder {
    pub fn runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    pub fn port_probe(mut self, ports: Arc<dyn PortProbe>) -> Self {
        self.ports = Some(ports);
        self
    }

    pub fn service_probe(mut self, probe: Arc<dyn ServiceProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Confirmation capability. Defaults to [`AssumeYes`] under `--force`,
    /// otherwise [`TerminalConfirm`].
    pub fn confirm(mut self, confirm: Arc<dyn Confirm>) -> Self {
        self.confirm = Some(confirm);
        self
    }

    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<SyncEngine> {
        let runner: Arc<dyn CommandRunner> =
            self.runner.unwrap_or_else(|| Arc::new(SystemRunner::new()));
        let ports: Arc<dyn PortProbe> = match self.ports {
            Some(ports) => ports,
            None => Arc::new(SystemPortProbe::new(runner.clone())),
        };
        let probe: Arc<dyn ServiceProbe> = match self.probe {
            Some(probe) => probe,
            None => Arc::new(NetworkProbe::new()?),
        };
        let confirm: Arc<dyn Confirm> = match self.confirm {
            Some(confirm) => confirm,
            None if self.session.force => Arc::new(AssumeYes),
            None => Arc::new(TerminalConfirm::new()),
        };

        let config = self.config;
        let git = Git::new(runner.clone(), config.project_root.clone());
        let supabase = Supabase::new(runner, config.clone());
        let health = HealthMonitor::new(config.clone(), supabase.clone(), ports, probe);
        let mut backups = BackupManager::new(config.clone(), supabase.clone(), git.clone());
        if let Some(clock) = self.clock {
            backups = backups.with_clock(clock);
        }
        let resolver = ConflictResolver::new(git.clone(), config.rule_set());

        Ok(SyncEngine {
            config,
            session: self.session,
            git,
            supabase,
            health,
            backups,
            resolver,
            confirm,
        })
    }
}

/// Drives one sync session against the working tree and the Supabase project.
pub struct SyncEngine {
    config: Arc<ProjectConfig>,
    session: SyncSession,
    git: Git,
    supabase: Supabase,
    health: HealthMonitor,
    backups: BackupManager,
    resolver: ConflictResolver,
    confirm: Arc<dyn Confirm>,
}

impl SyncEngine {
    pub fn builder(config: Arc<ProjectConfig>, session: SyncSession) -> SyncEngineBuilder {
        SyncEngineBuilder {
            config,
            session,
            runner: None,
            ports: None,
            probe: None,
            confirm: None,
            clock: None,
        }
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn session(&self) -> &SyncSession {
        &self.session
    }

    pub fn health(&self) -> &HealthMonitor {
        &self.health
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    fn dry_run(&self) -> bool {
        self.session.dry_run
    }

    /// Run a fatal step, recording its outcome and wrapping its error.
    async fn run_step<F>(&self, report: &mut SyncReport, step: Step, fut: F) -> Result<()>
    where
        F: Future<Output = Result<StepStatus>>,
    {
        tracing::debug!("Starting step {}", step);
        match fut.await {
            Ok(status) => {
                report.record(step, status);
                Ok(())
            }
            Err(cause) => Err(self.fail(report, step, cause)),
        }
    }

    fn fail(&self, report: &mut SyncReport, step: Step, cause: Error) -> Error {
        report.record(step, StepStatus::Failed(cause.to_string()));
        let last_backup = report
            .rollback_point
            .clone()
            .or_else(|| self.backups.latest_backup().map(|r| r.path));
        Error::PartialSyncFailure {
            failed_step: step,
            completed: report.completed_steps(),
            cause: Box::new(cause),
            last_backup,
            stash: report.stash.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Shared steps
    // ------------------------------------------------------------------

    /// Tools and credential. Runs in dry-run too.
    async fn check_prereqs(&self, report: &mut SyncReport) -> Result<()> {
        let result = self.prereqs().await;
        match result {
            Ok(()) => {
                report.record(Step::CheckPrereqs, StepStatus::Completed);
                Ok(())
            }
            Err(e) => {
                report.record(Step::CheckPrereqs, StepStatus::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn prereqs(&self) -> Result<()> {
        if self.config.credential().is_none() {
            return Err(Error::Precondition(
                "no Supabase access token; set SUPABASE_ACCESS_TOKEN".to_string(),
            ));
        }
        self.git
            .version()
            .await
            .map_err(|e| Error::Precondition(format!("git is not available: {}", e)))?;
        self.supabase
            .version()
            .await
            .map_err(|e| Error::Precondition(format!("supabase CLI is not available: {}", e)))?;
        Ok(())
    }

    /// Git-state snapshot plus a database snapshot of local. Best-effort.
    async fn backup_step(&self, report: &mut SyncReport) {
        let kind = BackupKind::from_strategy(self.config.backup.strategy);
        if self.dry_run() {
            report.record(
                Step::Backup,
                StepStatus::Planned(format!("git-state snapshot + {} snapshot of local", kind)),
            );
            return;
        }

        let mut problems = Vec::new();
        match self
            .backups
            .create_snapshot(BackupKind::GitState, BackupSource::Git)
            .await
        {
            Ok(record) => report.backups.push(record.path),
            Err(e) => problems.push(e.to_string()),
        }
        match self.backups.create_snapshot(kind, BackupSource::Local).await {
            Ok(record) => {
                report.rollback_point = Some(record.path.clone());
                report.backups.push(record.path);
            }
            Err(e) => {
                problems.push(e.to_string());
                report.warn("No clean rollback point: the local database snapshot failed");
            }
        }

        if problems.is_empty() {
            report.record(Step::Backup, StepStatus::Completed);
        } else {
            report.record(Step::Backup, StepStatus::Warned(problems.join("; ")));
        }
    }

    async fn start_backend(&self) -> Result<StepStatus> {
        if self.dry_run() {
            return Ok(StepStatus::Planned("supabase start".to_string()));
        }
        self.health.ensure_running().await?;
        Ok(StepStatus::Completed)
    }

    /// Ask unless forced. `false` means the user declined.
    async fn consent(&self, prompt: &str) -> bool {
        self.session.force || self.confirm.confirm(prompt).await
    }

    // ------------------------------------------------------------------
    // Push
    // ------------------------------------------------------------------

    /// Commit and push the working tree, then the schema and data.
    pub async fn push(&self) -> Result<SyncOutcome> {
        let mut report = SyncReport::new(Verb::Push, self.dry_run());
        tracing::info!("Starting push");

        self.check_prereqs(&mut report).await?;
        self.backup_step(&mut report).await;

        self.run_step(&mut report, Step::CommitLocalChanges, self.commit_local_changes())
            .await?;
        self.run_step(&mut report, Step::PushVcs, self.push_vcs())
            .await?;
        self.run_step(&mut report, Step::PushBackendSchema, self.push_schema())
            .await?;

        let export = self.export_data(&mut report, Step::ExportLocalData, DbTarget::Local).await;
        self.import_data(&mut report, Step::ImportDataToRemote, export.as_deref(), DbTarget::Remote)
            .await;

        match self.git.last_commit().await {
            Ok(commit) => {
                report.last_commit = commit;
                report.record(Step::ReportStatus, StepStatus::Completed);
            }
            Err(e) => report.record(Step::ReportStatus, StepStatus::Warned(e.to_string())),
        }

        Ok(SyncOutcome::Completed(report))
    }

    async fn commit_local_changes(&self) -> Result<StepStatus> {
        let changes = self.git.status_porcelain().await?;
        if changes.is_empty() {
            return Ok(StepStatus::Skipped("working tree clean".to_string()));
        }
        let message = &self.config.git.commit_message;
        if self.dry_run() {
            return Ok(StepStatus::Planned(format!(
                "git add -A && git commit -m \"{}\" ({} change(s))",
                message,
                changes.len()
            )));
        }
        self.git.add_all().await?;
        self.git.commit(message).await?;
        Ok(StepStatus::Completed)
    }

    async fn push_vcs(&self) -> Result<StepStatus> {
        let git = &self.config.git;
        if self.dry_run() {
            return Ok(StepStatus::Planned(format!(
                "git push {} {}",
                git.remote, git.branch
            )));
        }
        self.git.push(&git.remote, &git.branch).await?;
        Ok(StepStatus::Completed)
    }

    async fn push_schema(&self) -> Result<StepStatus> {
        if self.config.sync.migration_strategy == MigrationStrategy::Manual {
            return Ok(StepStatus::Skipped("migration_strategy: manual".to_string()));
        }
        if self.dry_run() {
            return Ok(StepStatus::Planned("supabase db push".to_string()));
        }
        self.supabase.db_push().await?;
        Ok(StepStatus::Completed)
    }

    /// Data-only snapshot of `source`, used as the import file. Best-effort.
    async fn export_data(
        &self,
        report: &mut SyncReport,
        step: Step,
        source: DbTarget,
    ) -> Option<PathBuf> {
        if self.config.sync.data_strategy == DataStrategy::None {
            report.record(step, StepStatus::Skipped("data_strategy: none".to_string()));
            return None;
        }
        if source == DbTarget::Remote && self.config.remote_db_url().is_none() {
            report.record(
                step,
                StepStatus::Skipped("no remote database connection configured".to_string()),
            );
            return None;
        }
        if self.dry_run() {
            report.record(
                step,
                StepStatus::Planned(format!("supabase db dump --data-only ({})", source)),
            );
            return None;
        }

        match self
            .backups
            .create_snapshot(BackupKind::DataOnly, source.into())
            .await
        {
            Ok(record) => {
                report.record(step, StepStatus::Completed);
                Some(record.path)
            }
            Err(e) => {
                report.record(step, StepStatus::Warned(e.to_string()));
                None
            }
        }
    }

    /// Replay an exported data file into `target`. Best-effort.
    async fn import_data(
        &self,
        report: &mut SyncReport,
        step: Step,
        export: Option<&Path>,
        target: DbTarget,
    ) {
        if self.config.sync.data_strategy == DataStrategy::None {
            report.record(step, StepStatus::Skipped("data_strategy: none".to_string()));
            return;
        }
        if self.config.remote_db_url().is_none() {
            report.record(
                step,
                StepStatus::Skipped("no remote database connection configured".to_string()),
            );
            return;
        }
        if self.dry_run() {
            report.record(
                step,
                StepStatus::Planned(format!("psql <{}> -v ON_ERROR_STOP=1 -f <export>", target)),
            );
            return;
        }
        let Some(export) = export else {
            report.record(step, StepStatus::Skipped("no data export".to_string()));
            return;
        };
        let Some(conn) = self.supabase.connection_for(target).await else {
            report.record(
                step,
                StepStatus::Skipped(format!("no {} database connection", target)),
            );
            return;
        };

        match self.supabase.psql_file(&conn, export).await {
            Ok(out) if out.success() => report.record(step, StepStatus::Completed),
            Ok(out) => {
                let err = ExecError::failed("psql", &out);
                report.record(step, StepStatus::Warned(err.to_string()));
            }
            Err(e) => report.record(step, StepStatus::Warned(e.to_string())),
        }
    }

    // ------------------------------------------------------------------
    // Pull
    // ------------------------------------------------------------------

    /// Bring in remote commits, rebuild the local database from them and
    /// copy remote data down.
    pub async fn pull(&self) -> Result<SyncOutcome> {
        let mut report = SyncReport::new(Verb::Pull, self.dry_run());
        tracing::info!("Starting pull");

        self.check_prereqs(&mut report).await?;
        self.backup_step(&mut report).await;

        // StashIfDirty. Declining cancels before any mutation.
        let dirty = match self.git.status_porcelain().await {
            Ok(changes) => changes,
            Err(e) => return Err(self.fail(&mut report, Step::StashIfDirty, e)),
        };
        if dirty.is_empty() {
            report.record(
                Step::StashIfDirty,
                StepStatus::Skipped("working tree clean".to_string()),
            );
        } else if self.dry_run() {
            report.record(
                Step::StashIfDirty,
                StepStatus::Planned(format!("git stash push -u -m \"{}\"", STASH_MESSAGE)),
            );
        } else {
            let prompt = format!(
                "Working tree has {} uncommitted change(s). Stash them before pulling?",
                dirty.len()
            );
            if !self.consent(&prompt).await {
                report.record(
                    Step::StashIfDirty,
                    StepStatus::Skipped("declined by user".to_string()),
                );
                tracing::info!("Pull cancelled");
                return Ok(SyncOutcome::Cancelled(report));
            }
            if let Err(e) = self.git.stash_push(STASH_MESSAGE).await {
                return Err(self.fail(&mut report, Step::StashIfDirty, e));
            }
            report.stash = Some(STASH_MESSAGE.to_string());
            report.record(Step::StashIfDirty, StepStatus::Completed);
        }

        // PullVcs + ResolveConflicts
        let conflicts = match self.pull_vcs().await {
            Ok((status, conflicts)) => {
                report.record(Step::PullVcs, status);
                conflicts
            }
            Err(e) => return Err(self.fail(&mut report, Step::PullVcs, e)),
        };
        if conflicts.is_empty() {
            report.record(
                Step::ResolveConflicts,
                StepStatus::Skipped("no conflicts".to_string()),
            );
        } else {
            match self.resolver.resolve(&conflicts).await {
                Ok(summary) => {
                    report.conflicts = Some(summary);
                    report.record(Step::ResolveConflicts, StepStatus::Completed);
                }
                Err(e) => return Err(self.fail(&mut report, Step::ResolveConflicts, e)),
            }
        }

        self.run_step(&mut report, Step::ResetLocalBackend, self.reset_local_backend())
            .await?;
        self.run_step(&mut report, Step::PullBackendSchema, self.pull_schema())
            .await?;

        let export = self
            .export_data(&mut report, Step::ExportRemoteData, DbTarget::Remote)
            .await;
        self.import_data(&mut report, Step::ImportDataToLocal, export.as_deref(), DbTarget::Local)
            .await;

        self.run_step(&mut report, Step::StartBackend, self.start_backend())
            .await?;

        if self.dry_run() {
            let status = self.health.check_health().await;
            let step_status = if status.is_healthy() {
                StepStatus::Completed
            } else {
                StepStatus::Warned("local stack is not healthy".to_string())
            };
            report.health = Some(status);
            report.record(Step::VerifyHealth, step_status);
        } else {
            match self.health.verify_health().await {
                Ok(status) => {
                    report.health = Some(status);
                    report.record(Step::VerifyHealth, StepStatus::Completed);
                }
                Err(e) => return Err(self.fail(&mut report, Step::VerifyHealth, e)),
            }
        }

        self.offer_stash_restore(&mut report, !dirty.is_empty()).await;

        Ok(SyncOutcome::Completed(report))
    }

    /// Returns the step status and the paths left conflicted by the merge.
    async fn pull_vcs(&self) -> Result<(StepStatus, Vec<String>)> {
        let git = &self.config.git;
        if self.dry_run() {
            return Ok((
                StepStatus::Planned(format!("git pull --no-rebase {} {}", git.remote, git.branch)),
                Vec::new(),
            ));
        }

        let output = self.git.pull(&git.remote, &git.branch).await?;
        if output.success() {
            return Ok((StepStatus::Completed, Vec::new()));
        }

        let conflicts = self.git.conflicted_paths().await?;
        if conflicts.is_empty() {
            let command = format!("git pull --no-rebase {} {}", git.remote, git.branch);
            return Err(ExecError::failed(command, &output).into());
        }
        Ok((
            StepStatus::Warned(format!(
                "merge stopped with {} conflicted path(s)",
                conflicts.len()
            )),
            conflicts,
        ))
    }

    async fn reset_local_backend(&self) -> Result<StepStatus> {
        if self.dry_run() {
            return Ok(StepStatus::Planned("supabase db reset".to_string()));
        }
        self.health.ensure_running().await?;
        self.supabase.db_reset().await?;
        Ok(StepStatus::Completed)
    }

    async fn pull_schema(&self) -> Result<StepStatus> {
        if self.config.sync.migration_strategy == MigrationStrategy::Manual {
            return Ok(StepStatus::Skipped("migration_strategy: manual".to_string()));
        }
        if self.dry_run() {
            return Ok(StepStatus::Planned("supabase db pull".to_string()));
        }
        self.supabase.db_pull().await?;
        Ok(StepStatus::Completed)
    }

    async fn offer_stash_restore(&self, report: &mut SyncReport, was_dirty: bool) {
        if self.dry_run() && was_dirty {
            report.record(
                Step::OfferStashRestore,
                StepStatus::Planned("git stash pop".to_string()),
            );
            return;
        }
        if report.stash.is_none() {
            report.record(
                Step::OfferStashRestore,
                StepStatus::Skipped("nothing stashed".to_string()),
            );
            return;
        }
        if !self.consent("Restore the changes stashed before the pull?").await {
            report.record(
                Step::OfferStashRestore,
                StepStatus::Skipped(format!(
                    "kept in stash '{}'; run `git stash pop` to restore",
                    STASH_MESSAGE
                )),
            );
            return;
        }
        if let Err(e) = self.git.stash_pop().await {
            report.warn(format!(
                "Your changes are still in the stash '{}'; resolve and run `git stash pop`",
                STASH_MESSAGE
            ));
            report.record(Step::OfferStashRestore, StepStatus::Warned(e.to_string()));
            return;
        }
        report.stash = None;
        report.record(Step::OfferStashRestore, StepStatus::Completed);
    }

    // ------------------------------------------------------------------
    // Reset
    // ------------------------------------------------------------------

    /// Rebuild the local stack from the remote schema. Local data is lost.
    pub async fn reset(&self) -> Result<SyncOutcome> {
        let mut report = SyncReport::new(Verb::Reset, self.dry_run());
        tracing::info!("Starting reset");

        if self.dry_run() {
            report.record(
                Step::ConfirmUnlessForced,
                StepStatus::Skipped("dry run".to_string()),
            );
        } else if self.session.force {
            report.record(
                Step::ConfirmUnlessForced,
                StepStatus::Skipped("--force".to_string()),
            );
        } else if self
            .confirm
            .confirm("Reset the local database to the remote schema? Local data will be lost.")
            .await
        {
            report.record(Step::ConfirmUnlessForced, StepStatus::Completed);
        } else {
            report.record(
                Step::ConfirmUnlessForced,
                StepStatus::Skipped("declined by user".to_string()),
            );
            tracing::info!("Reset cancelled");
            return Ok(SyncOutcome::Cancelled(report));
        }

        self.backup_step(&mut report).await;

        if self.dry_run() {
            report.record(
                Step::StopBackend,
                StepStatus::Planned("supabase stop --no-backup".to_string()),
            );
        } else {
            match self.supabase.stop_no_backup().await {
                Ok(()) => report.record(Step::StopBackend, StepStatus::Completed),
                Err(e) => report.record(Step::StopBackend, StepStatus::Warned(e.to_string())),
            }
        }

        self.run_step(&mut report, Step::ResetBackendToRemote, self.reset_to_remote())
            .await?;
        self.run_step(&mut report, Step::StartBackend, self.start_backend())
            .await?;

        Ok(SyncOutcome::Completed(report))
    }

    async fn reset_to_remote(&self) -> Result<StepStatus> {
        if self.dry_run() {
            return Ok(StepStatus::Planned("supabase db pull".to_string()));
        }
        self.supabase.db_pull().await?;
        Ok(StepStatus::Completed)
    }

    // ------------------------------------------------------------------
    // Backup / restore
    // ------------------------------------------------------------------

    /// Git-state snapshot plus a `backup.strategy` snapshot of local.
    ///
    /// Fails only when neither file could be written.
    pub async fn backup(&self) -> Result<SyncOutcome> {
        let mut report = SyncReport::new(Verb::Backup, self.dry_run());
        self.backup_step(&mut report).await;
        if !self.dry_run() && report.backups.is_empty() {
            let reason = match report.status_of(Step::Backup) {
                Some(StepStatus::Warned(reason)) => reason.clone(),
                _ => "no snapshot was written".to_string(),
            };
            return Err(Error::BackupUnavailable(reason));
        }
        Ok(SyncOutcome::Completed(report))
    }

    /// Resolve a restore argument: as given, then relative to the project
    /// root, then inside the backup directory.
    pub fn locate_backup(&self, file: &Path) -> Result<PathBuf> {
        let mut candidates = vec![file.to_path_buf()];
        if file.is_relative() {
            candidates.push(self.config.project_root.join(file));
            candidates.push(self.backups.directory().join(file));
        }
        candidates
            .into_iter()
            .find(|c| c.is_file())
            .ok_or_else(|| Error::BackupFileNotFound(file.to_path_buf()))
    }

    /// Safety snapshot, confirmation, then replay the session's restore
    /// target into the local database.
    pub async fn restore(&self) -> Result<SyncOutcome> {
        let mut report = SyncReport::new(Verb::Restore, self.dry_run());
        let file = self.session.restore_target.as_deref().ok_or_else(|| {
            Error::Precondition("no backup file given to restore".to_string())
        })?;
        let path = self.locate_backup(file)?;

        self.backup_step(&mut report).await;

        if !self.dry_run() {
            let prompt = format!(
                "Restore {} into the local database? Existing rows may conflict.",
                path.display()
            );
            if !self.consent(&prompt).await {
                report.record(
                    Step::ConfirmUnlessForced,
                    StepStatus::Skipped("declined by user".to_string()),
                );
                return Ok(SyncOutcome::Cancelled(report));
            }
            report.record(Step::ConfirmUnlessForced, StepStatus::Completed);
        }

        if self.dry_run() {
            report.record(
                Step::RestoreSnapshot,
                StepStatus::Planned(format!(
                    "psql <local> -v ON_ERROR_STOP=1 -f {}",
                    path.display()
                )),
            );
            return Ok(SyncOutcome::Completed(report));
        }

        match self.backups.restore_snapshot(&path, DbTarget::Local).await {
            Ok(()) => {
                report.record(Step::RestoreSnapshot, StepStatus::Completed);
                Ok(SyncOutcome::Completed(report))
            }
            Err(Error::RestoreFailed { file, reason, .. }) => {
                report.record(Step::RestoreSnapshot, StepStatus::Failed(reason.clone()));
                Err(Error::RestoreFailed {
                    file,
                    reason,
                    safety_backup: report.rollback_point.clone(),
                })
            }
            Err(e) => {
                report.record(Step::RestoreSnapshot, StepStatus::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// `supabase link --project-ref <id>`.
    pub async fn link_project(&self) -> Result<()> {
        self.supabase.link(&self.config.supabase.project_id).await
    }
}
