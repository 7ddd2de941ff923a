use crate::conflict::ResolutionSummary;
use crate::health::ServiceHealthStatus;
use crate::session::Verb;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// A named stage of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    CheckPrereqs,
    ConfirmUnlessForced,
    Backup,
    CommitLocalChanges,
    PushVcs,
    PushBackendSchema,
    ExportLocalData,
    ImportDataToRemote,
    ReportStatus,
    StashIfDirty,
    PullVcs,
    ResolveConflicts,
    ResetLocalBackend,
    PullBackendSchema,
    ExportRemoteData,
    ImportDataToLocal,
    StartBackend,
    VerifyHealth,
    OfferStashRestore,
    StopBackend,
    ResetBackendToRemote,
    RestoreSnapshot,
}

impl Step {
    pub fn name(self) -> &'static str {
        match self {
            Step::CheckPrereqs => "check-prereqs",
            Step::ConfirmUnlessForced => "confirm-unless-forced",
            Step::Backup => "backup",
            Step::CommitLocalChanges => "commit-local-changes",
            Step::PushVcs => "push-vcs",
            Step::PushBackendSchema => "push-backend-schema",
            Step::ExportLocalData => "export-local-data",
            Step::ImportDataToRemote => "import-data-to-remote",
            Step::ReportStatus => "report-status",
            Step::StashIfDirty => "stash-if-dirty",
            Step::PullVcs => "pull-vcs",
            Step::ResolveConflicts => "resolve-conflicts",
            Step::ResetLocalBackend => "reset-local-backend",
            Step::PullBackendSchema => "pull-backend-schema",
            Step::ExportRemoteData => "export-remote-data",
            Step::ImportDataToLocal => "import-data-to-local",
            Step::StartBackend => "start-backend",
            Step::VerifyHealth => "verify-health",
            Step::OfferStashRestore => "offer-stash-restore",
            Step::StopBackend => "stop-backend",
            Step::ResetBackendToRemote => "reset-backend-to-remote",
            Step::RestoreSnapshot => "restore-snapshot",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum StepStatus {
    Completed,
    Skipped(String),
    /// Dry-run: the command that would have run.
    Planned(String),
    /// A best-effort step failed; the run continued.
    Warned(String),
    Failed(String),
}

impl StepStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, StepStatus::Failed(_))
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Completed => f.write_str("done"),
            StepStatus::Skipped(reason) => write!(f, "skipped ({})", reason),
            StepStatus::Planned(action) => write!(f, "would run: {}", action),
            StepStatus::Warned(reason) => write!(f, "warning: {}", reason),
            StepStatus::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub step: Step,
    #[serde(flatten)]
    pub status: StepStatus,
}

/// Everything a run did, in order.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub verb: Verb,
    pub dry_run: bool,
    pub steps: Vec<StepRecord>,
    /// Database snapshot taken before the first destructive action.
    /// `None` means there is no clean rollback point.
    pub rollback_point: Option<PathBuf>,
    /// Every file written by the backup step.
    pub backups: Vec<PathBuf>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<ResolutionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<ServiceHealthStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_commit: Option<String>,
    /// Stash holding the user's uncommitted changes until they are popped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stash: Option<String>,
}

impl SyncReport {
    pub fn new(verb: Verb, dry_run: bool) -> Self {
        Self {
            verb,
            dry_run,
            steps: Vec::new(),
            rollback_point: None,
            backups: Vec::new(),
            warnings: Vec::new(),
            conflicts: None,
            health: None,
            last_commit: None,
            stash: None,
        }
    }

    pub fn record(&mut self, step: Step, status: StepStatus) {
        match &status {
            StepStatus::Failed(reason) => tracing::error!("{}: {}", step, reason),
            StepStatus::Warned(reason) => tracing::warn!("{}: {}", step, reason),
            other => tracing::info!("{}: {}", step, other),
        }
        self.steps.push(StepRecord { step, status });
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }

    pub fn status_of(&self, step: Step) -> Option<&StepStatus> {
        self.steps
            .iter()
            .find(|r| r.step == step)
            .map(|r| &r.status)
    }

    /// Steps that finished in any state other than failed.
    pub fn completed_steps(&self) -> Vec<Step> {
        self.steps
            .iter()
            .filter(|r| !r.status.is_failed())
            .map(|r| r.step)
            .collect()
    }

    /// Actions recorded as planned (dry-run).
    pub fn planned(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter_map(|r| match &r.status {
                StepStatus::Planned(action) => Some(action.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// How a run ended.
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    Completed(SyncReport),
    /// The user declined a confirmation; nothing after it ran.
    Cancelled(SyncReport),
}

impl SyncOutcome {
    pub fn report(&self) -> &SyncReport {
        match self {
            SyncOutcome::Completed(report) | SyncOutcome::Cancelled(report) => report,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SyncOutcome::Cancelled(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_names_are_kebab_case() {
        assert_eq!(Step::PushBackendSchema.to_string(), "push-backend-schema");
        assert_eq!(
            serde_json::to_string(&Step::ImportDataToLocal).unwrap(),
            "\"import-data-to-local\""
        );
    }

    #[test]
    fn completed_steps_exclude_failures() {
        let mut report = SyncReport::new(Verb::Push, false);
        report.record(Step::CheckPrereqs, StepStatus::Completed);
        report.record(Step::Backup, StepStatus::Warned("dump failed".into()));
        report.record(Step::PushVcs, StepStatus::Failed("rejected".into()));
        assert_eq!(
            report.completed_steps(),
            vec![Step::CheckPrereqs, Step::Backup]
        );
        assert_eq!(
            report.status_of(Step::PushVcs),
            Some(&StepStatus::Failed("rejected".into()))
        );
    }

    #[test]
    fn step_record_serializes_flat() {
        let record = StepRecord {
            step: Step::PushVcs,
            status: StepStatus::Planned("git push origin main".into()),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["step"], "push-vcs");
        assert_eq!(json["status"], "planned");
        assert_eq!(json["detail"], "git push origin main");
    }
}
