//! Lifecycle and health of the local Supabase stack.
//!
//! [`HealthMonitor`] tracks the runtime through
//! `Stopped -> Starting -> Running -> (Degraded | Running)` and owns every
//! wait in the sync flow: readiness polling after `supabase start`, port
//! rechecks after stopping a stale stack, and the settle pause of a forced
//! restart. Every wait is bounded by a [`RetryPolicy`].

pub mod ports;
pub mod probe;

pub use ports::{PortOccupant, PortProbe, PortResolution, SystemPortProbe};
pub use probe::{NetworkProbe, ServiceProbe};

use crate::backend::{OrphanCleaner, Supabase};
use crate::config::ProjectConfig;
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Attempts when waiting for a port to be released.
const PORT_RECHECK_ATTEMPTS: u32 = 5;
/// Upper bound on the delay between port rechecks.
const PORT_RECHECK_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeState {
    Stopped,
    Starting,
    Running,
    /// Running, but the API or database does not answer.
    Degraded,
}

impl RuntimeState {
    fn from_status(status: &ServiceHealthStatus) -> Self {
        match (status.running, status.is_healthy()) {
            (false, _) => RuntimeState::Stopped,
            (true, true) => RuntimeState::Running,
            (true, false) => RuntimeState::Degraded,
        }
    }
}

impl fmt::Display for RuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RuntimeState::Stopped => "stopped",
            RuntimeState::Starting => "starting",
            RuntimeState::Running => "running",
            RuntimeState::Degraded => "degraded",
        })
    }
}

/// Snapshot of the stack's health. Recomputed on every check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceHealthStatus {
    pub running: bool,
    pub api_reachable: bool,
    pub db_reachable: bool,
    pub checked_at: DateTime<Utc>,
}

impl ServiceHealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.running && self.api_reachable && self.db_reachable
    }
}

/// Whether a configured port is currently bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortStatus {
    pub role: &'static str,
    pub port: u16,
    pub in_use: bool,
}

#[derive(Debug)]
struct MonitorState {
    runtime: RuntimeState,
    failed_checks: u32,
}

pub struct HealthMonitor {
    config: Arc<ProjectConfig>,
    supabase: Supabase,
    ports: Arc<dyn PortProbe>,
    probe: Arc<dyn ServiceProbe>,
    state: Mutex<MonitorState>,
}

impl HealthMonitor {
    pub fn new(
        config: Arc<ProjectConfig>,
        supabase: Supabase,
        ports: Arc<dyn PortProbe>,
        probe: Arc<dyn ServiceProbe>,
    ) -> Self {
        Self {
            config,
            supabase,
            ports,
            probe,
            state: Mutex::new(MonitorState {
                runtime: RuntimeState::Stopped,
                failed_checks: 0,
            }),
        }
    }

    pub fn state(&self) -> RuntimeState {
        self.state.lock().runtime
    }

    /// Failed health checks so far in this session.
    pub fn failed_checks(&self) -> u32 {
        self.state.lock().failed_checks
    }

    fn set_state(&self, runtime: RuntimeState) {
        let mut state = self.state.lock();
        if state.runtime != runtime {
            tracing::debug!("Runtime state {} -> {}", state.runtime, runtime);
            state.runtime = runtime;
        }
    }

    fn readiness_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.config.health.retries, self.config.health.poll_interval())
    }

    fn port_recheck_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(
            PORT_RECHECK_ATTEMPTS,
            self.config.health.poll_interval().min(PORT_RECHECK_DELAY),
        )
    }

    /// Start the stack unless it is already running, then wait for readiness.
    ///
    /// Occupied ports are cleaned up first; ports that stay busy are logged
    /// and the start is attempted anyway. Readiness polling is bounded by
    /// `health.retries` attempts of `health.interval`.
    pub async fn ensure_running(&self) -> Result<()> {
        if self.supabase.is_running().await? {
            tracing::debug!("Supabase stack already running");
            self.set_state(RuntimeState::Running);
            return Ok(());
        }

        self.set_state(RuntimeState::Starting);
        self.resolve_all_ports().await;

        tracing::info!("Starting Supabase stack");
        if let Err(e) = self.supabase.start().await {
            self.set_state(RuntimeState::Stopped);
            return Err(e);
        }

        let policy = self.readiness_policy();
        let supabase = &self.supabase;
        let ready = policy
            .run_until(|attempt| async move {
                tracing::debug!("Readiness check {}", attempt);
                supabase.is_running().await.unwrap_or(false)
            })
            .await;

        match ready {
            Ok(attempts) => {
                tracing::info!("Supabase stack ready after {} check(s)", attempts);
                self.set_state(RuntimeState::Running);
                Ok(())
            }
            Err(exhausted) => {
                self.set_state(RuntimeState::Stopped);
                Err(Error::RuntimeUnavailable {
                    attempts: exhausted.attempts,
                    waited: exhausted.waited,
                })
            }
        }
    }

    /// Try to free `port`.
    ///
    /// A busy port is assumed to belong to a stale copy of this project's
    /// stack, so `supabase stop` is issued and the port rechecked. Anything
    /// still holding it afterwards is reported, never killed.
    pub async fn resolve_port_conflict(&self, port: u16) -> PortResolution {
        if self.ports.is_free(port).await {
            return PortResolution::Free;
        }

        tracing::info!("Port {} is in use; stopping local Supabase stack", port);
        if let Err(e) = self.supabase.stop().await {
            tracing::warn!("supabase stop failed while freeing port {}: {}", port, e);
        }

        let ports = &self.ports;
        let freed = self
            .port_recheck_policy()
            .run_until(|_| ports.is_free(port))
            .await
            .is_ok();

        if freed {
            tracing::info!("Port {} released", port);
            PortResolution::Resolved
        } else {
            let occupants = self.ports.occupants(port).await;
            PortResolution::Unresolved { port, occupants }
        }
    }

    async fn resolve_all_ports(&self) {
        for (role, port) in self.config.ports.all() {
            if let PortResolution::Unresolved { occupants, .. } =
                self.resolve_port_conflict(port).await
            {
                let holders = occupants
                    .iter()
                    .map(|o| format!("{} (PID {})", o.name, o.pid))
                    .collect::<Vec<_>>();
                tracing::warn!(
                    "{} port {} is still in use{}",
                    role,
                    port,
                    if holders.is_empty() {
                        String::new()
                    } else {
                        format!(" by {}", holders.join(", "))
                    }
                );
            }
        }
    }

    /// Compose liveness with API and database reachability. Never retries.
    pub async fn check_health(&self) -> ServiceHealthStatus {
        let running = match self.supabase.is_running().await {
            Ok(running) => running,
            Err(e) => {
                tracing::warn!("Could not query Supabase status: {}", e);
                false
            }
        };
        let timeout = self.config.health.probe_timeout();
        let api_reachable = self.probe.api_reachable(self.config.ports.api, timeout).await;
        let db_reachable = self.probe.db_reachable(self.config.ports.db, timeout).await;

        let status = ServiceHealthStatus {
            running,
            api_reachable,
            db_reachable,
            checked_at: Utc::now(),
        };

        self.set_state(RuntimeState::from_status(&status));
        if !status.is_healthy() {
            self.state.lock().failed_checks += 1;
        }
        status
    }

    /// Check, check again after one interval, and force a restart once two
    /// checks have failed in this session.
    pub async fn verify_health(&self) -> Result<ServiceHealthStatus> {
        let started = Instant::now();

        let status = self.check_health().await;
        if status.is_healthy() {
            return Ok(status);
        }

        tracing::warn!(
            "Health check failed (running: {}, api: {}, db: {}); retrying",
            status.running,
            status.api_reachable,
            status.db_reachable
        );
        let interval = self.config.health.poll_interval();
        if !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }

        let status = self.check_health().await;
        if status.is_healthy() {
            return Ok(status);
        }

        if self.failed_checks() >= 2 {
            tracing::warn!("Local stack unhealthy twice; forcing a restart");
            self.force_restart().await?;
            let status = self.check_health().await;
            if status.is_healthy() {
                return Ok(status);
            }
        }

        Err(Error::RuntimeUnavailable {
            attempts: self.failed_checks(),
            waited: started.elapsed(),
        })
    }

    /// Stop without keeping volumes, remove leftover containers, free ports,
    /// settle, and start again.
    pub async fn force_restart(&self) -> Result<()> {
        tracing::info!("Force-restarting Supabase stack");
        if let Err(e) = self.supabase.stop_no_backup().await {
            tracing::warn!("supabase stop --no-backup failed: {}", e);
        }
        self.set_state(RuntimeState::Stopped);

        let cleaner = OrphanCleaner::new(self.supabase.runner().clone(), self.config.local_stack_id());
        match cleaner.remove_orphans().await {
            Ok(0) => {}
            Ok(n) => tracing::info!("Removed {} orphaned container(s)", n),
            Err(e) => tracing::warn!("Orphan container cleanup failed: {}", e),
        }

        self.resolve_all_ports().await;

        let settle = self.config.health.settle();
        if !settle.is_zero() {
            tracing::debug!("Waiting {:?} for ports to settle", settle);
            tokio::time::sleep(settle).await;
        }

        self.ensure_running().await
    }

    /// Occupancy of every configured port. Read-only.
    pub async fn port_occupancy(&self) -> Vec<PortStatus> {
        let mut report = Vec::with_capacity(4);
        for (role, port) in self.config.ports.all() {
            report.push(PortStatus {
                role,
                port,
                in_use: !self.ports.is_free(port).await,
            });
        }
        report
    }
}
