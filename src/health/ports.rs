//! Port occupancy checks.
//!
//! Discovery of who holds a port is read-only (`ss`, `lsof`); nothing in
//! this module ever signals a process.

use crate::exec::{CommandRunner, CommandSpec};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// A process holding a port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortOccupant {
    pub pid: u32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

/// Outcome of [`super::HealthMonitor::resolve_port_conflict`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PortResolution {
    /// Nothing was listening.
    Free,
    /// The port was held by this project's stack and was released.
    Resolved,
    /// Still held after cleanup; the occupants are reported, never killed.
    Unresolved {
        port: u16,
        occupants: Vec<PortOccupant>,
    },
}

#[async_trait]
pub trait PortProbe: Send + Sync {
    /// True when nothing is bound to `port`.
    async fn is_free(&self, port: u16) -> bool;

    /// Processes holding `port`, as far as they can be discovered.
    async fn occupants(&self, port: u16) -> Vec<PortOccupant>;
}

/// Bind-based check plus `ss`/`lsof` discovery.
pub struct SystemPortProbe {
    runner: Arc<dyn CommandRunner>,
}

impl SystemPortProbe {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    async fn ss(&self, port: u16) -> Vec<PortOccupant> {
        let filter = format!("sport = :{}", port);
        let spec = CommandSpec::new("ss", ["-tlnp", filter.as_str()]).timeout(DISCOVERY_TIMEOUT);
        match self.runner.run(&spec).await {
            Ok(out) if out.success() => parse_ss_pids(&out.stdout)
                .into_iter()
                .map(occupant_from_proc)
                .collect(),
            _ => Vec::new(),
        }
    }

    async fn lsof(&self, port: u16) -> Vec<PortOccupant> {
        let target = format!(":{}", port);
        let spec = CommandSpec::new("lsof", ["-i", target.as_str(), "-P", "-n", "-F", "pcn"])
            .timeout(DISCOVERY_TIMEOUT);
        match self.runner.run(&spec).await {
            Ok(out) if out.success() => parse_lsof_fields(&out.stdout),
            _ => Vec::new(),
        }
    }
}

#[async_trait]
impl PortProbe for SystemPortProbe {
    async fn is_free(&self, port: u16) -> bool {
        // 127.0.0.1 can bind on some platforms while 0.0.0.0 is taken; check both.
        match TcpListener::bind(("127.0.0.1", port)).await {
            Ok(listener) => drop(listener),
            Err(_) => return false,
        }
        TcpListener::bind(("0.0.0.0", port)).await.is_ok()
    }

    async fn occupants(&self, port: u16) -> Vec<PortOccupant> {
        let mut found = if cfg!(target_os = "linux") {
            self.ss(port).await
        } else {
            Vec::new()
        };
        let seen: HashSet<u32> = found.iter().map(|p| p.pid).collect();
        found.extend(
            self.lsof(port)
                .await
                .into_iter()
                .filter(|p| !seen.contains(&p.pid)),
        );
        found
    }
}

fn occupant_from_proc(pid: u32) -> PortOccupant {
    let name = std::fs::read_to_string(format!("/proc/{}/comm", pid))
        .ok()
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let command = std::fs::read_to_string(format!("/proc/{}/cmdline", pid))
        .ok()
        .map(|s| s.replace('\0', " ").trim().to_string())
        .filter(|s| !s.is_empty());
    PortOccupant { pid, name, command }
}

/// PIDs from `ss -tlnp` output (`users:(("name",pid=123,fd=4))`).
fn parse_ss_pids(output: &str) -> Vec<u32> {
    let mut seen = HashSet::new();
    output
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().last())
        .flat_map(|users| users.split(','))
        .filter_map(|part| part.strip_prefix("pid="))
        .filter_map(|pid| pid.parse::<u32>().ok())
        .filter(|pid| seen.insert(*pid))
        .collect()
}

/// Processes from `lsof -F pcn` output, one `p<pid>` line per process.
fn parse_lsof_fields(output: &str) -> Vec<PortOccupant> {
    let mut processes: Vec<PortOccupant> = Vec::new();
    for line in output.lines() {
        if let Some(pid) = line.strip_prefix('p') {
            if let Ok(pid) = pid.parse::<u32>() {
                if processes.iter().all(|p| p.pid != pid) {
                    processes.push(PortOccupant {
                        pid,
                        name: "unknown".to_string(),
                        command: None,
                    });
                }
            }
        } else if let Some(command) = line.strip_prefix('c') {
            if let Some(last) = processes.last_mut() {
                if last.command.is_none() {
                    last.name = command.to_string();
                    last.command = Some(command.to_string());
                }
            }
        }
    }
    processes
}
