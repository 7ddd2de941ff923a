//! Local stack lifecycle: bounded readiness, port cleanup, forced restart.

mod common;

use common::{failure, FakePorts, FakeProbe, FakeRunner, Project};
use std::sync::Arc;
use supabase_git_sync::backend::Supabase;
use supabase_git_sync::health::PortOccupant;
use supabase_git_sync::{Error, HealthMonitor, PortResolution, RuntimeState};

fn monitor(
    project: &Project,
    runner: &Arc<FakeRunner>,
    ports: &Arc<FakePorts>,
    probe: &Arc<FakeProbe>,
) -> HealthMonitor {
    let supabase = Supabase::new(runner.clone(), project.config.clone());
    HealthMonitor::new(
        project.config.clone(),
        supabase,
        ports.clone(),
        probe.clone(),
    )
}

#[tokio::test]
async fn test_ensure_running_is_noop_when_already_running() {
    let project = Project::new();
    let (runner, ports, probe) = (FakeRunner::new(), FakePorts::new(), FakeProbe::healthy());
    let health = monitor(&project, &runner, &ports, &probe);

    health.ensure_running().await.unwrap();

    assert_eq!(health.state(), RuntimeState::Running);
    assert_eq!(runner.count(&["supabase", "start"]), 0);
}

#[tokio::test]
async fn test_ensure_running_polls_exactly_retries_times() {
    // health.retries is 3 in the shared config.
    let project = Project::new();
    let (runner, ports, probe) = (FakeRunner::new(), FakePorts::new(), FakeProbe::down());
    runner.respond(&["supabase", "status"], failure("not running"));
    let health = monitor(&project, &runner, &ports, &probe);

    let err = health.ensure_running().await.expect_err("never ready");

    assert!(matches!(err, Error::RuntimeUnavailable { attempts: 3, .. }));
    assert_eq!(runner.count(&["supabase", "start"]), 1);
    // One initial status check plus three readiness polls.
    assert_eq!(runner.count(&["supabase", "status"]), 4);
    assert_eq!(health.state(), RuntimeState::Stopped);
}

#[tokio::test]
async fn test_ensure_running_succeeds_once_ready() {
    let project = Project::new();
    let (runner, ports, probe) = (FakeRunner::new(), FakePorts::new(), FakeProbe::healthy());
    runner.respond_times(&["supabase", "status"], 2, failure("starting"));
    let health = monitor(&project, &runner, &ports, &probe);

    health.ensure_running().await.unwrap();

    assert_eq!(health.state(), RuntimeState::Running);
    assert_eq!(runner.count(&["supabase", "status"]), 3);
}

#[tokio::test]
async fn test_failed_start_command_is_reported() {
    let project = Project::new();
    let (runner, ports, probe) = (FakeRunner::new(), FakePorts::new(), FakeProbe::down());
    runner.respond(&["supabase", "status"], failure("not running"));
    runner.respond(&["supabase", "start"], failure("Cannot connect to the Docker daemon"));
    let health = monitor(&project, &runner, &ports, &probe);

    let err = health.ensure_running().await.expect_err("start failed");
    assert!(err.to_string().contains("Docker daemon"));
    assert_eq!(runner.count(&["supabase", "status"]), 1);
}

#[tokio::test]
async fn test_port_held_by_stale_stack_is_released_by_stop() {
    let project = Project::new();
    let (runner, ports, probe) = (FakeRunner::new(), FakePorts::new(), FakeProbe::healthy());
    ports.occupy(54321);
    let freed = ports.clone();
    runner.on(&["supabase", "stop"], move || freed.release_all());
    let health = monitor(&project, &runner, &ports, &probe);

    let resolution = health.resolve_port_conflict(54321).await;

    assert_eq!(resolution, PortResolution::Resolved);
    assert_eq!(runner.count(&["supabase", "stop"]), 1);
    assert!(!runner.lines().iter().any(|l| l.starts_with("kill")));
}

#[tokio::test]
async fn test_port_held_by_foreign_process_is_reported_not_killed() {
    let project = Project::new();
    let (runner, ports, probe) = (FakeRunner::new(), FakePorts::new(), FakeProbe::healthy());
    ports.occupy(54322);
    ports.held_by(PortOccupant {
        pid: 4242,
        name: "postgres".to_string(),
        command: Some("postgres -D /var/lib/postgresql".to_string()),
    });
    let health = monitor(&project, &runner, &ports, &probe);

    let resolution = health.resolve_port_conflict(54322).await;

    match resolution {
        PortResolution::Unresolved { port, occupants } => {
            assert_eq!(port, 54322);
            assert_eq!(occupants.len(), 1);
            assert_eq!(occupants[0].pid, 4242);
        }
        other => panic!("expected Unresolved, got {:?}", other),
    }
    assert!(!killed_anything(&runner));
}

fn killed_anything(runner: &FakeRunner) -> bool {
    runner
        .lines()
        .iter()
        .any(|l| l.starts_with("kill") || l.starts_with("docker rm"))
}

#[tokio::test]
async fn test_free_port_needs_no_action() {
    let project = Project::new();
    let (runner, ports, probe) = (FakeRunner::new(), FakePorts::new(), FakeProbe::healthy());
    let health = monitor(&project, &runner, &ports, &probe);

    assert_eq!(health.resolve_port_conflict(54321).await, PortResolution::Free);
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_check_health_counts_failures() {
    let project = Project::new();
    let (runner, ports, probe) = (FakeRunner::new(), FakePorts::new(), FakeProbe::down());
    let health = monitor(&project, &runner, &ports, &probe);

    let status = health.check_health().await;
    assert!(status.running);
    assert!(!status.is_healthy());
    assert_eq!(health.state(), RuntimeState::Degraded);
    assert_eq!(health.failed_checks(), 1);

    probe.set(true);
    assert!(health.check_health().await.is_healthy());
    assert_eq!(health.state(), RuntimeState::Running);
    assert_eq!(health.failed_checks(), 1);
}

#[tokio::test]
async fn test_verify_health_forces_restart_after_two_failures() {
    let project = Project::new();
    let (runner, ports, probe) = (FakeRunner::new(), FakePorts::new(), FakeProbe::down());
    let recovered = probe.clone();
    runner.on(&["supabase", "stop", "--no-backup"], move || recovered.set(true));
    runner.respond(
        &["docker", "ps"],
        common::ok("supabase_db_orphan\nsupabase_kong_other\n"),
    );
    let health = monitor(&project, &runner, &ports, &probe);

    let status = health.verify_health().await.expect("restart recovers");

    assert!(status.is_healthy());
    assert_eq!(health.failed_checks(), 2);
    assert_eq!(runner.count(&["supabase", "stop", "--no-backup"]), 1);
    assert_eq!(runner.count(&["docker", "ps"]), 1);
}

#[tokio::test]
async fn test_verify_health_gives_up_when_restart_does_not_help() {
    let project = Project::new();
    let (runner, ports, probe) = (FakeRunner::new(), FakePorts::new(), FakeProbe::down());
    let health = monitor(&project, &runner, &ports, &probe);

    let err = health.verify_health().await.expect_err("still unhealthy");

    assert!(matches!(err, Error::RuntimeUnavailable { attempts: 3, .. }));
    assert_eq!(runner.count(&["supabase", "stop", "--no-backup"]), 1);
}

#[tokio::test]
async fn test_port_occupancy_reports_every_role() {
    let project = Project::new();
    let (runner, ports, probe) = (FakeRunner::new(), FakePorts::new(), FakeProbe::healthy());
    ports.occupy(54323);
    let health = monitor(&project, &runner, &ports, &probe);

    let report = health.port_occupancy().await;

    let roles: Vec<&str> = report.iter().map(|p| p.role).collect();
    assert_eq!(roles, vec!["api", "db", "studio", "inbucket"]);
    assert!(report.iter().find(|p| p.role == "studio").unwrap().in_use);
    assert!(!report.iter().find(|p| p.role == "api").unwrap().in_use);
}
