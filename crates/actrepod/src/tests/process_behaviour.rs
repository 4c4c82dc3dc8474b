//! Behavioural tests covering the daemon lifecycle from bootstrap to drain.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::client::CommandRequest;
use crate::process::LaunchError;
use crate::protocol::ResponseStatus;

use super::support::{HealthEvent, ProcessTestWorld, StepResult};

#[fixture]
fn world() -> RefCell<ProcessTestWorld> {
    RefCell::new(ProcessTestWorld::new())
}

#[given("a fresh daemon process world")]
fn given_world(world: &RefCell<ProcessTestWorld>) {
    let _ = world;
}

#[when("the daemon starts")]
fn when_daemon_starts(world: &RefCell<ProcessTestWorld>) -> StepResult {
    world.borrow_mut().start_background()?;
    world.borrow().wait_for_ready()
}

#[when("the daemon starts with an invalid configuration")]
fn when_daemon_starts_invalid(world: &RefCell<ProcessTestWorld>) -> StepResult {
    world.borrow_mut().start_with_invalid_config()
}

#[when("a client pings the daemon over the Unix socket")]
fn when_ping_unix(world: &RefCell<ProcessTestWorld>) -> StepResult {
    world.borrow_mut().send_unix(&CommandRequest::new(0, 0))
}

#[when("a client pings the daemon over TCP")]
fn when_ping_tcp(world: &RefCell<ProcessTestWorld>) -> StepResult {
    world.borrow_mut().send_tcp(&CommandRequest::new(0, 0))
}

#[when("shutdown is triggered")]
fn when_shutdown_triggered(world: &RefCell<ProcessTestWorld>) {
    world.borrow_mut().trigger_shutdown();
}

#[when("the daemon run completes")]
fn when_daemon_completes(world: &RefCell<ProcessTestWorld>) -> StepResult {
    world.borrow_mut().join_background()
}

#[then("the daemon answers pong")]
fn then_daemon_answers_pong(world: &RefCell<ProcessTestWorld>) -> StepResult {
    let world = world.borrow();
    let reply = world
        .reply()
        .ok_or_else(|| "no reply recorded".to_owned())?;
    if reply.status == ResponseStatus::Success && reply.description == "pong" {
        Ok(())
    } else {
        Err(format!("unexpected reply: {reply:?}"))
    }
}

#[then("the daemon exits cleanly")]
fn then_daemon_exits_cleanly(world: &RefCell<ProcessTestWorld>) -> StepResult {
    match world.borrow().result() {
        Some(Ok(())) => Ok(()),
        Some(Err(error)) => Err(format!("daemon failed: {error}")),
        None => Err("daemon result missing".to_owned()),
    }
}

#[then("the daemon reports a bootstrap error")]
fn then_daemon_reports_bootstrap_error(world: &RefCell<ProcessTestWorld>) -> StepResult {
    match world.borrow().result() {
        Some(Err(LaunchError::Bootstrap { .. })) => Ok(()),
        other => Err(format!("expected bootstrap error, got {other:?}")),
    }
}

#[then("the socket file is removed")]
fn then_socket_removed(world: &RefCell<ProcessTestWorld>) {
    assert!(
        !world.borrow().socket_exists(),
        "socket file should be removed after shutdown"
    );
}

#[then("health reporting records the shutdown")]
fn then_health_shutdown(world: &RefCell<ProcessTestWorld>) -> StepResult {
    let events = world.borrow().events();
    let stopping = events.iter().position(|event| *event == HealthEvent::Stopping);
    let stopped = events
        .iter()
        .position(|event| matches!(event, HealthEvent::Stopped(0)));
    match (stopping, stopped) {
        (Some(first), Some(second)) if first < second => Ok(()),
        _ => Err(format!("shutdown events missing or out of order: {events:?}")),
    }
}

#[then("the daemon never listened")]
fn then_never_listened(world: &RefCell<ProcessTestWorld>) -> StepResult {
    let events = world.borrow().events();
    if events
        .iter()
        .any(|event| matches!(event, HealthEvent::Listening { .. }))
    {
        Err(format!("daemon should not have listened: {events:?}"))
    } else {
        Ok(())
    }
}

#[scenario(
    path = "tests/features/daemon_process.feature",
    name = "The daemon answers over both endpoints and shuts down cleanly"
)]
fn daemon_serves_and_shuts_down(#[from(world)] world: RefCell<ProcessTestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/daemon_process.feature",
    name = "Invalid configuration aborts before listening"
)]
fn invalid_configuration_aborts(#[from(world)] world: RefCell<ProcessTestWorld>) {
    drop(world);
}
