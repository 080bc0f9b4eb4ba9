//! Behavioural tests for the daemon bootstrap sequence.

use std::cell::RefCell;
use std::path::Path;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use super::support::{self, HealthEvent, TestConfigLoader, TestWorld};

#[fixture]
fn world() -> RefCell<TestWorld> {
    support::world()
}

#[given("a healthy configuration loader")]
fn given_healthy_loader(world: &RefCell<TestWorld>) {
    world.borrow_mut().use_loader(TestConfigLoader::new());
}

#[given("a failing configuration loader")]
fn given_failing_loader(world: &RefCell<TestWorld>) {
    world.borrow_mut().use_failing_loader();
}

#[given("a configuration naming device {device}")]
fn given_device(world: &RefCell<TestWorld>, device: String) {
    let loader = TestConfigLoader::new().with_device(strip_quotes(&device));
    world.borrow_mut().use_loader(loader);
}

#[given("a configuration enabling TLS without key material")]
fn given_incomplete_tls(world: &RefCell<TestWorld>) {
    world
        .borrow_mut()
        .use_loader(TestConfigLoader::new().with_incomplete_tls());
}

#[when("the daemon bootstrap runs")]
fn when_bootstrap_runs(world: &RefCell<TestWorld>) {
    world.borrow_mut().bootstrap();
}

#[then("bootstrap succeeds")]
fn then_bootstrap_succeeds(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    assert!(
        world.bootstrap_error().is_none(),
        "bootstrap error: {:?}",
        world.bootstrap_error()
    );
    assert!(
        world.daemon().is_some(),
        "daemon should have been initialised"
    );
}

#[then("bootstrap fails")]
fn then_bootstrap_fails(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    assert!(
        world.bootstrap_error().is_some(),
        "bootstrap succeeded unexpectedly"
    );
}

#[then("the failure reads {message}")]
fn then_failure_reads(world: &RefCell<TestWorld>, message: String) {
    let world = world.borrow();
    let error = world.bootstrap_error().expect("bootstrap error missing");
    assert_eq!(error.to_string(), strip_quotes(&message));
}

#[then("the socket directory exists")]
fn then_socket_directory_exists(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    let socket = world.socket_path().expect("socket path missing");
    let parent = Path::new(socket).parent().expect("socket parent");
    assert!(parent.is_dir(), "{} should exist", parent.display());
}

#[then("the dispatcher serves device {device}")]
fn then_dispatcher_device(world: &RefCell<TestWorld>, device: String) {
    let daemon = world.borrow_mut().take_daemon().expect("daemon missing");
    let response = daemon
        .into_dispatcher()
        .handle(br#"{"jsonrpc":"2.0","method":"GetDeviceInfo","id":1}"#);
    let result = response.result().expect("device info result");
    assert_eq!(result["device"]["name"], strip_quotes(&device));
}

#[then("the reporter recorded bootstrap start")]
fn then_reporter_start(world: &RefCell<TestWorld>) {
    assert!(
        world
            .borrow()
            .reporter
            .events()
            .contains(&HealthEvent::BootstrapStarting),
        "bootstrap start event missing"
    );
}

#[then("the reporter recorded bootstrap success")]
fn then_reporter_success(world: &RefCell<TestWorld>) {
    assert!(
        world
            .borrow()
            .reporter
            .events()
            .contains(&HealthEvent::BootstrapSucceeded),
        "bootstrap success event missing"
    );
}

#[then("the reporter recorded bootstrap failure")]
fn then_reporter_failure(world: &RefCell<TestWorld>) {
    let failure = world.borrow().reporter.failure();
    assert!(failure.is_some(), "bootstrap failure event missing");
}

fn strip_quotes(s: &str) -> &str {
    s.trim_matches('"')
}

#[scenario(path = "tests/features/daemon_bootstrap.feature")]
fn daemon_bootstrap(#[from(world)] world: RefCell<TestWorld>) {
    drop(world);
}
