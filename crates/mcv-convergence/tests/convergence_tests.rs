//! Convergence across scripted workloads

use mcv_convergence::{
    CheckFailure, CheckMode, ConvergenceChecker, ConvergenceError, RouteExpectation,
};
use mcv_retry::{RetryPolicy, SimulatedClock};
use mcv_test_utils::{route_dump, workloads, ScriptedWorkload};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn route() -> RouteExpectation {
    RouteExpectation::new("fake-service-1.example.com", 80)
}

fn policy() -> RetryPolicy {
    RetryPolicy::new()
        .with_timeout(Duration::from_secs(10))
        .with_delay(Duration::from_millis(500))
}

fn checker(clock: &SimulatedClock) -> ConvergenceChecker {
    ConvergenceChecker::new().with_clock(Arc::new(clock.clone()))
}

#[tokio::test]
async fn second_of_three_never_converges_third_never_checked() {
    let clock = SimulatedClock::new();
    let first = ScriptedWorkload::converged("a-1", route_dump(&[route()]));
    let second = ScriptedWorkload::never("a-2");
    let third = ScriptedWorkload::converged("a-3", route_dump(&[route()]));

    let all = workloads(&[first.clone(), second.clone(), third.clone()]);
    let err = checker(&clock)
        .wait_for_expectation(&all, &route(), &policy())
        .await
        .unwrap_err();

    let ConvergenceError::NotConverged {
        workload, elapsed, ..
    } = &err
    else {
        panic!("expected NotConverged, got {err:?}");
    };
    assert_eq!(workload, "a-2");
    assert!(*elapsed >= Duration::from_secs(10));
    assert_eq!(first.fetches(), 1);
    assert!(second.fetches() > 1);
    assert_eq!(third.fetches(), 0);
}

#[tokio::test]
async fn fetch_errors_are_retried_until_route_lands() {
    let clock = SimulatedClock::new();
    let flaky = Arc::new(
        ScriptedWorkload::new("a-1")
            .then_error("connection refused")
            .then_error("connection refused")
            .then_snapshot(mcv_test_utils::empty_dump())
            .then_snapshot(route_dump(&[route()])),
    );

    let report = checker(&clock)
        .wait_for_expectation(&workloads(&[flaky.clone()]), &route(), &policy())
        .await
        .unwrap();

    assert_eq!(report.converged.len(), 1);
    assert_eq!(report.converged[0].attempts, 4);
    assert_eq!(report.converged[0].elapsed, Duration::from_millis(1_500));
    assert_eq!(flaky.fetches(), 4);
}

#[tokio::test]
async fn persistent_fetch_error_is_the_reported_cause() {
    let clock = SimulatedClock::new();
    let down = Arc::new(ScriptedWorkload::new("a-1").then_error("admin port closed"));

    let err = checker(&clock)
        .wait_for_expectation(&workloads(&[down]), &route(), &policy())
        .await
        .unwrap_err();

    let ConvergenceError::NotConverged { last_error, .. } = &err else {
        panic!("expected NotConverged, got {err:?}");
    };
    assert!(matches!(last_error, Some(CheckFailure::Fetch(_))));
    assert!(err.to_string().contains("admin port closed"));
}

#[tokio::test]
async fn sidecarless_workloads_recorded_as_skipped() {
    let clock = SimulatedClock::new();
    let vm = Arc::new(ScriptedWorkload::new("vm-1").without_proxy());
    let pod = ScriptedWorkload::after("a-1", 2, route_dump(&[route()]));

    let report = checker(&clock)
        .wait_for_expectation(&workloads(&[vm.clone(), pod]), &route(), &policy())
        .await
        .unwrap();

    assert_eq!(report.skipped, vec!["vm-1".to_string()]);
    assert_eq!(report.converged[0].workload, "a-1");
    assert_eq!(report.converged[0].attempts, 3);
    assert_eq!(vm.fetches(), 0);
}

#[tokio::test]
async fn route_for_other_port_does_not_count() {
    let clock = SimulatedClock::new();
    let wrong_port = ScriptedWorkload::converged(
        "a-1",
        route_dump(&[RouteExpectation::new("fake-service-1.example.com", 8080)]),
    );

    let err = checker(&clock)
        .wait_for_expectation(&workloads(&[wrong_port]), &route(), &policy())
        .await
        .unwrap_err();

    assert!(err.is_timeout());
}

#[tokio::test]
async fn withdrawn_route_converges_on_absence() {
    let clock = SimulatedClock::new();
    let draining = Arc::new(
        ScriptedWorkload::new("a-1")
            .then_snapshot(route_dump(&[route()]))
            .then_snapshot(mcv_test_utils::empty_dump()),
    );

    let report = checker(&clock)
        .wait_for_route(&workloads(&[draining]), &route().absent().unwrap(), &policy())
        .await
        .unwrap();

    assert_eq!(report.converged[0].attempts, 2);
}

#[tokio::test]
async fn stable_convergence_needs_consecutive_hits() {
    let clock = SimulatedClock::new();
    let flapping = Arc::new(
        ScriptedWorkload::new("a-1")
            .then_snapshot(route_dump(&[route()]))
            .then_snapshot(mcv_test_utils::empty_dump())
            .then_snapshot(route_dump(&[route()])),
    );

    let report = checker(&clock)
        .wait_for_expectation(&workloads(&[flapping]), &route(), &policy().with_converge(3))
        .await
        .unwrap();

    // hit, miss, then three hits in a row
    assert_eq!(report.converged[0].attempts, 5);
}

#[tokio::test]
async fn collect_all_keeps_input_order() {
    let clock = SimulatedClock::new();
    let items = [
        ScriptedWorkload::never("a-1"),
        ScriptedWorkload::converged("a-2", route_dump(&[route()])),
        ScriptedWorkload::never("a-3"),
    ];

    let err = checker(&clock)
        .with_mode(CheckMode::CollectAll)
        .wait_for_expectation(&workloads(&items), &route(), &policy())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "2 workload(s) did not converge: a-1, a-3");
}
