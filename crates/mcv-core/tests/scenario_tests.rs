//! End-to-end scenario runs against scripted collaborators

use mcv_convergence::{ConvergenceChecker, RouteExpectation};
use mcv_core::{FailoverScenario, McvConfig, McvError, ScenarioRunner};
use mcv_retry::{RetryPolicy, SimulatedClock};
use mcv_test_utils::{
    batch, route_dump, workloads, RecordingApplier, ScriptedTransport, ScriptedWorkload,
};
use mcv_traffic::{Caller, OriginMatcher, TrafficError, TrafficResult};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

const HOST: &str = "fake-service-1.example.com";
const MANIFEST: &str = "apiVersion: networking.istio.io/v1alpha3\nkind: ServiceEntry\n";

fn scenario() -> FailoverScenario {
    FailoverScenario::new("locality-1", MANIFEST, HOST, OriginMatcher::new("^b-.*$").unwrap())
}

fn runner(applier: Arc<RecordingApplier>, clock: &SimulatedClock) -> ScenarioRunner {
    ScenarioRunner::new(applier)
        .with_checker(ConvergenceChecker::new().with_clock(Arc::new(clock.clone())))
        .with_policy(RetryPolicy::new().with_timeout(Duration::from_secs(10)))
}

fn converged(name: &str) -> Arc<ScriptedWorkload> {
    ScriptedWorkload::after(name, 2, route_dump(&[RouteExpectation::new(HOST, 80)]))
}

#[tokio::test]
async fn failover_to_close_region_passes() {
    let clock = SimulatedClock::new();
    let applier = RecordingApplier::new();
    let transport = ScriptedTransport::responding(batch("b-v1", 2, 100));
    let caller = Caller::new("a", transport.clone());
    let sidecarless = Arc::new(ScriptedWorkload::new("a-vm").without_proxy());

    let report = runner(applier.clone(), &clock)
        .run(&scenario(), &caller, &workloads(&[converged("a-1"), converged("a-2"), sidecarless]))
        .await
        .unwrap();

    assert_eq!(applier.applied(), vec![("locality-1".to_string(), MANIFEST.to_string())]);
    assert_eq!(report.convergence.converged.len(), 2);
    assert_eq!(report.convergence.skipped, vec!["a-vm".to_string()]);
    assert_eq!(report.traffic.sent, 100);
    assert_eq!(report.traffic.hits("b-v1-0"), 50);
    assert_eq!(transport.calls()[0].header("Host"), Some(HOST));
}

#[tokio::test]
async fn rejected_manifest_stops_before_waiting() {
    let clock = SimulatedClock::new();
    let workload = converged("a-1");
    let transport = ScriptedTransport::responding(batch("b", 1, 100));

    let err = runner(RecordingApplier::failing("admission webhook denied"), &clock)
        .run(&scenario(), &Caller::new("a", transport.clone()), &workloads(&[workload.clone()]))
        .await
        .unwrap_err();

    assert!(matches!(err, McvError::Apply(_)));
    assert_eq!(workload.fetches(), 0);
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn slow_control_plane_stops_before_traffic() {
    let clock = SimulatedClock::new();
    let transport = ScriptedTransport::responding(batch("b", 1, 100));

    let err = runner(RecordingApplier::new(), &clock)
        .run(
            &scenario(),
            &Caller::new("a", transport.clone()),
            &workloads(&[converged("a-1"), ScriptedWorkload::never("a-2")]),
        )
        .await
        .unwrap_err();

    assert_eq!(err.stage(), "convergence");
    assert!(err.is_timeout());
    assert!(err.to_string().contains("a-2 did not converge"));
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn traffic_to_wrong_region_fails() {
    let clock = SimulatedClock::new();
    let mut results = batch("b-v1", 1, 100);
    results[42] = TrafficResult::ok("c-instance-1");

    let err = runner(RecordingApplier::new(), &clock)
        .run(
            &scenario(),
            &Caller::new("a", ScriptedTransport::responding(results)),
            &workloads(&[converged("a-1")]),
        )
        .await
        .unwrap_err();

    let McvError::Traffic(TrafficError::OriginMismatch { index, hostname, .. }) = err else {
        panic!("expected origin mismatch, got {err:?}");
    };
    assert_eq!(index, 42);
    assert_eq!(hostname, "c-instance-1");
}

#[tokio::test]
async fn runner_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[retry]\ntimeout_ms = 2000\n\n[traffic]\nsend_count = 5\nport_name = \"http-alt\"\n"
    )
    .unwrap();
    let config = McvConfig::from_file(file.path()).unwrap();

    let clock = SimulatedClock::new();
    let transport = ScriptedTransport::responding(batch("b", 1, 5));
    let runner = ScenarioRunner::from_config(RecordingApplier::new(), &config)
        .with_checker(ConvergenceChecker::new().with_clock(Arc::new(clock.clone())));
    let scenario = FailoverScenario::from_config(&config, "locality-1", MANIFEST, HOST).unwrap();

    let report = runner
        .run(&scenario, &Caller::new("a", transport.clone()), &workloads(&[converged("a-1")]))
        .await
        .unwrap();

    assert_eq!(report.traffic.sent, 5);
    assert_eq!(transport.calls()[0].port_name, "http-alt");
}
