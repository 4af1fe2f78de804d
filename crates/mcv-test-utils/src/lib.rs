//! Testing utilities for MCV workspace
//!
//! Scripted collaborators and snapshot fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use mcv_convergence::{ApplyError, ConfigApplier, RouteExpectation, Workload, WorkloadError};
use mcv_structpath::Snapshot;
use mcv_traffic::{CallOptions, TrafficResult, Transport, TransportError};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// One scripted reply to `fetch_snapshot`
#[derive(Debug, Clone)]
pub enum FetchStep {
    Snapshot(Snapshot),
    Error(String),
}

/// Workload that replays a fixed sequence of fetch results
///
/// The last step repeats once the script is exhausted.
#[derive(Debug)]
pub struct ScriptedWorkload {
    name: String,
    proxy: bool,
    steps: Vec<FetchStep>,
    fetches: AtomicUsize,
}

impl ScriptedWorkload {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            proxy: true,
            steps: Vec::new(),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Always answers with `dump`
    pub fn converged(name: &str, dump: Snapshot) -> Arc<Self> {
        Arc::new(Self::new(name).then_snapshot(dump))
    }

    /// Always answers with a dump holding no routes
    pub fn never(name: &str) -> Arc<Self> {
        Arc::new(Self::new(name).then_snapshot(empty_dump()))
    }

    /// Answers `pending` empty dumps, then `dump` forever
    pub fn after(name: &str, pending: usize, dump: Snapshot) -> Arc<Self> {
        let mut workload = Self::new(name);
        for _ in 0..pending {
            workload = workload.then_snapshot(empty_dump());
        }
        Arc::new(workload.then_snapshot(dump))
    }

    #[must_use]
    pub fn without_proxy(mut self) -> Self {
        self.proxy = false;
        self
    }

    #[must_use]
    pub fn then_snapshot(mut self, snapshot: Snapshot) -> Self {
        self.steps.push(FetchStep::Snapshot(snapshot));
        self
    }

    #[must_use]
    pub fn then_error(mut self, message: &str) -> Self {
        self.steps.push(FetchStep::Error(message.to_string()));
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Workload for ScriptedWorkload {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_proxy(&self) -> bool {
        self.proxy
    }

    async fn fetch_snapshot(&self) -> Result<Snapshot, WorkloadError> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst);
        match self.steps.get(n).or_else(|| self.steps.last()) {
            Some(FetchStep::Snapshot(snapshot)) => Ok(snapshot.clone()),
            Some(FetchStep::Error(message)) => {
                Err(WorkloadError::unreachable(&self.name, message.as_str()))
            }
            None => Err(WorkloadError::unreachable(&self.name, "no snapshot scripted")),
        }
    }
}

/// Erase concrete workload types for the checker
pub fn workloads(items: &[Arc<ScriptedWorkload>]) -> Vec<Arc<dyn Workload>> {
    items.iter().map(|w| Arc::clone(w) as Arc<dyn Workload>).collect()
}

/// Transport that answers every call with a fixed outcome
#[derive(Debug)]
pub struct ScriptedTransport {
    outcome: Result<Vec<TrafficResult>, TransportError>,
    calls: Mutex<Vec<CallOptions>>,
}

impl ScriptedTransport {
    pub fn responding(results: Vec<TrafficResult>) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(results),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// One successful result per hostname, in order
    pub fn hostnames<'a>(hostnames: impl IntoIterator<Item = &'a str>) -> Arc<Self> {
        Self::responding(hostnames.into_iter().map(TrafficResult::ok).collect())
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(TransportError::new(message)),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<CallOptions> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn call(&self, options: CallOptions) -> Result<Vec<TrafficResult>, TransportError> {
        self.calls.lock().push(options);
        self.outcome.clone()
    }
}

/// Applier that records every manifest it is given
#[derive(Debug, Default)]
pub struct RecordingApplier {
    failure: Option<String>,
    applied: Mutex<Vec<(String, String)>>,
}

impl RecordingApplier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(message.to_string()),
            applied: Mutex::new(Vec::new()),
        })
    }

    /// `(namespace, manifest)` pairs, in call order
    pub fn applied(&self) -> Vec<(String, String)> {
        self.applied.lock().clone()
    }
}

#[async_trait]
impl ConfigApplier for RecordingApplier {
    async fn apply(&self, namespace: &str, manifest: &str) -> Result<(), ApplyError> {
        self.applied
            .lock()
            .push((namespace.to_string(), manifest.to_string()));
        match &self.failure {
            Some(message) => Err(ApplyError::new(namespace, message.as_str())),
            None => Ok(()),
        }
    }
}

/// Config dump with bootstrap only
pub fn empty_dump() -> Snapshot {
    route_dump(&[])
}

/// Config dump in which every route in `routes` has been pushed
pub fn route_dump(routes: &[RouteExpectation]) -> Snapshot {
    let clusters: Vec<_> = routes
        .iter()
        .map(|r| json!({"versionInfo": "1", "cluster": {"name": r.cluster_name()}}))
        .collect();

    let mut by_port: BTreeMap<u16, Vec<serde_json::Value>> = BTreeMap::new();
    for route in routes {
        by_port.entry(route.port()).or_default().push(json!({
            "name": route.virtual_host_name(),
            "domains": [route.host(), route.virtual_host_name()],
        }));
    }
    let route_configs: Vec<_> = by_port
        .into_iter()
        .map(|(port, virtual_hosts)| {
            json!({
                "versionInfo": "1",
                "routeConfig": {"name": port.to_string(), "virtualHosts": virtual_hosts},
            })
        })
        .collect();

    Snapshot::from(json!({"configs": [
        {
            "@type": "type.googleapis.com/envoy.admin.v3.BootstrapConfigDump",
            "bootstrap": {"node": {"id": "sidecar~10.0.0.1"}},
        },
        {
            "@type": "type.googleapis.com/envoy.admin.v3.ClustersConfigDump",
            "dynamicActiveClusters": clusters,
        },
        {
            "@type": "type.googleapis.com/envoy.admin.v3.RoutesConfigDump",
            "dynamicRouteConfigs": route_configs,
        },
    ]}))
}

/// `count` successful results from hosts named `{prefix}-0`, `{prefix}-1`, ...
/// cycling over `replicas` distinct backends
pub fn batch(prefix: &str, replicas: usize, count: usize) -> Vec<TrafficResult> {
    (0..count)
        .map(|i| TrafficResult::ok(format!("{prefix}-{}", i % replicas.max(1))))
        .collect()
}
