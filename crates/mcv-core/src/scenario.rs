//! Locality failover scenario
//!
//! One run pushes a rendered routing policy, waits until every proxied
//! workload of the caller holds the route to the destination, then sends a
//! batch and checks that every response came from the expected locality.

use crate::config::{McvConfig, DEFAULT_PORT, DEFAULT_SEND_COUNT};
use crate::error::Result;
use mcv_convergence::{
    ConfigApplier, ConvergenceChecker, ConvergenceReport, RouteExpectation, Workload,
};
use mcv_retry::RetryPolicy;
use mcv_traffic::{Caller, OriginMatcher, TrafficReport, TrafficVerifier};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// One routing policy and the traffic outcome it should produce
#[derive(Debug, Clone)]
pub struct FailoverScenario {
    pub namespace: String,
    /// Rendered routing-policy document
    pub manifest: String,
    /// Destination host traffic is addressed to
    pub host: String,
    pub port: u16,
    pub send_count: usize,
    pub expected_origin: OriginMatcher,
}

impl FailoverScenario {
    /// Create scenario with default port and batch size
    #[must_use]
    pub fn new(
        namespace: impl Into<String>,
        manifest: impl Into<String>,
        host: impl Into<String>,
        expected_origin: OriginMatcher,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            manifest: manifest.into(),
            host: host.into(),
            port: DEFAULT_PORT,
            send_count: DEFAULT_SEND_COUNT,
            expected_origin,
        }
    }

    /// Create scenario taking port, batch size and expected origin from
    /// configuration
    ///
    /// # Errors
    /// Returns `McvError::Config` if the configured origin pattern is invalid
    pub fn from_config(
        config: &McvConfig,
        namespace: impl Into<String>,
        manifest: impl Into<String>,
        host: impl Into<String>,
    ) -> Result<Self> {
        let expected_origin = config.traffic.origin_matcher()?;
        Ok(Self::new(namespace, manifest, host, expected_origin)
            .with_port(config.traffic.port)
            .with_send_count(config.traffic.send_count))
    }

    /// With destination port
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// With batch size
    #[inline]
    #[must_use]
    pub fn with_send_count(mut self, send_count: usize) -> Self {
        self.send_count = send_count;
        self
    }

    /// With expected backend pattern
    #[inline]
    #[must_use]
    pub fn with_expected_origin(mut self, matcher: OriginMatcher) -> Self {
        self.expected_origin = matcher;
        self
    }

    /// Route every proxied workload must hold before traffic is sent
    #[must_use]
    pub fn route(&self) -> RouteExpectation {
        RouteExpectation::new(&self.host, self.port)
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    pub convergence: ConvergenceReport,
    pub traffic: TrafficReport,
}

/// Drives scenarios through apply, convergence and traffic stages
#[derive(Clone)]
pub struct ScenarioRunner {
    applier: Arc<dyn ConfigApplier>,
    checker: ConvergenceChecker,
    verifier: TrafficVerifier,
    policy: RetryPolicy,
}

impl ScenarioRunner {
    /// Create runner with default checker, verifier and policy
    pub fn new(applier: Arc<dyn ConfigApplier>) -> Self {
        Self {
            applier,
            checker: ConvergenceChecker::new(),
            verifier: TrafficVerifier::new(),
            policy: RetryPolicy::default(),
        }
    }

    /// Create runner from configuration
    pub fn from_config(applier: Arc<dyn ConfigApplier>, config: &McvConfig) -> Self {
        Self::new(applier)
            .with_checker(ConvergenceChecker::new().with_mode(config.convergence.mode))
            .with_verifier(TrafficVerifier::new().with_port_name(&config.traffic.port_name))
            .with_policy(config.retry.clone())
    }

    /// With convergence checker
    #[inline]
    #[must_use]
    pub fn with_checker(mut self, checker: ConvergenceChecker) -> Self {
        self.checker = checker;
        self
    }

    /// With traffic verifier
    #[inline]
    #[must_use]
    pub fn with_verifier(mut self, verifier: TrafficVerifier) -> Self {
        self.verifier = verifier;
        self
    }

    /// With retry policy for convergence waits
    #[inline]
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run one scenario
    ///
    /// `workloads` are the caller's instances; each proxied one must hold
    /// the route before any traffic is sent.
    ///
    /// # Errors
    /// - `McvError::Apply` if the manifest is rejected
    /// - `McvError::Convergence` if a workload never receives the route
    /// - `McvError::Traffic` if the batch fails or lands elsewhere
    pub async fn run(
        &self,
        scenario: &FailoverScenario,
        caller: &Caller,
        workloads: &[Arc<dyn Workload>],
    ) -> Result<ScenarioReport> {
        tracing::info!("Applying routing policy to namespace {}", scenario.namespace);
        self.applier.apply(&scenario.namespace, &scenario.manifest).await?;

        let route = scenario.route();
        tracing::info!(
            "Waiting for route {} on {} workload(s)",
            route.virtual_host_name(),
            workloads.len()
        );
        let convergence = self
            .checker
            .wait_for_expectation(workloads, &route, &self.policy)
            .await?;

        tracing::info!(
            "Sending {} requests {}->{}",
            scenario.send_count,
            caller.name(),
            scenario.host
        );
        let traffic = self
            .verifier
            .send_and_verify(
                caller,
                &scenario.host,
                scenario.send_count,
                &scenario.expected_origin,
            )
            .await?;

        tracing::info!("Scenario passed: {} backend(s) answered", traffic.backends.len());
        Ok(ScenarioReport { convergence, traffic })
    }
}

impl fmt::Debug for ScenarioRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioRunner")
            .field("checker", &self.checker)
            .field("verifier", &self.verifier)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
