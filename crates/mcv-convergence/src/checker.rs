//! Waiting for workloads to converge
//!
//! Each proxied workload is polled in input order. One poll fetches a fresh
//! snapshot and checks every assertion against it; a fetch error or a failed
//! assertion is a transient cause that the poller retries until the policy
//! runs out.

use crate::error::{CheckFailure, ConvergenceError};
use crate::route::RouteExpectation;
use crate::workload::Workload;
use mcv_retry::{CancellationToken, Clock, RetryError, RetryPoller, RetryPolicy, TokioClock};
use mcv_structpath::Assertion;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// How failures across workloads are reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckMode {
    /// Stop at the first workload that does not converge
    #[default]
    FailFast,
    /// Check every workload, then report all that did not converge
    CollectAll,
}

/// One workload that reached the expected state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkloadConvergence {
    pub workload: String,
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Outcome of a successful wait
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConvergenceReport {
    /// Proxied workloads, in input order
    pub converged: Vec<WorkloadConvergence>,
    /// Workloads without a proxy
    pub skipped: Vec<String>,
}

impl ConvergenceReport {
    /// Longest single-workload wait
    #[must_use]
    pub fn slowest(&self) -> Option<&WorkloadConvergence> {
        self.converged.iter().max_by_key(|c| c.elapsed)
    }
}

/// Waits until every proxied workload satisfies a set of assertions
#[derive(Debug, Clone)]
pub struct ConvergenceChecker {
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
    mode: CheckMode,
}

impl Default for ConvergenceChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl ConvergenceChecker {
    /// Create a fail-fast checker on the tokio clock
    #[must_use]
    pub fn new() -> Self {
        Self {
            clock: Arc::new(TokioClock),
            cancel: CancellationToken::new(),
            mode: CheckMode::default(),
        }
    }

    /// With a custom time source
    #[inline]
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// With an externally owned cancellation token
    #[inline]
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// With failure reporting mode
    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: CheckMode) -> Self {
        self.mode = mode;
        self
    }

    /// Get the failure reporting mode
    #[inline]
    #[must_use]
    pub fn mode(&self) -> CheckMode {
        self.mode
    }

    /// Token that aborts in-progress waits
    #[inline]
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Wait until every proxied workload satisfies all `assertions`
    ///
    /// Workloads are checked one after another in input order, each with a
    /// fresh time budget from `policy`.
    ///
    /// # Errors
    /// - `ConvergenceError::NotConverged` naming the first workload whose
    ///   poll timed out, with the last fetch or assertion failure
    /// - `ConvergenceError::Cancelled` once the cancellation token fires
    /// - `ConvergenceError::Aggregate` in collect-all mode when more than
    ///   one workload did not converge
    pub async fn wait_for_route(
        &self,
        workloads: &[Arc<dyn Workload>],
        assertions: &[Assertion],
        policy: &RetryPolicy,
    ) -> Result<ConvergenceReport, ConvergenceError> {
        let poller = RetryPoller::new(policy.clone())
            .with_clock(Arc::clone(&self.clock))
            .with_cancellation(self.cancel.clone());
        let mut report = ConvergenceReport::default();
        let mut failures = Vec::new();

        for workload in workloads {
            if !workload.has_proxy() {
                tracing::debug!(workload = workload.name(), "no proxy attached, skipping");
                report.skipped.push(workload.name().to_string());
                continue;
            }

            let outcome = poller
                .wait_for(|| {
                    let workload = Arc::clone(workload);
                    async move { check_snapshot(workload.as_ref(), assertions).await }
                })
                .await;

            match outcome {
                Ok(summary) => {
                    tracing::debug!(
                        workload = workload.name(),
                        attempts = summary.attempts,
                        elapsed = ?summary.elapsed,
                        "workload converged"
                    );
                    report.converged.push(WorkloadConvergence {
                        workload: workload.name().to_string(),
                        attempts: summary.attempts,
                        elapsed: summary.elapsed,
                    });
                }
                Err(err) => {
                    let err = not_converged(workload.name(), err);
                    tracing::debug!(
                        workload = workload.name(),
                        error = %err,
                        "workload did not converge"
                    );
                    if self.mode == CheckMode::FailFast || err.is_cancelled() {
                        return Err(err);
                    }
                    failures.push(err);
                }
            }
        }

        match failures.len() {
            0 => Ok(report),
            1 => Err(failures.remove(0)),
            _ => Err(ConvergenceError::Aggregate { failures }),
        }
    }

    /// Wait until every proxied workload holds the route to `expectation`
    ///
    /// # Errors
    /// As [`wait_for_route`](Self::wait_for_route), plus
    /// `ConvergenceError::InvalidExpectation` if the route queries do not
    /// parse
    pub async fn wait_for_expectation(
        &self,
        workloads: &[Arc<dyn Workload>],
        expectation: &RouteExpectation,
        policy: &RetryPolicy,
    ) -> Result<ConvergenceReport, ConvergenceError> {
        let assertions = expectation.present()?;
        self.wait_for_route(workloads, &assertions, policy).await
    }
}

/// One attempt: fetch then check every assertion
async fn check_snapshot(
    workload: &dyn Workload,
    assertions: &[Assertion],
) -> Result<bool, CheckFailure> {
    let snapshot = workload.fetch_snapshot().await?;
    for assertion in assertions {
        assertion.check(&snapshot)?;
    }
    Ok(true)
}

fn not_converged(workload: &str, err: RetryError<CheckFailure>) -> ConvergenceError {
    match err {
        RetryError::Timeout {
            elapsed,
            attempts,
            last_error,
        } => ConvergenceError::NotConverged {
            workload: workload.to_string(),
            elapsed,
            attempts,
            last_error,
        },
        RetryError::Cancelled { elapsed, attempts } => ConvergenceError::Cancelled {
            workload: workload.to_string(),
            elapsed,
            attempts,
        },
    }
}
