//! Convergence failures

use crate::workload::WorkloadError;
use mcv_structpath::{AssertionFailed, ParseError};
use std::time::Duration;

/// Why a single poll attempt against a workload did not hold
#[derive(Debug, thiserror::Error)]
pub enum CheckFailure {
    /// Snapshot could not be fetched
    #[error(transparent)]
    Fetch(#[from] WorkloadError),

    /// Snapshot fetched but an assertion did not hold
    #[error(transparent)]
    Assertion(#[from] AssertionFailed),
}

/// Why waiting for convergence failed
#[derive(Debug, thiserror::Error)]
pub enum ConvergenceError {
    /// A workload did not reach the expected state within the policy timeout
    #[error(
        "{workload} did not converge after {elapsed:?} ({attempts} attempt(s)): {}",
        describe(.last_error)
    )]
    NotConverged {
        workload: String,
        elapsed: Duration,
        attempts: u32,
        /// Most recent fetch or assertion failure
        last_error: Option<CheckFailure>,
    },

    /// The wait was aborted while checking a workload
    #[error("wait for {workload} cancelled after {elapsed:?} ({attempts} attempt(s))")]
    Cancelled {
        workload: String,
        elapsed: Duration,
        attempts: u32,
    },

    /// Expected route could not be expressed as a query
    #[error("invalid route expectation: {0}")]
    InvalidExpectation(#[from] ParseError),

    /// Several workloads did not converge
    #[error("{} workload(s) did not converge: {}", .failures.len(), names(.failures))]
    Aggregate { failures: Vec<ConvergenceError> },
}

fn describe(last_error: &Option<CheckFailure>) -> String {
    match last_error {
        Some(err) => err.to_string(),
        None => "never satisfied".to_string(),
    }
}

fn names(failures: &[ConvergenceError]) -> String {
    failures
        .iter()
        .filter_map(ConvergenceError::workload)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ConvergenceError {
    /// Workload the failure concerns, if it concerns exactly one
    #[must_use]
    pub fn workload(&self) -> Option<&str> {
        match self {
            Self::NotConverged { workload, .. } | Self::Cancelled { workload, .. } => {
                Some(workload)
            }
            Self::InvalidExpectation(_) | Self::Aggregate { .. } => None,
        }
    }

    /// Check if the wait was cancelled
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Check if any workload ran out of time
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::NotConverged { .. } => true,
            Self::Aggregate { failures } => failures.iter().any(Self::is_timeout),
            Self::Cancelled { .. } | Self::InvalidExpectation(_) => false,
        }
    }
}
