//! Collaborator seams
//!
//! - [`Workload`]: one data-plane agent whose configuration can be dumped
//! - [`ConfigApplier`]: pushes an already-rendered routing-policy manifest
//!
//! Both are implemented by the orchestration framework, not here.

use async_trait::async_trait;
use mcv_structpath::{Snapshot, SnapshotError};

/// One data-plane agent instance
#[async_trait]
pub trait Workload: Send + Sync {
    /// Identity used in diagnostics (pod or instance name)
    fn name(&self) -> &str;

    /// Whether a sidecar proxy is attached; proxy-less workloads are skipped
    fn has_proxy(&self) -> bool;

    /// Fetch the agent's current dynamic configuration
    async fn fetch_snapshot(&self) -> Result<Snapshot, WorkloadError>;
}

/// Failure fetching a workload's configuration
#[derive(Debug, thiserror::Error)]
pub enum WorkloadError {
    /// The agent's admin endpoint could not be reached
    #[error("failed to fetch config from {workload}: {message}")]
    Unreachable { workload: String, message: String },

    /// The dump arrived but did not decode
    #[error("config from {workload} did not decode: {source}")]
    Decode {
        workload: String,
        #[source]
        source: SnapshotError,
    },
}

impl WorkloadError {
    /// Create unreachable error for a workload
    pub fn unreachable(workload: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unreachable {
            workload: workload.into(),
            message: message.into(),
        }
    }

    /// Create decode error for a workload
    pub fn decode(workload: impl Into<String>, source: SnapshotError) -> Self {
        Self::Decode {
            workload: workload.into(),
            source,
        }
    }
}

/// Pushes routing policy into the control plane
#[async_trait]
pub trait ConfigApplier: Send + Sync {
    /// Apply a rendered manifest into `namespace`
    async fn apply(&self, namespace: &str, manifest: &str) -> Result<(), ApplyError>;
}

/// Failure applying a manifest
#[derive(Debug, thiserror::Error)]
#[error("failed to apply config to namespace {namespace}: {message}")]
pub struct ApplyError {
    pub namespace: String,
    pub message: String,
}

impl ApplyError {
    /// Create apply error
    pub fn new(namespace: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            message: message.into(),
        }
    }
}
