//! Error types for MCV Core
//!
//! [`McvError`] is the single error a scenario run returns; each stage maps
//! to its own variant so callers can tell a rejected manifest from a slow
//! control plane from misrouted traffic.

use crate::config::ConfigError;
use mcv_convergence::{ApplyError, ConvergenceError};
use mcv_structpath::{ParseError, SnapshotError, ValidationError};
use mcv_traffic::TrafficError;

/// Main MCV error type
#[derive(Debug, thiserror::Error)]
pub enum McvError {
    /// Configuration could not be loaded
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Routing policy was not accepted
    #[error("apply failed: {0}")]
    Apply(#[from] ApplyError),

    /// Routing policy did not reach every workload in time
    #[error("convergence failed: {0}")]
    Convergence(#[from] ConvergenceError),

    /// Traffic did not land where expected
    #[error("traffic verification failed: {0}")]
    Traffic(#[from] TrafficError),

    /// Query expression is malformed
    #[error("invalid query: {0}")]
    Query(#[from] ParseError),

    /// Snapshot assertion did not hold
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Snapshot could not be decoded
    #[error("invalid snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
}

impl McvError {
    /// Stage the failure belongs to, for summaries
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Apply(_) => "apply",
            Self::Convergence(_) => "convergence",
            Self::Traffic(_) => "traffic",
            Self::Query(_) | Self::Validation(_) | Self::Snapshot(_) => "query",
        }
    }

    /// Check if waiting longer might have helped
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Convergence(err) => err.is_timeout(),
            _ => false,
        }
    }
}

/// Result type for MCV operations
pub type Result<T> = std::result::Result<T, McvError>;
