//! Traffic verification failures

use crate::transport::TransportError;

/// Why a traffic batch did not show the expected routing outcome
///
/// Every variant names the sending service and the destination host.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrafficError {
    /// The batch could not be sent at all
    #[error("{source_name}->{destination} failed sending: {cause}")]
    Transport {
        source_name: String,
        destination: String,
        #[source]
        cause: TransportError,
    },

    /// Fewer or more results than requests
    #[error("{source_name}->{destination} expected {expected} responses, received {actual}")]
    CountMismatch {
        source_name: String,
        destination: String,
        expected: usize,
        actual: usize,
    },

    /// A request was answered by a backend outside the expected set
    #[error("{source_name}->{destination} request[{index}] made to unexpected service: {hostname}")]
    OriginMismatch {
        source_name: String,
        destination: String,
        index: usize,
        hostname: String,
    },

    /// A single request in the batch failed
    #[error("{source_name}->{destination} request[{index}] failed: {error}")]
    RequestFailed {
        source_name: String,
        destination: String,
        index: usize,
        error: String,
    },

    /// A batch of zero requests verifies nothing
    #[error("{source_name}->{destination} send count must be at least 1")]
    EmptyBatch {
        source_name: String,
        destination: String,
    },
}

impl TrafficError {
    /// Index of the offending request, for per-request failures
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::OriginMismatch { index, .. } | Self::RequestFailed { index, .. } => Some(*index),
            Self::Transport { .. } | Self::CountMismatch { .. } | Self::EmptyBatch { .. } => None,
        }
    }
}
