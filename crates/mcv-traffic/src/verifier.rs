//! Batch send and verify

use crate::error::TrafficError;
use crate::matcher::OriginMatcher;
use crate::transport::{CallOptions, Caller, TrafficResult};
use indexmap::IndexMap;
use serde::Serialize;

/// Port name requests are sent on unless configured otherwise
pub const DEFAULT_PORT_NAME: &str = "http";

/// Verified batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrafficReport {
    pub source: String,
    pub destination: String,
    /// Requests sent, equal to results received
    pub sent: usize,
    /// Responses per backend identity, in first-seen order
    pub backends: IndexMap<String, usize>,
}

impl TrafficReport {
    /// Responses answered by `hostname`
    #[must_use]
    pub fn hits(&self, hostname: &str) -> usize {
        self.backends.get(hostname).copied().unwrap_or(0)
    }
}

/// Sends a batch through a caller and checks where it landed
#[derive(Debug, Clone)]
pub struct TrafficVerifier {
    port_name: String,
}

impl Default for TrafficVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TrafficVerifier {
    /// Create verifier sending on the `http` port
    #[must_use]
    pub fn new() -> Self {
        Self {
            port_name: DEFAULT_PORT_NAME.to_string(),
        }
    }

    /// With a different named port
    #[inline]
    #[must_use]
    pub fn with_port_name(mut self, port_name: impl Into<String>) -> Self {
        self.port_name = port_name.into();
        self
    }

    /// Get the port name
    #[inline]
    #[must_use]
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Send `send_count` requests for `host` and check every response
    ///
    /// Requests are addressed to the caller itself with a `Host` header
    /// naming `host`, so routing is decided by the caller's sidecar.
    ///
    /// # Errors
    /// - `TrafficError::EmptyBatch` if `send_count` is zero
    /// - `TrafficError::Transport` if the batch could not be sent
    /// - `TrafficError::CountMismatch` if the result count differs
    /// - `TrafficError::RequestFailed` / `OriginMismatch` for the first
    ///   failed request or unexpected backend, by index
    pub async fn send_and_verify(
        &self,
        caller: &Caller,
        host: &str,
        send_count: usize,
        matcher: &OriginMatcher,
    ) -> Result<TrafficReport, TrafficError> {
        let source_name = caller.name();
        if send_count == 0 {
            return Err(TrafficError::EmptyBatch {
                source_name: source_name.to_string(),
                destination: host.to_string(),
            });
        }

        let options = CallOptions::new(source_name, &self.port_name, send_count)
            .with_header("Host", host);
        let results = caller
            .transport()
            .call(options)
            .await
            .map_err(|cause| TrafficError::Transport {
                source_name: source_name.to_string(),
                destination: host.to_string(),
                cause,
            })?;

        let report = verify(source_name, host, send_count, &results, matcher)?;
        tracing::debug!(
            source = source_name,
            destination = host,
            sent = send_count,
            backends = report.backends.len(),
            "traffic verified"
        );
        Ok(report)
    }
}

/// Check a completed batch against the expected count and origin
///
/// # Errors
/// As [`TrafficVerifier::send_and_verify`], minus transport failures
pub fn verify(
    source_name: &str,
    destination: &str,
    expected: usize,
    results: &[TrafficResult],
    matcher: &OriginMatcher,
) -> Result<TrafficReport, TrafficError> {
    if results.len() != expected {
        return Err(TrafficError::CountMismatch {
            source_name: source_name.to_string(),
            destination: destination.to_string(),
            expected,
            actual: results.len(),
        });
    }

    let mut backends = IndexMap::new();
    for (index, result) in results.iter().enumerate() {
        if !result.ok {
            return Err(TrafficError::RequestFailed {
                source_name: source_name.to_string(),
                destination: destination.to_string(),
                index,
                error: result.error.clone().unwrap_or_else(|| "unknown error".to_string()),
            });
        }
        if !matcher.matches(&result.hostname) {
            return Err(TrafficError::OriginMismatch {
                source_name: source_name.to_string(),
                destination: destination.to_string(),
                index,
                hostname: result.hostname.clone(),
            });
        }
        *backends.entry(result.hostname.clone()).or_insert(0) += 1;
    }

    Ok(TrafficReport {
        source: source_name.to_string(),
        destination: destination.to_string(),
        sent: expected,
        backends,
    })
}
