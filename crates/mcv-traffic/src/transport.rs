//! Request transport seam

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One batch of identical requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOptions {
    /// Endpoint the requests are addressed to
    pub target: String,
    /// Named port on the target
    pub port_name: String,
    /// Headers sent with every request, in order
    pub headers: Vec<(String, String)>,
    /// Number of requests
    pub count: usize,
}

impl CallOptions {
    /// Create options for `count` requests to `target`
    #[must_use]
    pub fn new(target: impl Into<String>, port_name: impl Into<String>, count: usize) -> Self {
        Self {
            target: target.into(),
            port_name: port_name.into(),
            headers: Vec::new(),
            count,
        }
    }

    /// With an extra header
    #[inline]
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First value of a header, matched case-insensitively
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// One completed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficResult {
    /// Whether the request completed successfully
    pub ok: bool,
    /// Identity of the backend that answered
    pub hostname: String,
    /// Per-request failure, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TrafficResult {
    /// Successful response from `hostname`
    #[must_use]
    pub fn ok(hostname: impl Into<String>) -> Self {
        Self {
            ok: true,
            hostname: hostname.into(),
            error: None,
        }
    }

    /// Failed request
    #[must_use]
    pub fn failed(hostname: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            hostname: hostname.into(),
            error: Some(error.into()),
        }
    }
}

/// Batch-level transport failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    /// Create transport error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Sends request batches on behalf of a caller
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue `options.count` requests and return one result per completed
    /// request
    async fn call(&self, options: CallOptions) -> Result<Vec<TrafficResult>, TransportError>;
}

/// Source endpoint traffic is sent from
#[derive(Clone)]
pub struct Caller {
    name: String,
    transport: Arc<dyn Transport>,
}

impl Caller {
    /// Create caller
    pub fn new(name: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            name: name.into(),
            transport,
        }
    }

    /// Service name of the caller
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Transport requests go through
    #[inline]
    #[must_use]
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }
}

impl fmt::Debug for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Caller").field("name", &self.name).finish_non_exhaustive()
    }
}
