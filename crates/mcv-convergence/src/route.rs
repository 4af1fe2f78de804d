//! Route expectations
//!
//! A host is routable from a sidecar once the proxy holds both a virtual
//! host named `host:port` in one of its dynamic route configs and an active
//! outbound cluster named `outbound|port||host`.

use mcv_structpath::{quote, Assertion, Expectation, ParseError, PathExpression};

/// Expected outbound route to a host
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteExpectation {
    host: String,
    port: u16,
}

impl RouteExpectation {
    /// Create expectation for `host` on `port`
    #[inline]
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Target host
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Target port
    #[inline]
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Virtual host name the route config carries
    #[must_use]
    pub fn virtual_host_name(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Outbound cluster name
    #[must_use]
    pub fn cluster_name(&self) -> String {
        format!("outbound|{}||{}", self.port, self.host)
    }

    /// Query selecting the virtual host
    ///
    /// # Errors
    /// Returns `ParseError` only if the generated expression is malformed
    pub fn virtual_host_query(&self) -> Result<PathExpression, ParseError> {
        PathExpression::parse(&format!(
            "{{.configs[*].dynamicRouteConfigs[*].routeConfig.virtualHosts[?(@.name == {})]}}",
            quote(&self.virtual_host_name())
        ))
    }

    /// Query selecting the active cluster
    ///
    /// # Errors
    /// Returns `ParseError` only if the generated expression is malformed
    pub fn cluster_query(&self) -> Result<PathExpression, ParseError> {
        PathExpression::parse(&format!(
            "{{.configs[*].dynamicActiveClusters[?(@.cluster.name == {})]}}",
            quote(&self.cluster_name())
        ))
    }

    /// Assertions that hold once the route has been pushed
    ///
    /// # Errors
    /// Returns `ParseError` only if a generated expression is malformed
    pub fn present(&self) -> Result<Vec<Assertion>, ParseError> {
        self.assertions(Expectation::MustExist)
    }

    /// Assertions that hold once the route has been withdrawn
    ///
    /// # Errors
    /// Returns `ParseError` only if a generated expression is malformed
    pub fn absent(&self) -> Result<Vec<Assertion>, ParseError> {
        self.assertions(Expectation::MustNotExist)
    }

    fn assertions(&self, expectation: Expectation) -> Result<Vec<Assertion>, ParseError> {
        Ok(vec![
            Assertion::new(self.virtual_host_query()?, expectation),
            Assertion::new(self.cluster_query()?, expectation),
        ])
    }
}
