//! MCV Traffic
//!
//! Sends a bounded batch of requests through a caller's sidecar and checks
//! that every response came from the expected set of backends.
//!
//! # Core Concepts
//!
//! - [`Transport`]: Issues a batch and returns one [`TrafficResult`] per request
//! - [`Caller`]: Named source endpoint plus its transport
//! - [`OriginMatcher`]: Pattern the responding backend's identity must contain
//! - [`TrafficVerifier`]: Sends, then checks count and origin
//!
//! # Example
//!
//! ```rust,ignore
//! use mcv_traffic::{OriginMatcher, TrafficVerifier};
//!
//! let report = TrafficVerifier::new()
//!     .send_and_verify(&caller, "fake-service-1.example.com", 100, &OriginMatcher::new("^b-.*$")?)
//!     .await?;
//! assert_eq!(report.sent, 100);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod matcher;
mod transport;
mod verifier;

pub use error::TrafficError;
pub use matcher::OriginMatcher;
pub use transport::{CallOptions, Caller, TrafficResult, Transport, TransportError};
pub use verifier::{verify, TrafficReport, TrafficVerifier, DEFAULT_PORT_NAME};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
