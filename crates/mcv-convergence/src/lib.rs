//! MCV Convergence
//!
//! Waits until pushed routing configuration has reached every data-plane
//! agent that should hold it.
//!
//! # Core Concepts
//!
//! - [`Workload`]: One agent instance whose config can be dumped
//! - [`RouteExpectation`]: The virtual host and cluster a route implies
//! - [`ConvergenceChecker`]: Polls each proxied workload until its snapshot
//!   satisfies the assertions
//! - [`ConfigApplier`]: Pushes routing policy before the wait begins
//!
//! # Example
//!
//! ```rust,ignore
//! use mcv_convergence::{ConvergenceChecker, RouteExpectation};
//! use mcv_retry::RetryPolicy;
//!
//! let route = RouteExpectation::new("fake-service-1.example.com", 80);
//! let report = ConvergenceChecker::new()
//!     .wait_for_expectation(&workloads, &route, &RetryPolicy::default())
//!     .await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod checker;
mod error;
mod route;
mod workload;

pub use checker::{CheckMode, ConvergenceChecker, ConvergenceReport, WorkloadConvergence};
pub use error::{CheckFailure, ConvergenceError};
pub use route::RouteExpectation;
pub use workload::{ApplyError, ConfigApplier, Workload, WorkloadError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
