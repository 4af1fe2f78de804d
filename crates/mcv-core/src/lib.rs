//! MCV Core
//!
//! Configuration and the end-to-end failover scenario: apply routing policy,
//! wait for it to reach every sidecar, then prove traffic follows it.
//!
//! # Core Concepts
//!
//! - [`McvConfig`]: Retry, traffic and convergence settings loaded from TOML
//! - [`FailoverScenario`]: Manifest, destination and expected backend pattern
//! - [`ScenarioRunner`]: Drives a scenario through apply, convergence and
//!   traffic stages
//! - [`McvError`]: One error type with a variant per stage
//!
//! # Example
//!
//! ```rust,ignore
//! use mcv_core::{FailoverScenario, McvConfig, ScenarioRunner};
//!
//! let config = McvConfig::from_file("mcv.toml")?;
//! let scenario = FailoverScenario::from_config(
//!     &config,
//!     "locality-1",
//!     manifest,
//!     "fake-service-1.example.com",
//! )?;
//! let report = ScenarioRunner::from_config(applier, &config)
//!     .run(&scenario, &caller, &workloads)
//!     .await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod config;
mod error;
mod scenario;

pub use config::{
    ConfigError, ConvergenceConfig, McvConfig, TrafficConfig, DEFAULT_EXPECTED_ORIGIN, DEFAULT_PORT,
    DEFAULT_SEND_COUNT,
};
pub use error::{McvError, Result};
pub use scenario::{FailoverScenario, ScenarioReport, ScenarioRunner};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
