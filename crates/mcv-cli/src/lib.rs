//! MCV command-line support
//!
//! The `mcv` binary queries config dump files and waits for assertions over
//! them to hold. A dump file stands in for a workload: it is re-read on every
//! poll attempt.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod commands;
mod source;

pub use source::{FileWorkload, SnapshotFormat};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
