//! MCV Structpath
//!
//! Declarative queries over configuration snapshots.
//!
//! # Core Concepts
//!
//! - [`Snapshot`]: Schema-agnostic tree decoded from an agent's config dump
//! - [`PathExpression`]: Parsed query (fields, wildcards, indices, filters)
//! - [`Assertion`]: Expression plus expected cardinality
//! - [`Validator`]: Chained assertions against one snapshot
//!
//! # Example
//!
//! ```rust
//! use mcv_structpath::{quote, Assertion, Snapshot};
//!
//! let dump = Snapshot::from_json_str(
//!     r#"{"configs": [{"dynamicActiveClusters": [{"cluster": {"name": "outbound|80||b"}}]}]}"#,
//! ).unwrap();
//!
//! let cluster = Assertion::exists(&format!(
//!     "{{.configs[*].dynamicActiveClusters[?(@.cluster.name == {})]}}",
//!     quote("outbound|80||b"),
//! )).unwrap();
//!
//! assert_eq!(cluster.check(&dump), Ok(1));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod assertion;
mod error;
mod eval;
mod expr;
mod value;

pub use assertion::{Assertion, Expectation, Validator};
pub use error::{AssertionFailed, ParseError, ValidationError};
pub use expr::{quote, CompareOp, Filter, Literal, PathExpression, Segment};
pub use value::{Snapshot, SnapshotError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
