//! MCV Retry
//!
//! Polls a predicate until it holds, its time budget runs out, or the
//! caller cancels. Time and randomness are injected so every path is
//! reproducible in tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use mcv_retry::{RetryPoller, RetryPolicy};
//! use std::time::Duration;
//!
//! let poller = RetryPoller::new(RetryPolicy::new().with_timeout(Duration::from_secs(10)));
//! poller.wait_for(|| async { fetch_and_check().await }).await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod clock;
mod error;
mod policy;
mod poller;

pub use clock::{Clock, SimulatedClock, TokioClock};
pub use error::RetryError;
pub use policy::{Backoff, Jitter, RetryPolicy};
pub use poller::{PollSummary, RetryPoller};

pub use tokio_util::sync::CancellationToken;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
