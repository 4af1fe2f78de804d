//! Terminal poll failures

use std::fmt::{Debug, Display};
use std::time::Duration;

/// Why a poll ended without success
///
/// `E` is the predicate's own error type; a timeout carries the most recent
/// one so the caller can report the underlying cause.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E>
where
    E: Display + Debug,
{
    /// The policy's time budget ran out
    #[error(
        "timed out after {elapsed:?} ({attempts} attempt(s)): {}",
        describe(.last_error)
    )]
    Timeout {
        /// Time since the poll started
        elapsed: Duration,
        /// Predicate invocations made
        attempts: u32,
        /// Most recent predicate error, if any attempt produced one
        last_error: Option<E>,
    },

    /// The caller aborted the poll
    #[error("cancelled after {elapsed:?} ({attempts} attempt(s))")]
    Cancelled {
        /// Time since the poll started
        elapsed: Duration,
        /// Predicate invocations made
        attempts: u32,
    },
}

fn describe<E: Display>(last_error: &Option<E>) -> String {
    match last_error {
        Some(err) => err.to_string(),
        None => "predicate never became true".to_string(),
    }
}

impl<E: Display + Debug> RetryError<E> {
    /// Check if the poll ran out of time
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if the poll was cancelled
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Most recent predicate error, for timeouts
    #[inline]
    #[must_use]
    pub fn last_error(&self) -> Option<&E> {
        match self {
            Self::Timeout { last_error, .. } => last_error.as_ref(),
            Self::Cancelled { .. } => None,
        }
    }

    /// Predicate invocations made before the poll ended
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Timeout { attempts, .. } | Self::Cancelled { attempts, .. } => *attempts,
        }
    }

    /// Convert the carried predicate error
    pub fn map_err<F, G>(self, f: F) -> RetryError<G>
    where
        F: FnOnce(E) -> G,
        G: Display + Debug,
    {
        match self {
            Self::Timeout {
                elapsed,
                attempts,
                last_error,
            } => RetryError::Timeout {
                elapsed,
                attempts,
                last_error: last_error.map(f),
            },
            Self::Cancelled { elapsed, attempts } => RetryError::Cancelled { elapsed, attempts },
        }
    }
}
