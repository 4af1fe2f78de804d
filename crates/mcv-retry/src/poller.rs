//! Deadline-bounded polling
//!
//! [`RetryPoller::wait_for`] drives a small state machine:
//!
//! ```text
//! Running --predicate Ok(true) x converge--> Succeeded
//! Running --elapsed >= timeout-----------> TimedOut(last error)
//! Running --cancellation token-----------> Cancelled
//! ```
//!
//! Transitions are computed by [`PollMachine`] from attempt results and
//! clock readings alone; the async driver only awaits the predicate and the
//! backoff sleep, each raced against cancellation.

use crate::clock::{Clock, TokioClock};
use crate::error::RetryError;
use crate::policy::RetryPolicy;
use rand::rngs::StdRng;
use std::fmt::{Debug, Display};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Successful poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSummary {
    /// Predicate invocations made
    pub attempts: u32,
    /// Time from start to success
    pub elapsed: Duration,
}

/// Polls a predicate until it holds, time runs out, or the caller cancels
#[derive(Debug, Clone)]
pub struct RetryPoller {
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
}

impl RetryPoller {
    /// Create a poller on the tokio clock with its own cancellation token
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            clock: Arc::new(TokioClock),
            cancel: CancellationToken::new(),
        }
    }

    /// With a custom time source
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// With an externally owned cancellation token
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Get the policy
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Token that aborts this poller's waits
    #[inline]
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Repeatedly evaluate `predicate` until it holds
    ///
    /// `Ok(true)` counts as a success, `Ok(false)` and `Err(_)` as a
    /// transient failure that resets the consecutive-success count. The
    /// timeout is measured from the start of this call.
    ///
    /// # Errors
    /// - `RetryError::Timeout` once the elapsed time meets the policy
    ///   timeout, carrying the most recent predicate error
    /// - `RetryError::Cancelled` as soon as the token fires, including
    ///   mid-attempt and mid-backoff
    pub async fn wait_for<F, Fut, E>(&self, mut predicate: F) -> Result<PollSummary, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool, E>>,
        E: Display + Debug,
    {
        let mut machine = PollMachine::new(&self.policy, self.clock.now());

        loop {
            if self.cancel.is_cancelled() {
                return Err(machine.cancelled(self.clock.now()));
            }

            let result = tokio::select! {
                biased;
                () = self.cancel.cancelled() => None,
                result = predicate() => Some(result),
            };
            let Some(result) = result else {
                return Err(machine.cancelled(self.clock.now()));
            };

            match machine.record(result, self.clock.now()) {
                Step::Succeeded(summary) => return Ok(summary),
                Step::TimedOut => return Err(machine.timed_out(self.clock.now())),
                Step::RetryAfter(delay) => {
                    tracing::trace!(attempt = machine.attempts, ?delay, "predicate not satisfied");
                    let slept = tokio::select! {
                        biased;
                        () = self.cancel.cancelled() => false,
                        () = self.clock.sleep(delay) => true,
                    };
                    if !slept {
                        return Err(machine.cancelled(self.clock.now()));
                    }
                }
            }
        }
    }
}

/// Next move after an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Succeeded(PollSummary),
    TimedOut,
    RetryAfter(Duration),
}

/// Pure transition logic for one poll
#[derive(Debug)]
pub(crate) struct PollMachine<'p, E> {
    policy: &'p RetryPolicy,
    started: Instant,
    attempts: u32,
    streak: u32,
    last_error: Option<E>,
    rng: Option<StdRng>,
}

impl<'p, E: Display + Debug> PollMachine<'p, E> {
    pub(crate) fn new(policy: &'p RetryPolicy, started: Instant) -> Self {
        Self {
            policy,
            started,
            attempts: 0,
            streak: 0,
            last_error: None,
            rng: policy.jitter.as_ref().map(|j| j.rng()),
        }
    }

    pub(crate) fn record(&mut self, result: Result<bool, E>, now: Instant) -> Step {
        self.attempts += 1;
        match result {
            Ok(true) => {
                self.streak += 1;
                if self.streak >= self.policy.required_successes() {
                    return Step::Succeeded(PollSummary {
                        attempts: self.attempts,
                        elapsed: self.elapsed(now),
                    });
                }
            }
            Ok(false) => self.streak = 0,
            Err(err) => {
                self.streak = 0;
                self.last_error = Some(err);
            }
        }

        let elapsed = self.elapsed(now);
        if elapsed >= self.policy.timeout {
            return Step::TimedOut;
        }

        let mut delay = self.policy.backoff.delay(self.attempts - 1);
        if let (Some(jitter), Some(rng)) = (self.policy.jitter.as_ref(), self.rng.as_mut()) {
            delay = jitter.apply(delay, rng);
        }
        Step::RetryAfter(delay.min(self.policy.timeout - elapsed))
    }

    pub(crate) fn timed_out(self, now: Instant) -> RetryError<E> {
        RetryError::Timeout {
            elapsed: self.elapsed(now),
            attempts: self.attempts,
            last_error: self.last_error,
        }
    }

    pub(crate) fn cancelled(self, now: Instant) -> RetryError<E> {
        RetryError::Cancelled {
            elapsed: self.elapsed(now),
            attempts: self.attempts,
        }
    }

    fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }
}
