//! Retry policy and backoff strategies
//!
//! Provides [`RetryPolicy`]: how long to keep polling, how long to wait
//! between attempts, and how many consecutive successes count as converged.
//! Durations serialize as integer milliseconds (`timeout_ms`, `delay_ms`).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Polling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryPolicy {
    /// Maximum wall-clock time to keep retrying, measured per call
    #[serde(rename = "timeout_ms", with = "millis")]
    pub timeout: Duration,
    /// Delay strategy between attempts
    pub backoff: Backoff,
    /// Consecutive successes required before reporting success
    pub converge: u32,
    /// Optional randomization of each delay
    pub jitter: Option<Jitter>,
}

impl RetryPolicy {
    /// Create default policy
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// With backoff strategy
    #[inline]
    #[must_use]
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// With a fixed delay between attempts
    #[inline]
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        self.with_backoff(Backoff::Fixed { delay })
    }

    /// Require `n` consecutive successes (0 is treated as 1)
    #[inline]
    #[must_use]
    pub fn with_converge(mut self, n: u32) -> Self {
        self.converge = n;
        self
    }

    /// With seeded jitter
    #[inline]
    #[must_use]
    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Effective consecutive-success requirement
    #[inline]
    #[must_use]
    pub fn required_successes(&self) -> u32 {
        self.converge.max(1)
    }
}

impl Default for RetryPolicy {
    /// Default: 10s timeout, fixed 100ms delay, converge on first success
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            backoff: Backoff::default(),
            converge: 1,
            jitter: None,
        }
    }
}

/// Delay strategy between attempts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Backoff {
    /// Same delay after every attempt
    Fixed {
        #[serde(rename = "delay_ms", with = "millis")]
        delay: Duration,
    },
    /// Delay grows geometrically up to a cap
    Exponential {
        #[serde(rename = "initial_ms", with = "millis")]
        initial: Duration,
        #[serde(rename = "max_ms", with = "millis")]
        max: Duration,
        multiplier: f64,
    },
}

impl Backoff {
    /// Delay to wait after the given failed attempt (0-indexed)
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => *delay,
            Self::Exponential {
                initial,
                max,
                multiplier,
            } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let secs = initial.as_secs_f64() * multiplier.max(1.0).powi(exponent);
                Duration::try_from_secs_f64(secs)
                    .map_or(*max, |d| d.min(*max))
            }
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Fixed {
            delay: Duration::from_millis(100),
        }
    }
}

/// Randomized shortening of each delay
///
/// Each delay is scaled by a factor drawn uniformly from
/// `[1 - ratio, 1]`. The generator is seeded per poll from `seed`, so a
/// given policy always produces the same delay sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Jitter {
    /// Fraction of the delay that may be removed, clamped to `[0, 1]`.
    /// A non-finite ratio disables jitter.
    pub ratio: f64,
    /// Seed for the per-poll generator
    pub seed: u64,
}

impl Jitter {
    /// Create jitter with the given ratio and seed
    #[inline]
    #[must_use]
    pub fn new(ratio: f64, seed: u64) -> Self {
        Self { ratio, seed }
    }

    pub(crate) fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }

    pub(crate) fn apply(&self, delay: Duration, rng: &mut StdRng) -> Duration {
        let ratio = if self.ratio.is_finite() {
            self.ratio.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if ratio == 0.0 {
            return delay;
        }
        let factor = rng.random_range((1.0 - ratio)..=1.0);
        delay.mul_f64(factor)
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.timeout, Duration::from_secs(10));
        assert_eq!(policy.backoff.delay(7), Duration::from_millis(100));
        assert_eq!(policy.required_successes(), 1);
    }

    #[test]
    fn converge_zero_means_one() {
        assert_eq!(RetryPolicy::new().with_converge(0).required_successes(), 1);
        assert_eq!(RetryPolicy::new().with_converge(3).required_successes(), 3);
    }

    #[test]
    fn exponential_grows_and_caps() {
        let backoff = Backoff::Exponential {
            initial: Duration::from_millis(10),
            max: Duration::from_millis(100),
            multiplier: 2.0,
        };
        assert_eq!(backoff.delay(0), Duration::from_millis(10));
        assert_eq!(backoff.delay(1), Duration::from_millis(20));
        assert_eq!(backoff.delay(3), Duration::from_millis(80));
        assert_eq!(backoff.delay(4), Duration::from_millis(100));
        assert_eq!(backoff.delay(u32::MAX), Duration::from_millis(100));
    }

    #[test]
    fn jitter_is_seeded_and_bounded() {
        let jitter = Jitter::new(0.5, 7);
        let delay = Duration::from_millis(200);

        let mut a = jitter.rng();
        let mut b = jitter.rng();
        for _ in 0..32 {
            let da = jitter.apply(delay, &mut a);
            let db = jitter.apply(delay, &mut b);
            assert_eq!(da, db);
            assert!(da >= Duration::from_millis(100) && da <= delay);
        }
    }

    #[test]
    fn zero_jitter_is_identity() {
        let jitter = Jitter::new(0.0, 1);
        let mut rng = jitter.rng();
        assert_eq!(jitter.apply(Duration::from_secs(1), &mut rng), Duration::from_secs(1));
    }

    #[test]
    fn non_finite_jitter_is_identity() {
        let delay = Duration::from_millis(250);
        for ratio in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let jitter = Jitter::new(ratio, 3);
            let mut rng = jitter.rng();
            assert_eq!(jitter.apply(delay, &mut rng), delay);
        }
    }

    #[test]
    fn policy_round_trips_as_milliseconds() {
        let policy = RetryPolicy::new()
            .with_timeout(Duration::from_secs(2))
            .with_backoff(Backoff::Exponential {
                initial: Duration::from_millis(5),
                max: Duration::from_millis(500),
                multiplier: 1.5,
            });
        let json = serde_json::to_value(&policy).unwrap();
        assert_eq!(json["timeout_ms"], 2000);
        assert_eq!(json["backoff"]["kind"], "exponential");
        assert_eq!(json["backoff"]["initial_ms"], 5);

        let back: RetryPolicy = serde_json::from_value(json).unwrap();
        assert_eq!(back, policy);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let policy: RetryPolicy = toml::from_str(
            r#"
            timeout_ms = 500
            backoff = { kind = "fixed", delay_ms = 25 }
            "#,
        )
        .unwrap();
        assert_eq!(policy.timeout, Duration::from_millis(500));
        assert_eq!(policy.backoff.delay(0), Duration::from_millis(25));
        assert_eq!(policy.converge, 1);
        assert!(policy.jitter.is_none());
    }

    #[test]
    fn misspelled_keys_rejected() {
        assert!(toml::from_str::<RetryPolicy>("timeout = 500").is_err());
        assert!(toml::from_str::<RetryPolicy>("jitter = { ratio = 0.5, sed = 1 }").is_err());
    }
}
