//! Deadline properties of the poller, checked on a simulated clock.

use mcv_retry::{RetryError, RetryPoller, RetryPolicy, SimulatedClock};
use proptest::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime")
        .block_on(future)
}

proptest! {
    #[test]
    fn prop_eventually_true_succeeds_within_budget(
        timeout_ms in 1u64..5_000,
        delay_ms in 1u64..500,
        attempt_ms in 0u64..200,
        true_after_ms in 0u64..5_000,
    ) {
        prop_assume!(true_after_ms + attempt_ms < timeout_ms);
        let clock = SimulatedClock::new();
        let poller = RetryPoller::new(
            RetryPolicy::new()
                .with_timeout(Duration::from_millis(timeout_ms))
                .with_delay(Duration::from_millis(delay_ms)),
        )
        .with_clock(Arc::new(clock.clone()));

        let result = block_on(poller.wait_for(|| {
            let clock = clock.clone();
            async move {
                let ready = clock.elapsed() >= Duration::from_millis(true_after_ms);
                clock.advance(Duration::from_millis(attempt_ms));
                Ok::<_, String>(ready)
            }
        }));

        // The flip lands early enough that an attempt starting after it
        // still begins before the deadline.
        let summary = result.expect("predicate turned true inside the budget");
        prop_assert!(summary.elapsed <= Duration::from_millis(timeout_ms + attempt_ms));
    }

    #[test]
    fn prop_never_true_times_out_no_earlier_than_budget(
        timeout_ms in 0u64..5_000,
        delay_ms in 1u64..1_000,
        attempt_ms in 0u64..300,
    ) {
        let clock = SimulatedClock::new();
        let poller = RetryPoller::new(
            RetryPolicy::new()
                .with_timeout(Duration::from_millis(timeout_ms))
                .with_delay(Duration::from_millis(delay_ms)),
        )
        .with_clock(Arc::new(clock.clone()));
        let attempts = AtomicU32::new(0);

        let result = block_on(poller.wait_for(|| {
            let clock = clock.clone();
            attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                clock.advance(Duration::from_millis(attempt_ms));
                Err::<bool, _>("still converging")
            }
        }));

        match result {
            Err(RetryError::Timeout { elapsed, attempts: reported, last_error }) => {
                prop_assert!(elapsed >= Duration::from_millis(timeout_ms));
                prop_assert!(elapsed <= Duration::from_millis(timeout_ms + attempt_ms));
                prop_assert_eq!(reported, attempts.load(Ordering::SeqCst));
                prop_assert_eq!(last_error, Some("still converging"));
            }
            other => prop_assert!(false, "expected timeout, got {:?}", other),
        }
    }
}
