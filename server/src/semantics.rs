//! Standalone at-least-once demonstration wrapper.
//!
//! Used for semantics validation rather than production traffic: a unit of
//! work is retried under an injected random-failure probability until it
//! succeeds or the attempt budget runs out. A non-idempotent unit that
//! succeeds only after retries has possibly executed twice upstream, which
//! is exactly the hazard at-least-once delivery accepts; it is logged as a
//! warning so the demonstration makes the hazard visible.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{Result, ServerError};

/// Total attempts before giving up.
pub const MAX_ATTEMPTS: u32 = 3;

/// Base backoff; attempt `n` sleeps `n` times this.
pub const BACKOFF_STEP: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub struct AtLeastOnce {
    max_attempts: u32,
    backoff_step: Duration,
    failure_rate: f64,
}

impl AtLeastOnce {
    pub fn new(failure_rate: f64) -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            backoff_step: BACKOFF_STEP,
            failure_rate: failure_rate.clamp(0.0, 1.0),
        }
    }

    /// Runs `work` until it succeeds or the budget is exhausted, with
    /// linearly increasing backoff between attempts.
    pub async fn execute<F, Fut, T>(&self, idempotent: bool, mut work: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        for attempt in 1..=self.max_attempts {
            if self.failure_rate > 0.0 && rand::thread_rng().gen::<f64>() < self.failure_rate {
                debug!(attempt, "injected failure");
                sleep(self.backoff_step * attempt).await;
                continue;
            }
            match work().await {
                Ok(value) => {
                    if !idempotent && attempt > 1 {
                        warn!(
                            attempt,
                            "non-idempotent unit of work succeeded after retries; \
                             duplicate side effects are possible upstream"
                        );
                    }
                    return Ok(value);
                }
                Err(err) => {
                    debug!(attempt, %err, "unit of work failed");
                    sleep(self.backoff_step * attempt).await;
                }
            }
        }
        Err(ServerError::RetriesExhausted {
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_first_try_without_injection() {
        let semantics = AtLeastOnce::new(0.0);
        let calls = AtomicU32::new(0);
        let value = semantics
            .execute(true, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(99) }
            })
            .await
            .unwrap();
        assert_eq!(value, 99);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn certain_injection_exhausts_retries() {
        let semantics = AtLeastOnce::new(1.0);
        let err = semantics
            .execute(true, || async { Ok(()) })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServerError::RetriesExhausted { attempts: 3 }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_real_failures_until_success() {
        let semantics = AtLeastOnce::new(0.0);
        let calls = AtomicU32::new(0);
        let value = semantics
            .execute(false, || {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call < 2 {
                        Err(ServerError::MalformedRequest("flaky".into()))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(value, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
