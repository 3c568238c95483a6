//! Bounded retries with linear backoff and jitter around store calls.
//!
//! Every handler's store call passes through [`execute`]. It knows nothing
//! about HTTP and retries every failure the same way; callers decide how the
//! final error is reported.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::context::OpContext;
use crate::error::StoreResult;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay added per attempt already made.
    pub base_delay: Duration,
    /// Upper bound (exclusive) of the random delay added to each wait.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_jitter: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy that retries without waiting.
    pub fn immediate(max_attempts: u32) -> Self {
        Self { max_attempts, base_delay: Duration::ZERO, max_jitter: Duration::ZERO }
    }

    /// Wait before the attempt following the 0-based `attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.base_delay.saturating_mul(attempt);
        let jitter_ms = self.max_jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rand::thread_rng().gen_range(0..jitter_ms))
    }
}

/// Calls `op` until it succeeds or `policy.max_attempts` calls have failed.
///
/// After each failure the context is checked first; an ended context returns
/// its own error without further attempts. The backoff wait is abandoned as
/// soon as the context ends. When every attempt fails the last error is
/// returned.
pub async fn execute<T, F, Fut>(ctx: &OpContext, policy: &RetryPolicy, mut op: F) -> StoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if let Some(ctx_err) = ctx.err() {
            return Err(ctx_err);
        }

        attempt += 1;
        if attempt >= max_attempts {
            tracing::warn!(attempts = attempt, "Reached all the retry attempts: {}", err);
            return Err(err);
        }

        let wait = policy.backoff(attempt - 1);
        tracing::debug!(attempt, ?wait, "Store call failed, retrying: {}", err);
        tokio::select! {
            ctx_err = ctx.done() => return Err(ctx_err),
            _ = tokio::time::sleep(wait) => {}
        }
    }
}
