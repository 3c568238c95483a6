//! Deadline and cancellation carried by every store call.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::{StoreError, StoreResult};

/// A time budget plus a cancellation signal shared by one request's store work.
///
/// Clones observe the same deadline and token, so a batch can hand one
/// context to every sub-task and cancel all of them together.
#[derive(Clone, Debug)]
pub struct OpContext {
    deadline: Instant,
    token: CancellationToken,
}

impl OpContext {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { deadline: Instant::now() + timeout, token: CancellationToken::new() }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Cancels this context when the returned guard is dropped. Handlers hold
    /// it so that a client disconnect, which drops the handler future, also
    /// stops any work spawned on the context.
    pub fn drop_guard(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }

    /// Returns the cancellation error if this context has already ended.
    pub fn err(&self) -> Option<StoreError> {
        if self.token.is_cancelled() {
            Some(StoreError::Canceled)
        } else if Instant::now() >= self.deadline {
            Some(StoreError::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Resolves once the deadline passes or the token is cancelled.
    pub async fn done(&self) -> StoreError {
        tokio::select! {
            _ = self.token.cancelled() => StoreError::Canceled,
            _ = tokio::time::sleep_until(self.deadline) => StoreError::DeadlineExceeded,
        }
    }

    /// Runs `fut` unless the context ends first.
    pub async fn run<T, F>(&self, fut: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        if let Some(err) = self.err() {
            return Err(err);
        }
        tokio::select! {
            biased;
            err = self.done() => Err(err),
            res = fut => res,
        }
    }
}
