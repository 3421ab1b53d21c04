//! Cancellable, deadline-bounded call context
//!
//! A [`CallContext`] is threaded through every network operation. Cancelling it, or
//! letting its deadline pass, stops the operation and everything it spawned.

use crate::error::QuorumError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Why a context finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelCause {
    /// Someone called `cancel` on this context or one of its parents
    Cancelled,
    /// The deadline passed
    DeadlineExceeded,
}

impl From<CancelCause> for QuorumError {
    fn from(cause: CancelCause) -> Self {
        match cause {
            CancelCause::Cancelled => QuorumError::Cancelled("context cancelled".into()),
            CancelCause::DeadlineExceeded => {
                QuorumError::Timeout("context deadline exceeded".into())
            }
        }
    }
}

/// Cancellation scope for one call
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Create a root context with no deadline
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a context cancelled together with this one, keeping the deadline
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derive a child context whose deadline is at most `timeout` from now
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        Self {
            token: self.token.child_token(),
            deadline: Some(match self.deadline {
                Some(existing) => existing.min(deadline),
                None => deadline,
            }),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancel this context and all contexts derived from it
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Cancel this context when the returned guard is dropped
    pub fn cancel_on_drop(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether the context is finished, for either reason
    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.deadline.map_or(false, |d| Instant::now() >= d)
    }

    /// Resolve once the context is finished
    pub async fn done(&self) -> CancelCause {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => CancelCause::Cancelled,
                    _ = tokio::time::sleep_until(deadline) => CancelCause::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                CancelCause::Cancelled
            }
        }
    }

    /// Run `fut` unless the context finishes first
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, CancelCause> {
        tokio::select! {
            biased;
            cause = self.done() => Err(cause),
            output = fut => Ok(output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_propagates_to_children() {
        let parent = CallContext::new();
        let child = parent.child();
        let grandchild = child.with_timeout(Duration::from_secs(60));

        parent.cancel();

        assert!(child.is_cancelled());
        assert!(grandchild.is_done());
        assert_eq!(grandchild.done().await, CancelCause::Cancelled);
    }

    #[tokio::test]
    async fn test_child_cancel_does_not_reach_parent() {
        let parent = CallContext::new();
        let child = parent.child();

        child.cancel();

        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn test_deadline_keeps_earliest() {
        let outer = CallContext::new().with_timeout(Duration::from_millis(10));
        let inner = outer.with_timeout(Duration::from_secs(60));

        assert_eq!(inner.deadline(), outer.deadline());
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let ctx = CallContext::new().with_timeout(Duration::from_millis(20));
        let result = ctx.run(std::future::pending::<()>()).await;

        assert_eq!(result, Err(CancelCause::DeadlineExceeded));
        assert!(QuorumError::from(CancelCause::DeadlineExceeded).is_ephemeral());
    }

    #[tokio::test]
    async fn test_run_completes() {
        let ctx = CallContext::new().with_timeout(Duration::from_secs(5));
        let result = ctx.run(async { 42 }).await;

        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn test_drop_guard_cancels() {
        let ctx = CallContext::new();
        {
            let _guard = ctx.cancel_on_drop();
            assert!(!ctx.is_cancelled());
        }
        assert!(ctx.is_cancelled());
    }
}
