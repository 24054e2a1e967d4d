//! Request-scoped execution context handed to every action

use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};
use std::time::Duration;

/// Cancellation-aware execution context
///
/// The dispatcher creates one per request and cancels it when the request
/// finishes or its future is dropped, which is what happens when the client
/// goes away. A configured request timeout becomes the deadline. Methods are
/// expected to observe cancellation cooperatively; nothing aborts them.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Create a context with no deadline
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an absolute deadline
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set a deadline relative to now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once the request is gone or the deadline has passed
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
            || self
                .deadline
                .map(|deadline| Instant::now() >= deadline)
                .unwrap_or(false)
    }

    /// Wait until the context is cancelled or its deadline elapses
    pub async fn cancelled(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    /// Cancel this context and every child derived from it
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Derive a context cancelled together with this one
    ///
    /// Cancelling the child does not cancel the parent.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Guard cancelling the context when dropped
    pub(crate) fn cancel_on_drop(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drop_guard_cancels() {
        let ctx = CallContext::new();
        let observer = ctx.clone();
        {
            let _guard = ctx.cancel_on_drop();
            assert!(!observer.is_cancelled());
        }
        assert!(observer.is_cancelled());
        observer.cancelled().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_elapses() {
        let ctx = CallContext::new().with_timeout(Duration::from_secs(5));
        assert!(!ctx.is_cancelled());

        ctx.cancelled().await;
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_child_follows_parent() {
        let parent = CallContext::new();
        let child = parent.child();

        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());

        let second = parent.child();
        parent.cancel();
        assert!(second.is_cancelled());
    }
}
