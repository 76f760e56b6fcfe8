//! Cancellation context
//!
//! A [`Context`] is handed to every page fetch. Cancelling its
//! [`CancelHandle`] wakes every task waiting in [`Context::cancelled`].
//! Dropping the handle without cancelling leaves the context live forever.

use std::future;
use std::sync::Arc;
use tokio::sync::watch;

/// Caller-owned cancellation signal
#[derive(Debug, Clone, Default)]
pub struct Context {
    rx: Option<watch::Receiver<bool>>,
}

/// Cancels the [`Context`] it was created with
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl Context {
    /// A context that is never cancelled
    pub fn background() -> Self {
        Self { rx: None }
    }

    /// Create a cancellable context and its handle
    pub fn with_cancel() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        (Self { rx: Some(rx) }, CancelHandle { tx: Arc::new(tx) })
    }

    /// Check whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolve once cancellation is requested
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return future::pending().await;
        };
        let mut rx = rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // handle dropped without cancelling
                return future::pending().await;
            }
        }
    }
}

impl CancelHandle {
    /// Request cancellation
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Check whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_background_never_cancelled() {
        assert!(!Context::background().is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_wakes_waiters() {
        let (ctx, handle) = Context::with_cancel();
        let waiter = tokio::spawn({
            let ctx = ctx.clone();
            async move { ctx.cancelled().await }
        });

        assert!(!ctx.is_cancelled());
        handle.cancel();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
        assert!(ctx.is_cancelled());
        assert!(handle.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_resolves_immediately_after_cancel() {
        let (ctx, handle) = Context::with_cancel();
        handle.cancel();
        tokio::time::timeout(Duration::from_millis(100), ctx.cancelled())
            .await
            .expect("already cancelled");
    }

    #[tokio::test]
    async fn test_dropped_handle_does_not_cancel() {
        let (ctx, handle) = Context::with_cancel();
        drop(handle);
        let waited = tokio::time::timeout(Duration::from_millis(50), ctx.cancelled()).await;
        assert!(waited.is_err());
        assert!(!ctx.is_cancelled());
    }
}
