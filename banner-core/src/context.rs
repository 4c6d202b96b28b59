//! Per-request cancellation and deadline context
//!
//! Every resolver, store and cache call runs through a [`RequestContext`].
//! The context carries no timeouts of its own; it only enforces what the
//! caller put into it.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use uuid::Uuid;

/// Why a guarded call did not finish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    Cancelled,
    DeadlineExceeded,
}

/// Cancellation and deadline scope for one request
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: Uuid,
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContext {
    /// Context with no deadline and no cancellation signal
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            deadline: None,
            cancel: None,
        }
    }

    /// Fail guarded calls once `timeout` has elapsed from now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Fail guarded calls once `true` is sent on the channel
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True if cancellation was already signalled
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Run `fut` until it completes, the deadline passes or the request is cancelled
    pub async fn guard<F, T>(&self, fut: F) -> Result<T, Interrupted>
    where
        F: Future<Output = T>,
    {
        if self.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Interrupted::DeadlineExceeded);
            }
        }

        let mut cancel = self.cancel.clone();
        let cancelled = async {
            match cancel.as_mut() {
                Some(rx) => loop {
                    if rx.changed().await.is_err() {
                        // Sender gone: nobody can cancel any more
                        std::future::pending::<()>().await;
                    }
                    if *rx.borrow() {
                        break;
                    }
                },
                None => std::future::pending::<()>().await,
            }
        };

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            out = fut => Ok(out),
            _ = cancelled => Err(Interrupted::Cancelled),
            _ = expired => Err(Interrupted::DeadlineExceeded),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_guard_passes_through() {
        let ctx = RequestContext::new();
        let out = ctx.guard(async { 42 }).await;
        assert_eq!(out, Ok(42));
    }

    #[tokio::test]
    async fn test_guard_deadline() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(20));
        let out = ctx
            .guard(tokio::time::sleep(Duration::from_secs(5)))
            .await;
        assert_eq!(out, Err(Interrupted::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_guard_already_expired() {
        let ctx = RequestContext::new().with_deadline(Instant::now());
        let out = ctx.guard(async { 1 }).await;
        assert_eq!(out, Err(Interrupted::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_guard_cancellation() {
        let (tx, rx) = watch::channel(false);
        let ctx = RequestContext::new().with_cancellation(rx);

        let handle = tokio::spawn(async move {
            ctx.guard(tokio::time::sleep(Duration::from_secs(5))).await
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        tx.send(true).unwrap();

        assert_eq!(handle.await.unwrap(), Err(Interrupted::Cancelled));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let ctx = RequestContext::new().with_cancellation(rx);

        assert!(ctx.is_cancelled());
        assert_eq!(ctx.guard(async { 1 }).await, Err(Interrupted::Cancelled));
    }

    #[tokio::test]
    async fn test_dropped_sender_never_cancels() {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        let ctx = RequestContext::new().with_cancellation(rx);

        assert_eq!(ctx.guard(async { 7 }).await, Ok(7));
    }

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(RequestContext::new().request_id(), RequestContext::new().request_id());
    }
}
