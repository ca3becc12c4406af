//! Per-request cancellation, deadline and correlation id.
//!
//! A [`RequestContext`] is handed to every executor call. Store operations
//! race against [`RequestContext::interrupted`] so a canceled or expired
//! request returns promptly instead of waiting on the database.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Context without a deadline and with a freshly generated request id.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn with_request_id(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Set the deadline relative to now. An earlier existing deadline wins.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        self.with_deadline(deadline)
    }

    /// Set an absolute deadline. An earlier existing deadline wins.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        });
        self
    }

    /// Derived context: canceled together with `self`, but canceling the
    /// child leaves the parent untouched.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            request_id: self.request_id.clone(),
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Canceled or past the deadline.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.is_canceled() || self.is_expired()
    }

    /// Resolves once the context is canceled or its deadline passes.
    /// Never resolves for a context without deadline that is never canceled.
    pub async fn interrupted(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.cancel.cancelled() => {}
                    () = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.cancel.cancelled().await,
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_is_active() {
        let ctx = RequestContext::new();
        assert!(!ctx.is_canceled());
        assert!(!ctx.is_expired());
        assert!(!ctx.is_interrupted());
        assert!(ctx.deadline().is_none());
        assert!(!ctx.request_id().is_empty());
    }

    #[test]
    fn test_cancel_is_observed() {
        let ctx = RequestContext::with_request_id("req-1");
        ctx.cancel();
        assert!(ctx.is_canceled());
        assert!(ctx.is_interrupted());
        assert_eq!(ctx.request_id(), "req-1");
    }

    #[test]
    fn test_child_follows_parent_but_not_reverse() {
        let parent = RequestContext::new();
        let child = parent.child();
        child.cancel();
        assert!(child.is_canceled());
        assert!(!parent.is_canceled());

        let other_child = parent.child();
        parent.cancel();
        assert!(other_child.is_canceled());
    }

    #[tokio::test]
    async fn test_earlier_deadline_wins() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(10));
        let first = ctx.deadline().unwrap();
        let ctx = ctx.with_timeout(Duration::from_secs(60));
        assert_eq!(ctx.deadline(), Some(first));
    }

    #[tokio::test]
    async fn test_interrupted_resolves_on_deadline() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(20));
        tokio::time::timeout(Duration::from_secs(2), ctx.interrupted())
            .await
            .expect("deadline should interrupt the context");
        assert!(ctx.is_expired());
        assert!(!ctx.is_canceled());
    }

    #[tokio::test]
    async fn test_interrupted_resolves_on_cancel() {
        let ctx = RequestContext::new();
        let canceler = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceler.cancel();
        });
        tokio::time::timeout(Duration::from_secs(2), ctx.interrupted())
            .await
            .expect("cancel should interrupt the context");
        assert!(ctx.is_canceled());
    }

    #[tokio::test]
    async fn test_interrupted_pending_without_signal() {
        let ctx = RequestContext::new();
        let result = tokio::time::timeout(Duration::from_millis(20), ctx.interrupted()).await;
        assert!(result.is_err());
    }
}
