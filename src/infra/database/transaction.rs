//! Run caller work inside one transaction with guaranteed cleanup.

use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::{debug, instrument};

use super::executor::TransactionHandle;
use super::postgres::Database;
use crate::domain::{AppResult, DomainError, RequestContext};

impl Database {
    /// Begin, run `work`, then commit or roll back.
    ///
    /// * `work` returns `Ok`: commit, unless the context was interrupted in
    ///   the meantime, in which case roll back and return `Canceled`.
    /// * `work` returns `Err`: roll back and return that error unchanged.
    /// * `work` panics: abandon the transaction, then resume the panic.
    /// * the context is interrupted while `work` runs: `work` is dropped
    ///   (aborting its in-flight statement), the transaction is abandoned
    ///   and `Canceled` returns at once.
    ///
    /// An abandoned transaction is rolled back by the pool once the
    /// connection is free again; the caller never waits for a statement
    /// the server is still running.
    ///
    /// `work` must own what it captures:
    ///
    /// ```ignore
    /// let repo = Arc::clone(&self.users);
    /// db.run_in_transaction(ctx, move |tx, ctx| {
    ///     Box::pin(async move { repo.create(tx, ctx, &input).await })
    /// })
    /// .await
    /// ```
    #[instrument(skip(self, ctx, work), fields(request_id = %ctx.request_id()))]
    pub async fn run_in_transaction<T, F>(&self, ctx: &RequestContext, work: F) -> AppResult<T>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut TransactionHandle, &'t RequestContext) -> BoxFuture<'t, AppResult<T>>
            + Send,
    {
        let mut tx = self.begin(ctx).await?;

        let outcome = {
            let running = AssertUnwindSafe(work(&mut tx, ctx)).catch_unwind();
            tokio::select! {
                biased;
                () = ctx.interrupted() => None,
                outcome = running => Some(outcome),
            }
        };

        match outcome {
            Some(Ok(Ok(value))) => {
                tx.commit(ctx).await?;
                Ok(value)
            }
            Some(Ok(Err(err))) => {
                debug!(code = err.code(), "Rolling back after failed unit of work");
                tx.rollback().await;
                Err(err)
            }
            Some(Err(panic)) => {
                tx.abandon();
                std::panic::resume_unwind(panic)
            }
            None => {
                debug!("Rolling back interrupted unit of work");
                tx.abandon();
                Err(DomainError::canceled())
            }
        }
    }
}
