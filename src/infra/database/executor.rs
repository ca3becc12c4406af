//! One statement-execution interface over the pool and over a transaction.
//!
//! Repositories take `&mut dyn QueryExecutor` and cannot tell whether they
//! run on a pooled connection or inside a transaction. Every error leaving
//! an executor has already been through the [`ErrorTranslator`].

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use futures_util::stream::{BoxStream, Stream, StreamExt};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, warn};

use super::translator::ErrorTranslator;
use crate::domain::{AppResult, DomainError, RequestContext};

/// A parameterized statement with its bound arguments.
pub type Statement<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

#[async_trait]
pub trait QueryExecutor: Send {
    /// Execute a statement and return the number of affected rows.
    async fn command(&mut self, ctx: &RequestContext, statement: Statement<'_>) -> AppResult<u64>;

    /// Stream the rows of a query.
    ///
    /// The stream is lazy and single-pass. It holds the underlying
    /// connection until it is exhausted, closed or dropped.
    fn query<'e>(
        &'e mut self,
        ctx: &'e RequestContext,
        statement: Statement<'e>,
    ) -> RowStream<'e>;

    /// Fetch exactly one row; zero rows is `NotFound`.
    async fn query_one(
        &mut self,
        ctx: &RequestContext,
        statement: Statement<'_>,
    ) -> AppResult<PgRow>;

    /// Translator used for errors raised while decoding rows.
    fn translator(&self) -> &ErrorTranslator;
}

/// Race a store call against the context; losing the race drops the call.
pub(crate) async fn guarded<T, F>(
    ctx: &RequestContext,
    translator: &ErrorTranslator,
    operation: F,
) -> AppResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    if ctx.is_interrupted() {
        return Err(DomainError::canceled());
    }
    tokio::select! {
        biased;
        () = ctx.interrupted() => {
            debug!(request_id = %ctx.request_id(), "Statement aborted by interrupted context");
            Err(DomainError::canceled())
        }
        result = operation => translator.settle(ctx, result),
    }
}

/// Decode a row, translating decode failures.
pub fn decode_row<T, F>(
    executor: &dyn QueryExecutor,
    ctx: &RequestContext,
    row: &PgRow,
    decode: F,
) -> AppResult<T>
where
    F: FnOnce(&PgRow) -> Result<T, sqlx::Error>,
{
    executor.translator().settle(ctx, decode(row))
}

/// Lazy, finite, non-restartable sequence of rows.
///
/// Yields `Canceled` once if the context is interrupted while rows are still
/// pending, and a translated error if the store fails; it is exhausted after
/// either.
pub struct RowStream<'e> {
    rows: BoxStream<'e, Result<PgRow, sqlx::Error>>,
    interrupted: BoxFuture<'e, ()>,
    ctx: &'e RequestContext,
    translator: &'e ErrorTranslator,
    finished: bool,
}

impl<'e> RowStream<'e> {
    pub(crate) fn new(
        rows: BoxStream<'e, Result<PgRow, sqlx::Error>>,
        ctx: &'e RequestContext,
        translator: &'e ErrorTranslator,
    ) -> Self {
        Self {
            rows,
            interrupted: Box::pin(ctx.interrupted()),
            ctx,
            translator,
            finished: false,
        }
    }

    /// Release the underlying connection without draining.
    pub fn close(self) {}

    /// Drain the stream, decoding every row.
    pub async fn decode_all<T, F>(mut self, decode: F) -> AppResult<Vec<T>>
    where
        F: Fn(&PgRow) -> Result<T, sqlx::Error>,
    {
        let mut items = Vec::new();
        while let Some(row) = self.next().await {
            let row = row?;
            items.push(self.translator.settle(self.ctx, decode(&row))?);
        }
        Ok(items)
    }
}

impl Stream for RowStream<'_> {
    type Item = AppResult<PgRow>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        if this.interrupted.as_mut().poll(cx).is_ready() {
            this.finished = true;
            return Poll::Ready(Some(Err(DomainError::canceled())));
        }

        match this.rows.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(row))) => Poll::Ready(Some(Ok(row))),
            Poll::Ready(Some(Err(err))) => {
                this.finished = true;
                Poll::Ready(Some(Err(this.translator.translate(this.ctx, &err))))
            }
            Poll::Ready(None) => {
                this.finished = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Executor over the shared pool.
///
/// Each statement leases a connection for its own duration and returns it
/// to the pool on completion, error or drop.
#[derive(Debug, Clone)]
pub struct PooledHandle {
    pool: PgPool,
    translator: ErrorTranslator,
}

impl PooledHandle {
    #[must_use]
    pub fn new(pool: PgPool, translator: ErrorTranslator) -> Self {
        Self { pool, translator }
    }
}

#[async_trait]
impl QueryExecutor for PooledHandle {
    async fn command(&mut self, ctx: &RequestContext, statement: Statement<'_>) -> AppResult<u64> {
        let done = guarded(ctx, &self.translator, statement.execute(&self.pool)).await?;
        Ok(done.rows_affected())
    }

    fn query<'e>(
        &'e mut self,
        ctx: &'e RequestContext,
        statement: Statement<'e>,
    ) -> RowStream<'e> {
        RowStream::new(statement.fetch(&self.pool), ctx, &self.translator)
    }

    async fn query_one(
        &mut self,
        ctx: &RequestContext,
        statement: Statement<'_>,
    ) -> AppResult<PgRow> {
        guarded(ctx, &self.translator, statement.fetch_one(&self.pool)).await
    }

    fn translator(&self) -> &ErrorTranslator {
        &self.translator
    }
}

/// Executor bound to one open transaction.
///
/// Dropping the handle without [`commit`](Self::commit) rolls the
/// transaction back.
pub struct TransactionHandle {
    tx: Transaction<'static, Postgres>,
    translator: ErrorTranslator,
}

impl TransactionHandle {
    pub(crate) fn new(tx: Transaction<'static, Postgres>, translator: ErrorTranslator) -> Self {
        Self { tx, translator }
    }

    /// Commit all statements issued on this handle.
    ///
    /// An interrupted context rolls back instead and reports `Canceled`.
    /// The commit itself is not raced against the context.
    pub async fn commit(self, ctx: &RequestContext) -> AppResult<()> {
        if ctx.is_interrupted() {
            self.rollback().await;
            return Err(DomainError::canceled());
        }
        let Self { tx, translator } = self;
        translator.settle(ctx, tx.commit().await)
    }

    /// Roll back. Failures are logged; the store discards the transaction
    /// when the connection is reset either way.
    pub async fn rollback(self) {
        if let Err(err) = self.tx.rollback().await {
            warn!(error = %err, "Transaction rollback failed");
        }
    }

    /// Give up the transaction without waiting on the connection.
    ///
    /// Used when a statement may still be running on the server: the
    /// rollback is queued on the connection and completes before the pool
    /// hands it out again.
    pub fn abandon(self) {
        debug!("Transaction abandoned, rollback queued");
        drop(self.tx);
    }
}

#[async_trait]
impl QueryExecutor for TransactionHandle {
    async fn command(&mut self, ctx: &RequestContext, statement: Statement<'_>) -> AppResult<u64> {
        let done = guarded(ctx, &self.translator, statement.execute(&mut *self.tx)).await?;
        Ok(done.rows_affected())
    }

    fn query<'e>(
        &'e mut self,
        ctx: &'e RequestContext,
        statement: Statement<'e>,
    ) -> RowStream<'e> {
        RowStream::new(statement.fetch(&mut *self.tx), ctx, &self.translator)
    }

    async fn query_one(
        &mut self,
        ctx: &RequestContext,
        statement: Statement<'_>,
    ) -> AppResult<PgRow> {
        guarded(ctx, &self.translator, statement.fetch_one(&mut *self.tx)).await
    }

    fn translator(&self) -> &ErrorTranslator {
        &self.translator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use futures_util::stream;

    use crate::domain::ErrorKind;
    use crate::infra::database::translator::tests::FakeDbError;

    #[tokio::test]
    async fn test_guarded_passes_result_through_translator() {
        let ctx = RequestContext::new();
        let translator = ErrorTranslator::default();

        let ok = guarded(&ctx, &translator, async { Ok::<_, sqlx::Error>(5) }).await;
        assert_eq!(ok, Ok(5));

        let err = guarded(&ctx, &translator, async {
            Err::<(), _>(sqlx::Error::RowNotFound)
        })
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_guarded_refuses_interrupted_context() {
        let ctx = RequestContext::new();
        ctx.cancel();
        let err = guarded(&ctx, &ErrorTranslator::default(), async {
            Ok::<_, sqlx::Error>(())
        })
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Canceled);
    }

    #[tokio::test]
    async fn test_guarded_aborts_on_deadline() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(20));
        let err = guarded(&ctx, &ErrorTranslator::default(), async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, sqlx::Error>(())
        })
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Canceled);
    }

    #[tokio::test]
    async fn test_row_stream_translates_and_fuses() {
        let ctx = RequestContext::new();
        let translator = ErrorTranslator::default();
        let rows: BoxStream<'_, Result<PgRow, sqlx::Error>> = stream::iter(vec![
            Err(FakeDbError::boxed("23503", None, "fk")),
            Err(sqlx::Error::RowNotFound),
        ])
        .boxed();

        let mut rows = RowStream::new(rows, &ctx, &translator);
        let first = rows.next().await.unwrap().unwrap_err();
        assert_eq!(first.kind(), ErrorKind::ForeignKeyViolation);
        assert!(rows.next().await.is_none());
    }

    #[tokio::test]
    async fn test_row_stream_reports_cancellation() {
        let ctx = RequestContext::new();
        let translator = ErrorTranslator::default();
        let rows: BoxStream<'_, Result<PgRow, sqlx::Error>> = stream::pending().boxed();

        let mut rows = RowStream::new(rows, &ctx, &translator);
        ctx.cancel();
        let err = rows.next().await.unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Canceled);
        assert!(rows.next().await.is_none());
    }

    #[tokio::test]
    async fn test_row_stream_empty() {
        let ctx = RequestContext::new();
        let translator = ErrorTranslator::default();
        let rows: BoxStream<'_, Result<PgRow, sqlx::Error>> = stream::empty().boxed();

        let decoded: Vec<i64> = RowStream::new(rows, &ctx, &translator)
            .decode_all(|_| Ok(1))
            .await
            .unwrap();
        assert!(decoded.is_empty());
    }
}
