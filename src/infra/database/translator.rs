//! Classification of raw store errors into [`DomainError`].
//!
//! This is the only place where the text of a raw `sqlx::Error` may be
//! observed outside the driver, and then only in the operational log.

use std::sync::Arc;

use tracing::error;

use crate::domain::{AppResult, DomainError, RequestContext};

/// SQLSTATE class 23 codes the translator understands.
pub const UNIQUE_VIOLATION: &str = "23505";
pub const FOREIGN_KEY_VIOLATION: &str = "23503";
pub const NOT_NULL_VIOLATION: &str = "23502";

/// Name of the unique index on `users.email` in the bootstrap schema.
pub const DEFAULT_EMAIL_CONSTRAINT: &str = "idx_users_email";

/// Maps raw store errors to the fixed taxonomy.
///
/// Built once at startup and cloned into every executor.
#[derive(Debug, Clone)]
pub struct ErrorTranslator {
    email_constraint: Arc<str>,
}

impl ErrorTranslator {
    #[must_use]
    pub fn new(email_constraint: impl Into<Arc<str>>) -> Self {
        Self {
            email_constraint: email_constraint.into(),
        }
    }

    pub fn email_constraint(&self) -> &str {
        &self.email_constraint
    }

    /// Map a store result, leaving `Ok` untouched.
    pub fn settle<T>(&self, ctx: &RequestContext, result: Result<T, sqlx::Error>) -> AppResult<T> {
        result.map_err(|e| self.translate(ctx, &e))
    }

    /// Classify one raw error. First matching rule wins:
    /// no-rows sentinel, unique, foreign key, not-null, interrupted context,
    /// then everything else as internal (logged).
    pub fn translate(&self, ctx: &RequestContext, err: &sqlx::Error) -> DomainError {
        if matches!(err, sqlx::Error::RowNotFound) {
            return DomainError::not_found();
        }

        if let sqlx::Error::Database(db_err) = err {
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    return if self.names_email_constraint(&**db_err) {
                        DomainError::duplicate_email()
                    } else {
                        DomainError::duplicate_entry()
                    };
                }
                Some(FOREIGN_KEY_VIOLATION) => return DomainError::foreign_key_violation(),
                Some(NOT_NULL_VIOLATION) => return DomainError::required_field(),
                _ => {}
            }
        }

        if ctx.is_interrupted() {
            return DomainError::canceled();
        }

        error!(
            request_id = %ctx.request_id(),
            error = %err,
            "Unexpected store error"
        );
        DomainError::internal()
    }

    fn names_email_constraint(&self, db_err: &dyn sqlx::error::DatabaseError) -> bool {
        match db_err.constraint() {
            Some(constraint) => constraint == &*self.email_constraint,
            None => db_err.message().contains(&*self.email_constraint),
        }
    }
}

impl Default for ErrorTranslator {
    fn default() -> Self {
        Self::new(DEFAULT_EMAIL_CONSTRAINT)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::borrow::Cow;
    use std::fmt;

    use crate::domain::ErrorKind;
    use crate::domain::error::{
        CODE_DUPLICATE_ENTRY, CODE_FOREIGN_KEY_VIOLATION, CODE_INTERNAL_SERVER_ERROR,
        CODE_NOT_FOUND, CODE_REQUEST_CANCELED, CODE_REQUIRED_FIELD, CODE_USER_EMAIL_EXISTS,
    };

    /// Minimal driver error carrying a SQLSTATE code.
    #[derive(Debug)]
    pub(crate) struct FakeDbError {
        code: &'static str,
        constraint: Option<&'static str>,
        message: String,
    }

    impl FakeDbError {
        pub(crate) fn boxed(
            code: &'static str,
            constraint: Option<&'static str>,
            message: &str,
        ) -> sqlx::Error {
            sqlx::Error::Database(Box::new(Self {
                code,
                constraint,
                message: message.to_string(),
            }))
        }
    }

    impl fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.message)
        }
    }

    impl std::error::Error for FakeDbError {}

    impl sqlx::error::DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            &self.message
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            match self.code {
                UNIQUE_VIOLATION => sqlx::error::ErrorKind::UniqueViolation,
                FOREIGN_KEY_VIOLATION => sqlx::error::ErrorKind::ForeignKeyViolation,
                NOT_NULL_VIOLATION => sqlx::error::ErrorKind::NotNullViolation,
                _ => sqlx::error::ErrorKind::Other,
            }
        }
    }

    fn fixtures() -> Vec<sqlx::Error> {
        vec![
            sqlx::Error::RowNotFound,
            FakeDbError::boxed(UNIQUE_VIOLATION, Some("idx_users_email"), "dup email"),
            FakeDbError::boxed(UNIQUE_VIOLATION, Some("restaurants_pkey"), "dup key"),
            FakeDbError::boxed(FOREIGN_KEY_VIOLATION, Some("fk_user"), "fk"),
            FakeDbError::boxed(NOT_NULL_VIOLATION, None, "null value"),
            FakeDbError::boxed("40P01", None, "deadlock detected"),
            sqlx::Error::PoolTimedOut,
            sqlx::Error::PoolClosed,
            sqlx::Error::Protocol("unexpected message".to_string()),
            sqlx::Error::ColumnNotFound("email".to_string()),
        ]
    }

    #[test]
    fn test_row_not_found() {
        let err = ErrorTranslator::default()
            .translate(&RequestContext::new(), &sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.code(), CODE_NOT_FOUND);
    }

    #[test]
    fn test_unique_violation_on_email_index() {
        let raw = FakeDbError::boxed(
            UNIQUE_VIOLATION,
            Some("idx_users_email"),
            "duplicate key value violates unique constraint \"idx_users_email\"",
        );
        let err = ErrorTranslator::default().translate(&RequestContext::new(), &raw);
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
        assert_eq!(err.code(), CODE_USER_EMAIL_EXISTS);
    }

    #[test]
    fn test_unique_violation_matched_by_message_without_constraint() {
        let raw = FakeDbError::boxed(
            UNIQUE_VIOLATION,
            None,
            "duplicate key value violates unique constraint \"idx_users_email\"",
        );
        let err = ErrorTranslator::default().translate(&RequestContext::new(), &raw);
        assert_eq!(err.code(), CODE_USER_EMAIL_EXISTS);
    }

    #[test]
    fn test_unique_violation_other_index_is_conflict() {
        let raw = FakeDbError::boxed(UNIQUE_VIOLATION, Some("restaurants_pkey"), "dup");
        let err = ErrorTranslator::default().translate(&RequestContext::new(), &raw);
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.code(), CODE_DUPLICATE_ENTRY);
    }

    #[test]
    fn test_configured_email_constraint() {
        let translator = ErrorTranslator::new("users_email_key");
        let raw = FakeDbError::boxed(UNIQUE_VIOLATION, Some("users_email_key"), "dup");
        assert_eq!(
            translator.translate(&RequestContext::new(), &raw).code(),
            CODE_USER_EMAIL_EXISTS
        );
        let raw = FakeDbError::boxed(UNIQUE_VIOLATION, Some("idx_users_email"), "dup");
        assert_eq!(
            translator.translate(&RequestContext::new(), &raw).code(),
            CODE_DUPLICATE_ENTRY
        );
    }

    #[test]
    fn test_foreign_key_violation() {
        let raw = FakeDbError::boxed(FOREIGN_KEY_VIOLATION, Some("fk_user"), "fk");
        let err = ErrorTranslator::default().translate(&RequestContext::new(), &raw);
        assert_eq!(err.kind(), ErrorKind::ForeignKeyViolation);
        assert_eq!(err.code(), CODE_FOREIGN_KEY_VIOLATION);
    }

    #[test]
    fn test_not_null_violation() {
        let raw = FakeDbError::boxed(NOT_NULL_VIOLATION, None, "null value in column");
        let err = ErrorTranslator::default().translate(&RequestContext::new(), &raw);
        assert_eq!(err.kind(), ErrorKind::RequiredFieldMissing);
        assert_eq!(err.code(), CODE_REQUIRED_FIELD);
    }

    #[test]
    fn test_interrupted_context_is_canceled() {
        let ctx = RequestContext::new();
        ctx.cancel();
        let err = ErrorTranslator::default().translate(&ctx, &sqlx::Error::PoolTimedOut);
        assert_eq!(err.kind(), ErrorKind::Canceled);
        assert_eq!(err.code(), CODE_REQUEST_CANCELED);
    }

    #[test]
    fn test_constraint_rules_win_over_cancellation() {
        let ctx = RequestContext::new();
        ctx.cancel();
        let raw = FakeDbError::boxed(FOREIGN_KEY_VIOLATION, None, "fk");
        assert_eq!(
            ErrorTranslator::default().translate(&ctx, &raw).kind(),
            ErrorKind::ForeignKeyViolation
        );
        assert_eq!(
            ErrorTranslator::default()
                .translate(&ctx, &sqlx::Error::RowNotFound)
                .kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_unknown_errors_are_internal_without_raw_text() {
        let raw = FakeDbError::boxed("40P01", None, "deadlock detected on relation users");
        let err = ErrorTranslator::default().translate(&RequestContext::new(), &raw);
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.code(), CODE_INTERNAL_SERVER_ERROR);
        assert!(!err.message().contains("deadlock"));
        assert!(!err.details().unwrap_or_default().contains("deadlock"));
        assert!(!err.to_string().contains("deadlock"));
    }

    #[test]
    fn test_total_and_deterministic() {
        let translator = ErrorTranslator::default();
        let ctx = RequestContext::new();
        for raw in fixtures() {
            let first = translator.translate(&ctx, &raw);
            let second = translator.translate(&ctx, &raw);
            assert_eq!(first.kind(), second.kind());
            assert_eq!(first.code(), second.code());
            assert!(!first.code().is_empty());
        }
    }

    #[test]
    fn test_settle_passes_ok_through() {
        let translator = ErrorTranslator::default();
        let ctx = RequestContext::new();
        assert_eq!(translator.settle(&ctx, Ok::<_, sqlx::Error>(3)), Ok(3));
        let err = translator
            .settle::<()>(&ctx, Err(sqlx::Error::RowNotFound))
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
