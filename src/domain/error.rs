//! Normalized, client-safe error taxonomy.
//!
//! Every failure that crosses the persistence boundary is expressed as a
//! [`DomainError`]. Raw store errors are classified exactly once, by the
//! translator in the database layer, and only forwarded from there on.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience alias used by services and repositories.
pub type AppResult<T> = Result<T, DomainError>;

pub const CODE_NOT_FOUND: &str = "NOT_FOUND";
pub const CODE_DUPLICATE_ENTRY: &str = "DUPLICATE_ENTRY";
pub const CODE_USER_EMAIL_EXISTS: &str = "USER_EMAIL_EXISTS";
pub const CODE_FOREIGN_KEY_VIOLATION: &str = "FOREIGN_KEY_VIOLATION";
pub const CODE_REQUIRED_FIELD: &str = "REQUIRED_FIELD";
pub const CODE_VALIDATION_ERROR: &str = "VALIDATION_ERROR";
pub const CODE_REQUEST_CANCELED: &str = "REQUEST_CANCELED";
pub const CODE_INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";

/// Fixed set of error kinds. No other kind ever reaches a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    DuplicateKey,
    ForeignKeyViolation,
    RequiredFieldMissing,
    Validation,
    Canceled,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::DuplicateKey => "duplicate_key",
            Self::ForeignKeyViolation => "foreign_key_violation",
            Self::RequiredFieldMissing => "required_field_missing",
            Self::Validation => "validation",
            Self::Canceled => "canceled",
            Self::Internal => "internal",
        }
    }

    /// Whether message and details may be shown to a client verbatim.
    #[must_use]
    pub fn is_client_safe(&self) -> bool {
        !matches!(self, Self::Internal)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalized error value.
///
/// Immutable once built: the `with_*` methods consume and return a new value.
/// For [`ErrorKind::Internal`] the message and details are fixed strings; the
/// raw cause is only ever written to the log by the translator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.render())]
pub struct DomainError {
    kind: ErrorKind,
    code: &'static str,
    message: Cow<'static, str>,
    details: Option<Cow<'static, str>>,
    context: Option<Cow<'static, str>>,
}

impl DomainError {
    fn new(
        kind: ErrorKind,
        code: &'static str,
        message: impl Into<Cow<'static, str>>,
        details: Option<Cow<'static, str>>,
    ) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
            details,
            context: None,
        }
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::new(
            ErrorKind::NotFound,
            CODE_NOT_FOUND,
            "Resource not found",
            Some("The requested resource does not exist".into()),
        )
    }

    #[must_use]
    pub fn duplicate_email() -> Self {
        Self::new(
            ErrorKind::DuplicateKey,
            CODE_USER_EMAIL_EXISTS,
            "Email address is already in use",
            Some("Please use a different email address".into()),
        )
    }

    #[must_use]
    pub fn duplicate_entry() -> Self {
        Self::new(
            ErrorKind::Conflict,
            CODE_DUPLICATE_ENTRY,
            "Duplicate entry found",
            Some("A record with this value already exists".into()),
        )
    }

    #[must_use]
    pub fn foreign_key_violation() -> Self {
        Self::new(
            ErrorKind::ForeignKeyViolation,
            CODE_FOREIGN_KEY_VIOLATION,
            "Invalid reference",
            Some("The referenced record does not exist".into()),
        )
    }

    #[must_use]
    pub fn required_field() -> Self {
        Self::new(
            ErrorKind::RequiredFieldMissing,
            CODE_REQUIRED_FIELD,
            "Required field missing",
            Some("Please provide all required fields".into()),
        )
    }

    /// Validation failure with the already-rendered field messages.
    #[must_use]
    pub fn validation(details: impl Into<Cow<'static, str>>) -> Self {
        Self::new(
            ErrorKind::Validation,
            CODE_VALIDATION_ERROR,
            "Validation failed",
            Some(details.into()),
        )
    }

    #[must_use]
    pub fn canceled() -> Self {
        Self::new(
            ErrorKind::Canceled,
            CODE_REQUEST_CANCELED,
            "Request canceled",
            Some("The request was canceled or exceeded its deadline".into()),
        )
    }

    #[must_use]
    pub fn internal() -> Self {
        Self::new(
            ErrorKind::Internal,
            CODE_INTERNAL_SERVER_ERROR,
            "Internal server error",
            Some("An unexpected error occurred".into()),
        )
    }

    /// Attach operation context ("while updating user").
    ///
    /// Kind and code are preserved; an existing context is kept as the
    /// innermost part of the chain.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<Cow<'static, str>>) -> Self {
        let outer = context.into();
        self.context = Some(match self.context.take() {
            Some(inner) => Cow::Owned(format!("{outer}: {inner}")),
            None => outer,
        });
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    /// Log form: context chain, message and code. Never sent to clients.
    fn render(&self) -> String {
        match &self.context {
            Some(context) => format!("{context}: {} ({})", self.message, self.code),
            None => format!("{} ({})", self.message, self.code),
        }
    }
}

/// Extension methods for forwarding already-normalized errors.
pub trait ResultExt<T> {
    /// Wrap the error with operation context without changing kind or code.
    fn context(self, context: &'static str) -> AppResult<T>;

    /// Turn `NotFound` into `Ok(None)` for lookups that treat absence as a value.
    fn optional(self) -> AppResult<Option<T>>;
}

impl<T> ResultExt<T> for AppResult<T> {
    fn context(self, context: &'static str) -> AppResult<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn optional(self) -> AppResult<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Configuration loading failures. Only raised during startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn all_errors() -> Vec<DomainError> {
        vec![
            DomainError::not_found(),
            DomainError::duplicate_entry(),
            DomainError::duplicate_email(),
            DomainError::foreign_key_violation(),
            DomainError::required_field(),
            DomainError::validation("name: must be provided"),
            DomainError::canceled(),
            DomainError::internal(),
        ]
    }

    #[test]
    fn test_codes_are_distinct() {
        let codes: HashSet<&str> = all_errors().iter().map(DomainError::code).collect();
        assert_eq!(codes.len(), 8);
    }

    #[test]
    fn test_every_kind_is_covered() {
        let kinds: HashSet<ErrorKind> = all_errors().iter().map(DomainError::kind).collect();
        assert_eq!(kinds.len(), 8);
    }

    #[test]
    fn test_context_keeps_kind_and_code() {
        let err = DomainError::duplicate_email()
            .with_context("while creating user")
            .with_context("while onboarding restaurant");

        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
        assert_eq!(err.code(), CODE_USER_EMAIL_EXISTS);
        assert_eq!(
            err.context(),
            Some("while onboarding restaurant: while creating user")
        );
        assert_eq!(err.message(), "Email address is already in use");
    }

    #[test]
    fn test_display_includes_context_and_code() {
        let err = DomainError::not_found().with_context("while deleting user");
        assert_eq!(
            err.to_string(),
            "while deleting user: Resource not found (NOT_FOUND)"
        );
    }

    #[test]
    fn test_optional_maps_only_not_found() {
        let missing: AppResult<i32> = Err(DomainError::not_found());
        assert_eq!(missing.optional(), Ok(None));

        let found: AppResult<i32> = Ok(7);
        assert_eq!(found.optional(), Ok(Some(7)));

        let failed: AppResult<i32> = Err(DomainError::internal());
        assert_eq!(failed.optional(), Err(DomainError::internal()));
    }

    #[test]
    fn test_only_internal_is_not_client_safe() {
        for err in all_errors() {
            assert_eq!(err.kind().is_client_safe(), err.kind() != ErrorKind::Internal);
        }
    }
}
