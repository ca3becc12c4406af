//! Rendering of [`DomainError`] as HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::domain::{DomainError, ErrorEntry, ErrorExtensions, ErrorKind, ErrorResponse};

/// HTTP status for each error kind
#[must_use]
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict | ErrorKind::DuplicateKey => StatusCode::CONFLICT,
        ErrorKind::ForeignKeyViolation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::RequiredFieldMissing | ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Canceled => StatusCode::REQUEST_TIMEOUT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Client-facing body. Kinds that are not client-safe are flattened to the
/// generic internal message regardless of what they carry.
#[must_use]
pub fn error_body(err: &DomainError) -> ErrorResponse {
    let entry = if err.kind().is_client_safe() {
        ErrorEntry {
            message: err.message().to_string(),
            extensions: ErrorExtensions {
                code: err.code().to_string(),
                details: err.details().map(str::to_string),
            },
        }
    } else {
        let internal = DomainError::internal();
        ErrorEntry {
            message: internal.message().to_string(),
            extensions: ErrorExtensions {
                code: internal.code().to_string(),
                details: internal.details().map(str::to_string),
            },
        }
    };
    ErrorResponse {
        errors: vec![entry],
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = status_for(self.kind());
        if status.is_server_error() {
            error!(code = self.code(), context = ?self.context(), "Server error");
        }
        (status, Json(error_body(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    use crate::domain::error::{CODE_INTERNAL_SERVER_ERROR, CODE_USER_EMAIL_EXISTS};

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::DuplicateKey), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::Conflict), StatusCode::CONFLICT);
        assert_eq!(
            status_for(ErrorKind::ForeignKeyViolation),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(ErrorKind::RequiredFieldMissing),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_for(ErrorKind::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::Canceled), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            status_for(ErrorKind::Internal),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_context_is_not_rendered() {
        let err = DomainError::duplicate_email().with_context("while creating user");
        let body = error_body(&err);
        assert_eq!(body.errors.len(), 1);
        assert_eq!(body.errors[0].extensions.code, CODE_USER_EMAIL_EXISTS);
        assert!(!body.errors[0].message.contains("while"));
    }

    #[test]
    fn test_internal_is_generic() {
        let body = error_body(&DomainError::internal().with_context("while listing users"));
        assert_eq!(body.errors[0].message, "Internal server error");
        assert_eq!(
            body.errors[0].extensions.details.as_deref(),
            Some("An unexpected error occurred")
        );
        assert_eq!(body.errors[0].extensions.code, CODE_INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_into_response_shape() {
        let response = DomainError::validation("email: must be provided").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["errors"][0]["message"], "Validation failed");
        assert_eq!(json["errors"][0]["extensions"]["code"], "VALIDATION_ERROR");
        assert_eq!(
            json["errors"][0]["extensions"]["details"],
            "email: must be provided"
        );
    }
}
