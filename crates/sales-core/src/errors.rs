use std::fmt;

use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::response::ErrorDocument;
use crate::validate::FieldErrors;

/// Top-level message used for every field-validation failure.
pub const VALIDATION_MESSAGE: &str = "data validation error";

/// How an [`AppError`] is presented to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An expected failure raised by a handler, with the status the client
    /// should see. Field-validation errors are trusted errors whose cause is a
    /// [`FieldErrors`].
    Trusted(StatusCode),
    /// Authentication or authorization failed. Always 401, cause never shown.
    Auth,
    /// The service lost integrity and must shut down gracefully.
    Shutdown,
    /// Anything unexpected. Always 500, cause never shown.
    Internal,
}

#[derive(Debug)]
pub struct AppError {
    pub kind: ErrorKind,
    pub error: Error,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            kind: ErrorKind::Trusted(status),
            error: err.into(),
        }
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            kind: ErrorKind::Internal,
            error: err.into(),
        }
    }

    pub fn unauthorized<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            kind: ErrorKind::Auth,
            error: err.into(),
        }
    }

    pub fn shutdown(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Shutdown,
            error: anyhow::anyhow!(message.into()),
        }
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    pub fn conflict<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::CONFLICT, err)
    }

    /// A 400 carrying per-field messages.
    pub fn fields(errors: FieldErrors) -> Self {
        Self::new(StatusCode::BAD_REQUEST, errors)
    }

    pub fn is_shutdown(&self) -> bool {
        self.kind == ErrorKind::Shutdown
    }

    pub fn is_auth(&self) -> bool {
        self.kind == ErrorKind::Auth
    }

    /// Returns the field errors carried by a trusted error, if any.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self.kind {
            ErrorKind::Trusted(_) => self.error.downcast_ref::<FieldErrors>(),
            _ => None,
        }
    }

    /// Maps the error onto the status and document the client receives.
    ///
    /// Only trusted errors expose their own message; auth and internal
    /// failures are reduced to the canonical status text.
    pub fn classify(&self) -> (StatusCode, ErrorDocument) {
        match self.kind {
            ErrorKind::Trusted(status) => match self.field_errors() {
                Some(fields) => (
                    status,
                    ErrorDocument::with_fields(VALIDATION_MESSAGE, fields.fields().clone()),
                ),
                None => (status, ErrorDocument::new(self.error.to_string())),
            },
            ErrorKind::Auth => (
                StatusCode::UNAUTHORIZED,
                ErrorDocument::new(canonical_reason(StatusCode::UNAUTHORIZED)),
            ),
            ErrorKind::Shutdown | ErrorKind::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDocument::new(canonical_reason(StatusCode::INTERNAL_SERVER_ERROR)),
            ),
        }
    }
}

fn canonical_reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown")
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, document) = self.classify();
        (status, Json(document)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}
