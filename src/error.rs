use std::fmt::Debug;
use std::fmt::Display;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Failure kinds surfaced by the data access layer. Callers translate these
/// into HTTP statuses; only `Duplicate` and `NotFound` carry meaning beyond
/// "something broke".
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("duplicate value for a unique column")]
    Duplicate,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};
        match err {
            Error::NotFound => StoreError::NotFound,
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => StoreError::Duplicate,
            other => StoreError::Other(other.into()),
        }
    }
}

impl From<diesel_async::pooled_connection::deadpool::PoolError> for StoreError {
    fn from(err: diesel_async::pooled_connection::deadpool::PoolError) -> Self {
        StoreError::Other(err.into())
    }
}

/// Request-level failure, converted to an HTTP response at the handler
/// boundary. `Internal` echoes the source message in the `details` field,
/// matching the API's error envelope.
pub enum AppError {
    Validation(String),
    NotFound(&'static str),
    Conflict(&'static str),
    Internal {
        context: &'static str,
        source: anyhow::Error,
    },
}

impl AppError {
    pub fn internal<E: Into<anyhow::Error>>(context: &'static str, source: E) -> Self {
        Self::Internal {
            context,
            source: source.into(),
        }
    }
}

// Tell axum how to convert `AppError` into a response.
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "status": "error", "message": message })),
            )
                .into_response(),
            AppError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            AppError::Conflict(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            AppError::Internal { context, source } => {
                tracing::error!(%source, "{context}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": context, "details": source.to_string() })),
                )
                    .into_response()
            }
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Validation(m) => write!(f, "{m}"),
            AppError::NotFound(m) | AppError::Conflict(m) => write!(f, "{m}"),
            AppError::Internal { context, source } => write!(f, "{context}: {source}"),
        }
    }
}

impl Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

// This enables using `?` on functions that return `Result<_, anyhow::Error>` to turn them into
// `Result<_, AppError>`. That way you don't need to do that manually.
impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Internal {
            context: "Request failed",
            source: err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::DatabaseErrorKind;

    #[test]
    fn diesel_not_found_maps_to_not_found() {
        let err: StoreError = diesel::result::Error::NotFound.into();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn unique_violation_maps_to_duplicate() {
        let err: StoreError = diesel::result::Error::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value".to_string()),
        )
        .into();
        assert!(matches!(err, StoreError::Duplicate));
    }

    #[test]
    fn other_diesel_errors_stay_unclassified() {
        let err: StoreError = diesel::result::Error::DatabaseError(
            DatabaseErrorKind::ForeignKeyViolation,
            Box::new("fk violation".to_string()),
        )
        .into();
        assert!(matches!(err, StoreError::Other(_)));
    }

    #[test]
    fn app_error_status_codes() {
        assert_eq!(
            AppError::NotFound("Blog not found").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("Email or phone number already exists")
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Validation("authorId must be a valid number".into())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::internal("Failed to fetch blogs", anyhow::anyhow!("boom"))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
