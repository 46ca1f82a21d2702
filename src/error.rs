use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Error taxonomy shared by every store. Update/delete on a row that is
/// missing and on a row owned by someone else both surface as
/// `NotFoundOrForbidden`; callers are never told which one it was.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found")]
    NotFoundOrForbidden,

    #[error("unauthorized")]
    Unauthorized,

    #[error("storage unavailable")]
    StorageUnavailable,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation(msg) => {
                tracing::warn!(error = %msg, "validation rejected");
                (
                    StatusCode::BAD_REQUEST,
                    serde_json::json!({ "error": msg }),
                )
            }
            Self::Conflict(msg) => {
                tracing::warn!(error = %msg, "conflict");
                (StatusCode::CONFLICT, serde_json::json!({ "error": msg }))
            }
            Self::NotFoundOrForbidden => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "error": "not found" }),
            ),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({ "error": "unauthorized" }),
            ),
            Self::StorageUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                serde_json::json!({ "error": "storage unavailable" }),
            ),
            Self::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "internal server error" }),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFoundOrForbidden,
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                match code.as_deref() {
                    // unique_violation: the constraint is the final word on
                    // uniqueness, a lost pre-check race lands here
                    Some("23505") => Self::Conflict("already exists".into()),
                    // foreign_key_violation: the referenced row is gone
                    Some("23503") => Self::NotFoundOrForbidden,
                    _ => {
                        tracing::error!(error = %err, "database error");
                        Self::Internal(err.into())
                    }
                }
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => {
                tracing::error!(error = %err, "database unreachable");
                Self::StorageUnavailable
            }
            _ => {
                tracing::error!(error = %err, "database error");
                Self::Internal(err.into())
            }
        }
    }
}
