use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use intake_auth::error::AuthError;
use intake_core::error::CoreError;
use intake_storage::error::StorageError;

pub const INVALID_LINK: &str = "Deze link is niet (meer) geldig.";
pub const INVALID_PASSWORD: &str = "Onjuist wachtwoord";
pub const TRY_AGAIN: &str = "Er ging iets mis. Probeer opnieuw.";

/// Unified API error type for all route handlers.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    /// The store could not be reached; the request can be retried.
    Unavailable(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Unavailable(msg) => {
                tracing::warn!("store unavailable: {msg}");
                (StatusCode::SERVICE_UNAVAILABLE, TRY_AGAIN.to_string())
            }
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, TRY_AGAIN.to_string())
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::NoSuchActiveClient { .. } => ApiError::NotFound(INVALID_LINK.to_string()),
            AuthError::InvalidPassword => ApiError::Unauthorized(INVALID_PASSWORD.to_string()),
            AuthError::Storage(e) => e.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::UnknownProcess(_) => ApiError::NotFound(e.to_string()),
            CoreError::UnknownField(_) | CoreError::LastProcess | CoreError::InvalidSlug(_) => {
                ApiError::BadRequest(e.to_string())
            }
            CoreError::NotApplied => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Read { .. } | StorageError::Write { .. } => {
                ApiError::Unavailable(e.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_store_is_a_retryable_503() {
        let e = StorageError::Read {
            key: "drafts/acme.json".to_string(),
            message: "timeout".to_string(),
        };
        let response = ApiError::from(e).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let e = AuthError::Storage(StorageError::Write {
            key: "clients/acme.json".to_string(),
            message: "timeout".to_string(),
        });
        let response = ApiError::from(e).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn edit_errors_map_to_client_errors() {
        let status = |e: CoreError| ApiError::from(e).into_response().status();
        assert_eq!(status(CoreError::UnknownProcess("9".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(CoreError::LastProcess), StatusCode::BAD_REQUEST);
        assert_eq!(status(CoreError::NotApplied), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
