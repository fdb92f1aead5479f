use axum::{http::StatusCode, response::IntoResponse, Json};

use crate::JsonResponse;

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username/email or password";

#[derive(Debug)]
pub enum RequestError {
    Validation(&'static str),
    Conflict(&'static str),
    NotFound(&'static str),
    InvalidCredentials,
    Forbidden,
    SessionError,
    ServerError,
    DatabaseError(sqlx::Error),
}

#[derive(serde::Serialize)]
pub struct ErrorBody {
    error: String,
}

impl ErrorBody {
    pub fn new(error: &str) -> ErrorBody {
        ErrorBody {
            error: error.to_string(),
        }
    }
}

impl From<sqlx::Error> for RequestError {
    fn from(value: sqlx::Error) -> Self {
        Self::DatabaseError(value)
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> axum::response::Response {
        self.to_json_response().into_response()
    }
}

impl RequestError {
    pub fn to_json_response(&self) -> JsonResponse<ErrorBody> {
        let (status_code, json) = match self {
            RequestError::Validation(message) => {
                (StatusCode::BAD_REQUEST, ErrorBody::new(message))
            }
            RequestError::Conflict(message) => (StatusCode::BAD_REQUEST, ErrorBody::new(message)),
            RequestError::NotFound(message) => (StatusCode::NOT_FOUND, ErrorBody::new(message)),
            RequestError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new(INVALID_CREDENTIALS_MESSAGE),
            ),
            RequestError::Forbidden => (StatusCode::FORBIDDEN, ErrorBody::new("Forbidden")),
            RequestError::SessionError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("Session error"),
            ),
            RequestError::ServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("Internal Server Error"),
            ),
            RequestError::DatabaseError(e) => {
                tracing::error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("Internal Server Error"),
                )
            }
        };
        (status_code, Json(json))
    }

    /// True when the underlying driver rejected a write for violating a
    /// UNIQUE constraint on the named column (e.g. "users.username").
    pub fn is_unique_violation(error: &sqlx::Error, column: &str) -> bool {
        if let sqlx::Error::Database(e) = error {
            let message = e.message();
            return message.contains("UNIQUE constraint failed") && message.contains(column);
        }
        false
    }

    pub fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
        if let sqlx::Error::Database(e) = error {
            return e.message().contains("FOREIGN KEY constraint failed");
        }
        false
    }
}
