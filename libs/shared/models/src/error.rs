use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Invalid token format: expected 3 segments, found {found}")]
    Segments { found: usize },

    #[error("Invalid payload encoding: {0}")]
    Base64(String),

    #[error("Payload is not valid UTF-8")]
    Utf8,

    #[error("Invalid claims format: {0}")]
    Json(String),
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailure(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Storage unavailable: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::Serialization(err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::AuthenticationFailure(_) => StatusCode::UNAUTHORIZED,
            AuthError::Transport(_) | AuthError::Api { .. } => StatusCode::BAD_GATEWAY,
            AuthError::Storage(_) | AuthError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = self.to_string();

        tracing::error!("Error: {}: {}", status, message);

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
