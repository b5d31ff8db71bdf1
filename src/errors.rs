use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Failure of a single upstream HTTP exchange.
///
/// `Status` means the remote answered with something other than 200; `Transport`
/// means no usable status was obtained (connect/TLS failure, body read or
/// (de)serialization error).
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("{call}: invalid status {code} : {status}, response\n{body}")]
    Status {
        call: String,
        code: u16,
        status: String,
        body: String,
    },

    #[error("{call}: {message}")]
    Transport { call: String, message: String },
}

impl RequestError {
    pub fn transport(call: &str, message: impl Into<String>) -> Self {
        RequestError::Transport {
            call: call.to_string(),
            message: message.into(),
        }
    }

    /// Remote HTTP status, if one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            RequestError::Status { code, .. } => Some(*code),
            RequestError::Transport { .. } => None,
        }
    }
}

/// Error surfaced by the cloud client.
///
/// A failed access-token exchange is kept apart from a failed API call so
/// that a 401 from the exchange itself never triggers the refresh-and-retry
/// path.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("request IAM token: {0}")]
    TokenRefresh(#[source] RequestError),
}

impl ClientError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Request(e) | ClientError::TokenRefresh(e) => e.status_code(),
        }
    }

    pub fn is_status(&self, code: u16) -> bool {
        self.status_code() == Some(code)
    }
}

/// Errors returned by the HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::BadRequest(reason) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "bad_request",
                reason.clone(),
            ),
            AppError::Client(ClientError::TokenRefresh(e)) => {
                tracing::error!("access token exchange failed: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "authentication_error",
                    "token_refresh_failed",
                    e.to_string(),
                )
            }
            AppError::Client(ClientError::Request(e)) => {
                tracing::error!("upstream error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    "upstream_failed",
                    e.to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}
