//! Translation of call-site failures into structured JSON error responses.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::forwarder::ForwardError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected before anything was sent upstream.
    #[error("{0}")]
    Validation(String),

    #[error("invalid form data: {0}")]
    Form(#[from] MultipartError),

    #[error("failed to read request body: {0}")]
    Body(#[source] axum::Error),

    #[error(transparent)]
    Forward(#[from] ForwardError),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Form(_) | ApiError::Body(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Forward(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Forward(e) if e.is_connect() => StatusCode::BAD_GATEWAY,
            ApiError::Forward(ForwardError::InvalidJson(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Forward(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::Form(_) => "invalid_form",
            ApiError::Body(_) => "invalid_body",
            ApiError::Forward(ForwardError::InvalidJson(_)) => "invalid_upstream_response",
            ApiError::Forward(ForwardError::InvalidTarget { .. }) => "internal_error",
            ApiError::Forward(ForwardError::Upstream(_)) => "upstream_error",
        }
    }

    /// Client-facing message; upstream failure details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            ApiError::Validation(_) | ApiError::Form(_) | ApiError::Body(_) => self.to_string(),
            ApiError::Forward(ForwardError::Upstream(_)) => "upstream request failed".to_string(),
            ApiError::Forward(ForwardError::InvalidJson(_)) => {
                "upstream returned an unreadable response".to_string()
            }
            ApiError::Forward(ForwardError::InvalidTarget { .. }) => {
                "an unexpected error occurred".to_string()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = ErrorBody {
            error: self.code(),
            message: self.public_message(),
        };
        (status, axum::Json(body)).into_response()
    }
}
