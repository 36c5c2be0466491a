//! Relaying the upstream response back to the caller.
//!
//! JSON bodies are parsed and re-serialized; everything else streams through
//! verbatim with its original headers. The status code is always preserved.

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};

use super::error::ForwardError;
use super::headers::is_hop_by_hop;

/// What the caller gets back for one forwarded request.
pub enum RelayedResponse {
    /// Upstream declared JSON; the payload has been parsed.
    Json {
        status: StatusCode,
        body: serde_json::Value,
    },
    /// Any other content type, passed through untouched.
    Raw {
        status: StatusCode,
        headers: HeaderMap,
        body: Body,
    },
}

impl RelayedResponse {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayedResponse::Json { status, .. } | RelayedResponse::Raw { status, .. } => *status,
        }
    }
}

impl std::fmt::Debug for RelayedResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayedResponse::Json { status, body } => f
                .debug_struct("Json")
                .field("status", status)
                .field("body", body)
                .finish(),
            RelayedResponse::Raw {
                status, headers, ..
            } => f
                .debug_struct("Raw")
                .field("status", status)
                .field("headers", headers)
                .finish_non_exhaustive(),
        }
    }
}

impl IntoResponse for RelayedResponse {
    fn into_response(self) -> Response {
        match self {
            RelayedResponse::Json { status, body } => (status, axum::Json(body)).into_response(),
            RelayedResponse::Raw {
                status,
                headers,
                body,
            } => {
                let mut response = Response::new(body);
                *response.status_mut() = status;
                *response.headers_mut() = headers;
                response
            }
        }
    }
}

/// Whether the headers declare a JSON payload.
pub fn declares_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"))
}

/// Whether a response to `method` with `status` can carry a body at all.
fn may_have_body(method: &Method, status: StatusCode) -> bool {
    *method != Method::HEAD
        && status != StatusCode::NO_CONTENT
        && status != StatusCode::NOT_MODIFIED
}

/// Turn the upstream response to a `method` request into a [`RelayedResponse`].
///
/// A JSON body that fails to parse is an error, not a pass-through. Bodiless
/// responses (HEAD, 204, 304) are relayed raw even when they declare JSON.
pub async fn relay(
    method: &Method,
    upstream: reqwest::Response,
) -> Result<RelayedResponse, ForwardError> {
    let status = upstream.status();

    if declares_json(upstream.headers()) && may_have_body(method, status) {
        let bytes = upstream.bytes().await?;
        let body = serde_json::from_slice(&bytes)?;
        return Ok(RelayedResponse::Json { status, body });
    }

    let mut headers = HeaderMap::with_capacity(upstream.headers().len());
    for (name, value) in upstream.headers() {
        if is_hop_by_hop(name) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    Ok(RelayedResponse::Raw {
        status,
        headers,
        body: Body::from_stream(upstream.bytes_stream()),
    })
}
