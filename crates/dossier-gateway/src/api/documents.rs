//! Dossier documents: multipart uploads and opaque downloads.

use std::sync::Arc;

use axum::extract::{Multipart, Path, Request, State};
use axum::http::header::ACCEPT;
use axum::http::{HeaderMap, HeaderValue, Method, Uri};

use super::{detached_request, forward_with, read_form, validate_id, ApiError, ApiResult};
use crate::forwarder::{ForwardBody, ForwardOptions};
use crate::server::AppState;

/// POST /api/dossiers/{id}/documents
///
/// The form is re-encoded; the multipart content type, boundary included, is
/// left to the HTTP client.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult {
    validate_id("dossier", &id)?;
    let (form, fields) = read_form(multipart).await?;
    if !fields.iter().any(|name| name == "file") {
        return Err(ApiError::validation("document upload requires a \"file\" field"));
    }

    forward_with(
        &state,
        detached_request(method, uri, headers),
        &format!("/dossiers/{id}/documents"),
        ForwardOptions::new().body(ForwardBody::Multipart(form)),
    )
    .await
}

/// GET /api/documents/{id}/content
///
/// Document bytes (PDFs, photos) come back with the backend's own headers.
/// The browser's `accept` header is carried over so the backend can pick a
/// rendition.
pub async fn content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request,
) -> ApiResult {
    validate_id("document", &id)?;
    let accept = request
        .headers()
        .get(ACCEPT)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*/*"));
    forward_with(
        &state,
        request,
        &format!("/documents/{id}/content"),
        ForwardOptions::new().header(ACCEPT, accept),
    )
    .await
}
