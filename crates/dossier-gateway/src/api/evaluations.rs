//! Inspection evaluation forms: criteria, checklist and signatures.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Multipart, Path, Request, State};
use axum::http::{HeaderMap, HeaderValue, Method, Uri};
use bytes::Bytes;
use serde_json::Value;

use super::{
    detached_request, forward_with, pass_through, read_form, validate_id, ApiError, ApiResult,
};
use crate::forwarder::{ContentTypeDirective, ForwardBody, ForwardOptions};
use crate::server::AppState;

/// GET/PUT /api/evaluations/{id}
pub async fn item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request,
) -> ApiResult {
    validate_id("evaluation", &id)?;
    pass_through(&state, request, &format!("/evaluations/{id}")).await
}

/// PUT /api/evaluations/{id}/criteria
pub async fn criteria(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request,
) -> ApiResult {
    validate_id("evaluation", &id)?;
    let (request, bytes) = buffer_body(&state, request).await?;
    check_criteria(&parse_json(&bytes)?)?;
    forward_json(&state, request, &format!("/evaluations/{id}/criteria"), bytes).await
}

/// PUT /api/evaluations/{id}/checklist
pub async fn checklist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request,
) -> ApiResult {
    validate_id("evaluation", &id)?;
    let (request, bytes) = buffer_body(&state, request).await?;
    check_checklist(&parse_json(&bytes)?)?;
    forward_json(&state, request, &format!("/evaluations/{id}/checklist"), bytes).await
}

/// POST /api/evaluations/{id}/signatures
///
/// Multipart form with at least a `signature` part (the drawn image); the
/// content type is left to the HTTP client so the boundary matches.
pub async fn signatures(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult {
    validate_id("evaluation", &id)?;
    let (form, fields) = read_form(multipart).await?;
    if !fields.iter().any(|name| name == "signature") {
        return Err(ApiError::validation(
            "signature upload requires a \"signature\" field",
        ));
    }

    forward_with(
        &state,
        detached_request(method, uri, headers),
        &format!("/evaluations/{id}/signatures"),
        ForwardOptions::new()
            .body(ForwardBody::Multipart(form))
            .content_type(ContentTypeDirective::Suppress),
    )
    .await
}

/// Read the whole body, handing back the request head with an empty body.
async fn buffer_body(state: &AppState, request: Request) -> Result<(Request, Bytes), ApiError> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, state.config.server.max_body_bytes)
        .await
        .map_err(ApiError::Body)?;
    Ok((Request::from_parts(parts, Body::empty()), bytes))
}

fn parse_json(bytes: &Bytes) -> Result<Value, ApiError> {
    serde_json::from_slice(bytes)
        .map_err(|e| ApiError::validation(format!("request body is not valid JSON: {e}")))
}

async fn forward_json(state: &AppState, request: Request, path: &str, bytes: Bytes) -> ApiResult {
    let options = ForwardOptions::new()
        .body(ForwardBody::Buffered {
            bytes,
            content_type: None,
        })
        .content_type(ContentTypeDirective::Literal(HeaderValue::from_static(
            "application/json",
        )));
    forward_with(state, request, path, options).await
}

/// Criteria are saved as an array of `{ "criterionId": ..., ... }` entries.
fn check_criteria(value: &Value) -> Result<(), ApiError> {
    let entries = value
        .as_array()
        .ok_or_else(|| ApiError::validation("criteria must be a JSON array"))?;
    for (index, entry) in entries.iter().enumerate() {
        let has_id = entry
            .as_object()
            .and_then(|obj| obj.get("criterionId"))
            .is_some_and(|id| id.is_string() || id.is_number());
        if !has_id {
            return Err(ApiError::validation(format!(
                "criteria[{index}] is missing a criterionId"
            )));
        }
    }
    Ok(())
}

/// A checklist is an object carrying an `items` array.
fn check_checklist(value: &Value) -> Result<(), ApiError> {
    match value.get("items") {
        Some(Value::Array(_)) if value.is_object() => Ok(()),
        _ => Err(ApiError::validation(
            "checklist must be an object with an \"items\" array",
        )),
    }
}
