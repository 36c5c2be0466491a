//! `/api` routes of the back-office application.
//!
//! Each route maps a local path onto the backend's path and forwards the
//! request. The few routes that inspect their payload reject bad input with a
//! 400 before anything is sent upstream.

mod accounts;
mod customers;
mod documents;
mod dossiers;
mod error;
mod evaluations;

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Multipart, Request};
use axum::http::{HeaderMap, Method, Uri};
use axum::routing::{get, patch, post, put};
use axum::Router;

use crate::forwarder::{ForwardOptions, RelayedResponse};
use crate::server::AppState;

pub use error::ApiError;

pub type ApiResult = Result<RelayedResponse, ApiError>;

/// All `/api` routes; nest under `/api`.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/customers",
            get(customers::collection).post(customers::collection),
        )
        .route(
            "/customers/{id}",
            get(customers::item).put(customers::item).delete(customers::item),
        )
        .route("/customers/{id}/approve", post(customers::approve))
        .route("/dossiers", get(dossiers::collection).post(dossiers::collection))
        .route(
            "/dossiers/{id}",
            get(dossiers::item).put(dossiers::item).delete(dossiers::item),
        )
        .route(
            "/dossiers/{id}/machines",
            get(dossiers::machines).post(dossiers::machines),
        )
        .route(
            "/dossiers/{id}/machines/{machine_id}",
            get(dossiers::machine)
                .put(dossiers::machine)
                .delete(dossiers::machine),
        )
        .route("/dossiers/{id}/documents", post(documents::upload))
        .route("/documents/{id}/content", get(documents::content))
        .route(
            "/evaluations/{id}",
            get(evaluations::item).put(evaluations::item),
        )
        .route("/evaluations/{id}/criteria", put(evaluations::criteria))
        .route("/evaluations/{id}/checklist", put(evaluations::checklist))
        .route("/evaluations/{id}/signatures", post(evaluations::signatures))
        .route("/users", get(accounts::users))
        .route(
            "/users/{id}/competencies",
            get(accounts::competencies).put(accounts::competencies),
        )
        .route("/notifications", get(accounts::notifications))
        .route("/notifications/{id}/read", patch(accounts::mark_read))
}

/// Reject path identifiers the backend would never issue.
fn validate_id(kind: &str, id: &str) -> Result<(), ApiError> {
    if id.is_empty() {
        return Err(ApiError::validation(format!("{kind} id must not be empty")));
    }
    if !id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(ApiError::validation(format!(
            "{kind} id contains invalid characters"
        )));
    }
    Ok(())
}

/// `path` with the query string of `uri` appended.
fn with_query(path: &str, uri: &Uri) -> String {
    match uri.query() {
        Some(query) if !query.is_empty() => format!("{path}?{query}"),
        _ => path.to_string(),
    }
}

/// Forward `request` to `path` unchanged apart from the standard
/// header/body reconciliation.
async fn pass_through(state: &AppState, request: Request, path: &str) -> ApiResult {
    forward_with(state, request, path, ForwardOptions::new()).await
}

async fn forward_with(
    state: &AppState,
    request: Request,
    path: &str,
    options: ForwardOptions,
) -> ApiResult {
    let target = with_query(path, request.uri());
    Ok(state.forwarder.forward(request, &target, options).await?)
}

/// Bodiless stand-in for a request whose body was consumed by an extractor.
///
/// Keeps method, URI and headers, which is all the forwarder needs when the
/// body is supplied explicitly.
fn detached_request(method: Method, uri: Uri, headers: HeaderMap) -> Request {
    let mut request = Request::new(Body::empty());
    *request.method_mut() = method;
    *request.uri_mut() = uri;
    *request.headers_mut() = headers;
    request
}

/// Re-encode a received multipart form for the upstream call.
///
/// Returns the form and the names of its parts in order. File parts keep
/// their file name and media type.
async fn read_form(
    mut multipart: Multipart,
) -> Result<(reqwest::multipart::Form, Vec<String>), ApiError> {
    let mut form = reqwest::multipart::Form::new();
    let mut names = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            return Err(ApiError::validation("form field without a name"));
        };
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?;

        let mut part = reqwest::multipart::Part::bytes(data.to_vec());
        if let Some(file_name) = file_name {
            part = part.file_name(file_name);
        }
        if let Some(content_type) = content_type {
            part = part.mime_str(&content_type).map_err(|_| {
                ApiError::validation(format!("invalid content type for field {name:?}"))
            })?;
        }

        form = form.part(name.clone(), part);
        names.push(name);
    }

    Ok((form, names))
}
