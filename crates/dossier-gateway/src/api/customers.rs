//! Customer onboarding and approval.

use std::sync::Arc;

use axum::extract::{Path, Request, State};

use super::{forward_with, pass_through, validate_id, ApiResult};
use crate::forwarder::ForwardOptions;
use crate::server::AppState;

/// GET/POST /api/customers
pub async fn collection(State(state): State<Arc<AppState>>, request: Request) -> ApiResult {
    pass_through(&state, request, "/customers").await
}

/// GET/PUT/DELETE /api/customers/{id}
pub async fn item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request,
) -> ApiResult {
    validate_id("customer", &id)?;
    pass_through(&state, request, &format!("/customers/{id}")).await
}

/// POST /api/customers/{id}/approve
///
/// Approval is a bare command; whatever the browser sent as a body is dropped.
pub async fn approve(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request,
) -> ApiResult {
    validate_id("customer", &id)?;
    forward_with(
        &state,
        request,
        &format!("/customers/{id}/approve"),
        ForwardOptions::new().no_body(),
    )
    .await
}
