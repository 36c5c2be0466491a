//! Users, inspector competencies and notifications.

use std::sync::Arc;

use axum::extract::{Path, Request, State};

use super::{forward_with, pass_through, validate_id, ApiResult};
use crate::forwarder::ForwardOptions;
use crate::server::AppState;

/// GET /api/users
pub async fn users(State(state): State<Arc<AppState>>, request: Request) -> ApiResult {
    pass_through(&state, request, "/users").await
}

/// GET/PUT /api/users/{id}/competencies
pub async fn competencies(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request,
) -> ApiResult {
    validate_id("user", &id)?;
    pass_through(&state, request, &format!("/users/{id}/competencies")).await
}

/// GET /api/notifications
pub async fn notifications(State(state): State<Arc<AppState>>, request: Request) -> ApiResult {
    pass_through(&state, request, "/notifications").await
}

/// PATCH /api/notifications/{id}/read
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request,
) -> ApiResult {
    validate_id("notification", &id)?;
    forward_with(
        &state,
        request,
        &format!("/notifications/{id}/read"),
        ForwardOptions::new().no_body(),
    )
    .await
}
