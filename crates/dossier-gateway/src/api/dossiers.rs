//! Dossiers and the machine inventory attached to them.

use std::sync::Arc;

use axum::extract::{Path, Request, State};

use super::{pass_through, validate_id, ApiResult};
use crate::server::AppState;

/// GET/POST /api/dossiers
pub async fn collection(State(state): State<Arc<AppState>>, request: Request) -> ApiResult {
    pass_through(&state, request, "/dossiers").await
}

/// GET/PUT/DELETE /api/dossiers/{id}
pub async fn item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request,
) -> ApiResult {
    validate_id("dossier", &id)?;
    pass_through(&state, request, &format!("/dossiers/{id}")).await
}

/// GET/POST /api/dossiers/{id}/machines
pub async fn machines(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request,
) -> ApiResult {
    validate_id("dossier", &id)?;
    pass_through(&state, request, &format!("/dossiers/{id}/machines")).await
}

/// GET/PUT/DELETE /api/dossiers/{id}/machines/{machine_id}
pub async fn machine(
    State(state): State<Arc<AppState>>,
    Path((id, machine_id)): Path<(String, String)>,
    request: Request,
) -> ApiResult {
    validate_id("dossier", &id)?;
    validate_id("machine", &machine_id)?;
    pass_through(
        &state,
        request,
        &format!("/dossiers/{id}/machines/{machine_id}"),
    )
    .await
}
