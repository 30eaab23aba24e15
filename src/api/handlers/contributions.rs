//! Contribution details seen from a project.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::domain::{Caller, ContributionDetailsView, ProjectId};
use crate::error::{ErrorResponse, MarketplaceError};

/// `GET /projects/{id}/contributions/{contribution_id}`: One contribution
/// with its links and rewards.
///
/// # Errors
///
/// Returns [`MarketplaceError::Forbidden`] when the caller is neither the
/// author nor a lead, whether or not the contribution exists, and
/// [`MarketplaceError::NotFound`] when a lead asks for a contribution
/// outside the project.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}/contributions/{contribution_id}",
    tag = "Contributions",
    summary = "Get a contribution",
    description = "Readable by the project's leads and by the contribution's author.",
    params(
        ("id" = Uuid, Path, description = "Project id"),
        ("contribution_id" = String, Path, description = "Contribution id"),
    ),
    responses(
        (status = 200, description = "Contribution", body = ContributionDetailsView),
        (status = 401, description = "Anonymous caller", body = ErrorResponse),
        (status = 403, description = "Caller may not read it", body = ErrorResponse),
        (status = 404, description = "Contribution not found", body = ErrorResponse),
    )
)]
pub async fn get_contribution(
    State(state): State<AppState>,
    caller: Caller,
    Path((id, contribution_id)): Path<(Uuid, String)>,
) -> Result<Json<ContributionDetailsView>, MarketplaceError> {
    let details = state
        .contribution_service
        .get_contribution(ProjectId::from(id), &contribution_id, &caller)
        .await?;
    Ok(Json(details))
}

/// Contribution routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/projects/{id}/contributions/{contribution_id}",
        get(get_contribution),
    )
}
