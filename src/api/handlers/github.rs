//! Indexed GitHub item lookups.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::domain::RewardableItemView;
use crate::error::{ErrorResponse, MarketplaceError};

/// `GET /github/repos/{owner}/{repo}/issues/{number}`: Issue lookup.
///
/// # Errors
///
/// Returns [`MarketplaceError::NotFound`] when the issue is not indexed.
#[utoipa::path(
    get,
    path = "/api/v1/github/repos/{owner}/{repo}/issues/{number}",
    tag = "GitHub",
    summary = "Find an issue",
    params(
        ("owner" = String, Path, description = "Repository owner login"),
        ("repo" = String, Path, description = "Repository name"),
        ("number" = i64, Path, description = "Issue number"),
    ),
    responses(
        (status = 200, description = "Issue", body = RewardableItemView),
        (status = 404, description = "Issue not indexed", body = ErrorResponse),
    )
)]
pub async fn get_issue(
    State(state): State<AppState>,
    Path((owner, repo, number)): Path<(String, String, i64)>,
) -> Result<Json<RewardableItemView>, MarketplaceError> {
    let issue = state
        .contribution_service
        .find_issue(&owner, &repo, number)
        .await?;
    Ok(Json(issue))
}

/// `GET /github/repos/{owner}/{repo}/pulls/{number}`: Pull request lookup.
///
/// # Errors
///
/// Returns [`MarketplaceError::NotFound`] when the pull request is not
/// indexed.
#[utoipa::path(
    get,
    path = "/api/v1/github/repos/{owner}/{repo}/pulls/{number}",
    tag = "GitHub",
    summary = "Find a pull request",
    params(
        ("owner" = String, Path, description = "Repository owner login"),
        ("repo" = String, Path, description = "Repository name"),
        ("number" = i64, Path, description = "Pull request number"),
    ),
    responses(
        (status = 200, description = "Pull request", body = RewardableItemView),
        (status = 404, description = "Pull request not indexed", body = ErrorResponse),
    )
)]
pub async fn get_pull_request(
    State(state): State<AppState>,
    Path((owner, repo, number)): Path<(String, String, i64)>,
) -> Result<Json<RewardableItemView>, MarketplaceError> {
    let pull_request = state
        .contribution_service
        .find_pull_request(&owner, &repo, number)
        .await?;
    Ok(Json(pull_request))
}

/// GitHub lookup routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/github/repos/{owner}/{repo}/issues/{number}", get(get_issue))
        .route(
            "/github/repos/{owner}/{repo}/pulls/{number}",
            get(get_pull_request),
        )
}
