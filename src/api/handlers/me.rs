//! Endpoints scoped to the authenticated caller.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, put};
use axum::{Json, Router};
use uuid::Uuid;

use super::paged;
use crate::api::dto::{
    ContributedParams, ContributionParams, PageParams, RewardListParams, page_request,
};
use crate::app_state::AppState;
use crate::domain::{
    Caller, ContributionView, GithubRepoLink, Page, ProjectId, ProjectLink, RewardDetailsView,
    RewardId, RewardItemView, UserRewardsPage,
};
use crate::error::{ErrorResponse, MarketplaceError};

/// `GET /me/contributions`: The caller's contributions.
///
/// # Errors
///
/// Returns [`MarketplaceError::Unauthorized`] for anonymous callers and
/// [`MarketplaceError::BadRequest`] for an unparsable filter.
#[utoipa::path(
    get,
    path = "/api/v1/me/contributions",
    tag = "Me",
    summary = "List my contributions",
    description = "One row per contribution and project. Filters are comma-separated lists.",
    params(ContributionParams),
    responses(
        (status = 200, description = "Single page", body = Page<ContributionView>),
        (status = 206, description = "One page of several", body = Page<ContributionView>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 401, description = "Anonymous caller", body = ErrorResponse),
    )
)]
pub async fn my_contributions(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<ContributionParams>,
) -> Result<Response, MarketplaceError> {
    let filters = params.filters()?;
    let page = page_request(params.page_index, params.page_size, state.default_page_size);
    let contributions = state
        .contribution_service
        .list_contributions(
            &caller,
            filters,
            params.sort.unwrap_or_default(),
            params.direction.unwrap_or_default(),
            page,
        )
        .await?;
    Ok(paged(contributions.is_partial(), contributions))
}

/// `GET /me/contributed-projects`: Projects the caller contributed to.
///
/// # Errors
///
/// Returns [`MarketplaceError::Unauthorized`] for anonymous callers and
/// [`MarketplaceError::BadRequest`] for an unparsable filter.
#[utoipa::path(
    get,
    path = "/api/v1/me/contributed-projects",
    tag = "Me",
    summary = "List my contributed projects",
    description = "Projects holding a contribution of the caller in one of the given repositories.",
    params(ContributedParams),
    responses(
        (status = 200, description = "Projects", body = Vec<ProjectLink>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 401, description = "Anonymous caller", body = ErrorResponse),
    )
)]
pub async fn my_contributed_projects(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<ContributedParams>,
) -> Result<Json<Vec<ProjectLink>>, MarketplaceError> {
    let filters = params.filters()?;
    let projects = state
        .contribution_service
        .contributed_projects(&caller, filters)
        .await?;
    Ok(Json(projects))
}

/// `GET /me/contributed-repos`: Repositories the caller contributed to.
///
/// # Errors
///
/// Returns [`MarketplaceError::Unauthorized`] for anonymous callers and
/// [`MarketplaceError::BadRequest`] for an unparsable filter.
#[utoipa::path(
    get,
    path = "/api/v1/me/contributed-repos",
    tag = "Me",
    summary = "List my contributed repositories",
    description = "Repositories holding a contribution of the caller, linked to one of the given projects.",
    params(ContributedParams),
    responses(
        (status = 200, description = "Repositories", body = Vec<GithubRepoLink>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 401, description = "Anonymous caller", body = ErrorResponse),
    )
)]
pub async fn my_contributed_repos(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<ContributedParams>,
) -> Result<Json<Vec<GithubRepoLink>>, MarketplaceError> {
    let filters = params.filters()?;
    let repos = state
        .contribution_service
        .contributed_repos(&caller, filters)
        .await?;
    Ok(Json(repos))
}

/// `GET /me/rewards`: Rewards received by the caller.
///
/// # Errors
///
/// Returns [`MarketplaceError::Unauthorized`] for anonymous callers.
#[utoipa::path(
    get,
    path = "/api/v1/me/rewards",
    tag = "Me",
    summary = "List my rewards",
    description = "A page of rewards with totals over all of them.",
    params(RewardListParams),
    responses(
        (status = 200, description = "Single page", body = UserRewardsPage),
        (status = 206, description = "One page of several", body = UserRewardsPage),
        (status = 401, description = "Anonymous caller", body = ErrorResponse),
    )
)]
pub async fn my_rewards(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<RewardListParams>,
) -> Result<Response, MarketplaceError> {
    let page = page_request(params.page_index, params.page_size, state.default_page_size);
    let rewards = state
        .user_service
        .my_rewards(
            &caller,
            params.sort.unwrap_or_default(),
            params.direction.unwrap_or_default(),
            page,
        )
        .await?;
    Ok(paged(rewards.rewards.is_partial(), rewards))
}

/// `GET /me/rewards/{reward_id}`: One reward of the caller.
///
/// # Errors
///
/// Returns [`MarketplaceError::NotFound`] for an unknown reward and
/// [`MarketplaceError::Forbidden`] when the caller is not its recipient.
#[utoipa::path(
    get,
    path = "/api/v1/me/rewards/{reward_id}",
    tag = "Me",
    summary = "Get my reward",
    params(("reward_id" = Uuid, Path, description = "Reward id")),
    responses(
        (status = 200, description = "Reward", body = RewardDetailsView),
        (status = 403, description = "Not the recipient", body = ErrorResponse),
        (status = 404, description = "Reward not found", body = ErrorResponse),
    )
)]
pub async fn my_reward(
    State(state): State<AppState>,
    caller: Caller,
    Path(reward_id): Path<Uuid>,
) -> Result<Json<RewardDetailsView>, MarketplaceError> {
    let reward = state
        .user_service
        .my_reward(&caller, RewardId::from(reward_id))
        .await?;
    Ok(Json(reward))
}

/// `GET /me/rewards/{reward_id}/reward-items`: Items paid by one reward of
/// the caller.
///
/// # Errors
///
/// Same as [`my_reward`].
#[utoipa::path(
    get,
    path = "/api/v1/me/rewards/{reward_id}/reward-items",
    tag = "Me",
    summary = "List the items of my reward",
    params(("reward_id" = Uuid, Path, description = "Reward id"), PageParams),
    responses(
        (status = 200, description = "Single page", body = Page<RewardItemView>),
        (status = 206, description = "One page of several", body = Page<RewardItemView>),
        (status = 403, description = "Not the recipient", body = ErrorResponse),
        (status = 404, description = "Reward not found", body = ErrorResponse),
    )
)]
pub async fn my_reward_items(
    State(state): State<AppState>,
    caller: Caller,
    Path(reward_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<Response, MarketplaceError> {
    let page = page_request(params.page_index, params.page_size, state.default_page_size);
    let items = state
        .user_service
        .my_reward_items(&caller, RewardId::from(reward_id), page)
        .await?;
    Ok(paged(items.is_partial(), items))
}

/// `PUT /me/project-leader-invitations/{project_id}`: Accept a lead
/// invitation.
///
/// # Errors
///
/// Returns [`MarketplaceError::NotFound`] when the caller has no pending
/// invitation for the project.
#[utoipa::path(
    put,
    path = "/api/v1/me/project-leader-invitations/{project_id}",
    tag = "Me",
    summary = "Accept a project lead invitation",
    params(("project_id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 204, description = "Invitation accepted"),
        (status = 401, description = "Anonymous caller", body = ErrorResponse),
        (status = 404, description = "No pending invitation", body = ErrorResponse),
    )
)]
pub async fn accept_lead_invitation(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<Uuid>,
) -> Result<StatusCode, MarketplaceError> {
    state
        .project_service
        .accept_lead_invitation(ProjectId::from(project_id), &caller)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Caller-scoped routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/me/contributions", get(my_contributions))
        .route("/me/contributed-projects", get(my_contributed_projects))
        .route("/me/contributed-repos", get(my_contributed_repos))
        .route("/me/rewards", get(my_rewards))
        .route("/me/rewards/{reward_id}", get(my_reward))
        .route("/me/rewards/{reward_id}/reward-items", get(my_reward_items))
        .route(
            "/me/project-leader-invitations/{project_id}",
            put(accept_lead_invitation),
        )
}
