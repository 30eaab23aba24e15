//! Project handlers: catalog, project pages, lead-only reads and project
//! administration.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Json, Router};
use uuid::Uuid;

use super::paged;
use crate::api::dto::{
    ContributorParams, CreateProjectRequest, IgnoredContributionsRequest, PageParams,
    ProjectListParams, RewardListParams, RewardableItemParams, UpdateProjectRequest, page_request,
};
use crate::app_state::AppState;
use crate::domain::{
    BudgetsView, Caller, ContributorListing, Page, ProjectCatalog, ProjectDetailsView, ProjectId,
    RewardDetailsView, RewardId, RewardItemView, RewardView, RewardableItemView,
};
use crate::error::{ErrorResponse, MarketplaceError};

/// `GET /projects`: Project catalog.
///
/// # Errors
///
/// Returns [`MarketplaceError`] on malformed identity headers or storage
/// failures.
#[utoipa::path(
    get,
    path = "/api/v1/projects",
    tag = "Projects",
    summary = "List projects",
    description = "Returns the projects visible to the caller with the technologies and sponsors available as filters. Private projects are listed only to their leads, invited leads and contributors.",
    params(ProjectListParams),
    responses(
        (status = 200, description = "Single page", body = ProjectCatalog),
        (status = 206, description = "One page of several", body = ProjectCatalog),
        (status = 400, description = "Malformed request", body = ErrorResponse),
    )
)]
pub async fn list_projects(
    State(state): State<AppState>,
    caller: Caller,
    Query(params): Query<ProjectListParams>,
) -> Result<Response, MarketplaceError> {
    let page = page_request(params.page_index, params.page_size, state.default_page_size);
    let catalog = state
        .project_service
        .list_projects(
            &caller,
            params.filters(),
            params.sort.unwrap_or_default(),
            page,
        )
        .await?;
    Ok(paged(catalog.projects.is_partial(), catalog))
}

/// `POST /projects`: Create a project led by the caller.
///
/// # Errors
///
/// Returns [`MarketplaceError::Unauthorized`] for anonymous callers and
/// [`MarketplaceError::Conflict`] when the slug is taken.
#[utoipa::path(
    post,
    path = "/api/v1/projects",
    tag = "Projects",
    summary = "Create a project",
    description = "Creates a public project whose first lead is the caller. Invited accounts become pending leads.",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectDetailsView),
        (status = 400, description = "Invalid name", body = ErrorResponse),
        (status = 401, description = "Anonymous caller", body = ErrorResponse),
        (status = 409, description = "Slug already used", body = ErrorResponse),
    )
)]
pub async fn create_project(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, MarketplaceError> {
    let project = state
        .project_service
        .create_project(&caller, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// `GET /projects/{id}`: Project page.
///
/// # Errors
///
/// Returns [`MarketplaceError::NotFound`] for an unknown project.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}",
    tag = "Projects",
    summary = "Get a project",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project details", body = ProjectDetailsView),
        (status = 404, description = "Project not found", body = ErrorResponse),
    )
)]
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectDetailsView>, MarketplaceError> {
    let project = state
        .project_service
        .get_project_by_id(ProjectId::from(id))
        .await?;
    Ok(Json(project))
}

/// `GET /projects/slug/{slug}`: Project page by slug.
///
/// # Errors
///
/// Returns [`MarketplaceError::NotFound`] for an unknown slug.
#[utoipa::path(
    get,
    path = "/api/v1/projects/slug/{slug}",
    tag = "Projects",
    summary = "Get a project by slug",
    params(("slug" = String, Path, description = "Project slug")),
    responses(
        (status = 200, description = "Project details", body = ProjectDetailsView),
        (status = 404, description = "Project not found", body = ErrorResponse),
    )
)]
pub async fn get_project_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProjectDetailsView>, MarketplaceError> {
    let project = state.project_service.get_project_by_slug(&slug).await?;
    Ok(Json(project))
}

/// `PUT /projects/{id}`: Update a project (leads only).
///
/// # Errors
///
/// Returns [`MarketplaceError::Forbidden`] for non-leads and
/// [`MarketplaceError::BadRequest`] for an invalid lead roster.
#[utoipa::path(
    put,
    path = "/api/v1/projects/{id}",
    tag = "Projects",
    summary = "Update a project",
    description = "Updates the given fields. Repository and invitation lists are replaced when present; `projectLeadsToKeep` must be a non-empty subset of the current leads.",
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 204, description = "Project updated"),
        (status = 400, description = "Invalid lead roster", body = ErrorResponse),
        (status = 403, description = "Caller is not a lead", body = ErrorResponse),
    )
)]
pub async fn update_project(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> Result<StatusCode, MarketplaceError> {
    state
        .project_service
        .update_project(ProjectId::from(id), &caller, req.into())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /projects/{id}/budgets`: Budgets with USD equivalents (leads only).
///
/// # Errors
///
/// Returns [`MarketplaceError::Forbidden`] for non-leads.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}/budgets",
    tag = "Projects",
    summary = "Get project budgets",
    description = "Per-currency budgets with USD equivalents. Currencies without a quote are listed with null equivalents and left out of the totals.",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Budgets", body = BudgetsView),
        (status = 403, description = "Caller is not a lead", body = ErrorResponse),
    )
)]
pub async fn get_budgets(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<BudgetsView>, MarketplaceError> {
    let budgets = state
        .project_service
        .get_budgets(ProjectId::from(id), &caller)
        .await?;
    Ok(Json(budgets))
}

/// `GET /projects/{id}/contributors`: Contributor ranking.
///
/// # Errors
///
/// Returns [`MarketplaceError`] on storage failures.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}/contributors",
    tag = "Projects",
    summary = "List project contributors",
    description = "Leads also get each contributor's earnings and the number of items left to reward.",
    params(("id" = Uuid, Path, description = "Project id"), ContributorParams),
    responses(
        (status = 200, description = "Single page", body = ContributorListing),
        (status = 206, description = "One page of several", body = ContributorListing),
    )
)]
pub async fn get_contributors(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Query(params): Query<ContributorParams>,
) -> Result<Response, MarketplaceError> {
    let page = page_request(params.page_index, params.page_size, state.default_page_size);
    let listing = state
        .project_service
        .get_contributors(
            ProjectId::from(id),
            &caller,
            params.login.as_deref(),
            params.sort.unwrap_or_default(),
            params.direction.unwrap_or_default(),
            page,
        )
        .await?;
    Ok(paged(listing.is_partial(), listing))
}

/// `GET /projects/{id}/rewards`: Rewards paid by the project (leads only).
///
/// # Errors
///
/// Returns [`MarketplaceError::Forbidden`] for non-leads.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}/rewards",
    tag = "Rewards",
    summary = "List project rewards",
    params(("id" = Uuid, Path, description = "Project id"), RewardListParams),
    responses(
        (status = 200, description = "Single page", body = Page<RewardView>),
        (status = 206, description = "One page of several", body = Page<RewardView>),
        (status = 403, description = "Caller is not a lead", body = ErrorResponse),
    )
)]
pub async fn get_rewards(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Query(params): Query<RewardListParams>,
) -> Result<Response, MarketplaceError> {
    let page = page_request(params.page_index, params.page_size, state.default_page_size);
    let rewards = state
        .project_service
        .get_rewards(
            ProjectId::from(id),
            &caller,
            params.sort.unwrap_or_default(),
            params.direction.unwrap_or_default(),
            page,
        )
        .await?;
    Ok(paged(rewards.is_partial(), rewards))
}

/// `GET /projects/{id}/rewards/{reward_id}`: One reward (leads only).
///
/// # Errors
///
/// Returns [`MarketplaceError::Forbidden`] for non-leads and
/// [`MarketplaceError::NotFound`] when the reward is not the project's.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}/rewards/{reward_id}",
    tag = "Rewards",
    summary = "Get a project reward",
    params(
        ("id" = Uuid, Path, description = "Project id"),
        ("reward_id" = Uuid, Path, description = "Reward id"),
    ),
    responses(
        (status = 200, description = "Reward", body = RewardDetailsView),
        (status = 403, description = "Caller is not a lead", body = ErrorResponse),
        (status = 404, description = "Reward not found", body = ErrorResponse),
    )
)]
pub async fn get_reward(
    State(state): State<AppState>,
    caller: Caller,
    Path((id, reward_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RewardDetailsView>, MarketplaceError> {
    let reward = state
        .project_service
        .get_reward(ProjectId::from(id), RewardId::from(reward_id), &caller)
        .await?;
    Ok(Json(reward))
}

/// `GET /projects/{id}/rewards/{reward_id}/reward-items`: Items paid by a
/// reward (leads only).
///
/// # Errors
///
/// Returns [`MarketplaceError::Forbidden`] for non-leads and
/// [`MarketplaceError::NotFound`] when the reward is not the project's.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}/rewards/{reward_id}/reward-items",
    tag = "Rewards",
    summary = "List the items of a project reward",
    params(
        ("id" = Uuid, Path, description = "Project id"),
        ("reward_id" = Uuid, Path, description = "Reward id"),
        PageParams,
    ),
    responses(
        (status = 200, description = "Single page", body = Page<RewardItemView>),
        (status = 206, description = "One page of several", body = Page<RewardItemView>),
        (status = 403, description = "Caller is not a lead", body = ErrorResponse),
        (status = 404, description = "Reward not found", body = ErrorResponse),
    )
)]
pub async fn get_reward_items(
    State(state): State<AppState>,
    caller: Caller,
    Path((id, reward_id)): Path<(Uuid, Uuid)>,
    Query(params): Query<PageParams>,
) -> Result<Response, MarketplaceError> {
    let page = page_request(params.page_index, params.page_size, state.default_page_size);
    let items = state
        .project_service
        .get_reward_items(
            ProjectId::from(id),
            RewardId::from(reward_id),
            &caller,
            page,
        )
        .await?;
    Ok(paged(items.is_partial(), items))
}

/// `GET /projects/{id}/rewardable-items`: Items a lead may reward.
///
/// # Errors
///
/// Returns [`MarketplaceError::Forbidden`] for non-leads.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}/rewardable-items",
    tag = "Rewards",
    summary = "List rewardable items",
    description = "Contributions of one contributor in the project's repositories, newest first. Ignored items are hidden unless requested.",
    params(("id" = Uuid, Path, description = "Project id"), RewardableItemParams),
    responses(
        (status = 200, description = "Single page", body = Page<RewardableItemView>),
        (status = 206, description = "One page of several", body = Page<RewardableItemView>),
        (status = 403, description = "Caller is not a lead", body = ErrorResponse),
    )
)]
pub async fn get_rewardable_items(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Query(params): Query<RewardableItemParams>,
) -> Result<Response, MarketplaceError> {
    let page = page_request(params.page_index, params.page_size, state.default_page_size);
    let items = state
        .project_service
        .get_rewardable_items(
            ProjectId::from(id),
            &caller,
            params.github_user_id,
            params.filters(),
            page,
        )
        .await?;
    Ok(paged(items.is_partial(), items))
}

/// `PATCH /projects/{id}/ignored-contributions`: Edit ignore overrides
/// (leads only).
///
/// # Errors
///
/// Returns [`MarketplaceError::Forbidden`] for non-leads.
#[utoipa::path(
    patch,
    path = "/api/v1/projects/{id}/ignored-contributions",
    tag = "Contributions",
    summary = "Ignore or unignore contributions",
    description = "Sets the per-project ignore override of each listed contribution. Repeating a request has no further effect.",
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = IgnoredContributionsRequest,
    responses(
        (status = 204, description = "Overrides saved"),
        (status = 403, description = "Caller is not a lead", body = ErrorResponse),
    )
)]
pub async fn patch_ignored_contributions(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(req): Json<IgnoredContributionsRequest>,
) -> Result<StatusCode, MarketplaceError> {
    let project_id = ProjectId::from(id);
    state
        .project_service
        .ignore_contributions(project_id, &caller, &req.contributions_to_ignore)
        .await?;
    state
        .project_service
        .unignore_contributions(project_id, &caller, &req.contributions_to_unignore)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Project routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route("/projects/slug/{slug}", get(get_project_by_slug))
        .route("/projects/{id}", get(get_project).put(update_project))
        .route("/projects/{id}/budgets", get(get_budgets))
        .route("/projects/{id}/contributors", get(get_contributors))
        .route("/projects/{id}/rewards", get(get_rewards))
        .route("/projects/{id}/rewards/{reward_id}", get(get_reward))
        .route(
            "/projects/{id}/rewards/{reward_id}/reward-items",
            get(get_reward_items),
        )
        .route("/projects/{id}/rewardable-items", get(get_rewardable_items))
        .route(
            "/projects/{id}/ignored-contributions",
            patch(patch_ignored_contributions),
        )
}
