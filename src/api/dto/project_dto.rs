//! Project DTOs: catalog and listing parameters, create/update bodies.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use super::common_dto::parse_list;
use crate::domain::{
    ContributionType, ContributorSort, CreateProjectCommand, GithubRepoId, GithubUserId,
    ProjectCardSort, ProjectListFilters, RewardSettings, RewardSort, RewardableItemFilters,
    SortDirection, UpdateProjectCommand, UserId,
};

/// Query parameters of `GET /projects`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProjectListParams {
    /// 0-based page index.
    pub page_index: Option<i32>,
    /// Page size, at most 100.
    pub page_size: Option<i32>,
    /// Sort key, `NAME` by default.
    pub sort: Option<ProjectCardSort>,
    /// Comma-separated languages.
    pub technologies: Option<String>,
    /// Comma-separated sponsor names.
    pub sponsors: Option<String>,
    /// Match on name or short description.
    pub search: Option<String>,
    /// Only projects the caller leads or is invited to lead.
    #[serde(default)]
    pub mine: bool,
}

impl ProjectListParams {
    /// Catalog filters carried by the query string.
    #[must_use]
    pub fn filters(&self) -> ProjectListFilters {
        let text = |v: &str| Some(v.to_string());
        ProjectListFilters {
            technologies: parse_list("technologies", self.technologies.as_deref(), text)
                .ok()
                .flatten(),
            sponsors: parse_list("sponsors", self.sponsors.as_deref(), text)
                .ok()
                .flatten(),
            search: self.search.clone(),
            mine: self.mine,
        }
    }
}

/// Query parameters of `GET /projects/{id}/contributors`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ContributorParams {
    /// 0-based page index.
    pub page_index: Option<i32>,
    /// Page size, at most 100.
    pub page_size: Option<i32>,
    /// Case-insensitive partial login.
    pub login: Option<String>,
    /// Sort key, `LOGIN` by default.
    pub sort: Option<ContributorSort>,
    /// `ASC` or `DESC`.
    pub direction: Option<SortDirection>,
}

/// Query parameters of reward listings.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RewardListParams {
    /// 0-based page index.
    pub page_index: Option<i32>,
    /// Page size, at most 100.
    pub page_size: Option<i32>,
    /// Sort key, `REQUESTED_AT` by default.
    pub sort: Option<RewardSort>,
    /// `ASC` or `DESC`.
    pub direction: Option<SortDirection>,
}

/// Query parameters of plain paginated listings.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// 0-based page index.
    pub page_index: Option<i32>,
    /// Page size, at most 100.
    pub page_size: Option<i32>,
}

/// Query parameters of `GET /projects/{id}/rewardable-items`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RewardableItemParams {
    /// Contributor whose items are listed.
    pub github_user_id: GithubUserId,
    /// 0-based page index.
    pub page_index: Option<i32>,
    /// Page size, at most 100.
    pub page_size: Option<i32>,
    /// Keep only this kind.
    #[serde(rename = "type")]
    pub kind: Option<ContributionType>,
    /// Match on title or number.
    pub search: Option<String>,
    /// Also list ignored items.
    #[serde(default)]
    pub include_ignored_items: bool,
}

impl RewardableItemParams {
    /// Filters carried by the query string.
    #[must_use]
    pub fn filters(&self) -> RewardableItemFilters {
        RewardableItemFilters {
            kind: self.kind,
            search: self.search.clone(),
            include_ignored: self.include_ignored_items,
        }
    }
}

/// Body of `POST /projects`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    /// Project name.
    pub name: String,
    /// One-line description.
    pub short_description: String,
    /// Full description.
    pub long_description: String,
    /// External link.
    pub more_info_url: Option<String>,
    /// Logo URL.
    pub logo_url: Option<String>,
    /// Whether the project is looking for contributors.
    #[serde(default)]
    pub hiring: bool,
    /// Repositories to link.
    #[serde(default)]
    pub github_repo_ids: Vec<GithubRepoId>,
    /// Accounts invited to lead the project.
    #[serde(default)]
    pub invite_github_user_ids_as_project_leads: Vec<GithubUserId>,
    /// Reward eligibility, nothing ignored when absent.
    pub reward_settings: Option<RewardSettings>,
}

impl From<CreateProjectRequest> for CreateProjectCommand {
    fn from(req: CreateProjectRequest) -> Self {
        Self {
            name: req.name,
            short_description: req.short_description,
            long_description: req.long_description,
            more_info_url: req.more_info_url,
            logo_url: req.logo_url,
            hiring: req.hiring,
            github_repo_ids: req.github_repo_ids,
            github_user_ids_to_invite: req.invite_github_user_ids_as_project_leads,
            reward_settings: req.reward_settings,
        }
    }
}

/// Body of `PUT /projects/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    /// New name; the slug follows.
    pub name: Option<String>,
    /// New one-line description.
    pub short_description: Option<String>,
    /// New full description.
    pub long_description: Option<String>,
    /// New external link.
    pub more_info_url: Option<String>,
    /// New logo URL.
    pub logo_url: Option<String>,
    /// New hiring flag.
    pub hiring: Option<bool>,
    /// Replacement repository list.
    pub github_repo_ids: Option<Vec<GithubRepoId>>,
    /// Replacement list of pending lead invitations.
    pub invite_github_user_ids_as_project_leads: Option<Vec<GithubUserId>>,
    /// Leads to keep, a non-empty subset of the current ones.
    pub project_leads_to_keep: Option<Vec<UserId>>,
    /// New reward eligibility.
    pub reward_settings: Option<RewardSettings>,
}

impl From<UpdateProjectRequest> for UpdateProjectCommand {
    fn from(req: UpdateProjectRequest) -> Self {
        Self {
            name: req.name,
            short_description: req.short_description,
            long_description: req.long_description,
            more_info_url: req.more_info_url,
            logo_url: req.logo_url,
            hiring: req.hiring,
            github_repo_ids: req.github_repo_ids,
            github_user_ids_to_invite: req.invite_github_user_ids_as_project_leads,
            leaders_to_keep: req.project_leads_to_keep,
            reward_settings: req.reward_settings,
        }
    }
}

/// Body of `PATCH /projects/{id}/ignored-contributions`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IgnoredContributionsRequest {
    /// Contributions to exclude from rewards.
    #[serde(default)]
    pub contributions_to_ignore: Vec<String>,
    /// Contributions to make eligible again.
    #[serde(default)]
    pub contributions_to_unignore: Vec<String>,
}
