//! Projects: views, listing parameters and write commands.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::contribution::ContributionType;
use super::github::{GithubRepoLink, GithubUserLink};
use super::ids::{GithubRepoId, GithubUserId, ProjectId, SponsorId, UserId};
use super::pagination::Page;

/// Who may list a project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectVisibility {
    /// Listed for everybody.
    #[default]
    Public,
    /// Listed for leads, invitees and contributors only.
    Private,
}

/// Which contributions a project does not reward by default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RewardSettings {
    /// Pull requests are ignored.
    pub ignore_pull_requests: bool,
    /// Issues are ignored.
    pub ignore_issues: bool,
    /// Code reviews are ignored.
    pub ignore_code_reviews: bool,
    /// Contributions created before this date are ignored.
    pub ignore_contributions_before: Option<DateTime<Utc>>,
}

impl RewardSettings {
    /// Whether a contribution is ignored when no explicit override exists.
    #[must_use]
    pub fn ignores(&self, kind: ContributionType, created_at: DateTime<Utc>) -> bool {
        let by_kind = match kind {
            ContributionType::PullRequest => self.ignore_pull_requests,
            ContributionType::Issue => self.ignore_issues,
            ContributionType::CodeReview => self.ignore_code_reviews,
        };
        by_kind
            || self
                .ignore_contributions_before
                .is_some_and(|cutoff| created_at < cutoff)
    }
}

/// Short project reference embedded in other views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectLink {
    /// Project id.
    pub id: ProjectId,
    /// Project slug.
    pub slug: String,
    /// Project name.
    pub name: String,
    /// Logo URL.
    pub logo_url: Option<String>,
}

/// A registered user acting as project lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectLeaderView {
    /// Platform user id.
    pub id: UserId,
    /// GitHub account id.
    pub github_user_id: GithubUserId,
    /// GitHub login.
    pub login: String,
    /// Avatar URL.
    pub avatar_url: Option<String>,
}

/// Sponsor of one or more projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SponsorView {
    /// Sponsor id.
    pub id: SponsorId,
    /// Sponsor name.
    pub name: String,
    /// Logo URL.
    pub logo_url: Option<String>,
    /// Website.
    pub url: Option<String>,
}

/// Project as shown in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCardView {
    /// Project id.
    pub id: ProjectId,
    /// Project slug.
    pub slug: String,
    /// Project name.
    pub name: String,
    /// One-line description.
    pub short_description: String,
    /// Logo URL.
    pub logo_url: Option<String>,
    /// Whether the project is hiring.
    pub hiring: bool,
    /// Visibility.
    pub visibility: ProjectVisibility,
    /// Linked repositories.
    pub repo_count: i64,
    /// Distinct contributors across linked repositories.
    pub contributor_count: i64,
    /// Project leads.
    pub leaders: Vec<ProjectLeaderView>,
    /// Language name to code size across linked repositories.
    pub technologies: BTreeMap<String, i64>,
    /// Sponsors.
    pub sponsors: Vec<SponsorView>,
    /// The caller has a pending lead invitation.
    pub is_pending_project_lead: bool,
    /// The caller leads the project and a linked repository lacks the GitHub app.
    pub is_missing_github_app_installation: bool,
}

/// Sort key for the project catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectCardSort {
    /// Name, alphabetical.
    #[default]
    Name,
    /// Linked repository count, largest first.
    ReposCount,
    /// Contributor count, largest first.
    ContributorsCount,
    /// Curated rank, largest first.
    Rank,
}

/// Optional restrictions on the project catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectListFilters {
    /// Keep projects using any of these languages.
    pub technologies: Option<Vec<String>>,
    /// Keep projects backed by any of these sponsors (by name).
    pub sponsors: Option<Vec<String>>,
    /// Case-insensitive match on name or short description.
    pub search: Option<String>,
    /// Keep projects the caller leads or is invited to lead.
    pub mine: bool,
}

impl ProjectListFilters {
    /// Turns empty lists and blank search into `None`.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            technologies: self.technologies.filter(|v| !v.is_empty()),
            sponsors: self.sponsors.filter(|v| !v.is_empty()),
            search: self
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            mine: self.mine,
        }
    }
}

/// A catalog page with the filter options available to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCatalog {
    /// Matching projects.
    pub projects: Page<ProjectCardView>,
    /// Languages used by the visible projects.
    pub technologies: Vec<String>,
    /// Sponsors of the visible projects.
    pub sponsors: Vec<SponsorView>,
}

/// Contributor summary shown on a project page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopContributorView {
    /// Contributor account.
    pub github_user: GithubUserLink,
    /// Contributions in the project.
    pub contribution_count: i64,
}

/// Everything a project page shows.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetailsView {
    /// Project id.
    pub id: ProjectId,
    /// Project slug.
    pub slug: String,
    /// Project name.
    pub name: String,
    /// One-line description.
    pub short_description: String,
    /// Full description.
    pub long_description: String,
    /// Logo URL.
    pub logo_url: Option<String>,
    /// External link.
    pub more_info_url: Option<String>,
    /// Whether the project is hiring.
    pub hiring: bool,
    /// Visibility.
    pub visibility: ProjectVisibility,
    /// Curated rank.
    pub rank: i32,
    /// Default reward eligibility.
    pub reward_settings: RewardSettings,
    /// Project leads.
    pub leaders: Vec<ProjectLeaderView>,
    /// Accounts invited to lead the project.
    pub invited_leaders: Vec<GithubUserLink>,
    /// Sponsors.
    pub sponsors: Vec<SponsorView>,
    /// Language name to code size.
    pub technologies: BTreeMap<String, i64>,
    /// Linked repositories.
    pub repos: Vec<GithubRepoLink>,
    /// The three most active contributors.
    pub top_contributors: Vec<TopContributorView>,
    /// Distinct contributors.
    pub contributor_count: i64,
    /// Remaining budget in USD, quoted currencies only. `None` on
    /// overflow.
    pub remaining_usd_budget: Option<Decimal>,
}

/// Input for project creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProjectCommand {
    /// Project name, also the slug source.
    pub name: String,
    /// One-line description.
    pub short_description: String,
    /// Full description.
    pub long_description: String,
    /// External link.
    pub more_info_url: Option<String>,
    /// Logo URL.
    pub logo_url: Option<String>,
    /// Whether the project is hiring.
    pub hiring: bool,
    /// Repositories to link.
    pub github_repo_ids: Vec<GithubRepoId>,
    /// Accounts to invite as leads.
    pub github_user_ids_to_invite: Vec<GithubUserId>,
    /// Reward eligibility, defaults to rewarding everything.
    pub reward_settings: Option<RewardSettings>,
}

/// Input for project update. `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateProjectCommand {
    /// New name.
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
    /// Complete set of repositories to link.
    pub github_repo_ids: Option<Vec<GithubRepoId>>,
    /// Complete set of pending lead invitations.
    pub github_user_ids_to_invite: Option<Vec<GithubUserId>>,
    /// Current leads that stay leads. Must be a non-empty subset.
    pub leaders_to_keep: Option<Vec<UserId>>,
    /// New reward eligibility.
    pub reward_settings: Option<RewardSettings>,
}

/// Derives a URL slug from a project name.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
