//! Storage port and its adapters.
//!
//! The services talk to the three traits below. Every read returns a view
//! computed by the [`crate::query`] engine over a consistent snapshot;
//! adapters only differ in how that snapshot is obtained and how writes
//! land.
//!
//! - [`memory::MemoryStorage`] keeps the whole marketplace in one
//!   [`models::Dataset`] behind a `tokio::sync::RwLock`.
//! - [`postgres::PostgresStorage`] loads the tables a read needs inside one
//!   transaction and applies writes with `sqlx`.

pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::{
    AuthenticatedUser, BudgetsView, Caller, ContributionDetailsView, ContributionFilters,
    ContributionSort, ContributionView, ContributorSort, ContributorView, CreateProjectCommand,
    GithubRepoLink, GithubUserId, LeadContributorView, Page, PageRequest, ProjectCardSort,
    ProjectCatalog, ProjectDetailsView, ProjectId, ProjectLink, ProjectListFilters,
    RewardDetailsView, RewardId, RewardItemView, RewardSort, RewardView, RewardableItemFilters,
    RewardableItemView, SortDirection, UpdateProjectCommand, UserId, UserRewardsPage, slugify,
};
use crate::error::MarketplaceError;

pub use memory::MemoryStorage;
pub use models::Dataset;
pub use postgres::PostgresStorage;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, MarketplaceError>;

/// Slug of a new or renamed project.
fn project_slug(name: &str) -> StorageResult<String> {
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(MarketplaceError::BadRequest(
            "Project name must contain at least one letter or digit".to_string(),
        ));
    }
    Ok(slug)
}

/// Project-scoped reads and project writes.
#[async_trait]
pub trait ProjectStorage: Send + Sync + Debug {
    /// Current lead roster of a project, empty when the project is unknown.
    async fn project_lead_ids(&self, project_id: ProjectId) -> StorageResult<Vec<UserId>>;

    /// Resolves a slug.
    async fn project_id_by_slug(&self, slug: &str) -> StorageResult<Option<ProjectId>>;

    /// Project page.
    async fn project_details(
        &self,
        project_id: ProjectId,
    ) -> StorageResult<Option<ProjectDetailsView>>;

    /// Catalog page visible to `caller`.
    async fn project_catalog(
        &self,
        caller: &Caller,
        filters: &ProjectListFilters,
        sort: ProjectCardSort,
        page: PageRequest,
    ) -> StorageResult<ProjectCatalog>;

    /// Budgets with USD equivalents.
    async fn project_budgets(&self, project_id: ProjectId) -> StorageResult<BudgetsView>;

    /// Contributors without financial figures.
    async fn project_contributors(
        &self,
        project_id: ProjectId,
        login: Option<&str>,
        sort: ContributorSort,
        direction: SortDirection,
        page: PageRequest,
    ) -> StorageResult<Page<ContributorView>>;

    /// Contributors with the figures reserved to leads.
    async fn project_contributors_for_lead(
        &self,
        project_id: ProjectId,
        login: Option<&str>,
        sort: ContributorSort,
        direction: SortDirection,
        page: PageRequest,
    ) -> StorageResult<Page<LeadContributorView>>;

    /// Rewards paid by a project.
    async fn project_rewards(
        &self,
        project_id: ProjectId,
        sort: RewardSort,
        direction: SortDirection,
        page: PageRequest,
    ) -> StorageResult<Page<RewardView>>;

    /// One reward of a project.
    async fn project_reward(
        &self,
        project_id: ProjectId,
        reward_id: RewardId,
    ) -> StorageResult<Option<RewardDetailsView>>;

    /// Items of a reward of a project, `None` when the reward belongs
    /// elsewhere.
    async fn project_reward_items(
        &self,
        project_id: ProjectId,
        reward_id: RewardId,
        page: PageRequest,
    ) -> StorageResult<Option<Page<RewardItemView>>>;

    /// Contributions of `contributor_id` a lead may reward.
    async fn rewardable_items(
        &self,
        project_id: ProjectId,
        contributor_id: GithubUserId,
        filters: &RewardableItemFilters,
        page: PageRequest,
    ) -> StorageResult<Page<RewardableItemView>>;

    /// Writes the ignore override of each contribution for a project.
    async fn set_ignored_contributions(
        &self,
        project_id: ProjectId,
        contribution_ids: &[String],
        ignored: bool,
    ) -> StorageResult<()>;

    /// Creates a project led by `creator`.
    ///
    /// Fails with [`MarketplaceError::Conflict`] when the slug is taken.
    async fn create_project(
        &self,
        command: &CreateProjectCommand,
        creator: UserId,
    ) -> StorageResult<ProjectDetailsView>;

    /// Applies an already validated update.
    async fn update_project(
        &self,
        project_id: ProjectId,
        command: &UpdateProjectCommand,
    ) -> StorageResult<()>;

    /// Turns the pending invitation of `user` into a lead. Returns `false`
    /// when there is no such invitation.
    async fn accept_lead_invitation(
        &self,
        project_id: ProjectId,
        user: &AuthenticatedUser,
    ) -> StorageResult<bool>;
}

/// Contribution reads.
#[async_trait]
pub trait ContributionStorage: Send + Sync + Debug {
    /// Contributions of one contributor, one row per project.
    async fn contributions(
        &self,
        contributor_id: GithubUserId,
        filters: &ContributionFilters,
        sort: ContributionSort,
        direction: SortDirection,
        page: PageRequest,
    ) -> StorageResult<Page<ContributionView>>;

    /// Author of a contribution in one of the project's repositories.
    async fn contribution_author(
        &self,
        project_id: ProjectId,
        contribution_id: &str,
    ) -> StorageResult<Option<GithubUserId>>;

    /// A contribution seen from a project.
    async fn contribution_details(
        &self,
        project_id: ProjectId,
        contribution_id: &str,
    ) -> StorageResult<Option<ContributionDetailsView>>;

    /// Projects the contributor worked on. Only the project and repository
    /// lists of `filters` apply.
    async fn contributed_projects(
        &self,
        contributor_id: GithubUserId,
        filters: &ContributionFilters,
    ) -> StorageResult<Vec<ProjectLink>>;

    /// Repositories the contributor worked on. Only the project and
    /// repository lists of `filters` apply.
    async fn contributed_repos(
        &self,
        contributor_id: GithubUserId,
        filters: &ContributionFilters,
    ) -> StorageResult<Vec<GithubRepoLink>>;

    /// Issue by `owner/repo#number`.
    async fn find_issue(
        &self,
        owner: &str,
        repo: &str,
        number: i64,
    ) -> StorageResult<Option<RewardableItemView>>;

    /// Pull request by `owner/repo#number`.
    async fn find_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: i64,
    ) -> StorageResult<Option<RewardableItemView>>;
}

/// Reads on behalf of a reward recipient.
#[async_trait]
pub trait UserStorage: Send + Sync + Debug {
    /// Rewards received by an account, with totals.
    async fn user_rewards(
        &self,
        recipient_id: GithubUserId,
        sort: RewardSort,
        direction: SortDirection,
        page: PageRequest,
    ) -> StorageResult<UserRewardsPage>;

    /// A reward with its recipient.
    async fn user_reward(
        &self,
        reward_id: RewardId,
    ) -> StorageResult<Option<(GithubUserId, RewardDetailsView)>>;

    /// Items of a reward.
    async fn reward_items(
        &self,
        reward_id: RewardId,
        page: PageRequest,
    ) -> StorageResult<Page<RewardItemView>>;
}

/// An adapter implementing the whole port.
pub trait Storage: ProjectStorage + ContributionStorage + UserStorage {}

impl<T: ProjectStorage + ContributionStorage + UserStorage> Storage for T {}
