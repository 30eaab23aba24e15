//! In-memory storage adapter.
//!
//! [`MemoryStorage`] holds the whole marketplace in a single [`Dataset`]
//! guarded by a [`tokio::sync::RwLock`]. Reads share the lock, so each one
//! sees a consistent snapshot; writes take it exclusively and recompute the
//! derived contributor table before releasing it.
//!
//! It backs the test suites and the `STORAGE_BACKEND=memory` mode.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::models::{
    Dataset, IgnoredContributionRecord, LeadInvitationRecord, ProjectLeadRecord, ProjectRecord,
    ProjectRepoRecord,
};
use super::{ContributionStorage, ProjectStorage, StorageResult, UserStorage, project_slug};
use crate::domain::{
    AuthenticatedUser, BudgetsView, Caller, ContributionDetailsView, ContributionFilters,
    ContributionSort, ContributionView, ContributorSort, ContributorView, CreateProjectCommand,
    GithubRepoLink, GithubUserId, LeadContributorView, Page, PageRequest, ProjectCardSort,
    ProjectCatalog, ProjectDetailsView, ProjectId, ProjectLink, ProjectListFilters,
    ProjectVisibility, RewardDetailsView, RewardId, RewardItemView, RewardSort, RewardView,
    RewardableItemFilters, RewardableItemView, SortDirection, UpdateProjectCommand, UserId,
    UserRewardsPage,
};
use crate::error::MarketplaceError;
use crate::query;

/// How many times the lead-only and public read paths ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// Budget reads.
    pub budgets: u64,
    /// Contributor reads with financial figures.
    pub lead_contributors: u64,
    /// Contributor reads without financial figures.
    pub public_contributors: u64,
    /// Project reward listings.
    pub project_rewards: u64,
    /// Rewardable item listings.
    pub rewardable_items: u64,
    /// Contribution detail reads.
    pub contribution_details: u64,
}

#[derive(Debug, Default)]
struct CallCounters {
    budgets: AtomicU64,
    lead_contributors: AtomicU64,
    public_contributors: AtomicU64,
    project_rewards: AtomicU64,
    rewardable_items: AtomicU64,
    contribution_details: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// Marketplace held in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: RwLock<Dataset>,
    calls: CallCounters,
}

impl MemoryStorage {
    /// Wraps a dataset. Derived contributor rows are recomputed.
    #[must_use]
    pub fn new(mut data: Dataset) -> Self {
        data.derive_project_contributors();
        Self {
            data: RwLock::new(data),
            calls: CallCounters::default(),
        }
    }

    /// Copy of the current dataset.
    pub async fn snapshot(&self) -> Dataset {
        self.data.read().await.clone()
    }

    /// Applies `change` to the live dataset, then recomputes derived rows.
    #[cfg(test)]
    pub(crate) async fn update(&self, change: impl FnOnce(&mut Dataset)) {
        let mut data = self.data.write().await;
        change(&mut data);
        data.derive_project_contributors();
    }

    /// Read path counters.
    #[must_use]
    pub fn calls(&self) -> CallCounts {
        CallCounts {
            budgets: self.calls.budgets.load(Ordering::Relaxed),
            lead_contributors: self.calls.lead_contributors.load(Ordering::Relaxed),
            public_contributors: self.calls.public_contributors.load(Ordering::Relaxed),
            project_rewards: self.calls.project_rewards.load(Ordering::Relaxed),
            rewardable_items: self.calls.rewardable_items.load(Ordering::Relaxed),
            contribution_details: self.calls.contribution_details.load(Ordering::Relaxed),
        }
    }
}

fn unique<T: Ord + Copy>(values: &[T]) -> Vec<T> {
    values
        .iter()
        .copied()
        .collect::<BTreeSet<T>>()
        .into_iter()
        .collect()
}

fn ensure_slug_free(data: &Dataset, slug: &str, owner: Option<ProjectId>) -> StorageResult<()> {
    let taken = data
        .projects
        .iter()
        .any(|p| p.slug == slug && Some(p.id) != owner);
    if taken {
        return Err(MarketplaceError::Conflict(format!(
            "Project slug '{slug}' is already used"
        )));
    }
    Ok(())
}

fn replace_repos(data: &mut Dataset, project_id: ProjectId, repo_ids: &[i64]) {
    data.project_repos.retain(|r| r.project_id != project_id);
    data.project_repos.extend(
        unique(repo_ids)
            .into_iter()
            .map(|repo_id| ProjectRepoRecord { project_id, repo_id }),
    );
}

fn replace_invitations(data: &mut Dataset, project_id: ProjectId, github_user_ids: &[i64]) {
    data.lead_invitations.retain(|i| i.project_id != project_id);
    data.lead_invitations.extend(
        unique(github_user_ids)
            .into_iter()
            .map(|github_user_id| LeadInvitationRecord {
                project_id,
                github_user_id,
            }),
    );
}

fn details(data: &Dataset, project_id: ProjectId) -> StorageResult<ProjectDetailsView> {
    query::projects::project_details(data, project_id)
        .ok_or_else(|| MarketplaceError::NotFound(format!("Project {project_id} not found")))
}

#[async_trait]
impl ProjectStorage for MemoryStorage {
    async fn project_lead_ids(&self, project_id: ProjectId) -> StorageResult<Vec<UserId>> {
        let data = self.data.read().await;
        Ok(query::projects::project_lead_ids(&data, project_id))
    }

    async fn project_id_by_slug(&self, slug: &str) -> StorageResult<Option<ProjectId>> {
        let data = self.data.read().await;
        Ok(query::projects::project_id_by_slug(&data, slug))
    }

    async fn project_details(
        &self,
        project_id: ProjectId,
    ) -> StorageResult<Option<ProjectDetailsView>> {
        let data = self.data.read().await;
        Ok(query::projects::project_details(&data, project_id))
    }

    async fn project_catalog(
        &self,
        caller: &Caller,
        filters: &ProjectListFilters,
        sort: ProjectCardSort,
        page: PageRequest,
    ) -> StorageResult<ProjectCatalog> {
        let data = self.data.read().await;
        Ok(query::projects::project_catalog(
            &data, caller, filters, sort, page,
        ))
    }

    async fn project_budgets(&self, project_id: ProjectId) -> StorageResult<BudgetsView> {
        bump(&self.calls.budgets);
        let data = self.data.read().await;
        Ok(query::budgets::project_budgets(&data, project_id))
    }

    async fn project_contributors(
        &self,
        project_id: ProjectId,
        login: Option<&str>,
        sort: ContributorSort,
        direction: SortDirection,
        page: PageRequest,
    ) -> StorageResult<Page<ContributorView>> {
        bump(&self.calls.public_contributors);
        let data = self.data.read().await;
        Ok(query::contributors::project_contributors(
            &data, project_id, login, sort, direction, page,
        ))
    }

    async fn project_contributors_for_lead(
        &self,
        project_id: ProjectId,
        login: Option<&str>,
        sort: ContributorSort,
        direction: SortDirection,
        page: PageRequest,
    ) -> StorageResult<Page<LeadContributorView>> {
        bump(&self.calls.lead_contributors);
        let data = self.data.read().await;
        Ok(query::contributors::project_contributors_for_lead(
            &data, project_id, login, sort, direction, page,
        ))
    }

    async fn project_rewards(
        &self,
        project_id: ProjectId,
        sort: RewardSort,
        direction: SortDirection,
        page: PageRequest,
    ) -> StorageResult<Page<RewardView>> {
        bump(&self.calls.project_rewards);
        let data = self.data.read().await;
        Ok(query::rewards::project_rewards(
            &data, project_id, sort, direction, page,
        ))
    }

    async fn project_reward(
        &self,
        project_id: ProjectId,
        reward_id: RewardId,
    ) -> StorageResult<Option<RewardDetailsView>> {
        let data = self.data.read().await;
        Ok(query::rewards::project_reward(&data, project_id, reward_id))
    }

    async fn project_reward_items(
        &self,
        project_id: ProjectId,
        reward_id: RewardId,
        page: PageRequest,
    ) -> StorageResult<Option<Page<RewardItemView>>> {
        let data = self.data.read().await;
        if !query::rewards::reward_in_project(&data, project_id, reward_id) {
            return Ok(None);
        }
        Ok(Some(query::rewards::reward_items(&data, reward_id, page)))
    }

    async fn rewardable_items(
        &self,
        project_id: ProjectId,
        contributor_id: GithubUserId,
        filters: &RewardableItemFilters,
        page: PageRequest,
    ) -> StorageResult<Page<RewardableItemView>> {
        bump(&self.calls.rewardable_items);
        let data = self.data.read().await;
        Ok(query::rewardable::rewardable_items(
            &data,
            project_id,
            contributor_id,
            filters,
            page,
        ))
    }

    async fn set_ignored_contributions(
        &self,
        project_id: ProjectId,
        contribution_ids: &[String],
        ignored: bool,
    ) -> StorageResult<()> {
        let mut data = self.data.write().await;
        for contribution_id in contribution_ids {
            let existing = data
                .ignored_contributions
                .iter_mut()
                .find(|i| i.project_id == project_id && &i.contribution_id == contribution_id);
            match existing {
                Some(row) => row.ignored = ignored,
                None => data.ignored_contributions.push(IgnoredContributionRecord {
                    project_id,
                    contribution_id: contribution_id.clone(),
                    ignored,
                }),
            }
        }
        tracing::debug!(%project_id, count = contribution_ids.len(), ignored, "ignore overrides written");
        Ok(())
    }

    async fn create_project(
        &self,
        command: &CreateProjectCommand,
        creator: UserId,
    ) -> StorageResult<ProjectDetailsView> {
        let slug = project_slug(&command.name)?;
        let mut data = self.data.write().await;
        ensure_slug_free(&data, &slug, None)?;

        let project_id = ProjectId::new();
        data.projects.push(ProjectRecord {
            id: project_id,
            slug,
            name: command.name.clone(),
            short_description: command.short_description.clone(),
            long_description: command.long_description.clone(),
            logo_url: command.logo_url.clone(),
            more_info_url: command.more_info_url.clone(),
            hiring: command.hiring,
            visibility: ProjectVisibility::Public,
            rank: 0,
            reward_settings: command.reward_settings.clone().unwrap_or_default(),
        });
        data.project_leads.push(ProjectLeadRecord {
            project_id,
            user_id: creator,
        });
        replace_invitations(&mut data, project_id, &command.github_user_ids_to_invite);
        replace_repos(&mut data, project_id, &command.github_repo_ids);
        data.derive_project_contributors();
        details(&data, project_id)
    }

    async fn update_project(
        &self,
        project_id: ProjectId,
        command: &UpdateProjectCommand,
    ) -> StorageResult<()> {
        let slug = command.name.as_deref().map(project_slug).transpose()?;
        let mut data = self.data.write().await;
        if let Some(slug) = &slug {
            ensure_slug_free(&data, slug, Some(project_id))?;
        }
        let Some(project) = data.projects.iter_mut().find(|p| p.id == project_id) else {
            return Err(MarketplaceError::NotFound(format!(
                "Project {project_id} not found"
            )));
        };
        if let (Some(name), Some(slug)) = (&command.name, slug) {
            project.name.clone_from(name);
            project.slug = slug;
        }
        if let Some(value) = &command.short_description {
            project.short_description.clone_from(value);
        }
        if let Some(value) = &command.long_description {
            project.long_description.clone_from(value);
        }
        if let Some(value) = &command.more_info_url {
            project.more_info_url = Some(value.clone());
        }
        if let Some(value) = &command.logo_url {
            project.logo_url = Some(value.clone());
        }
        if let Some(value) = command.hiring {
            project.hiring = value;
        }
        if let Some(value) = &command.reward_settings {
            project.reward_settings = value.clone();
        }

        if let Some(keep) = &command.leaders_to_keep {
            data.project_leads
                .retain(|l| l.project_id != project_id || keep.contains(&l.user_id));
        }
        if let Some(invitees) = &command.github_user_ids_to_invite {
            replace_invitations(&mut data, project_id, invitees);
        }
        if let Some(repo_ids) = &command.github_repo_ids {
            replace_repos(&mut data, project_id, repo_ids);
            data.derive_project_contributors();
        }
        Ok(())
    }

    async fn accept_lead_invitation(
        &self,
        project_id: ProjectId,
        user: &AuthenticatedUser,
    ) -> StorageResult<bool> {
        let mut data = self.data.write().await;
        let before = data.lead_invitations.len();
        data.lead_invitations
            .retain(|i| !(i.project_id == project_id && i.github_user_id == user.github_user_id));
        if data.lead_invitations.len() == before {
            return Ok(false);
        }
        let already_lead = data
            .project_leads
            .iter()
            .any(|l| l.project_id == project_id && l.user_id == user.user_id);
        if !already_lead {
            data.project_leads.push(ProjectLeadRecord {
                project_id,
                user_id: user.user_id,
            });
        }
        Ok(true)
    }
}

#[async_trait]
impl ContributionStorage for MemoryStorage {
    async fn contributions(
        &self,
        contributor_id: GithubUserId,
        filters: &ContributionFilters,
        sort: ContributionSort,
        direction: SortDirection,
        page: PageRequest,
    ) -> StorageResult<Page<ContributionView>> {
        let data = self.data.read().await;
        Ok(query::contributions::list_contributions(
            &data,
            contributor_id,
            filters,
            sort,
            direction,
            page,
        ))
    }

    async fn contribution_author(
        &self,
        project_id: ProjectId,
        contribution_id: &str,
    ) -> StorageResult<Option<GithubUserId>> {
        let data = self.data.read().await;
        Ok(query::contributions::contribution_author(
            &data,
            project_id,
            contribution_id,
        ))
    }

    async fn contribution_details(
        &self,
        project_id: ProjectId,
        contribution_id: &str,
    ) -> StorageResult<Option<ContributionDetailsView>> {
        bump(&self.calls.contribution_details);
        let data = self.data.read().await;
        Ok(query::contributions::contribution_details(
            &data,
            project_id,
            contribution_id,
        ))
    }

    async fn contributed_projects(
        &self,
        contributor_id: GithubUserId,
        filters: &ContributionFilters,
    ) -> StorageResult<Vec<ProjectLink>> {
        let data = self.data.read().await;
        Ok(query::contributions::contributed_projects(
            &data,
            contributor_id,
            filters,
        ))
    }

    async fn contributed_repos(
        &self,
        contributor_id: GithubUserId,
        filters: &ContributionFilters,
    ) -> StorageResult<Vec<GithubRepoLink>> {
        let data = self.data.read().await;
        Ok(query::contributions::contributed_repos(
            &data,
            contributor_id,
            filters,
        ))
    }

    async fn find_issue(
        &self,
        owner: &str,
        repo: &str,
        number: i64,
    ) -> StorageResult<Option<RewardableItemView>> {
        let data = self.data.read().await;
        Ok(query::rewardable::find_issue(&data, owner, repo, number))
    }

    async fn find_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: i64,
    ) -> StorageResult<Option<RewardableItemView>> {
        let data = self.data.read().await;
        Ok(query::rewardable::find_pull_request(
            &data, owner, repo, number,
        ))
    }
}

#[async_trait]
impl UserStorage for MemoryStorage {
    async fn user_rewards(
        &self,
        recipient_id: GithubUserId,
        sort: RewardSort,
        direction: SortDirection,
        page: PageRequest,
    ) -> StorageResult<UserRewardsPage> {
        let data = self.data.read().await;
        Ok(query::rewards::user_rewards(
            &data,
            recipient_id,
            sort,
            direction,
            page,
        ))
    }

    async fn user_reward(
        &self,
        reward_id: RewardId,
    ) -> StorageResult<Option<(GithubUserId, RewardDetailsView)>> {
        let data = self.data.read().await;
        Ok(query::rewards::user_reward(&data, reward_id))
    }

    async fn reward_items(
        &self,
        reward_id: RewardId,
        page: PageRequest,
    ) -> StorageResult<Page<RewardItemView>> {
        let data = self.data.read().await;
        Ok(query::rewards::reward_items(&data, reward_id, page))
    }
}
