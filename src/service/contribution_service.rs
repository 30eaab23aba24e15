//! Contribution service: the caller's contributions, contribution details
//! and single-item lookups.

use std::sync::Arc;

use crate::domain::{
    Caller, ContributionDetailsView, ContributionFilters, ContributionSort, ContributionView,
    GithubRepoLink, Page, PageRequest, ProjectId, ProjectLink, RewardableItemView, SortDirection,
};
use crate::error::MarketplaceError;
use crate::service::permission::{PermissionService, denied};
use crate::storage::Storage;

/// Reads contributions on behalf of their authors and project leads.
#[derive(Debug, Clone)]
pub struct ContributionService {
    storage: Arc<dyn Storage>,
    permissions: PermissionService,
}

impl ContributionService {
    /// Creates a new `ContributionService`.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, permissions: PermissionService) -> Self {
        Self {
            storage,
            permissions,
        }
    }

    /// Contributions of the caller, one row per project.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Unauthorized`] for anonymous callers.
    pub async fn list_contributions(
        &self,
        caller: &Caller,
        filters: ContributionFilters,
        sort: ContributionSort,
        direction: SortDirection,
        page: PageRequest,
    ) -> Result<Page<ContributionView>, MarketplaceError> {
        let user = caller.require_authenticated()?;
        self.storage
            .contributions(
                user.github_user_id,
                &filters.normalized(),
                sort,
                direction,
                page,
            )
            .await
    }

    /// A contribution seen from a project. Readable by the project's leads
    /// and by the contribution's author.
    ///
    /// The author is resolved before any detail is loaded. Callers who are
    /// neither a lead nor the author get the same denial whether or not the
    /// contribution exists.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`] for callers who are neither
    /// the author nor a lead, and [`MarketplaceError::NotFound`] to leads
    /// when the contribution is not in the project.
    pub async fn get_contribution(
        &self,
        project_id: ProjectId,
        contribution_id: &str,
        caller: &Caller,
    ) -> Result<ContributionDetailsView, MarketplaceError> {
        let user = caller.require_authenticated()?;
        let author = self
            .storage
            .contribution_author(project_id, contribution_id)
            .await?;
        if author != Some(user.github_user_id)
            && !self
                .permissions
                .is_project_lead(project_id, user.user_id)
                .await?
        {
            tracing::debug!(%project_id, contribution_id, "contribution details denied");
            return Err(MarketplaceError::Forbidden(
                denied::READ_CONTRIBUTION.to_string(),
            ));
        }
        self.storage
            .contribution_details(project_id, contribution_id)
            .await?
            .ok_or_else(|| {
                MarketplaceError::NotFound(format!("Contribution {contribution_id} not found"))
            })
    }

    /// Projects the caller contributed to, restricted by the project and
    /// repository lists of `filters`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Unauthorized`] for anonymous callers.
    pub async fn contributed_projects(
        &self,
        caller: &Caller,
        filters: ContributionFilters,
    ) -> Result<Vec<ProjectLink>, MarketplaceError> {
        let user = caller.require_authenticated()?;
        self.storage
            .contributed_projects(user.github_user_id, &filters.normalized())
            .await
    }

    /// Repositories the caller contributed to, restricted by the project
    /// and repository lists of `filters`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Unauthorized`] for anonymous callers.
    pub async fn contributed_repos(
        &self,
        caller: &Caller,
        filters: ContributionFilters,
    ) -> Result<Vec<GithubRepoLink>, MarketplaceError> {
        let user = caller.require_authenticated()?;
        self.storage
            .contributed_repos(user.github_user_id, &filters.normalized())
            .await
    }

    /// Issue by `owner/repo#number`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::NotFound`] when the issue is not indexed.
    pub async fn find_issue(
        &self,
        owner: &str,
        repo: &str,
        number: i64,
    ) -> Result<RewardableItemView, MarketplaceError> {
        self.storage
            .find_issue(owner, repo, number)
            .await?
            .ok_or_else(|| {
                MarketplaceError::NotFound(format!("Issue {owner}/{repo}#{number} not found"))
            })
    }

    /// Pull request by `owner/repo#number`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::NotFound`] when the pull request is not
    /// indexed.
    pub async fn find_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: i64,
    ) -> Result<RewardableItemView, MarketplaceError> {
        self.storage
            .find_pull_request(owner, repo, number)
            .await?
            .ok_or_else(|| {
                MarketplaceError::NotFound(format!(
                    "Pull request {owner}/{repo}#{number} not found"
                ))
            })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::ContributionType;
    use crate::error::ErrorKind;
    use crate::query::fixtures::Fixture;
    use crate::storage::MemoryStorage;

    struct World {
        service: ContributionService,
        storage: Arc<MemoryStorage>,
        project: ProjectId,
        lead: Caller,
        author: Caller,
        stranger: Caller,
        contribution: String,
    }

    fn world() -> World {
        let mut f = Fixture::new();
        let (lead, lead_gid) = f.user("lead");
        let (author, author_gid) = f.user("author");
        let (stranger, stranger_gid) = f.user("stranger");
        let project = f.project("Madara", &[lead]);
        let repo = f.repo(project, "keep-starknet-strange", "madara");
        let (_, contribution) = f.pull_request(repo, author_gid, 42, "Sequencer fees", 1);
        f.issue(repo, author_gid, 7, "Fees are wrong", 0);
        let memory = Arc::new(MemoryStorage::new(f.finish()));
        let storage: Arc<dyn Storage> = Arc::<MemoryStorage>::clone(&memory);
        World {
            service: ContributionService::new(
                Arc::clone(&storage),
                PermissionService::new(storage),
            ),
            storage: memory,
            project,
            lead: Caller::user(lead, lead_gid),
            author: Caller::user(author, author_gid),
            stranger: Caller::user(stranger, stranger_gid),
            contribution,
        }
    }

    #[tokio::test]
    async fn lists_only_the_callers_contributions() {
        let w = world();
        let page = PageRequest::new(0, 10);
        let Ok(mine) = w
            .service
            .list_contributions(
                &w.author,
                ContributionFilters::default(),
                ContributionSort::CreatedAt,
                SortDirection::Desc,
                page,
            )
            .await
        else {
            panic!("listing failed");
        };
        assert_eq!(mine.total_item_number, 2);

        let only_prs = ContributionFilters {
            types: Some(vec![ContributionType::PullRequest]),
            project_ids: Some(vec![]),
            ..ContributionFilters::default()
        };
        let Ok(prs) = w
            .service
            .list_contributions(
                &w.author,
                only_prs,
                ContributionSort::CreatedAt,
                SortDirection::Desc,
                page,
            )
            .await
        else {
            panic!("listing failed");
        };
        assert_eq!(prs.total_item_number, 1);

        let Err(err) = w
            .service
            .list_contributions(
                &Caller::Anonymous,
                ContributionFilters::default(),
                ContributionSort::CreatedAt,
                SortDirection::Desc,
                page,
            )
            .await
        else {
            panic!("anonymous listed contributions");
        };
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn details_are_for_leads_and_authors() {
        let w = world();
        for caller in [&w.lead, &w.author] {
            let Ok(details) = w
                .service
                .get_contribution(w.project, &w.contribution, caller)
                .await
            else {
                panic!("allowed caller denied");
            };
            assert_eq!(details.contribution.id, w.contribution);
        }

        let Err(err) = w
            .service
            .get_contribution(w.project, &w.contribution, &w.stranger)
            .await
        else {
            panic!("stranger read details");
        };
        assert_eq!(err.to_string(), denied::READ_CONTRIBUTION);

        let Err(err) = w.service.get_contribution(w.project, "nope", &w.lead).await else {
            panic!("unknown contribution found");
        };
        assert_eq!(err.to_string(), "Contribution nope not found");
    }

    #[tokio::test]
    async fn strangers_cannot_tell_known_from_unknown_contributions() {
        let w = world();
        let known = w
            .service
            .get_contribution(w.project, &w.contribution, &w.stranger)
            .await;
        let unknown = w
            .service
            .get_contribution(w.project, "nope", &w.stranger)
            .await;
        let (Err(known), Err(unknown)) = (known, unknown) else {
            panic!("stranger read a contribution");
        };
        assert_eq!(known.kind(), ErrorKind::Forbidden);
        assert_eq!(unknown.kind(), ErrorKind::Forbidden);
        assert_eq!(known.to_string(), unknown.to_string());
        assert_eq!(w.storage.calls().contribution_details, 0);

        let Err(err) = w
            .service
            .get_contribution(w.project, &w.contribution, &Caller::Anonymous)
            .await
        else {
            panic!("anonymous read a contribution");
        };
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(w.storage.calls().contribution_details, 0);
    }

    #[tokio::test]
    async fn lookups_name_the_missing_item() {
        let w = world();
        let Ok(pr) = w
            .service
            .find_pull_request("keep-starknet-strange", "madara", 42)
            .await
        else {
            panic!("pull request missing");
        };
        assert_eq!(pr.title, "Sequencer fees");

        let Err(err) = w
            .service
            .find_issue("keep-starknet-strange", "madara", 8)
            .await
        else {
            panic!("unknown issue found");
        };
        assert_eq!(
            err.to_string(),
            "Issue keep-starknet-strange/madara#8 not found"
        );
        let Err(err) = w.service.find_pull_request("a", "b", 1).await else {
            panic!("unknown pull request found");
        };
        assert_eq!(err.to_string(), "Pull request a/b#1 not found");
    }

    #[tokio::test]
    async fn filter_options_cover_contributed_projects() {
        let w = world();
        let Ok(projects) = w
            .service
            .contributed_projects(&w.author, ContributionFilters::default())
            .await
        else {
            panic!("projects failed");
        };
        assert_eq!(projects.len(), 1);
        let Ok(repos) = w
            .service
            .contributed_repos(&w.stranger, ContributionFilters::default())
            .await
        else {
            panic!("repos failed");
        };
        assert!(repos.is_empty());

        let elsewhere = ContributionFilters {
            project_ids: Some(vec![ProjectId::new()]),
            ..ContributionFilters::default()
        };
        let Ok(repos) = w.service.contributed_repos(&w.author, elsewhere).await else {
            panic!("repos failed");
        };
        assert!(repos.is_empty());
        let unfiltered = ContributionFilters {
            repo_ids: Some(vec![]),
            ..ContributionFilters::default()
        };
        let Ok(repos) = w.service.contributed_repos(&w.author, unfiltered).await else {
            panic!("repos failed");
        };
        assert_eq!(repos.len(), 1);
    }
}
