//! Project service: catalog, project pages, lead-only financial reads and
//! project administration.

use std::sync::Arc;

use crate::domain::{
    BudgetsView, Caller, ContributorListing, ContributorSort, CreateProjectCommand, GithubUserId,
    Page, PageRequest, ProjectCardSort, ProjectCatalog, ProjectDetailsView, ProjectId,
    ProjectListFilters, RewardDetailsView, RewardId, RewardItemView, RewardSort, RewardView,
    RewardableItemFilters, RewardableItemView, SortDirection, UpdateProjectCommand,
};
use crate::error::MarketplaceError;
use crate::service::permission::{PermissionService, denied};
use crate::storage::Storage;

/// Orchestrates project reads and writes. Every lead-only operation goes
/// through the [`PermissionService`] before storage is queried.
#[derive(Debug, Clone)]
pub struct ProjectService {
    storage: Arc<dyn Storage>,
    permissions: PermissionService,
}

impl ProjectService {
    /// Creates a new `ProjectService`.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, permissions: PermissionService) -> Self {
        Self {
            storage,
            permissions,
        }
    }

    /// Project page by id.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::NotFound`] for an unknown project.
    pub async fn get_project_by_id(
        &self,
        project_id: ProjectId,
    ) -> Result<ProjectDetailsView, MarketplaceError> {
        self.storage
            .project_details(project_id)
            .await?
            .ok_or_else(|| MarketplaceError::NotFound(format!("Project {project_id} not found")))
    }

    /// Project page by slug.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::NotFound`] for an unknown slug.
    pub async fn get_project_by_slug(
        &self,
        slug: &str,
    ) -> Result<ProjectDetailsView, MarketplaceError> {
        let not_found = || MarketplaceError::NotFound(format!("Project '{slug}' not found"));
        let project_id = self
            .storage
            .project_id_by_slug(slug)
            .await?
            .ok_or_else(not_found)?;
        self.storage
            .project_details(project_id)
            .await?
            .ok_or_else(not_found)
    }

    /// Catalog page visible to `caller`.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub async fn list_projects(
        &self,
        caller: &Caller,
        filters: ProjectListFilters,
        sort: ProjectCardSort,
        page: PageRequest,
    ) -> Result<ProjectCatalog, MarketplaceError> {
        let filters = filters.normalized();
        self.storage
            .project_catalog(caller, &filters, sort, page)
            .await
    }

    /// Budgets of a project (leads only).
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`] for non-leads.
    pub async fn get_budgets(
        &self,
        project_id: ProjectId,
        caller: &Caller,
    ) -> Result<BudgetsView, MarketplaceError> {
        self.permissions
            .require_lead_caller(project_id, caller, denied::READ_BUDGETS)
            .await?;
        self.storage.project_budgets(project_id).await
    }

    /// Contributors of a project. Leads get the variant with earnings; the
    /// gate picks which query runs.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub async fn get_contributors(
        &self,
        project_id: ProjectId,
        caller: &Caller,
        login: Option<&str>,
        sort: ContributorSort,
        direction: SortDirection,
        page: PageRequest,
    ) -> Result<ContributorListing, MarketplaceError> {
        let login = login.map(str::trim).filter(|l| !l.is_empty());
        if self.permissions.is_lead_caller(project_id, caller).await? {
            let contributors = self
                .storage
                .project_contributors_for_lead(project_id, login, sort, direction, page)
                .await?;
            return Ok(ContributorListing::Lead(contributors));
        }
        let contributors = self
            .storage
            .project_contributors(project_id, login, sort, direction, page)
            .await?;
        Ok(ContributorListing::Public(contributors))
    }

    /// Rewards paid by a project (leads only).
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`] for non-leads.
    pub async fn get_rewards(
        &self,
        project_id: ProjectId,
        caller: &Caller,
        sort: RewardSort,
        direction: SortDirection,
        page: PageRequest,
    ) -> Result<Page<RewardView>, MarketplaceError> {
        self.permissions
            .require_lead_caller(project_id, caller, denied::READ_REWARDS)
            .await?;
        self.storage
            .project_rewards(project_id, sort, direction, page)
            .await
    }

    /// One reward of a project (leads only).
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`] for non-leads and
    /// [`MarketplaceError::NotFound`] when the reward is not the project's.
    pub async fn get_reward(
        &self,
        project_id: ProjectId,
        reward_id: RewardId,
        caller: &Caller,
    ) -> Result<RewardDetailsView, MarketplaceError> {
        self.permissions
            .require_lead_caller(project_id, caller, denied::READ_REWARD)
            .await?;
        self.storage
            .project_reward(project_id, reward_id)
            .await?
            .ok_or_else(reward_not_found)
    }

    /// Items paid by one reward of a project (leads only).
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`] for non-leads and
    /// [`MarketplaceError::NotFound`] when the reward is not the project's.
    pub async fn get_reward_items(
        &self,
        project_id: ProjectId,
        reward_id: RewardId,
        caller: &Caller,
        page: PageRequest,
    ) -> Result<Page<RewardItemView>, MarketplaceError> {
        self.permissions
            .require_lead_caller(project_id, caller, denied::READ_REWARD_ITEMS)
            .await?;
        self.storage
            .project_reward_items(project_id, reward_id, page)
            .await?
            .ok_or_else(reward_not_found)
    }

    /// Contributions of `contributor_id` a lead may reward.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`] for non-leads.
    pub async fn get_rewardable_items(
        &self,
        project_id: ProjectId,
        caller: &Caller,
        contributor_id: GithubUserId,
        filters: RewardableItemFilters,
        page: PageRequest,
    ) -> Result<Page<RewardableItemView>, MarketplaceError> {
        self.permissions
            .require_lead_caller(project_id, caller, denied::READ_REWARDABLE_ITEMS)
            .await?;
        let filters = RewardableItemFilters {
            search: filters
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            ..filters
        };
        self.storage
            .rewardable_items(project_id, contributor_id, &filters, page)
            .await
    }

    /// Marks contributions as ignored for the project.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`] for non-leads.
    pub async fn ignore_contributions(
        &self,
        project_id: ProjectId,
        caller: &Caller,
        contribution_ids: &[String],
    ) -> Result<(), MarketplaceError> {
        self.set_ignored(project_id, caller, contribution_ids, true)
            .await
    }

    /// Forces contributions to be eligible for the project.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`] for non-leads.
    pub async fn unignore_contributions(
        &self,
        project_id: ProjectId,
        caller: &Caller,
        contribution_ids: &[String],
    ) -> Result<(), MarketplaceError> {
        self.set_ignored(project_id, caller, contribution_ids, false)
            .await
    }

    async fn set_ignored(
        &self,
        project_id: ProjectId,
        caller: &Caller,
        contribution_ids: &[String],
        ignored: bool,
    ) -> Result<(), MarketplaceError> {
        self.permissions
            .require_lead_caller(project_id, caller, denied::EDIT_IGNORED_CONTRIBUTIONS)
            .await?;
        if contribution_ids.is_empty() {
            return Ok(());
        }
        self.storage
            .set_ignored_contributions(project_id, contribution_ids, ignored)
            .await?;
        tracing::info!(
            %project_id,
            count = contribution_ids.len(),
            ignored,
            "ignored contributions updated"
        );
        Ok(())
    }

    /// Creates a project led by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Unauthorized`] for anonymous callers,
    /// [`MarketplaceError::BadRequest`] for a name without any letter or
    /// digit and [`MarketplaceError::Conflict`] when the slug is taken.
    pub async fn create_project(
        &self,
        caller: &Caller,
        command: CreateProjectCommand,
    ) -> Result<ProjectDetailsView, MarketplaceError> {
        let user = caller.require_authenticated()?;
        let command = CreateProjectCommand {
            name: command.name.trim().to_string(),
            ..command
        };
        let project = self.storage.create_project(&command, user.user_id).await?;
        tracing::info!(project_id = %project.id, slug = %project.slug, "project created");
        Ok(project)
    }

    /// Updates a project (leads only).
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`] for non-leads and
    /// [`MarketplaceError::BadRequest`] when `leaders_to_keep` is empty or
    /// names someone who is not a lead.
    pub async fn update_project(
        &self,
        project_id: ProjectId,
        caller: &Caller,
        command: UpdateProjectCommand,
    ) -> Result<(), MarketplaceError> {
        self.permissions
            .require_lead_caller(project_id, caller, denied::UPDATE_PROJECT)
            .await?;
        if let Some(keep) = &command.leaders_to_keep {
            let roster = self.storage.project_lead_ids(project_id).await?;
            if keep.iter().any(|id| !roster.contains(id)) {
                return Err(MarketplaceError::BadRequest(
                    "Project leaders to keep must be a subset of current project leaders"
                        .to_string(),
                ));
            }
            if keep.is_empty() {
                return Err(MarketplaceError::BadRequest(
                    "Project must keep at least one project leader".to_string(),
                ));
            }
        }
        let command = UpdateProjectCommand {
            name: command.name.map(|n| n.trim().to_string()),
            ..command
        };
        self.storage.update_project(project_id, &command).await?;
        tracing::info!(%project_id, "project updated");
        Ok(())
    }

    /// Accepts the caller's pending invitation to lead the project.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::NotFound`] when no invitation is pending.
    pub async fn accept_lead_invitation(
        &self,
        project_id: ProjectId,
        caller: &Caller,
    ) -> Result<(), MarketplaceError> {
        let user = caller.require_authenticated()?;
        if !self
            .storage
            .accept_lead_invitation(project_id, user)
            .await?
        {
            return Err(MarketplaceError::NotFound(
                "Project leader invitation not found".to_string(),
            ));
        }
        tracing::info!(%project_id, user_id = %user.user_id, "project lead invitation accepted");
        Ok(())
    }
}

fn reward_not_found() -> MarketplaceError {
    MarketplaceError::NotFound("Reward not found".to_string())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::domain::{ContributionType, Currency, RewardStatus};
    use crate::error::ErrorKind;
    use crate::query::fixtures::{Fixture, day};
    use crate::service::UserService;
    use crate::storage::MemoryStorage;
    use crate::storage::models::PaymentRecord;

    struct World {
        service: ProjectService,
        storage: Arc<MemoryStorage>,
        project: ProjectId,
        lead_a: Caller,
        lead_b: Caller,
        outsider: Caller,
        alice: GithubUserId,
        reward: RewardId,
    }

    fn world() -> World {
        let mut f = Fixture::new();
        let (a, a_gid) = f.user("lead-a");
        let (b, b_gid) = f.user("lead-b");
        let (c, c_gid) = f.user("outsider");
        let (_, alice) = f.user("alice");
        let project = f.project("Starklings", &[a, b]);
        let repo = f.repo(project, "onlydust", "starklings");
        let (first, _) = f.pull_request(repo, alice, 1, "Add exercises", 1);
        f.pull_request(repo, alice, 2, "Fix hints", 2);
        f.quote(Currency::Eth, dec!(1500));
        f.budget(project, Currency::Eth, dec!(100), dec!(40));
        f.budget(project, Currency::Stark, dec!(1000), dec!(1000));
        let reward = f.reward(
            project,
            a,
            alice,
            dec!(500),
            Currency::Usd,
            &[(ContributionType::PullRequest, first.to_string())],
            3,
        );
        let storage = Arc::new(MemoryStorage::new(f.finish()));
        let dyn_storage: Arc<dyn Storage> = Arc::<MemoryStorage>::clone(&storage);
        let service = ProjectService::new(
            Arc::clone(&dyn_storage),
            PermissionService::new(dyn_storage),
        );
        World {
            service,
            storage,
            project,
            lead_a: Caller::user(a, a_gid),
            lead_b: Caller::user(b, b_gid),
            outsider: Caller::user(c, c_gid),
            alice,
            reward,
        }
    }

    #[tokio::test]
    async fn budgets_are_lead_only() {
        let w = world();
        let Err(err) = w.service.get_budgets(w.project, &w.outsider).await else {
            panic!("outsider read budgets");
        };
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(
            err.to_string(),
            "Only project leads can read budgets on their projects"
        );
        assert_eq!(w.storage.calls().budgets, 0);

        let Ok(budgets) = w.service.get_budgets(w.project, &w.lead_a).await else {
            panic!("lead denied");
        };
        assert_eq!(w.storage.calls().budgets, 1);
        assert_eq!(budgets.initial_dollars_equivalent, Some(dec!(150000)));
        assert_eq!(budgets.remaining_dollars_equivalent, Some(dec!(60000)));
        assert_eq!(budgets.budgets.len(), 3);
    }

    #[tokio::test]
    async fn contributors_variant_follows_the_gate() {
        let w = world();
        let page = PageRequest::new(0, 10);
        let Ok(listing) = w
            .service
            .get_contributors(
                w.project,
                &w.lead_b,
                None,
                ContributorSort::Login,
                SortDirection::Asc,
                page,
            )
            .await
        else {
            panic!("lead listing failed");
        };
        let ContributorListing::Lead(lead_page) = listing else {
            panic!("lead got the public variant");
        };
        assert_eq!(lead_page.content.len(), 1);
        assert_eq!(lead_page.content.first().and_then(|c| c.earned), Some(dec!(500)));

        for caller in [&w.outsider, &Caller::Anonymous] {
            let Ok(ContributorListing::Public(public)) = w
                .service
                .get_contributors(
                    w.project,
                    caller,
                    Some(" ali "),
                    ContributorSort::Login,
                    SortDirection::Asc,
                    page,
                )
                .await
            else {
                panic!("public listing failed");
            };
            assert_eq!(public.content.len(), 1);
        }
        let calls = w.storage.calls();
        assert_eq!(calls.lead_contributors, 1);
        assert_eq!(calls.public_contributors, 2);
    }

    #[tokio::test]
    async fn rewards_and_reward_details_are_lead_only() {
        let w = world();
        let page = PageRequest::new(0, 10);
        let Err(err) = w
            .service
            .get_rewards(w.project, &w.outsider, RewardSort::RequestedAt, SortDirection::Desc, page)
            .await
        else {
            panic!("outsider read rewards");
        };
        assert_eq!(err.to_string(), denied::READ_REWARDS);
        assert_eq!(w.storage.calls().project_rewards, 0);

        let Ok(rewards) = w
            .service
            .get_rewards(w.project, &w.lead_a, RewardSort::RequestedAt, SortDirection::Desc, page)
            .await
        else {
            panic!("lead denied");
        };
        assert_eq!(rewards.total_item_number, 1);
        assert_eq!(w.storage.calls().project_rewards, 1);

        let Ok(reward) = w.service.get_reward(w.project, w.reward, &w.lead_a).await else {
            panic!("reward missing");
        };
        assert_eq!(reward.amount, dec!(500));
        assert_eq!(reward.status, RewardStatus::MissingPayoutInfo);

        let Err(err) = w.service.get_reward(w.project, w.reward, &w.outsider).await else {
            panic!("outsider read reward");
        };
        assert_eq!(err.to_string(), denied::READ_REWARD);

        let Err(err) = w
            .service
            .get_reward(w.project, RewardId::new(), &w.lead_a)
            .await
        else {
            panic!("unknown reward found");
        };
        assert_eq!(err.to_string(), "Reward not found");

        let Err(err) = w
            .service
            .get_reward_items(w.project, w.reward, &w.outsider, page)
            .await
        else {
            panic!("outsider read reward items");
        };
        assert_eq!(err.to_string(), denied::READ_REWARD_ITEMS);
        let Ok(items) = w.service.get_reward_items(w.project, w.reward, &w.lead_a, page).await else {
            panic!("reward items missing");
        };
        assert_eq!(items.content.len(), 1);
    }

    #[tokio::test]
    async fn reward_views_follow_the_stored_facts() {
        let w = world();
        let snapshot = w.storage.snapshot().await;
        let Some(alice_user) = snapshot.users.iter().find(|u| u.github_user_id == w.alice) else {
            panic!("alice missing");
        };
        let alice = Caller::user(alice_user.id, w.alice);
        let users = UserService::new(Arc::<MemoryStorage>::clone(&w.storage));

        let Ok(before) = w.service.get_reward(w.project, w.reward, &w.lead_a).await else {
            panic!("reward missing");
        };
        assert_eq!(before.amount, dec!(500));
        assert_eq!(before.currency, Currency::Usd);
        assert_eq!(before.dollars_equivalent, Some(dec!(500)));
        assert_eq!(before.status, RewardStatus::MissingPayoutInfo);
        assert_eq!(before.processed_at, None);

        let reward_id = w.reward;
        w.storage
            .update(|data| {
                if let Some(reward) = data.rewards.iter_mut().find(|r| r.id == reward_id) {
                    reward.amount = dec!(2);
                    reward.currency = Currency::Eth;
                }
                data.payments.push(PaymentRecord {
                    reward_id,
                    amount: dec!(2),
                    currency: Currency::Eth,
                    transaction_reference: "0xfeed".to_string(),
                    processed_at: day(10),
                });
            })
            .await;

        let Ok(lead_view) = w.service.get_reward(w.project, w.reward, &w.lead_a).await else {
            panic!("reward missing");
        };
        assert_eq!(lead_view.amount, dec!(2));
        assert_eq!(lead_view.currency, Currency::Eth);
        assert_eq!(lead_view.dollars_equivalent, Some(dec!(3000)));
        assert_eq!(lead_view.status, RewardStatus::Complete);
        assert_eq!(lead_view.processed_at, Some(day(10)));
        assert_eq!(lead_view.transaction_reference.as_deref(), Some("0xfeed"));

        let Ok(own_view) = users.my_reward(&alice, w.reward).await else {
            panic!("recipient denied");
        };
        assert_eq!(own_view.amount, dec!(2));
        assert_eq!(own_view.currency, Currency::Eth);
        assert_eq!(own_view.dollars_equivalent, Some(dec!(3000)));
        assert_eq!(own_view.status, RewardStatus::Complete);
    }

    #[tokio::test]
    async fn rewardable_items_and_ignores_are_lead_only() {
        let w = world();
        let page = PageRequest::new(0, 10);
        let Err(err) = w
            .service
            .get_rewardable_items(w.project, &w.outsider, w.alice, RewardableItemFilters::default(), page)
            .await
        else {
            panic!("outsider read rewardable items");
        };
        assert_eq!(err.to_string(), denied::READ_REWARDABLE_ITEMS);
        assert_eq!(w.storage.calls().rewardable_items, 0);

        let Ok(items) = w
            .service
            .get_rewardable_items(w.project, &w.lead_a, w.alice, RewardableItemFilters::default(), page)
            .await
        else {
            panic!("lead denied");
        };
        assert_eq!(items.total_item_number, 2);
        let ids: Vec<String> = items
            .content
            .iter()
            .filter_map(|i| i.contribution_id.clone())
            .collect();

        let Err(err) = w.service.ignore_contributions(w.project, &w.outsider, &ids).await else {
            panic!("outsider ignored contributions");
        };
        assert_eq!(err.to_string(), denied::EDIT_IGNORED_CONTRIBUTIONS);

        tokio_test::assert_ok!(w.service.ignore_contributions(w.project, &w.lead_b, &ids).await);
        let Ok(items) = w
            .service
            .get_rewardable_items(w.project, &w.lead_a, w.alice, RewardableItemFilters::default(), page)
            .await
        else {
            panic!("lead denied");
        };
        assert!(items.content.is_empty());

        tokio_test::assert_ok!(w.service.unignore_contributions(w.project, &w.lead_b, &ids).await);
        let Ok(items) = w
            .service
            .get_rewardable_items(w.project, &w.lead_a, w.alice, RewardableItemFilters::default(), page)
            .await
        else {
            panic!("lead denied");
        };
        assert_eq!(items.total_item_number, 2);
    }

    #[tokio::test]
    async fn project_lookups_report_not_found() {
        let w = world();
        let Ok(by_slug) = w.service.get_project_by_slug("starklings").await else {
            panic!("slug lookup failed");
        };
        assert_eq!(by_slug.id, w.project);

        let missing = ProjectId::new();
        let Err(err) = w.service.get_project_by_id(missing).await else {
            panic!("unknown project found");
        };
        assert_eq!(err.to_string(), format!("Project {missing} not found"));
        let Err(err) = w.service.get_project_by_slug("nope").await else {
            panic!("unknown slug found");
        };
        assert_eq!(err.to_string(), "Project 'nope' not found");
    }

    #[tokio::test]
    async fn create_requires_authentication() {
        let w = world();
        let command = CreateProjectCommand {
            name: "  Cairo VM  ".to_string(),
            short_description: "VM".to_string(),
            long_description: "Cairo virtual machine".to_string(),
            more_info_url: None,
            logo_url: None,
            hiring: false,
            github_repo_ids: vec![],
            github_user_ids_to_invite: vec![],
            reward_settings: None,
        };
        let Err(err) = w
            .service
            .create_project(&Caller::Anonymous, command.clone())
            .await
        else {
            panic!("anonymous created a project");
        };
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let Ok(project) = w.service.create_project(&w.outsider, command).await else {
            panic!("create failed");
        };
        assert_eq!(project.name, "Cairo VM");
        assert_eq!(project.slug, "cairo-vm");
        assert_eq!(project.leaders.len(), 1);
    }

    #[tokio::test]
    async fn update_validates_leaders_to_keep() {
        let w = world();
        let Caller::Authenticated(a) = w.lead_a else {
            panic!("lead a anonymous");
        };
        let Caller::Authenticated(c) = w.outsider else {
            panic!("outsider anonymous");
        };

        let Err(err) = w
            .service
            .update_project(w.project, &w.outsider, UpdateProjectCommand::default())
            .await
        else {
            panic!("outsider updated");
        };
        assert_eq!(err.to_string(), denied::UPDATE_PROJECT);

        let not_subset = UpdateProjectCommand {
            leaders_to_keep: Some(vec![a.user_id, c.user_id]),
            ..UpdateProjectCommand::default()
        };
        let Err(err) = w.service.update_project(w.project, &w.lead_a, not_subset).await else {
            panic!("accepted a non-lead to keep");
        };
        assert_eq!(
            err.to_string(),
            "Project leaders to keep must be a subset of current project leaders"
        );

        let empty = UpdateProjectCommand {
            leaders_to_keep: Some(vec![]),
            ..UpdateProjectCommand::default()
        };
        let Err(err) = w.service.update_project(w.project, &w.lead_a, empty).await else {
            panic!("accepted an empty roster");
        };
        assert_eq!(err.to_string(), "Project must keep at least one project leader");

        let keep_a = UpdateProjectCommand {
            leaders_to_keep: Some(vec![a.user_id]),
            ..UpdateProjectCommand::default()
        };
        tokio_test::assert_ok!(w.service.update_project(w.project, &w.lead_a, keep_a).await);

        let Err(err) = w.service.get_budgets(w.project, &w.lead_b).await else {
            panic!("removed lead still reads budgets");
        };
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn accepting_an_invitation_needs_one() {
        let w = world();
        let Err(err) = w
            .service
            .accept_lead_invitation(w.project, &w.outsider)
            .await
        else {
            panic!("accepted a missing invitation");
        };
        assert_eq!(err.to_string(), "Project leader invitation not found");
    }
}
