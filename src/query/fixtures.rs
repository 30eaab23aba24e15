//! Dataset builder shared by unit tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::domain::{
    ContributionStatus, ContributionType, CryptoUsdQuote, Currency, GithubRepoId, GithubStatus,
    GithubUserId, PayoutInfo, ProjectId, ProjectVisibility, RewardId, RewardSettings, UserId,
};
use crate::storage::models::{
    BudgetRecord, ClosingIssueRecord, CodeReviewRecord, ContributionRecord, ContributionTarget,
    Dataset, GithubAccountRecord, GithubRepoRecord, IgnoredContributionRecord, IssueRecord,
    LeadInvitationRecord, PaymentRecord, ProjectLeadRecord, ProjectRecord, ProjectRepoRecord,
    PullRequestRecord, RewardItemRecord, RewardRecord, UserRecord,
};

/// Builds datasets with readable test code. Days are counted from
/// 2024-01-01.
#[derive(Debug, Default)]
pub(crate) struct Fixture {
    pub(crate) data: Dataset,
    next_id: i64,
}

pub(crate) fn day(n: i64) -> DateTime<Utc> {
    let base = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default();
    base + Duration::days(n)
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self {
            data: Dataset::default(),
            next_id: 1000,
        }
    }

    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// GitHub account that never signed up.
    pub(crate) fn account(&mut self, login: &str) -> GithubUserId {
        let id = self.id();
        self.data.accounts.push(GithubAccountRecord {
            id,
            login: login.to_string(),
            avatar_url: Some(format!("https://avatars.example.com/{login}")),
        });
        id
    }

    /// Signed-up user without payout settings.
    pub(crate) fn user(&mut self, login: &str) -> (UserId, GithubUserId) {
        let github_user_id = self.account(login);
        let user_id = UserId::new();
        self.data.users.push(UserRecord {
            id: user_id,
            github_user_id,
            payout_info: None,
        });
        (user_id, github_user_id)
    }

    pub(crate) fn payout_info(&mut self, user_id: UserId, info: PayoutInfo) {
        if let Some(user) = self.data.users.iter_mut().find(|u| u.id == user_id) {
            user.payout_info = Some(info);
        }
    }

    pub(crate) fn project(&mut self, name: &str, leads: &[UserId]) -> ProjectId {
        self.project_with(name, ProjectVisibility::Public, leads)
    }

    pub(crate) fn project_with(
        &mut self,
        name: &str,
        visibility: ProjectVisibility,
        leads: &[UserId],
    ) -> ProjectId {
        let id = ProjectId::new();
        self.data.projects.push(ProjectRecord {
            id,
            slug: crate::domain::slugify(name),
            name: name.to_string(),
            short_description: format!("{name} short"),
            long_description: format!("{name} long"),
            logo_url: None,
            more_info_url: None,
            hiring: false,
            visibility,
            rank: 0,
            reward_settings: RewardSettings::default(),
        });
        for lead in leads {
            self.data.project_leads.push(ProjectLeadRecord {
                project_id: id,
                user_id: *lead,
            });
        }
        id
    }

    pub(crate) fn invite(&mut self, project_id: ProjectId, github_user_id: GithubUserId) {
        self.data.lead_invitations.push(LeadInvitationRecord {
            project_id,
            github_user_id,
        });
    }

    pub(crate) fn repo(&mut self, project_id: ProjectId, owner: &str, name: &str) -> GithubRepoId {
        let id = self.id();
        self.data.repos.push(GithubRepoRecord {
            id,
            owner: owner.to_string(),
            name: name.to_string(),
            html_url: format!("https://github.com/{owner}/{name}"),
            languages: [("Rust".to_string(), 1000)].into_iter().collect(),
            has_app_installation: true,
        });
        self.link_repo(project_id, id);
        id
    }

    pub(crate) fn link_repo(&mut self, project_id: ProjectId, repo_id: GithubRepoId) {
        self.data.project_repos.push(ProjectRepoRecord { project_id, repo_id });
    }

    fn contribution(
        &mut self,
        contributor_id: GithubUserId,
        repo_id: GithubRepoId,
        target: ContributionTarget,
        created: i64,
    ) -> String {
        let id = format!("{}-{}", target.github_id(), contributor_id);
        self.data.contributions.push(ContributionRecord {
            id: id.clone(),
            contributor_id,
            repo_id,
            status: ContributionStatus::Completed,
            created_at: day(created),
            completed_at: Some(day(created + 1)),
            target,
        });
        id
    }

    /// Closed issue assigned to `assignee`, with its contribution.
    pub(crate) fn issue(
        &mut self,
        repo_id: GithubRepoId,
        assignee: GithubUserId,
        number: i64,
        title: &str,
        created: i64,
    ) -> (i64, String) {
        let id = self.id();
        self.data.issues.push(IssueRecord {
            id,
            repo_id,
            number,
            title: title.to_string(),
            html_url: format!("https://github.com/issues/{number}"),
            body: None,
            status: GithubStatus::Completed,
            author_id: assignee,
            comments_count: 2,
            created_at: day(created),
            closed_at: Some(day(created + 1)),
        });
        let contribution = self.contribution(assignee, repo_id, ContributionTarget::Issue(id), created);
        (id, contribution)
    }

    /// Merged pull request by `author` with one commit, with its contribution.
    pub(crate) fn pull_request(
        &mut self,
        repo_id: GithubRepoId,
        author: GithubUserId,
        number: i64,
        title: &str,
        created: i64,
    ) -> (i64, String) {
        let id = self.id();
        self.data.pull_requests.push(PullRequestRecord {
            id,
            repo_id,
            number,
            title: title.to_string(),
            html_url: format!("https://github.com/pull/{number}"),
            body: Some(format!("Body of {title}")),
            status: GithubStatus::Merged,
            author_id: author,
            comments_count: 1,
            created_at: day(created),
            closed_at: Some(day(created + 1)),
            commit_author_ids: vec![author],
        });
        let contribution =
            self.contribution(author, repo_id, ContributionTarget::PullRequest(id), created);
        (id, contribution)
    }

    /// Approved review of `pull_request_id`, with its contribution.
    pub(crate) fn code_review(
        &mut self,
        pull_request_id: i64,
        reviewer: GithubUserId,
        created: i64,
    ) -> String {
        let id = format!("review-{}", self.id());
        let repo_id = self
            .data
            .pull_requests
            .iter()
            .find(|p| p.id == pull_request_id)
            .map_or(0, |p| p.repo_id);
        self.data.code_reviews.push(CodeReviewRecord {
            id: id.clone(),
            pull_request_id,
            author_id: reviewer,
            status: GithubStatus::Completed,
            outcome: Some(crate::domain::CodeReviewOutcome::Approved),
            requested_at: day(created),
            submitted_at: Some(day(created + 1)),
        });
        self.contribution(reviewer, repo_id, ContributionTarget::CodeReview(id), created)
    }

    pub(crate) fn close_issue(&mut self, pull_request_id: i64, issue_id: i64) {
        self.data.closing_issues.push(ClosingIssueRecord {
            pull_request_id,
            issue_id,
        });
    }

    pub(crate) fn ignore(&mut self, project_id: ProjectId, contribution_id: &str, ignored: bool) {
        self.data.ignored_contributions.push(IgnoredContributionRecord {
            project_id,
            contribution_id: contribution_id.to_string(),
            ignored,
        });
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn reward(
        &mut self,
        project_id: ProjectId,
        requestor_id: UserId,
        recipient_id: GithubUserId,
        amount: Decimal,
        currency: Currency,
        items: &[(ContributionType, String)],
        requested: i64,
    ) -> RewardId {
        let id = RewardId::new();
        self.data.rewards.push(RewardRecord {
            id,
            project_id,
            requestor_id,
            recipient_id,
            amount,
            currency,
            requested_at: day(requested),
            invoice_received_at: None,
        });
        for (kind, item_id) in items {
            self.data.reward_items.push(RewardItemRecord {
                reward_id: id,
                kind: *kind,
                item_id: item_id.clone(),
            });
        }
        id
    }

    pub(crate) fn pay(&mut self, reward_id: RewardId, processed: i64) {
        let Some(reward) = self.data.rewards.iter().find(|r| r.id == reward_id) else {
            return;
        };
        let payment = PaymentRecord {
            reward_id,
            amount: reward.amount,
            currency: reward.currency,
            transaction_reference: format!("0x{reward_id}"),
            processed_at: day(processed),
        };
        self.data.payments.push(payment);
    }

    pub(crate) fn quote(&mut self, currency: Currency, price: Decimal) {
        self.data.quotes.push(CryptoUsdQuote {
            currency,
            price,
            updated_at: day(0),
        });
    }

    pub(crate) fn budget(
        &mut self,
        project_id: ProjectId,
        currency: Currency,
        initial_amount: Decimal,
        remaining_amount: Decimal,
    ) {
        self.data.budgets.push(BudgetRecord {
            project_id,
            currency,
            initial_amount,
            remaining_amount,
        });
    }

    /// Completes derived tables and returns the dataset.
    pub(crate) fn finish(mut self) -> Dataset {
        self.data.derive_project_contributors();
        self.data
    }
}
