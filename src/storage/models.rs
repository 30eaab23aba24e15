//! Fact tables the query engine reads.
//!
//! A [`Dataset`] is a consistent snapshot of the rows relevant to one
//! request. The in-memory adapter keeps the whole marketplace in one; the
//! PostgreSQL adapter loads the slice a query needs inside one transaction.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{
    CodeReviewOutcome, ContributionStatus, ContributionType, CryptoUsdQuote, Currency,
    GithubRepoId, GithubStatus, GithubUserId, PayoutInfo, ProjectId, ProjectVisibility, RewardId,
    RewardSettings, SponsorId, UserId,
};

/// Stored project.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRecord {
    /// Project id.
    pub id: ProjectId,
    /// Unique slug.
    pub slug: String,
    /// Name.
    pub name: String,
    /// One-line description.
    pub short_description: String,
    /// Full description.
    pub long_description: String,
    /// Logo URL.
    pub logo_url: Option<String>,
    /// External link.
    pub more_info_url: Option<String>,
    /// Hiring flag.
    pub hiring: bool,
    /// Visibility.
    pub visibility: ProjectVisibility,
    /// Curated rank.
    pub rank: i32,
    /// Default reward eligibility.
    pub reward_settings: RewardSettings,
}

/// Lead of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectLeadRecord {
    /// Project.
    pub project_id: ProjectId,
    /// Lead.
    pub user_id: UserId,
}

/// Pending invitation to lead a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadInvitationRecord {
    /// Project.
    pub project_id: ProjectId,
    /// Invited account.
    pub github_user_id: GithubUserId,
}

/// Repository linked to a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectRepoRecord {
    /// Project.
    pub project_id: ProjectId,
    /// Repository.
    pub repo_id: GithubRepoId,
}

/// Account contributing to a project, maintained by the indexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProjectContributorRecord {
    /// Project.
    pub project_id: ProjectId,
    /// Contributor.
    pub github_user_id: GithubUserId,
}

/// Sponsor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SponsorRecord {
    /// Sponsor id.
    pub id: SponsorId,
    /// Name.
    pub name: String,
    /// Logo URL.
    pub logo_url: Option<String>,
    /// Website.
    pub url: Option<String>,
}

/// Sponsorship of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectSponsorRecord {
    /// Project.
    pub project_id: ProjectId,
    /// Sponsor.
    pub sponsor_id: SponsorId,
}

/// Indexed GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubRepoRecord {
    /// Repository id.
    pub id: GithubRepoId,
    /// Owner login.
    pub owner: String,
    /// Name.
    pub name: String,
    /// URL.
    pub html_url: String,
    /// Language name to code size.
    pub languages: BTreeMap<String, i64>,
    /// Whether the GitHub app is installed on it.
    pub has_app_installation: bool,
}

/// Indexed GitHub account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubAccountRecord {
    /// Account id.
    pub id: GithubUserId,
    /// Login.
    pub login: String,
    /// Avatar URL.
    pub avatar_url: Option<String>,
}

/// Signed-up platform user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// User id.
    pub id: UserId,
    /// Linked GitHub account.
    pub github_user_id: GithubUserId,
    /// Saved payout settings.
    pub payout_info: Option<PayoutInfo>,
}

/// Indexed issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRecord {
    /// GitHub id.
    pub id: i64,
    /// Repository.
    pub repo_id: GithubRepoId,
    /// Number.
    pub number: i64,
    /// Title.
    pub title: String,
    /// URL.
    pub html_url: String,
    /// Description.
    pub body: Option<String>,
    /// Status.
    pub status: GithubStatus,
    /// Author.
    pub author_id: GithubUserId,
    /// Comment count.
    pub comments_count: i64,
    /// Opening date.
    pub created_at: DateTime<Utc>,
    /// Closing date.
    pub closed_at: Option<DateTime<Utc>>,
}

/// Indexed pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRecord {
    /// GitHub id.
    pub id: i64,
    /// Repository.
    pub repo_id: GithubRepoId,
    /// Number.
    pub number: i64,
    /// Title.
    pub title: String,
    /// URL.
    pub html_url: String,
    /// Description.
    pub body: Option<String>,
    /// Status.
    pub status: GithubStatus,
    /// Author.
    pub author_id: GithubUserId,
    /// Comment count.
    pub comments_count: i64,
    /// Opening date.
    pub created_at: DateTime<Utc>,
    /// Closing or merge date.
    pub closed_at: Option<DateTime<Utc>>,
    /// Author of each commit.
    pub commit_author_ids: Vec<GithubUserId>,
}

/// Indexed code review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeReviewRecord {
    /// GitHub id.
    pub id: String,
    /// Reviewed pull request.
    pub pull_request_id: i64,
    /// Reviewer.
    pub author_id: GithubUserId,
    /// Status.
    pub status: GithubStatus,
    /// Verdict once submitted.
    pub outcome: Option<CodeReviewOutcome>,
    /// Request date.
    pub requested_at: DateTime<Utc>,
    /// Submission date.
    pub submitted_at: Option<DateTime<Utc>>,
}

/// A pull request closing an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosingIssueRecord {
    /// Closing pull request.
    pub pull_request_id: i64,
    /// Closed issue.
    pub issue_id: i64,
}

/// The GitHub object a contribution is made of. Exactly one exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContributionTarget {
    /// Issue id.
    Issue(i64),
    /// Pull request id.
    PullRequest(i64),
    /// Code review id.
    CodeReview(String),
}

impl ContributionTarget {
    /// Contribution kind.
    #[must_use]
    pub const fn kind(&self) -> ContributionType {
        match self {
            Self::Issue(_) => ContributionType::Issue,
            Self::PullRequest(_) => ContributionType::PullRequest,
            Self::CodeReview(_) => ContributionType::CodeReview,
        }
    }

    /// GitHub id of the target, as referenced by reward items.
    #[must_use]
    pub fn github_id(&self) -> String {
        match self {
            Self::Issue(id) | Self::PullRequest(id) => id.to_string(),
            Self::CodeReview(id) => id.clone(),
        }
    }
}

/// Indexed contribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionRecord {
    /// Opaque contribution id.
    pub id: String,
    /// Contributor.
    pub contributor_id: GithubUserId,
    /// Repository.
    pub repo_id: GithubRepoId,
    /// Progress.
    pub status: ContributionStatus,
    /// Start date.
    pub created_at: DateTime<Utc>,
    /// End date.
    pub completed_at: Option<DateTime<Utc>>,
    /// Underlying GitHub object.
    pub target: ContributionTarget,
}

/// Per-project ignore override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredContributionRecord {
    /// Project.
    pub project_id: ProjectId,
    /// Contribution.
    pub contribution_id: String,
    /// `true` to ignore, `false` to force eligibility.
    pub ignored: bool,
}

/// Reward request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardRecord {
    /// Reward id.
    pub id: RewardId,
    /// Paying project.
    pub project_id: ProjectId,
    /// Requesting lead.
    pub requestor_id: UserId,
    /// Recipient account.
    pub recipient_id: GithubUserId,
    /// Amount.
    pub amount: Decimal,
    /// Currency.
    pub currency: Currency,
    /// Request date.
    pub requested_at: DateTime<Utc>,
    /// Invoice reception date.
    pub invoice_received_at: Option<DateTime<Utc>>,
}

/// Work item paid by a reward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardItemRecord {
    /// Reward.
    pub reward_id: RewardId,
    /// Kind of the item.
    pub kind: ContributionType,
    /// GitHub id of the issue, pull request or review.
    pub item_id: String,
}

/// Executed payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRecord {
    /// Paid reward.
    pub reward_id: RewardId,
    /// Amount paid.
    pub amount: Decimal,
    /// Currency paid.
    pub currency: Currency,
    /// Transaction hash or bank reference.
    pub transaction_reference: String,
    /// Execution date.
    pub processed_at: DateTime<Utc>,
}

/// Project budget in one currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetRecord {
    /// Project.
    pub project_id: ProjectId,
    /// Currency.
    pub currency: Currency,
    /// Allocated amount.
    pub initial_amount: Decimal,
    /// Unspent amount.
    pub remaining_amount: Decimal,
}

/// Snapshot of the marketplace tables.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Projects.
    pub projects: Vec<ProjectRecord>,
    /// Project leads.
    pub project_leads: Vec<ProjectLeadRecord>,
    /// Pending lead invitations.
    pub lead_invitations: Vec<LeadInvitationRecord>,
    /// Project repositories.
    pub project_repos: Vec<ProjectRepoRecord>,
    /// Project contributors.
    pub project_contributors: Vec<ProjectContributorRecord>,
    /// Accounts with open work in a project not yet counted as contributions.
    pub pending_contributors: Vec<ProjectContributorRecord>,
    /// Sponsors.
    pub sponsors: Vec<SponsorRecord>,
    /// Sponsorships.
    pub project_sponsors: Vec<ProjectSponsorRecord>,
    /// Repositories.
    pub repos: Vec<GithubRepoRecord>,
    /// GitHub accounts.
    pub accounts: Vec<GithubAccountRecord>,
    /// Platform users.
    pub users: Vec<UserRecord>,
    /// Issues.
    pub issues: Vec<IssueRecord>,
    /// Pull requests.
    pub pull_requests: Vec<PullRequestRecord>,
    /// Code reviews.
    pub code_reviews: Vec<CodeReviewRecord>,
    /// Issues closed by pull requests.
    pub closing_issues: Vec<ClosingIssueRecord>,
    /// Contributions.
    pub contributions: Vec<ContributionRecord>,
    /// Per-project ignore overrides.
    pub ignored_contributions: Vec<IgnoredContributionRecord>,
    /// Rewards.
    pub rewards: Vec<RewardRecord>,
    /// Reward items.
    pub reward_items: Vec<RewardItemRecord>,
    /// Payments.
    pub payments: Vec<PaymentRecord>,
    /// Budgets.
    pub budgets: Vec<BudgetRecord>,
    /// USD quotes.
    pub quotes: Vec<CryptoUsdQuote>,
}

impl Dataset {
    /// Recomputes `project_contributors` from contributions and project
    /// repositories, the way the indexer maintains it.
    pub fn derive_project_contributors(&mut self) {
        let contributors: BTreeSet<ProjectContributorRecord> = self
            .project_repos
            .iter()
            .flat_map(|link| {
                self.contributions
                    .iter()
                    .filter(move |c| c.repo_id == link.repo_id)
                    .map(move |c| ProjectContributorRecord {
                        project_id: link.project_id,
                        github_user_id: c.contributor_id,
                    })
            })
            .collect();
        self.project_contributors = contributors.into_iter().collect();
    }
}
