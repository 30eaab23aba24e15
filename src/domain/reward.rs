//! Rewards as seen by project leads and by their recipients.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::contribution::ContributionType;
use super::currency::Currency;
use super::github::{CodeReviewOutcome, GithubStatus, GithubUserLink};
use super::ids::{GithubRepoId, GithubUserId, RewardId};
use super::pagination::Page;
use super::project::ProjectLink;
use super::reward_status::RewardStatus;

/// Sort key for reward listings. Every key falls back to the request date,
/// newest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RewardSort {
    /// Request date.
    #[default]
    RequestedAt,
    /// USD equivalent.
    Amount,
    /// Number of rewarded items.
    Contribution,
    /// Derived status.
    Status,
}

/// A reward in a project lead listing.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RewardView {
    /// Reward id.
    pub id: RewardId,
    /// Amount.
    pub amount: Decimal,
    /// Currency.
    pub currency: Currency,
    /// USD value, `None` without a quote.
    pub dollars_equivalent: Option<Decimal>,
    /// Derived status.
    pub status: RewardStatus,
    /// Recipient.
    pub recipient: GithubUserLink,
    /// Request date.
    pub requested_at: DateTime<Utc>,
    /// Payment date.
    pub processed_at: Option<DateTime<Utc>>,
    /// Number of rewarded items.
    pub item_count: i64,
}

/// A reward with its project, requestor and payment reference.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RewardDetailsView {
    /// Reward id.
    pub id: RewardId,
    /// Amount.
    pub amount: Decimal,
    /// Currency.
    pub currency: Currency,
    /// USD value, `None` without a quote.
    pub dollars_equivalent: Option<Decimal>,
    /// Derived status.
    pub status: RewardStatus,
    /// Project paying the reward.
    pub project: ProjectLink,
    /// Lead who requested the reward.
    pub from: GithubUserLink,
    /// Recipient.
    pub to: GithubUserLink,
    /// Request date.
    pub requested_at: DateTime<Utc>,
    /// Payment date.
    pub processed_at: Option<DateTime<Utc>>,
    /// Transaction hash or bank reference once paid.
    pub transaction_reference: Option<String>,
}

/// One piece of work paid by a reward.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RewardItemView {
    /// GitHub id of the issue, pull request or review.
    pub id: String,
    /// Contribution id when the item is indexed as a contribution.
    pub contribution_id: Option<String>,
    /// Item kind.
    #[serde(rename = "type")]
    pub kind: ContributionType,
    /// GitHub status.
    pub status: GithubStatus,
    /// Issue or pull request number.
    pub number: i64,
    /// Title.
    pub title: String,
    /// Link on GitHub.
    pub html_url: String,
    /// Repository id.
    pub repo_id: GithubRepoId,
    /// Repository name.
    pub repo_name: String,
    /// When the work started.
    pub created_at: DateTime<Utc>,
    /// When the work ended.
    pub completed_at: Option<DateTime<Utc>>,
    /// Commits in the pull request.
    pub commits_count: Option<i64>,
    /// Commits authored by the recipient.
    pub user_commits_count: Option<i64>,
    /// Comments on the issue or pull request.
    pub comments_count: Option<i64>,
    /// Review verdict for code reviews.
    pub code_review_outcome: Option<CodeReviewOutcome>,
    /// Author of the issue or pull request.
    pub author: Option<GithubUserLink>,
    /// Recipient of the reward.
    pub recipient_id: GithubUserId,
}

/// A reward in its recipient's listing.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRewardView {
    /// Reward id.
    pub id: RewardId,
    /// Project paying the reward.
    pub project: ProjectLink,
    /// Amount.
    pub amount: Decimal,
    /// Currency.
    pub currency: Currency,
    /// USD value, `None` without a quote.
    pub dollars_equivalent: Option<Decimal>,
    /// Summary status.
    pub status: RewardStatus,
    /// Request date.
    pub requested_at: DateTime<Utc>,
    /// Payment date.
    pub processed_at: Option<DateTime<Utc>>,
    /// Number of rewarded items.
    pub item_count: i64,
}

/// Earned amount in one currency.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyTotalView {
    /// Currency.
    pub currency: Currency,
    /// Total amount.
    pub amount: Decimal,
    /// USD value, `None` without a quote.
    pub dollars_equivalent: Option<Decimal>,
}

/// Totals over every reward of a recipient.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RewardTotalsView {
    /// Sum of the known USD equivalents, `None` on overflow.
    pub total_dollars_equivalent: Option<Decimal>,
    /// Per-currency totals, in discovery order.
    pub details: Vec<CurrencyTotalView>,
}

/// A page of the caller's rewards with overall totals.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRewardsPage {
    /// Requested page.
    pub rewards: Page<UserRewardView>,
    /// Totals across all pages.
    pub totals: RewardTotalsView,
}
