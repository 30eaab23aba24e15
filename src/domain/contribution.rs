//! Contributions, rewardable items and their listing parameters.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::currency::Currency;
use super::github::{CodeReviewOutcome, GithubRepoLink, GithubStatus, GithubUserLink};
use super::ids::{GithubRepoId, ProjectId, RewardId};
use super::project::ProjectLink;
use super::reward_status::RewardStatus;

/// Kind of GitHub work a contribution is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContributionType {
    /// Issue assigned to the contributor.
    Issue,
    /// Pull request authored by the contributor.
    PullRequest,
    /// Review submitted by the contributor.
    CodeReview,
}

/// Progress of a contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContributionStatus {
    /// Work is ongoing.
    InProgress,
    /// Work is done.
    Completed,
    /// Work was abandoned.
    Cancelled,
}

/// Sort key for contribution listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContributionSort {
    /// Creation date.
    #[default]
    CreatedAt,
    /// Project name, then repository name.
    ProjectRepoName,
    /// GitHub number, then title.
    GithubNumberTitle,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    /// Smallest first.
    Asc,
    /// Largest first.
    #[default]
    Desc,
}

/// Optional restrictions on a contribution listing.
///
/// `None` means "do not filter". An empty list is treated the same way, see
/// [`ContributionFilters::normalized`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContributionFilters {
    /// Keep contributions of these projects.
    pub project_ids: Option<Vec<ProjectId>>,
    /// Keep contributions in these repositories.
    pub repo_ids: Option<Vec<GithubRepoId>>,
    /// Keep these kinds.
    pub types: Option<Vec<ContributionType>>,
    /// Keep these statuses.
    pub statuses: Option<Vec<ContributionStatus>>,
    /// Case-insensitive match on title or number.
    pub search: Option<String>,
}

fn non_empty<T>(values: Option<Vec<T>>) -> Option<Vec<T>> {
    values.filter(|v| !v.is_empty())
}

impl ContributionFilters {
    /// Turns empty lists and blank search into `None`.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            project_ids: non_empty(self.project_ids),
            repo_ids: non_empty(self.repo_ids),
            types: non_empty(self.types),
            statuses: non_empty(self.statuses),
            search: self
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        }
    }
}

/// Text search shared by contributions and rewardable items: partial,
/// case-insensitive match on the title or the display number.
#[must_use]
pub fn matches_search(search: &str, title: &str, number: i64) -> bool {
    let needle = search.to_lowercase();
    title.to_lowercase().contains(&needle) || number.to_string().contains(&needle)
}

/// Another contribution causally related to a listed one.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContributionLinkView {
    /// Contribution id.
    pub id: String,
    /// Contribution kind.
    #[serde(rename = "type")]
    pub kind: ContributionType,
    /// Contribution progress.
    pub status: ContributionStatus,
    /// Issue or pull request number.
    pub github_number: i64,
    /// GitHub status.
    pub github_status: GithubStatus,
    /// Title.
    pub github_title: String,
    /// Link on GitHub.
    pub github_html_url: String,
    /// Description.
    pub github_body: Option<String>,
    /// Author.
    pub github_author: Option<GithubUserLink>,
    /// Repository.
    pub repo: GithubRepoLink,
    /// Whether the same contributor made the linked contribution.
    pub is_mine: bool,
}

/// A contribution as listed for its author.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContributionView {
    /// Contribution id.
    pub id: String,
    /// When the work started.
    pub created_at: DateTime<Utc>,
    /// When the work ended.
    pub completed_at: Option<DateTime<Utc>>,
    /// Contribution kind.
    #[serde(rename = "type")]
    pub kind: ContributionType,
    /// Contribution progress.
    pub status: ContributionStatus,
    /// Issue or pull request number.
    pub github_number: i64,
    /// GitHub status.
    pub github_status: GithubStatus,
    /// Title.
    pub github_title: String,
    /// Link on GitHub.
    pub github_html_url: String,
    /// Description.
    pub github_body: Option<String>,
    /// Author of the underlying issue or pull request.
    pub github_author: Option<GithubUserLink>,
    /// Repository.
    pub repo: GithubRepoLink,
    /// Project the repository is linked to.
    pub project: ProjectLink,
    /// Related contributions.
    pub links: Vec<ContributionLinkView>,
    /// Rewards paying for this contribution in this project.
    pub reward_ids: Vec<RewardId>,
}

/// A reward as seen from the contribution it pays for.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContributionRewardView {
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
    /// Requestor.
    pub from: GithubUserLink,
    /// Recipient.
    pub to: GithubUserLink,
    /// Request date.
    pub requested_at: DateTime<Utc>,
    /// Payment date.
    pub processed_at: Option<DateTime<Utc>>,
}

/// A contribution with everything a detail page shows.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContributionDetailsView {
    /// Listing fields.
    #[serde(flatten)]
    pub contribution: ContributionView,
    /// Comment count on the underlying issue or pull request.
    pub comments_count: i64,
    /// Review verdict for code reviews.
    pub code_review_outcome: Option<CodeReviewOutcome>,
    /// Rewards paying for this contribution.
    pub rewards: Vec<ContributionRewardView>,
}

/// Optional restrictions on a rewardable item listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewardableItemFilters {
    /// Keep only this kind.
    pub kind: Option<ContributionType>,
    /// Case-insensitive match on title or number.
    pub search: Option<String>,
    /// Also list items ignored for the project.
    pub include_ignored: bool,
}

/// A contribution a project lead may attach to a reward.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RewardableItemView {
    /// GitHub id of the issue, pull request or review.
    pub id: String,
    /// Contribution id, when the item is indexed as a contribution.
    pub contribution_id: Option<String>,
    /// Contribution kind.
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
    /// Repository name.
    pub repo_name: String,
    /// Repository id.
    pub repo_id: GithubRepoId,
    /// When the work started.
    pub created_at: DateTime<Utc>,
    /// When the work ended.
    pub completed_at: Option<DateTime<Utc>>,
    /// Commits in the pull request.
    pub commits_count: Option<i64>,
    /// Commits in the pull request authored by the contributor.
    pub user_commits_count: Option<i64>,
    /// Comments on the issue or pull request.
    pub comments_count: Option<i64>,
    /// Review verdict for code reviews.
    pub code_review_outcome: Option<CodeReviewOutcome>,
    /// Whether the item is ignored for the project.
    pub ignored: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_lists_normalize_to_no_filter() {
        let filters = ContributionFilters {
            project_ids: Some(vec![]),
            repo_ids: Some(vec![42]),
            types: Some(vec![]),
            statuses: None,
            search: Some("   ".to_string()),
        }
        .normalized();
        assert_eq!(filters.project_ids, None);
        assert_eq!(filters.repo_ids, Some(vec![42]));
        assert_eq!(filters.types, None);
        assert_eq!(filters.search, None);
    }

    #[test]
    fn search_matches_title_or_number() {
        assert!(matches_search("fix", "Fix the build", 12));
        assert!(matches_search("FIX", "fix the build", 12));
        assert!(matches_search("23", "Unrelated", 1234));
        assert!(!matches_search("nope", "Unrelated", 1234));
    }

    #[test]
    fn kinds_use_boundary_names() {
        let json = serde_json::to_string(&ContributionType::PullRequest).unwrap_or_default();
        assert_eq!(json, "\"PULL_REQUEST\"");
        let json = serde_json::to_string(&CodeReviewOutcome::ChangeRequested).unwrap_or_default();
        assert_eq!(json, "\"changeRequested\"");
    }
}
