//! GitHub-side vocabulary shared by contributions, rewards and projects.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ids::{GithubRepoId, GithubUserId};

/// Lifecycle status of an issue, pull request or code review on GitHub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GithubStatus {
    /// Open issue or pull request.
    Open,
    /// Draft pull request.
    Draft,
    /// Pull request closed without merge.
    Closed,
    /// Merged pull request.
    Merged,
    /// Issue closed as not planned.
    Cancelled,
    /// Review requested, not yet submitted.
    Pending,
    /// Review asked for changes.
    ChangesRequested,
    /// Issue closed as done, or review approved.
    Completed,
}

/// Verdict of a submitted code review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum CodeReviewOutcome {
    /// Review approved the pull request.
    Approved,
    /// Review asked for changes.
    ChangeRequested,
}

/// Public GitHub account summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GithubUserLink {
    /// GitHub account id.
    pub github_user_id: GithubUserId,
    /// GitHub login.
    pub login: String,
    /// Avatar URL.
    pub avatar_url: Option<String>,
    /// Whether the account has signed up on the platform.
    pub is_registered: bool,
}

/// Public GitHub repository summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GithubRepoLink {
    /// GitHub repository id.
    pub id: GithubRepoId,
    /// Owner login.
    pub owner: String,
    /// Repository name.
    pub name: String,
    /// Repository URL.
    pub html_url: String,
}
