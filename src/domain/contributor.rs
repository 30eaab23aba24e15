//! Contributor rankings within a project.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::github::GithubUserLink;
use super::pagination::Page;

/// Sort key for contributor listings. Ties break on the login.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContributorSort {
    /// Login, alphabetical.
    #[default]
    Login,
    /// Contributions in the project.
    ContributionCount,
    /// USD earned in the project. Lead view only.
    Earned,
    /// Rewards received from the project.
    RewardCount,
    /// Completed contributions not yet rewarded. Lead view only.
    ToRewardCount,
}

/// Public contributor figures.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContributorView {
    /// Contributor account.
    pub github_user: GithubUserLink,
    /// Contributions in the project.
    pub contribution_count: i64,
    /// Rewards received from the project.
    pub reward_count: i64,
}

/// Contributor figures including the financial fields reserved to leads.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadContributorView {
    /// Public figures.
    #[serde(flatten)]
    pub contributor: ContributorView,
    /// USD earned in the project, quoted currencies only. `None` on
    /// overflow.
    pub earned: Option<Decimal>,
    /// Completed, non-ignored contributions not yet rewarded.
    pub to_reward_count: i64,
}

/// Contributor page in the variant the caller may see.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum ContributorListing {
    /// Anonymous callers and non-leads.
    Public(Page<ContributorView>),
    /// Project leads.
    Lead(Page<LeadContributorView>),
}

impl ContributorListing {
    /// Whether the result spans more than one page.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        match self {
            Self::Public(page) => page.is_partial(),
            Self::Lead(page) => page.is_partial(),
        }
    }
}
