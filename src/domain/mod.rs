//! Domain layer: identifiers, closed enumerations, read views and the pure
//! rules (pagination, USD conversion, budget aggregation, reward status).

pub mod budget;
pub mod caller;
pub mod contribution;
pub mod contributor;
pub mod currency;
pub mod github;
pub mod ids;
pub mod pagination;
pub mod project;
pub mod reward;
pub mod reward_status;

pub use budget::{Budget, BudgetView, BudgetsView, aggregate_budgets};
pub use caller::{AuthenticatedUser, Caller};
pub use contribution::{
    ContributionDetailsView, ContributionFilters, ContributionLinkView, ContributionRewardView,
    ContributionSort, ContributionStatus, ContributionType, ContributionView,
    RewardableItemFilters, RewardableItemView, SortDirection, matches_search,
};
pub use contributor::{ContributorListing, ContributorSort, ContributorView, LeadContributorView};
pub use currency::{CryptoUsdQuote, Currency, Network, Quotes, checked_sum};
pub use github::{CodeReviewOutcome, GithubRepoLink, GithubStatus, GithubUserLink};
pub use ids::{GithubRepoId, GithubUserId, ProjectId, RewardId, SponsorId, UserId};
pub use pagination::{Page, PageRequest};
pub use project::{
    CreateProjectCommand, ProjectCardSort, ProjectCardView, ProjectCatalog, ProjectDetailsView,
    ProjectLeaderView, ProjectLink, ProjectListFilters, ProjectVisibility, RewardSettings,
    SponsorView, TopContributorView, UpdateProjectCommand, slugify,
};
pub use reward::{
    CurrencyTotalView, RewardDetailsView, RewardItemView, RewardSort, RewardTotalsView,
    RewardView, UserRewardView, UserRewardsPage,
};
pub use reward_status::{
    BankAccount, Identity, PayoutInfo, PreferredPayoutMethod, RewardFacts, RewardStatus,
    StatusGranularity, Wallet,
};
