//! Query and aggregation engine.
//!
//! Every listing the API exposes is computed here from a [`Dataset`]
//! snapshot: joins are explicit lookups in an [`Index`], filters are
//! predicates, and orderings are comparator chains ending in a stable
//! tiebreak. Storage adapters only decide which rows land in the snapshot.

pub mod budgets;
pub mod contributions;
pub mod contributors;
pub mod projects;
pub mod rewardable;
pub mod rewards;

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::{
    CodeReviewOutcome, GithubRepoId, GithubRepoLink, GithubStatus, GithubUserId, GithubUserLink,
    ProjectId, ProjectLink, Quotes, SortDirection, UserId,
};
use crate::storage::models::{
    CodeReviewRecord, ContributionRecord, ContributionTarget, Dataset, GithubAccountRecord,
    GithubRepoRecord, IssueRecord, ProjectRecord, PullRequestRecord, UserRecord,
};

/// GitHub fields of a contribution target, resolved with pull request
/// fields first, then issue fields, then the reviewed pull request's.
#[derive(Debug, Clone, Copy)]
pub struct GithubItem<'a> {
    /// Repository.
    pub repo_id: GithubRepoId,
    /// Issue or pull request number.
    pub number: i64,
    /// Title.
    pub title: &'a str,
    /// URL.
    pub html_url: &'a str,
    /// Description.
    pub body: Option<&'a str>,
    /// Status of the target itself.
    pub status: GithubStatus,
    /// Author of the issue or pull request.
    pub author_id: GithubUserId,
    /// Comment count.
    pub comments_count: i64,
    /// Start date.
    pub created_at: DateTime<Utc>,
    /// End date.
    pub completed_at: Option<DateTime<Utc>>,
    /// Commit authors, for pull requests.
    pub commit_author_ids: Option<&'a [GithubUserId]>,
    /// Review verdict, for code reviews.
    pub code_review_outcome: Option<CodeReviewOutcome>,
}

impl GithubItem<'_> {
    /// Commit count, for pull requests.
    #[must_use]
    pub fn commits_count(&self) -> Option<i64> {
        self.commit_author_ids
            .map(|ids| i64::try_from(ids.len()).unwrap_or(i64::MAX))
    }

    /// Commits authored by `github_user_id`, for pull requests.
    #[must_use]
    pub fn user_commits_count(&self, github_user_id: GithubUserId) -> Option<i64> {
        self.commit_author_ids.map(|ids| {
            i64::try_from(ids.iter().filter(|id| **id == github_user_id).count())
                .unwrap_or(i64::MAX)
        })
    }
}

/// Hash lookups over a [`Dataset`].
#[derive(Debug)]
pub struct Index<'a> {
    data: &'a Dataset,
    projects: HashMap<ProjectId, &'a ProjectRecord>,
    repos: HashMap<GithubRepoId, &'a GithubRepoRecord>,
    accounts: HashMap<GithubUserId, &'a GithubAccountRecord>,
    users_by_github_id: HashMap<GithubUserId, &'a UserRecord>,
    users_by_id: HashMap<UserId, &'a UserRecord>,
    issues: HashMap<i64, &'a IssueRecord>,
    pull_requests: HashMap<i64, &'a PullRequestRecord>,
    code_reviews: HashMap<&'a str, &'a CodeReviewRecord>,
    quotes: Quotes,
}

impl<'a> Index<'a> {
    /// Builds the lookups for `data`.
    #[must_use]
    pub fn new(data: &'a Dataset) -> Self {
        Self {
            data,
            projects: data.projects.iter().map(|p| (p.id, p)).collect(),
            repos: data.repos.iter().map(|r| (r.id, r)).collect(),
            accounts: data.accounts.iter().map(|a| (a.id, a)).collect(),
            users_by_github_id: data.users.iter().map(|u| (u.github_user_id, u)).collect(),
            users_by_id: data.users.iter().map(|u| (u.id, u)).collect(),
            issues: data.issues.iter().map(|i| (i.id, i)).collect(),
            pull_requests: data.pull_requests.iter().map(|p| (p.id, p)).collect(),
            code_reviews: data.code_reviews.iter().map(|c| (c.id.as_str(), c)).collect(),
            quotes: Quotes::new(data.quotes.clone()),
        }
    }

    /// Underlying snapshot.
    #[must_use]
    pub const fn data(&self) -> &'a Dataset {
        self.data
    }

    /// Quote table.
    #[must_use]
    pub const fn quotes(&self) -> &Quotes {
        &self.quotes
    }

    /// Project by id.
    #[must_use]
    pub fn project(&self, id: ProjectId) -> Option<&'a ProjectRecord> {
        self.projects.get(&id).copied()
    }

    /// Short reference to a project.
    #[must_use]
    pub fn project_link(&self, id: ProjectId) -> Option<ProjectLink> {
        self.project(id).map(|p| ProjectLink {
            id: p.id,
            slug: p.slug.clone(),
            name: p.name.clone(),
            logo_url: p.logo_url.clone(),
        })
    }

    /// Repository by id.
    #[must_use]
    pub fn repo(&self, id: GithubRepoId) -> Option<&'a GithubRepoRecord> {
        self.repos.get(&id).copied()
    }

    /// Short reference to a repository.
    #[must_use]
    pub fn repo_link(&self, id: GithubRepoId) -> Option<GithubRepoLink> {
        self.repo(id).map(|r| GithubRepoLink {
            id: r.id,
            owner: r.owner.clone(),
            name: r.name.clone(),
            html_url: r.html_url.clone(),
        })
    }

    /// Platform user linked to a GitHub account.
    #[must_use]
    pub fn user_by_github_id(&self, github_user_id: GithubUserId) -> Option<&'a UserRecord> {
        self.users_by_github_id.get(&github_user_id).copied()
    }

    /// Platform user by id.
    #[must_use]
    pub fn user(&self, id: UserId) -> Option<&'a UserRecord> {
        self.users_by_id.get(&id).copied()
    }

    /// Login of an account, empty when the account is not indexed.
    #[must_use]
    pub fn login(&self, github_user_id: GithubUserId) -> &'a str {
        self.accounts
            .get(&github_user_id)
            .map_or("", |a| a.login.as_str())
    }

    /// Public summary of a GitHub account. Accounts missing from the
    /// index keep their id and an empty login.
    #[must_use]
    pub fn account_link(&self, github_user_id: GithubUserId) -> GithubUserLink {
        let account = self.accounts.get(&github_user_id);
        GithubUserLink {
            github_user_id,
            login: account.map(|a| a.login.clone()).unwrap_or_default(),
            avatar_url: account.and_then(|a| a.avatar_url.clone()),
            is_registered: self.users_by_github_id.contains_key(&github_user_id),
        }
    }

    /// Public summary of the GitHub account of a platform user.
    #[must_use]
    pub fn user_link(&self, user_id: UserId) -> Option<GithubUserLink> {
        self.user(user_id)
            .map(|u| self.account_link(u.github_user_id))
    }

    /// Issue by id.
    #[must_use]
    pub fn issue(&self, id: i64) -> Option<&'a IssueRecord> {
        self.issues.get(&id).copied()
    }

    /// Pull request by id.
    #[must_use]
    pub fn pull_request(&self, id: i64) -> Option<&'a PullRequestRecord> {
        self.pull_requests.get(&id).copied()
    }

    /// Code review by id.
    #[must_use]
    pub fn code_review(&self, id: &str) -> Option<&'a CodeReviewRecord> {
        self.code_reviews.get(id).copied()
    }

    /// Leads of a project.
    #[must_use]
    pub fn lead_ids(&self, project_id: ProjectId) -> Vec<UserId> {
        self.data
            .project_leads
            .iter()
            .filter(|l| l.project_id == project_id)
            .map(|l| l.user_id)
            .collect()
    }

    /// Repositories linked to a project.
    #[must_use]
    pub fn project_repo_ids(&self, project_id: ProjectId) -> Vec<GithubRepoId> {
        self.data
            .project_repos
            .iter()
            .filter(|l| l.project_id == project_id)
            .map(|l| l.repo_id)
            .collect()
    }

    /// Projects a repository is linked to.
    #[must_use]
    pub fn repo_project_ids(&self, repo_id: GithubRepoId) -> Vec<ProjectId> {
        self.data
            .project_repos
            .iter()
            .filter(|l| l.repo_id == repo_id)
            .map(|l| l.project_id)
            .collect()
    }

    /// Whether `contribution` is excluded from rewards in `project`.
    ///
    /// An explicit override wins. Without one, the project's reward
    /// settings decide.
    #[must_use]
    pub fn is_ignored(&self, project: &ProjectRecord, contribution: &ContributionRecord) -> bool {
        self.data
            .ignored_contributions
            .iter()
            .find(|i| i.project_id == project.id && i.contribution_id == contribution.id)
            .map_or_else(
                || {
                    project
                        .reward_settings
                        .ignores(contribution.target.kind(), contribution.created_at)
                },
                |i| i.ignored,
            )
    }

    /// Resolves the GitHub fields of a contribution target.
    #[must_use]
    pub fn github_item(&self, target: &ContributionTarget) -> Option<GithubItem<'a>> {
        match target {
            ContributionTarget::PullRequest(id) => self.pull_request(*id).map(pull_request_item),
            ContributionTarget::Issue(id) => self.issue(*id).map(issue_item),
            ContributionTarget::CodeReview(id) => {
                let review = self.code_review(id)?;
                let reviewed = self.pull_request(review.pull_request_id)?;
                Some(GithubItem {
                    status: review.status,
                    created_at: review.requested_at,
                    completed_at: review.submitted_at,
                    commit_author_ids: None,
                    code_review_outcome: review.outcome,
                    ..pull_request_item(reviewed)
                })
            }
        }
    }
}

fn pull_request_item(pr: &PullRequestRecord) -> GithubItem<'_> {
    GithubItem {
        repo_id: pr.repo_id,
        number: pr.number,
        title: &pr.title,
        html_url: &pr.html_url,
        body: pr.body.as_deref(),
        status: pr.status,
        author_id: pr.author_id,
        comments_count: pr.comments_count,
        created_at: pr.created_at,
        completed_at: pr.closed_at,
        commit_author_ids: Some(&pr.commit_author_ids),
        code_review_outcome: None,
    }
}

fn issue_item(issue: &IssueRecord) -> GithubItem<'_> {
    GithubItem {
        repo_id: issue.repo_id,
        number: issue.number,
        title: &issue.title,
        html_url: &issue.html_url,
        body: issue.body.as_deref(),
        status: issue.status,
        author_id: issue.author_id,
        comments_count: issue.comments_count,
        created_at: issue.created_at,
        completed_at: issue.closed_at,
        commit_author_ids: None,
        code_review_outcome: None,
    }
}

/// Applies a sort direction to an ascending ordering.
#[must_use]
pub fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// Case-insensitive ordering, as SQL `upper(x)`.
#[must_use]
pub fn cmp_upper(a: &str, b: &str) -> Ordering {
    a.to_uppercase().cmp(&b.to_uppercase())
}

#[cfg(test)]
pub(crate) mod fixtures;
