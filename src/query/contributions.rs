//! Contribution listings, details and linked-contribution resolution.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::domain::{
    ContributionDetailsView, ContributionFilters, ContributionLinkView, ContributionRewardView,
    ContributionSort, ContributionView, GithubRepoId, GithubRepoLink, GithubUserId, Page,
    PageRequest,
    ProjectId, ProjectLink, RewardId, SortDirection, StatusGranularity, matches_search,
};
use crate::storage::models::{ContributionRecord, ContributionTarget, Dataset, RewardRecord};

use super::rewards::{payment_of, requestor_link, reward_facts};
use super::{Index, cmp_upper, directed};

/// Contributions causally related to `contribution`.
///
/// A pull request links to the issues it closes, an issue to the pull
/// requests closing it, a code review to the pull request it reviews.
#[must_use]
pub fn linked_contributions<'a>(
    index: &Index<'a>,
    contribution: &ContributionRecord,
) -> Vec<&'a ContributionRecord> {
    let data = index.data();
    let targets: HashSet<ContributionTarget> = match &contribution.target {
        ContributionTarget::PullRequest(pr) => data
            .closing_issues
            .iter()
            .filter(|c| c.pull_request_id == *pr)
            .map(|c| ContributionTarget::Issue(c.issue_id))
            .collect(),
        ContributionTarget::Issue(issue) => data
            .closing_issues
            .iter()
            .filter(|c| c.issue_id == *issue)
            .map(|c| ContributionTarget::PullRequest(c.pull_request_id))
            .collect(),
        ContributionTarget::CodeReview(review) => index
            .code_review(review)
            .map(|r| ContributionTarget::PullRequest(r.pull_request_id))
            .into_iter()
            .collect(),
    };
    data.contributions
        .iter()
        .filter(|c| c.id != contribution.id && targets.contains(&c.target))
        .collect()
}

fn link_view(
    index: &Index<'_>,
    owner: GithubUserId,
    linked: &ContributionRecord,
) -> Option<ContributionLinkView> {
    let item = index.github_item(&linked.target)?;
    Some(ContributionLinkView {
        id: linked.id.clone(),
        kind: linked.target.kind(),
        status: linked.status,
        github_number: item.number,
        github_status: item.status,
        github_title: item.title.to_string(),
        github_html_url: item.html_url.to_string(),
        github_body: item.body.map(str::to_string),
        github_author: Some(index.account_link(item.author_id)),
        repo: index.repo_link(linked.repo_id)?,
        is_mine: linked.contributor_id == owner,
    })
}

/// Rewards of `project_id` paying `contribution`'s contributor for it.
fn rewards_of<'a>(
    index: &Index<'a>,
    project_id: ProjectId,
    contribution: &'a ContributionRecord,
) -> impl Iterator<Item = &'a RewardRecord> + 'a {
    let data = index.data();
    let item_id = contribution.target.github_id();
    let kind = contribution.target.kind();
    data.rewards.iter().filter(move |r| {
        r.project_id == project_id
            && r.recipient_id == contribution.contributor_id
            && data
                .reward_items
                .iter()
                .any(|i| i.reward_id == r.id && i.kind == kind && i.item_id == item_id)
    })
}

/// Builds the listing view of `contribution` within `project_id`.
#[must_use]
pub fn contribution_view(
    index: &Index<'_>,
    contribution: &ContributionRecord,
    project_id: ProjectId,
) -> Option<ContributionView> {
    let item = index.github_item(&contribution.target)?;
    let mut links: Vec<ContributionLinkView> = linked_contributions(index, contribution)
        .into_iter()
        .filter_map(|l| link_view(index, contribution.contributor_id, l))
        .collect();
    links.sort_by(|a, b| a.github_number.cmp(&b.github_number).then_with(|| a.id.cmp(&b.id)));

    let mut reward_ids: Vec<RewardId> = rewards_of(index, project_id, contribution)
        .map(|r| r.id)
        .collect();
    reward_ids.sort();

    Some(ContributionView {
        id: contribution.id.clone(),
        created_at: contribution.created_at,
        completed_at: contribution.completed_at,
        kind: contribution.target.kind(),
        status: contribution.status,
        github_number: item.number,
        github_status: item.status,
        github_title: item.title.to_string(),
        github_html_url: item.html_url.to_string(),
        github_body: item.body.map(str::to_string),
        github_author: Some(index.account_link(item.author_id)),
        repo: index.repo_link(contribution.repo_id)?,
        project: index.project_link(project_id)?,
        links,
        reward_ids,
    })
}

fn compare(
    sort: ContributionSort,
    direction: SortDirection,
    a: &ContributionView,
    b: &ContributionView,
) -> std::cmp::Ordering {
    let primary = match sort {
        ContributionSort::CreatedAt => a.created_at.cmp(&b.created_at),
        ContributionSort::ProjectRepoName => cmp_upper(&a.project.name, &b.project.name)
            .then_with(|| cmp_upper(&a.repo.name, &b.repo.name)),
        ContributionSort::GithubNumberTitle => a
            .github_number
            .cmp(&b.github_number)
            .then_with(|| a.github_title.cmp(&b.github_title)),
    };
    directed(primary, direction)
        .then_with(|| a.id.cmp(&b.id))
        .then_with(|| a.project.id.cmp(&b.project.id))
}

/// Lists the contributions of `contributor_id`, one row per project the
/// contribution's repository is linked to.
#[must_use]
pub fn list_contributions(
    data: &Dataset,
    contributor_id: GithubUserId,
    filters: &ContributionFilters,
    sort: ContributionSort,
    direction: SortDirection,
    page: PageRequest,
) -> Page<ContributionView> {
    let index = Index::new(data);
    let mut rows: Vec<ContributionView> = data
        .contributions
        .iter()
        .filter(|c| c.contributor_id == contributor_id)
        .filter(|c| filters.repo_ids.as_ref().is_none_or(|ids| ids.contains(&c.repo_id)))
        .filter(|c| filters.types.as_ref().is_none_or(|t| t.contains(&c.target.kind())))
        .filter(|c| filters.statuses.as_ref().is_none_or(|s| s.contains(&c.status)))
        .flat_map(|c| {
            index
                .repo_project_ids(c.repo_id)
                .into_iter()
                .filter(|p| filters.project_ids.as_ref().is_none_or(|ids| ids.contains(p)))
                .filter_map(|p| contribution_view(&index, c, p))
                .collect::<Vec<_>>()
        })
        .filter(|v| {
            filters
                .search
                .as_deref()
                .is_none_or(|s| matches_search(s, &v.github_title, v.github_number))
        })
        .collect();
    rows.sort_by(|a, b| compare(sort, direction, a, b));
    page.slice(rows)
}

/// Author of a contribution as seen from `project_id`. `None` when the
/// contribution does not exist or is outside the project's repositories.
#[must_use]
pub fn contribution_author(
    data: &Dataset,
    project_id: ProjectId,
    contribution_id: &str,
) -> Option<GithubUserId> {
    let contribution = data.contributions.iter().find(|c| c.id == contribution_id)?;
    data.project_repos
        .iter()
        .any(|l| l.project_id == project_id && l.repo_id == contribution.repo_id)
        .then_some(contribution.contributor_id)
}

/// Details of a contribution as seen from `project_id`. `None` when the
/// contribution does not exist or is outside the project's repositories.
#[must_use]
pub fn contribution_details(
    data: &Dataset,
    project_id: ProjectId,
    contribution_id: &str,
) -> Option<ContributionDetailsView> {
    let index = Index::new(data);
    let contribution = data.contributions.iter().find(|c| c.id == contribution_id)?;
    if !index.project_repo_ids(project_id).contains(&contribution.repo_id) {
        return None;
    }
    let item = index.github_item(&contribution.target)?;
    let view = contribution_view(&index, contribution, project_id)?;
    let mut rewards: Vec<ContributionRewardView> = rewards_of(&index, project_id, contribution)
        .map(|r| ContributionRewardView {
            id: r.id,
            amount: r.amount,
            currency: r.currency,
            dollars_equivalent: index.quotes().to_usd(r.amount, r.currency),
            status: reward_facts(&index, r).status(StatusGranularity::Detailed),
            from: requestor_link(&index, r),
            to: index.account_link(r.recipient_id),
            requested_at: r.requested_at,
            processed_at: payment_of(&index, r.id).map(|p| p.processed_at),
        })
        .collect();
    rewards.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));

    Some(ContributionDetailsView {
        contribution: view,
        comments_count: item.comments_count,
        code_review_outcome: item.code_review_outcome,
        rewards,
    })
}

/// `(project, repository)` pairs holding a contribution of
/// `contributor_id`, restricted by the project and repository filters.
fn contributed_pairs(
    index: &Index<'_>,
    contributor_id: GithubUserId,
    filters: &ContributionFilters,
) -> BTreeSet<(ProjectId, GithubRepoId)> {
    index
        .data()
        .contributions
        .iter()
        .filter(|c| c.contributor_id == contributor_id)
        .filter(|c| filters.repo_ids.as_ref().is_none_or(|ids| ids.contains(&c.repo_id)))
        .flat_map(|c| {
            index
                .repo_project_ids(c.repo_id)
                .into_iter()
                .map(move |p| (p, c.repo_id))
        })
        .filter(|(p, _)| filters.project_ids.as_ref().is_none_or(|ids| ids.contains(p)))
        .collect()
}

/// Projects `contributor_id` contributed to, by name.
#[must_use]
pub fn contributed_projects(
    data: &Dataset,
    contributor_id: GithubUserId,
    filters: &ContributionFilters,
) -> Vec<ProjectLink> {
    let index = Index::new(data);
    let projects: BTreeMap<ProjectId, ProjectLink> =
        contributed_pairs(&index, contributor_id, filters)
            .into_iter()
            .filter_map(|(p, _)| index.project_link(p).map(|l| (p, l)))
            .collect();
    let mut projects: Vec<ProjectLink> = projects.into_values().collect();
    projects.sort_by(|a, b| cmp_upper(&a.name, &b.name).then_with(|| a.id.cmp(&b.id)));
    projects
}

/// Repositories `contributor_id` contributed to, by name. Only
/// repositories linked to a project count.
#[must_use]
pub fn contributed_repos(
    data: &Dataset,
    contributor_id: GithubUserId,
    filters: &ContributionFilters,
) -> Vec<GithubRepoLink> {
    let index = Index::new(data);
    let repos: BTreeMap<GithubRepoId, GithubRepoLink> =
        contributed_pairs(&index, contributor_id, filters)
            .into_iter()
            .filter_map(|(_, r)| index.repo_link(r).map(|l| (r, l)))
            .collect();
    let mut repos: Vec<GithubRepoLink> = repos.into_values().collect();
    repos.sort_by(|a, b| cmp_upper(&a.name, &b.name).then_with(|| a.id.cmp(&b.id)));
    repos
}
