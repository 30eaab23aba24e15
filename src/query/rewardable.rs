//! Items a project lead may attach to a reward.

use crate::domain::{
    GithubRepoId, GithubUserId, Page, PageRequest, ProjectId, RewardableItemFilters,
    RewardableItemView, matches_search,
};
use crate::storage::models::{ContributionRecord, ContributionTarget, Dataset};

use super::{GithubItem, Index};

fn item_view(
    index: &Index<'_>,
    target: &ContributionTarget,
    item: &GithubItem<'_>,
    contribution: Option<&ContributionRecord>,
    rewarded_user: GithubUserId,
    ignored: bool,
) -> RewardableItemView {
    RewardableItemView {
        id: target.github_id(),
        contribution_id: contribution.map(|c| c.id.clone()),
        kind: target.kind(),
        status: item.status,
        number: item.number,
        title: item.title.to_string(),
        html_url: item.html_url.to_string(),
        repo_name: index.repo(item.repo_id).map(|r| r.name.clone()).unwrap_or_default(),
        repo_id: item.repo_id,
        created_at: contribution.map_or(item.created_at, |c| c.created_at),
        completed_at: contribution.map_or(item.completed_at, |c| c.completed_at),
        commits_count: item.commits_count(),
        user_commits_count: item.user_commits_count(rewarded_user),
        comments_count: Some(item.comments_count),
        code_review_outcome: item.code_review_outcome,
        ignored,
    }
}

/// Contributions of `contributor_id` in the repositories of `project_id`,
/// most recent first. Items ignored for the project are left out unless
/// `include_ignored` is set.
#[must_use]
pub fn rewardable_items(
    data: &Dataset,
    project_id: ProjectId,
    contributor_id: GithubUserId,
    filters: &RewardableItemFilters,
    page: PageRequest,
) -> Page<RewardableItemView> {
    let index = Index::new(data);
    let Some(project) = index.project(project_id) else {
        return page.slice(Vec::new());
    };
    let repo_ids = index.project_repo_ids(project_id);
    let search = filters
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let mut items: Vec<RewardableItemView> = data
        .contributions
        .iter()
        .filter(|c| c.contributor_id == contributor_id && repo_ids.contains(&c.repo_id))
        .filter(|c| filters.kind.is_none_or(|k| k == c.target.kind()))
        .filter_map(|c| {
            let ignored = index.is_ignored(project, c);
            if ignored && !filters.include_ignored {
                return None;
            }
            let item = index.github_item(&c.target)?;
            if search.is_some_and(|s| !matches_search(s, item.title, item.number)) {
                return None;
            }
            Some(item_view(&index, &c.target, &item, Some(c), contributor_id, ignored))
        })
        .collect();
    items.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    page.slice(items)
}

fn repo_by_name(index: &Index<'_>, owner: &str, name: &str) -> Option<GithubRepoId> {
    index
        .data()
        .repos
        .iter()
        .find(|r| r.owner.eq_ignore_ascii_case(owner) && r.name.eq_ignore_ascii_case(name))
        .map(|r| r.id)
}

/// Looks up an issue by `owner/repo#number`.
#[must_use]
pub fn find_issue(data: &Dataset, owner: &str, repo: &str, number: i64) -> Option<RewardableItemView> {
    let index = Index::new(data);
    let repo_id = repo_by_name(&index, owner, repo)?;
    let issue = data
        .issues
        .iter()
        .find(|i| i.repo_id == repo_id && i.number == number)?;
    let target = ContributionTarget::Issue(issue.id);
    let item = index.github_item(&target)?;
    let contribution = data.contributions.iter().find(|c| c.target == target);
    Some(item_view(&index, &target, &item, contribution, issue.author_id, false))
}

/// Looks up a pull request by `owner/repo#number`.
#[must_use]
pub fn find_pull_request(
    data: &Dataset,
    owner: &str,
    repo: &str,
    number: i64,
) -> Option<RewardableItemView> {
    let index = Index::new(data);
    let repo_id = repo_by_name(&index, owner, repo)?;
    let pr = data
        .pull_requests
        .iter()
        .find(|p| p.repo_id == repo_id && p.number == number)?;
    let target = ContributionTarget::PullRequest(pr.id);
    let item = index.github_item(&target)?;
    let contribution = data.contributions.iter().find(|c| c.target == target);
    Some(item_view(&index, &target, &item, contribution, pr.author_id, false))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{ContributionType, RewardSettings};
    use crate::query::fixtures::{Fixture, day};

    struct Scenario {
        data: Dataset,
        project: ProjectId,
        other_project: ProjectId,
        alice: GithubUserId,
        fix: String,
        docs: String,
    }

    fn scenario() -> Scenario {
        let mut f = Fixture::new();
        let (lead, _) = f.user("lead");
        let (_, alice) = f.user("alice");
        let project = f.project("Marketplace", &[lead]);
        let other_project = f.project("Widget", &[lead]);
        let repo = f.repo(project, "onlydustxyz", "marketplace");
        f.link_repo(other_project, repo);
        let (_, fix) = f.pull_request(repo, alice, 12, "Fix pagination", 1);
        let (_, docs) = f.pull_request(repo, alice, 7, "Docs", 2);
        f.issue(repo, alice, 3, "Crash on login", 3);
        f.ignore(project, &docs, true);
        Scenario {
            data: f.finish(),
            project,
            other_project,
            alice,
            fix,
            docs,
        }
    }

    fn list(s: &Scenario, project: ProjectId, filters: &RewardableItemFilters) -> Vec<RewardableItemView> {
        rewardable_items(&s.data, project, s.alice, filters, PageRequest::new(0, 50)).content
    }

    #[test]
    fn ignored_items_are_hidden_by_default() {
        let s = scenario();
        let items = list(&s, s.project, &RewardableItemFilters::default());
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| !i.ignored));

        let with_ignored = RewardableItemFilters {
            include_ignored: true,
            ..RewardableItemFilters::default()
        };
        let items = list(&s, s.project, &with_ignored);
        assert_eq!(items.len(), 3);
        let Some(docs) = items.iter().find(|i| i.contribution_id.as_deref() == Some(s.docs.as_str())) else {
            panic!("docs missing");
        };
        assert!(docs.ignored);
    }

    #[test]
    fn ignore_flag_is_scoped_per_project() {
        let s = scenario();
        let items = list(&s, s.other_project, &RewardableItemFilters::default());
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn ordered_by_start_date_desc() {
        let s = scenario();
        let items = list(&s, s.other_project, &RewardableItemFilters::default());
        let numbers: Vec<i64> = items.iter().map(|i| i.number).collect();
        assert_eq!(numbers, vec![3, 7, 12]);
    }

    #[test]
    fn filters_by_kind_and_search() {
        let s = scenario();
        let prs = RewardableItemFilters {
            kind: Some(ContributionType::PullRequest),
            ..RewardableItemFilters::default()
        };
        let items = list(&s, s.project, &prs);
        assert_eq!(items.len(), 1);
        let Some(item) = items.first() else {
            panic!("no item");
        };
        assert_eq!(item.contribution_id.as_deref(), Some(s.fix.as_str()));
        assert_eq!(item.commits_count, Some(1));
        assert_eq!(item.user_commits_count, Some(1));

        let by_number = RewardableItemFilters {
            search: Some("12".to_string()),
            ..RewardableItemFilters::default()
        };
        assert_eq!(list(&s, s.project, &by_number).len(), 1);

        let by_title = RewardableItemFilters {
            search: Some("crash".to_string()),
            ..RewardableItemFilters::default()
        };
        assert_eq!(list(&s, s.project, &by_title).len(), 1);
    }

    #[test]
    fn reward_settings_apply_without_override() {
        let mut s = scenario();
        let Some(project) = s.data.projects.iter_mut().find(|p| p.id == s.project) else {
            panic!("project missing");
        };
        project.reward_settings = RewardSettings {
            ignore_issues: true,
            ignore_contributions_before: Some(day(2)),
            ..RewardSettings::default()
        };
        s.data.ignored_contributions.push(crate::storage::models::IgnoredContributionRecord {
            project_id: s.project,
            contribution_id: s.fix.clone(),
            ignored: false,
        });
        let items = list(&s, s.project, &RewardableItemFilters::default());
        let ids: Vec<Option<&str>> = items.iter().map(|i| i.contribution_id.as_deref()).collect();
        assert_eq!(ids, vec![Some(s.fix.as_str())], "explicit unignore beats the cutoff");
    }

    #[test]
    fn finds_items_by_repo_and_number() {
        let s = scenario();
        let Some(issue) = find_issue(&s.data, "OnlyDustXYZ", "marketplace", 3) else {
            panic!("issue missing");
        };
        assert_eq!(issue.kind, ContributionType::Issue);
        assert!(find_issue(&s.data, "onlydustxyz", "marketplace", 12).is_none());
        assert!(find_pull_request(&s.data, "onlydustxyz", "marketplace", 12).is_some());
        assert!(find_pull_request(&s.data, "onlydustxyz", "nope", 12).is_none());
    }
}
