//! Contributor rankings within a project.

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;

use crate::domain::{
    ContributionStatus, ContributorSort, ContributorView, GithubUserId, LeadContributorView, Page,
    PageRequest, ProjectId, SortDirection,
};
use crate::storage::models::Dataset;

use super::{Index, cmp_upper, directed};

#[derive(Debug)]
struct Figures {
    contribution_count: i64,
    reward_count: i64,
    earned: Option<Decimal>,
    to_reward_count: i64,
}

impl Default for Figures {
    fn default() -> Self {
        Self {
            contribution_count: 0,
            reward_count: 0,
            earned: Some(Decimal::ZERO),
            to_reward_count: 0,
        }
    }
}

fn login_matches(index: &Index<'_>, github_user_id: GithubUserId, login: Option<&str>) -> bool {
    login.is_none_or(|needle| {
        index
            .login(github_user_id)
            .to_lowercase()
            .contains(&needle.to_lowercase())
    })
}

fn figures(
    index: &Index<'_>,
    project_id: ProjectId,
    login: Option<&str>,
) -> BTreeMap<GithubUserId, Figures> {
    let data = index.data();
    let mut rows: BTreeMap<GithubUserId, Figures> = BTreeMap::new();
    let Some(project) = index.project(project_id) else {
        return rows;
    };
    let repo_ids = index.project_repo_ids(project_id);
    let login = login.map(str::trim).filter(|l| !l.is_empty());

    let rewards: Vec<_> = data
        .rewards
        .iter()
        .filter(|r| r.project_id == project_id)
        .collect();
    let reward_ids: HashSet<_> = rewards.iter().map(|r| r.id).collect();
    let rewarded_items: HashSet<(_, &str)> = data
        .reward_items
        .iter()
        .filter(|i| reward_ids.contains(&i.reward_id))
        .map(|i| (i.kind, i.item_id.as_str()))
        .collect();

    for contribution in data
        .contributions
        .iter()
        .filter(|c| repo_ids.contains(&c.repo_id))
        .filter(|c| login_matches(index, c.contributor_id, login))
    {
        let row = rows.entry(contribution.contributor_id).or_default();
        row.contribution_count += 1;
        let rewarded = rewarded_items.contains(&(
            contribution.target.kind(),
            contribution.target.github_id().as_str(),
        ));
        if contribution.status == ContributionStatus::Completed
            && !rewarded
            && !index.is_ignored(project, contribution)
        {
            row.to_reward_count += 1;
        }
    }

    for reward in rewards {
        if let Some(row) = rows.get_mut(&reward.recipient_id) {
            row.reward_count += 1;
            let usd = index
                .quotes()
                .to_usd(reward.amount, reward.currency)
                .unwrap_or_default();
            row.earned = row.earned.and_then(|earned| earned.checked_add(usd));
        }
    }
    rows
}

fn sorted(
    index: &Index<'_>,
    rows: BTreeMap<GithubUserId, Figures>,
    sort: ContributorSort,
    direction: SortDirection,
) -> Vec<(GithubUserId, Figures)> {
    let mut rows: Vec<(GithubUserId, Figures)> = rows.into_iter().collect();
    rows.sort_by(|(a_id, a), (b_id, b)| {
        let by_login = || cmp_upper(index.login(*a_id), index.login(*b_id));
        let primary = match sort {
            ContributorSort::Login => directed(by_login(), direction),
            ContributorSort::ContributionCount => {
                directed(a.contribution_count.cmp(&b.contribution_count), direction)
            }
            ContributorSort::Earned => directed(a.earned.cmp(&b.earned), direction),
            ContributorSort::RewardCount => {
                directed(a.reward_count.cmp(&b.reward_count), direction)
            }
            ContributorSort::ToRewardCount => {
                directed(a.to_reward_count.cmp(&b.to_reward_count), direction)
            }
        };
        primary.then_with(by_login).then_with(|| a_id.cmp(b_id))
    });
    rows
}

fn public_view(index: &Index<'_>, github_user_id: GithubUserId, row: &Figures) -> ContributorView {
    ContributorView {
        github_user: index.account_link(github_user_id),
        contribution_count: row.contribution_count,
        reward_count: row.reward_count,
    }
}

/// Contributors of a project without financial figures. Sorting on a
/// lead-only figure falls back to the login order.
#[must_use]
pub fn project_contributors(
    data: &Dataset,
    project_id: ProjectId,
    login: Option<&str>,
    sort: ContributorSort,
    direction: SortDirection,
    page: PageRequest,
) -> Page<ContributorView> {
    let index = Index::new(data);
    let sort = match sort {
        ContributorSort::Earned | ContributorSort::ToRewardCount => ContributorSort::Login,
        other => other,
    };
    let rows = sorted(&index, figures(&index, project_id, login), sort, direction);
    page.slice(rows)
        .map(|(id, row)| public_view(&index, id, &row))
}

/// Contributors of a project with the earned amount and the count of
/// contributions still to reward.
#[must_use]
pub fn project_contributors_for_lead(
    data: &Dataset,
    project_id: ProjectId,
    login: Option<&str>,
    sort: ContributorSort,
    direction: SortDirection,
    page: PageRequest,
) -> Page<LeadContributorView> {
    let index = Index::new(data);
    let rows = sorted(&index, figures(&index, project_id, login), sort, direction);
    page.slice(rows).map(|(id, row)| LeadContributorView {
        contributor: public_view(&index, id, &row),
        earned: row.earned,
        to_reward_count: row.to_reward_count,
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::domain::{ContributionType, Currency};
    use crate::query::fixtures::Fixture;

    struct Scenario {
        data: Dataset,
        project: ProjectId,
        alice: GithubUserId,
        bob: GithubUserId,
    }

    fn scenario() -> Scenario {
        let mut f = Fixture::new();
        let (lead, _) = f.user("lead");
        let (_, alice) = f.user("alice");
        let bob = f.account("Bob");
        let project = f.project("Kakarot", &[lead]);
        let other = f.project("Madara", &[lead]);
        let repo = f.repo(project, "kkrt-labs", "kakarot");
        let elsewhere = f.repo(other, "keep-starknet-strange", "madara");

        let (pr, _) = f.pull_request(repo, alice, 1, "Add opcode", 1);
        f.pull_request(repo, alice, 2, "Fix gas", 2);
        let (_, ignored) = f.issue(repo, alice, 3, "Track gas", 3);
        f.ignore(project, &ignored, true);
        f.issue(repo, bob, 4, "Crash", 4);
        f.pull_request(elsewhere, bob, 5, "Unrelated", 5);

        f.quote(Currency::Eth, dec!(2000));
        f.reward(
            project,
            lead,
            alice,
            dec!(0.5),
            Currency::Eth,
            &[(ContributionType::PullRequest, pr.to_string())],
            6,
        );
        f.reward(project, lead, alice, dec!(10), Currency::Stark, &[], 7);
        Scenario {
            data: f.finish(),
            project,
            alice,
            bob,
        }
    }

    #[test]
    fn lead_view_carries_financial_figures() {
        let s = scenario();
        let page = project_contributors_for_lead(
            &s.data,
            s.project,
            None,
            ContributorSort::Login,
            SortDirection::Asc,
            PageRequest::new(0, 10),
        );
        assert_eq!(page.total_item_number, 2);
        let Some(alice) = page
            .content
            .iter()
            .find(|c| c.contributor.github_user.github_user_id == s.alice)
        else {
            panic!("alice missing");
        };
        assert_eq!(alice.contributor.contribution_count, 3);
        assert_eq!(alice.contributor.reward_count, 2);
        assert_eq!(alice.earned, Some(dec!(1000)));
        assert_eq!(alice.to_reward_count, 1);

        let Some(bob) = page
            .content
            .iter()
            .find(|c| c.contributor.github_user.github_user_id == s.bob)
        else {
            panic!("bob missing");
        };
        assert_eq!(bob.contributor.contribution_count, 1);
        assert_eq!(bob.earned, Some(Decimal::ZERO));
        assert!(!bob.contributor.github_user.is_registered);
    }

    #[test]
    fn login_order_is_case_insensitive() {
        let s = scenario();
        let page = project_contributors(
            &s.data,
            s.project,
            None,
            ContributorSort::Login,
            SortDirection::Asc,
            PageRequest::new(0, 10),
        );
        let logins: Vec<&str> = page.content.iter().map(|c| c.github_user.login.as_str()).collect();
        assert_eq!(logins, vec!["alice", "Bob"]);
    }

    #[test]
    fn sorts_by_count_then_login() {
        let s = scenario();
        let page = project_contributors(
            &s.data,
            s.project,
            None,
            ContributorSort::ContributionCount,
            SortDirection::Desc,
            PageRequest::new(0, 10),
        );
        let ids: Vec<GithubUserId> = page.content.iter().map(|c| c.github_user.github_user_id).collect();
        assert_eq!(ids, vec![s.alice, s.bob]);
    }

    #[test]
    fn login_filter_is_partial() {
        let s = scenario();
        let page = project_contributors(
            &s.data,
            s.project,
            Some("OB"),
            ContributorSort::Login,
            SortDirection::Asc,
            PageRequest::new(0, 10),
        );
        assert_eq!(page.total_item_number, 1);
        let Some(first) = page.content.first() else {
            panic!("empty page");
        };
        assert_eq!(first.github_user.github_user_id, s.bob);
    }
}
