//! Reward listings for project leads and recipients.

use std::cmp::Ordering;

use rust_decimal::Decimal;

use crate::domain::{
    ContributionType, CurrencyTotalView, GithubUserId, GithubUserLink, Page, PageRequest,
    ProjectId, ProjectLink, RewardDetailsView, RewardFacts, RewardId, RewardItemView, RewardSort,
    RewardStatus, RewardTotalsView, RewardView, SortDirection, StatusGranularity, UserRewardView,
    UserRewardsPage, checked_sum,
};
use crate::storage::models::{ContributionTarget, Dataset, PaymentRecord, RewardRecord};

use super::{Index, directed};

/// Payment recorded for a reward, if any.
#[must_use]
pub fn payment_of<'a>(index: &Index<'a>, reward_id: RewardId) -> Option<&'a PaymentRecord> {
    index.data().payments.iter().find(|p| p.reward_id == reward_id)
}

/// GitHub account of the lead who requested a reward.
#[must_use]
pub fn requestor_link(index: &Index<'_>, reward: &RewardRecord) -> GithubUserLink {
    index
        .user_link(reward.requestor_id)
        .unwrap_or_else(|| index.account_link(GithubUserId::default()))
}

/// Facts the status of `reward` derives from, read from the snapshot.
#[must_use]
pub fn reward_facts<'a>(index: &Index<'a>, reward: &RewardRecord) -> RewardFacts<'a> {
    let recipient = index.user_by_github_id(reward.recipient_id);
    RewardFacts {
        recipient_registered: recipient.is_some(),
        paid: payment_of(index, reward.id).is_some(),
        currency: reward.currency,
        payout_info: recipient.and_then(|u| u.payout_info.as_ref()),
        invoice_received: reward.invoice_received_at.is_some(),
    }
}

fn item_count(index: &Index<'_>, reward_id: RewardId) -> i64 {
    let count = index
        .data()
        .reward_items
        .iter()
        .filter(|i| i.reward_id == reward_id)
        .count();
    i64::try_from(count).unwrap_or(i64::MAX)
}

/// Orders rewards by `sort`, then by request date (newest first), then id.
fn compare_rewards(
    sort: RewardSort,
    direction: SortDirection,
    a: (&RewardRecord, &SortKeys),
    b: (&RewardRecord, &SortKeys),
) -> Ordering {
    let newest_first = || b.0.requested_at.cmp(&a.0.requested_at);
    let ordering = match sort {
        RewardSort::RequestedAt => directed(a.0.requested_at.cmp(&b.0.requested_at), direction),
        RewardSort::Amount => {
            directed(a.1.dollars_equivalent.cmp(&b.1.dollars_equivalent), direction)
                .then_with(newest_first)
        }
        RewardSort::Contribution => {
            directed(a.1.item_count.cmp(&b.1.item_count), direction).then_with(newest_first)
        }
        RewardSort::Status => directed(
            a.1.status.as_str().cmp(b.1.status.as_str()),
            direction,
        )
        .then_with(newest_first),
    };
    ordering.then_with(|| a.0.id.cmp(&b.0.id))
}

#[derive(Debug)]
struct SortKeys {
    dollars_equivalent: Option<Decimal>,
    item_count: i64,
    status: RewardStatus,
}

fn sorted<'a>(
    index: &Index<'a>,
    rewards: impl Iterator<Item = &'a RewardRecord>,
    granularity: StatusGranularity,
    sort: RewardSort,
    direction: SortDirection,
) -> Vec<(&'a RewardRecord, SortKeys)> {
    let mut rows: Vec<(&RewardRecord, SortKeys)> = rewards
        .map(|r| {
            let keys = SortKeys {
                dollars_equivalent: index.quotes().to_usd(r.amount, r.currency),
                item_count: item_count(index, r.id),
                status: reward_facts(index, r).status(granularity),
            };
            (r, keys)
        })
        .collect();
    rows.sort_by(|a, b| compare_rewards(sort, direction, (a.0, &a.1), (b.0, &b.1)));
    rows
}

/// Rewards paid by a project, as seen by its leads.
#[must_use]
pub fn project_rewards(
    data: &Dataset,
    project_id: ProjectId,
    sort: RewardSort,
    direction: SortDirection,
    page: PageRequest,
) -> Page<RewardView> {
    let index = Index::new(data);
    let rewards = data.rewards.iter().filter(|r| r.project_id == project_id);
    let rows = sorted(&index, rewards, StatusGranularity::Detailed, sort, direction);
    page.slice(rows).map(|(r, keys)| RewardView {
        id: r.id,
        amount: r.amount,
        currency: r.currency,
        dollars_equivalent: keys.dollars_equivalent,
        status: keys.status,
        recipient: index.account_link(r.recipient_id),
        requested_at: r.requested_at,
        processed_at: payment_of(&index, r.id).map(|p| p.processed_at),
        item_count: keys.item_count,
    })
}

fn details(
    index: &Index<'_>,
    reward: &RewardRecord,
    granularity: StatusGranularity,
) -> Option<RewardDetailsView> {
    let payment = payment_of(index, reward.id);
    Some(RewardDetailsView {
        id: reward.id,
        amount: reward.amount,
        currency: reward.currency,
        dollars_equivalent: index.quotes().to_usd(reward.amount, reward.currency),
        status: reward_facts(index, reward).status(granularity),
        project: index.project_link(reward.project_id)?,
        from: requestor_link(index, reward),
        to: index.account_link(reward.recipient_id),
        requested_at: reward.requested_at,
        processed_at: payment.map(|p| p.processed_at),
        transaction_reference: payment.map(|p| p.transaction_reference.clone()),
    })
}

/// A reward of `project_id`, with the detailed status.
#[must_use]
pub fn project_reward(
    data: &Dataset,
    project_id: ProjectId,
    reward_id: RewardId,
) -> Option<RewardDetailsView> {
    let index = Index::new(data);
    let reward = data
        .rewards
        .iter()
        .find(|r| r.id == reward_id && r.project_id == project_id)?;
    details(&index, reward, StatusGranularity::Detailed)
}

/// A reward seen by its recipient, with the summary status.
#[must_use]
pub fn user_reward(data: &Dataset, reward_id: RewardId) -> Option<(GithubUserId, RewardDetailsView)> {
    let index = Index::new(data);
    let reward = data.rewards.iter().find(|r| r.id == reward_id)?;
    details(&index, reward, StatusGranularity::Summary).map(|d| (reward.recipient_id, d))
}

fn target_of(kind: ContributionType, item_id: &str) -> Option<ContributionTarget> {
    match kind {
        ContributionType::Issue => item_id.parse().ok().map(ContributionTarget::Issue),
        ContributionType::PullRequest => item_id.parse().ok().map(ContributionTarget::PullRequest),
        ContributionType::CodeReview => Some(ContributionTarget::CodeReview(item_id.to_string())),
    }
}

/// Items paid by `reward_id`, most recent work first.
#[must_use]
pub fn reward_items(data: &Dataset, reward_id: RewardId, page: PageRequest) -> Page<RewardItemView> {
    let index = Index::new(data);
    let Some(reward) = data.rewards.iter().find(|r| r.id == reward_id) else {
        return page.slice(Vec::new());
    };
    let mut items: Vec<RewardItemView> = data
        .reward_items
        .iter()
        .filter(|i| i.reward_id == reward_id)
        .filter_map(|i| {
            let target = target_of(i.kind, &i.item_id)?;
            let item = index.github_item(&target)?;
            let contribution_id = data
                .contributions
                .iter()
                .find(|c| c.target == target && c.contributor_id == reward.recipient_id)
                .map(|c| c.id.clone());
            Some(RewardItemView {
                id: i.item_id.clone(),
                contribution_id,
                kind: i.kind,
                status: item.status,
                number: item.number,
                title: item.title.to_string(),
                html_url: item.html_url.to_string(),
                repo_id: item.repo_id,
                repo_name: index.repo(item.repo_id).map(|r| r.name.clone()).unwrap_or_default(),
                created_at: item.created_at,
                completed_at: item.completed_at,
                commits_count: item.commits_count(),
                user_commits_count: item.user_commits_count(reward.recipient_id),
                comments_count: Some(item.comments_count),
                code_review_outcome: item.code_review_outcome,
                author: Some(index.account_link(item.author_id)),
                recipient_id: reward.recipient_id,
            })
        })
        .collect();
    items.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.completed_at.cmp(&a.completed_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    page.slice(items)
}

/// Whether `reward_id` belongs to `project_id`.
#[must_use]
pub fn reward_in_project(data: &Dataset, project_id: ProjectId, reward_id: RewardId) -> bool {
    data.rewards
        .iter()
        .any(|r| r.id == reward_id && r.project_id == project_id)
}

fn totals<'a>(index: &Index<'a>, rewards: impl Iterator<Item = &'a RewardRecord>) -> RewardTotalsView {
    let mut details: Vec<CurrencyTotalView> = Vec::new();
    for reward in rewards {
        match details.iter_mut().find(|d| d.currency == reward.currency) {
            Some(total) => total.amount = total.amount.saturating_add(reward.amount),
            None => details.push(CurrencyTotalView {
                currency: reward.currency,
                amount: reward.amount,
                dollars_equivalent: None,
            }),
        }
    }
    for total in &mut details {
        total.dollars_equivalent = index.quotes().to_usd(total.amount, total.currency);
    }
    RewardTotalsView {
        total_dollars_equivalent: checked_sum(details.iter().filter_map(|d| d.dollars_equivalent)),
        details,
    }
}

/// Rewards received by `recipient_id`, with the summary status and totals.
#[must_use]
pub fn user_rewards(
    data: &Dataset,
    recipient_id: GithubUserId,
    sort: RewardSort,
    direction: SortDirection,
    page: PageRequest,
) -> UserRewardsPage {
    let index = Index::new(data);
    let mine = || data.rewards.iter().filter(move |r| r.recipient_id == recipient_id);
    let rows = sorted(&index, mine(), StatusGranularity::Summary, sort, direction);
    let rewards = page.slice(rows).map(|(r, keys)| UserRewardView {
        id: r.id,
        project: index.project_link(r.project_id).unwrap_or_else(|| ProjectLink {
            id: r.project_id,
            slug: String::new(),
            name: String::new(),
            logo_url: None,
        }),
        amount: r.amount,
        currency: r.currency,
        dollars_equivalent: keys.dollars_equivalent,
        status: keys.status,
        requested_at: r.requested_at,
        processed_at: payment_of(&index, r.id).map(|p| p.processed_at),
        item_count: keys.item_count,
    });
    UserRewardsPage {
        rewards,
        totals: totals(&index, mine()),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::domain::{Currency, Identity, Network, PayoutInfo, Wallet};
    use crate::query::fixtures::Fixture;

    #[test]
    fn statuses_differ_by_granularity() {
        let mut f = Fixture::new();
        let (lead, _) = f.user("lead");
        let (_, recipient) = f.user("recipient");
        let project = f.project("Onlydust", &[lead]);
        let reward = f.reward(project, lead, recipient, dec!(100), Currency::Usd, &[], 1);
        let data = f.finish();

        let Some(lead_view) = project_reward(&data, project, reward) else {
            panic!("reward missing");
        };
        assert_eq!(lead_view.status, RewardStatus::MissingPayoutInfo);

        let Some((owner, self_view)) = user_reward(&data, reward) else {
            panic!("reward missing");
        };
        assert_eq!(owner, recipient);
        assert_eq!(self_view.status, RewardStatus::Processing);
    }

    #[test]
    fn unknown_recipient_is_pending_signup_and_payment_completes() {
        let mut f = Fixture::new();
        let (lead, _) = f.user("lead");
        let ghost = f.account("ghost");
        let project = f.project("Onlydust", &[lead]);
        let reward = f.reward(project, lead, ghost, dec!(10), Currency::Eth, &[], 1);
        let data = f.data.clone();

        let Some(view) = project_reward(&data, project, reward) else {
            panic!("reward missing");
        };
        assert_eq!(view.status, RewardStatus::PendingSignup);

        f.pay(reward, 2);
        let data = f.finish();
        let Some(view) = project_reward(&data, project, reward) else {
            panic!("reward missing");
        };
        assert_eq!(view.status, RewardStatus::PendingSignup, "signup check comes first");
        assert!(view.transaction_reference.is_some());
    }

    #[test]
    fn project_rewards_sort_by_amount_then_newest() {
        let mut f = Fixture::new();
        let (lead, _) = f.user("lead");
        let (_, recipient) = f.user("recipient");
        let project = f.project("Onlydust", &[lead]);
        f.quote(Currency::Eth, dec!(1500));
        let small = f.reward(project, lead, recipient, dec!(100), Currency::Usd, &[], 1);
        let big = f.reward(project, lead, recipient, dec!(1), Currency::Eth, &[], 2);
        let unquoted = f.reward(project, lead, recipient, dec!(5000), Currency::Stark, &[], 3);
        let same_as_small = f.reward(project, lead, recipient, dec!(100), Currency::Usd, &[], 4);
        let data = f.finish();

        let page = project_rewards(
            &data,
            project,
            RewardSort::Amount,
            SortDirection::Desc,
            PageRequest::new(0, 10),
        );
        let ids: Vec<RewardId> = page.content.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![big, same_as_small, small, unquoted]);
        let Some(last) = page.content.last() else {
            panic!("empty page");
        };
        assert_eq!(last.dollars_equivalent, None);
    }

    #[test]
    fn status_sort_is_alphabetical() {
        let mut f = Fixture::new();
        let (lead, _) = f.user("lead");
        let ghost = f.account("ghost");
        let (_, unpaid) = f.user("unpaid");
        let (ready_user, ready) = f.user("ready");
        let (_, paid) = f.user("paid");
        f.payout_info(
            ready_user,
            PayoutInfo {
                identity: Some(Identity::Person {
                    first_name: Some("Ada".to_string()),
                    last_name: Some("Lovelace".to_string()),
                }),
                wallets: vec![Wallet {
                    network: Network::Ethereum,
                    address: "ada.eth".to_string(),
                }],
                ..PayoutInfo::default()
            },
        );
        let project = f.project("Onlydust", &[lead]);
        let processing = f.reward(project, lead, ready, dec!(1), Currency::Usd, &[], 1);
        let pending_signup = f.reward(project, lead, ghost, dec!(1), Currency::Usd, &[], 2);
        let missing_info = f.reward(project, lead, unpaid, dec!(1), Currency::Usd, &[], 3);
        let complete = f.reward(project, lead, paid, dec!(1), Currency::Usd, &[], 4);
        f.pay(complete, 5);
        let data = f.finish();

        let page = project_rewards(
            &data,
            project,
            RewardSort::Status,
            SortDirection::Asc,
            PageRequest::new(0, 10),
        );
        let ids: Vec<RewardId> = page.content.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![complete, missing_info, pending_signup, processing]);

        let page = project_rewards(
            &data,
            project,
            RewardSort::Status,
            SortDirection::Desc,
            PageRequest::new(0, 10),
        );
        let ids: Vec<RewardId> = page.content.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![processing, pending_signup, missing_info, complete]);
    }

    #[test]
    fn default_sort_is_request_date() {
        let mut f = Fixture::new();
        let (lead, _) = f.user("lead");
        let (_, recipient) = f.user("recipient");
        let project = f.project("Onlydust", &[lead]);
        let older = f.reward(project, lead, recipient, dec!(1), Currency::Usd, &[], 1);
        let newer = f.reward(project, lead, recipient, dec!(1), Currency::Usd, &[], 2);
        let data = f.finish();
        let page = project_rewards(
            &data,
            project,
            RewardSort::default(),
            SortDirection::Desc,
            PageRequest::new(0, 10),
        );
        let ids: Vec<RewardId> = page.content.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![newer, older]);
    }

    #[test]
    fn twenty_five_items_paginate_over_thirteen_pages() {
        let mut f = Fixture::new();
        let (lead, _) = f.user("lead");
        let (_, recipient) = f.user("recipient");
        let project = f.project("Onlydust", &[lead]);
        let repo = f.repo(project, "onlydustxyz", "marketplace");
        let items: Vec<(ContributionType, String)> = (1..=25)
            .map(|n| {
                let (pr, _) = f.pull_request(repo, recipient, n, &format!("PR {n}"), n);
                (ContributionType::PullRequest, pr.to_string())
            })
            .collect();
        let reward = f.reward(project, lead, recipient, dec!(1000), Currency::Usd, &items, 30);
        let data = f.finish();

        let first = reward_items(&data, reward, PageRequest::new(0, 2));
        assert_eq!(first.content.len(), 2);
        assert!(first.has_more);
        assert_eq!(first.total_page_number, 13);
        let Some(newest) = first.content.first() else {
            panic!("empty page");
        };
        assert_eq!(newest.number, 25);
        assert!(newest.contribution_id.is_some());
        assert_eq!(newest.user_commits_count, Some(1));

        let last = reward_items(&data, reward, PageRequest::new(12, 2));
        assert_eq!(last.content.len(), 1);
        assert!(!last.has_more);
        assert_eq!(last.total_page_number, 13);
    }

    #[test]
    fn user_totals_group_by_currency() {
        let mut f = Fixture::new();
        let (lead, _) = f.user("lead");
        let (_, recipient) = f.user("recipient");
        let project = f.project("Onlydust", &[lead]);
        f.quote(Currency::Eth, dec!(2000));
        f.reward(project, lead, recipient, dec!(100), Currency::Usd, &[], 1);
        f.reward(project, lead, recipient, dec!(0.5), Currency::Eth, &[], 2);
        f.reward(project, lead, recipient, dec!(0.25), Currency::Eth, &[], 3);
        f.reward(project, lead, recipient, dec!(7), Currency::Apt, &[], 4);
        let data = f.finish();

        let page = user_rewards(
            &data,
            recipient,
            RewardSort::RequestedAt,
            SortDirection::Desc,
            PageRequest::new(0, 2),
        );
        assert_eq!(page.rewards.total_item_number, 4);
        assert_eq!(page.rewards.content.len(), 2);
        assert_eq!(page.totals.details.len(), 3);
        assert_eq!(page.totals.total_dollars_equivalent, Some(dec!(1600)));
    }

    #[test]
    fn overflowing_user_totals_are_none() {
        let mut f = Fixture::new();
        let (lead, _) = f.user("lead");
        let (_, recipient) = f.user("recipient");
        let project = f.project("Onlydust", &[lead]);
        f.quote(Currency::Eth, dec!(2000));
        f.reward(project, lead, recipient, Decimal::MAX, Currency::Usd, &[], 1);
        f.reward(project, lead, recipient, dec!(1), Currency::Usd, &[], 2);
        f.reward(project, lead, recipient, dec!(1), Currency::Eth, &[], 3);
        let data = f.finish();

        let page = user_rewards(
            &data,
            recipient,
            RewardSort::RequestedAt,
            SortDirection::Desc,
            PageRequest::new(0, 10),
        );
        let Some(usd) = page.totals.details.iter().find(|d| d.currency == Currency::Usd) else {
            panic!("usd total missing");
        };
        assert_eq!(usd.amount, Decimal::MAX);
        assert_eq!(usd.dollars_equivalent, Some(Decimal::MAX));
        assert_eq!(page.totals.total_dollars_equivalent, None);
    }
}
