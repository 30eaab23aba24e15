//! Rewards seen by their recipient.

use std::sync::Arc;

use crate::domain::{
    Caller, Page, PageRequest, RewardDetailsView, RewardId, RewardItemView, RewardSort,
    SortDirection, UserRewardsPage,
};
use crate::error::MarketplaceError;
use crate::service::permission::denied;
use crate::storage::Storage;

/// Serves the "my rewards" pages.
#[derive(Debug, Clone)]
pub struct UserService {
    storage: Arc<dyn Storage>,
}

impl UserService {
    /// Creates a new `UserService`.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Rewards received by the caller, with totals across all pages.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Unauthorized`] for anonymous callers.
    pub async fn my_rewards(
        &self,
        caller: &Caller,
        sort: RewardSort,
        direction: SortDirection,
        page: PageRequest,
    ) -> Result<UserRewardsPage, MarketplaceError> {
        let user = caller.require_authenticated()?;
        self.storage
            .user_rewards(user.github_user_id, sort, direction, page)
            .await
    }

    /// One reward of the caller.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::NotFound`] for an unknown reward and
    /// [`MarketplaceError::Forbidden`] when the caller is not its recipient.
    pub async fn my_reward(
        &self,
        caller: &Caller,
        reward_id: RewardId,
    ) -> Result<RewardDetailsView, MarketplaceError> {
        let user = caller.require_authenticated()?;
        let (recipient_id, reward) = self
            .storage
            .user_reward(reward_id)
            .await?
            .ok_or_else(|| MarketplaceError::NotFound("Reward not found".to_string()))?;
        if recipient_id != user.github_user_id {
            tracing::debug!(%reward_id, "reward read by someone else than its recipient");
            return Err(MarketplaceError::Forbidden(
                denied::READ_OWN_REWARD.to_string(),
            ));
        }
        Ok(reward)
    }

    /// Items paid by one reward of the caller.
    ///
    /// # Errors
    ///
    /// Same as [`Self::my_reward`].
    pub async fn my_reward_items(
        &self,
        caller: &Caller,
        reward_id: RewardId,
        page: PageRequest,
    ) -> Result<Page<RewardItemView>, MarketplaceError> {
        self.my_reward(caller, reward_id).await?;
        self.storage.reward_items(reward_id, page).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::domain::{ContributionType, Currency, RewardStatus};
    use crate::query::fixtures::Fixture;
    use crate::storage::MemoryStorage;

    #[tokio::test]
    async fn recipient_pages_through_reward_items() {
        let mut f = Fixture::new();
        let (lead, _) = f.user("lead");
        let (me, me_gid) = f.user("me");
        let (other, other_gid) = f.user("other");
        let project = f.project("Cairo", &[lead]);
        let repo = f.repo(project, "starkware", "cairo");
        let items: Vec<(ContributionType, String)> = (1..=25)
            .map(|n| {
                let (id, _) = f.pull_request(repo, me_gid, n, &format!("Change {n}"), n);
                (ContributionType::PullRequest, id.to_string())
            })
            .collect();
        let reward = f.reward(project, lead, me_gid, dec!(100), Currency::Usd, &items, 30);
        let service = UserService::new(Arc::new(MemoryStorage::new(f.finish())));
        let caller = Caller::user(me, me_gid);

        let Ok(first) = service
            .my_reward_items(&caller, reward, PageRequest::new(0, 2))
            .await
        else {
            panic!("first page failed");
        };
        assert_eq!(first.content.len(), 2);
        assert!(first.has_more);
        assert_eq!(first.total_page_number, 13);

        let Ok(last) = service
            .my_reward_items(&caller, reward, PageRequest::new(12, 2))
            .await
        else {
            panic!("last page failed");
        };
        assert_eq!(last.content.len(), 1);
        assert!(!last.has_more);
        assert_eq!(last.total_page_number, 13);

        let Err(err) = service
            .my_reward_items(&Caller::user(other, other_gid), reward, PageRequest::new(0, 2))
            .await
        else {
            panic!("other user read reward items");
        };
        assert_eq!(err.to_string(), "Only recipient user can read its own reward");
    }

    #[tokio::test]
    async fn self_view_uses_summary_status() {
        let mut f = Fixture::new();
        let (lead, _) = f.user("lead");
        let (me, me_gid) = f.user("me");
        let project = f.project("Cairo", &[lead]);
        let paid = f.reward(project, lead, me_gid, dec!(10), Currency::Usd, &[], 1);
        let pending = f.reward(project, lead, me_gid, dec!(20), Currency::Usd, &[], 2);
        f.pay(paid, 3);
        let service = UserService::new(Arc::new(MemoryStorage::new(f.finish())));
        let caller = Caller::user(me, me_gid);

        let Ok(reward) = service.my_reward(&caller, pending).await else {
            panic!("pending reward missing");
        };
        assert_eq!(reward.status, RewardStatus::Processing);
        let Ok(reward) = service.my_reward(&caller, paid).await else {
            panic!("paid reward missing");
        };
        assert_eq!(reward.status, RewardStatus::Complete);

        let Ok(page) = service
            .my_rewards(&caller, RewardSort::RequestedAt, SortDirection::Desc, PageRequest::new(0, 10))
            .await
        else {
            panic!("listing failed");
        };
        assert_eq!(page.rewards.total_item_number, 2);
        assert_eq!(page.totals.total_dollars_equivalent, Some(dec!(30)));

        let Err(err) = service.my_reward(&caller, RewardId::new()).await else {
            panic!("unknown reward found");
        };
        assert_eq!(err.to_string(), "Reward not found");
    }
}
