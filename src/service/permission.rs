//! Project-lead authorization gate.
//!
//! The roster is read from storage on every check. Nothing is cached across
//! requests, so a removed lead loses access on the next call.

use std::sync::Arc;

use crate::domain::{AuthenticatedUser, Caller, ProjectId, UserId};
use crate::error::MarketplaceError;
use crate::storage::Storage;

/// Denied capability messages, rendered verbatim in 403 responses.
pub mod denied {
    /// Budget reads.
    pub const READ_BUDGETS: &str = "Only project leads can read budgets on their projects";
    /// Reward listing.
    pub const READ_REWARDS: &str = "Only project leads can read rewards on their projects";
    /// Single reward.
    pub const READ_REWARD: &str = "Only project leads can read reward on their projects";
    /// Items of a reward.
    pub const READ_REWARD_ITEMS: &str =
        "Only project leads can read reward items on their projects";
    /// Rewardable items.
    pub const READ_REWARDABLE_ITEMS: &str =
        "Only project leads can read rewardable items on their projects";
    /// Ignore and unignore.
    pub const EDIT_IGNORED_CONTRIBUTIONS: &str =
        "Only project leads can edit the list of ignored contributions";
    /// Project update.
    pub const UPDATE_PROJECT: &str = "Only project leads can update their projects";
    /// Contribution details.
    pub const READ_CONTRIBUTION: &str =
        "Only project leads and contribution authors can read contribution details";
    /// Reward read by someone other than its recipient.
    pub const READ_OWN_REWARD: &str = "Only recipient user can read its own reward";
}

/// Set membership test over a lead roster.
#[must_use]
pub fn is_lead(roster: &[UserId], user_id: UserId) -> bool {
    roster.contains(&user_id)
}

/// Answers "is this user a lead of this project" against current storage.
#[derive(Debug, Clone)]
pub struct PermissionService {
    storage: Arc<dyn Storage>,
}

impl PermissionService {
    /// Creates the gate over `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Whether `user_id` currently leads `project_id`.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub async fn is_project_lead(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> Result<bool, MarketplaceError> {
        let roster = self.storage.project_lead_ids(project_id).await?;
        Ok(is_lead(&roster, user_id))
    }

    /// Same as [`Self::is_project_lead`], `false` for anonymous callers.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub async fn is_lead_caller(
        &self,
        project_id: ProjectId,
        caller: &Caller,
    ) -> Result<bool, MarketplaceError> {
        match caller.authenticated() {
            Some(user) => self.is_project_lead(project_id, user.user_id).await,
            None => Ok(false),
        }
    }

    /// Fails unless `user_id` leads `project_id`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Forbidden`] carrying `denied` when the
    /// user is not a lead.
    pub async fn require_project_lead(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        denied: &str,
    ) -> Result<(), MarketplaceError> {
        if self.is_project_lead(project_id, user_id).await? {
            return Ok(());
        }
        tracing::debug!(%project_id, %user_id, reason = denied, "permission denied");
        Err(MarketplaceError::Forbidden(denied.to_string()))
    }

    /// Resolves the authenticated caller and requires them to lead the
    /// project.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Unauthorized`] for anonymous callers and
    /// [`MarketplaceError::Forbidden`] for non-leads.
    pub async fn require_lead_caller<'a>(
        &self,
        project_id: ProjectId,
        caller: &'a Caller,
        denied: &str,
    ) -> Result<&'a AuthenticatedUser, MarketplaceError> {
        let user = caller.require_authenticated()?;
        self.require_project_lead(project_id, user.user_id, denied)
            .await?;
        Ok(user)
    }
}
