//! Identity of the caller, as resolved by the upstream identity provider.

use super::ids::{GithubUserId, UserId};
use crate::error::MarketplaceError;

/// A signed-up user making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Platform user id.
    pub user_id: UserId,
    /// Linked GitHub account id.
    pub github_user_id: GithubUserId,
}

/// Who is making the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Caller {
    /// No identity was forwarded.
    #[default]
    Anonymous,
    /// A signed-up user.
    Authenticated(AuthenticatedUser),
}

impl Caller {
    /// Shorthand for an authenticated caller.
    #[must_use]
    pub const fn user(user_id: UserId, github_user_id: GithubUserId) -> Self {
        Self::Authenticated(AuthenticatedUser {
            user_id,
            github_user_id,
        })
    }

    /// The authenticated user, if any.
    #[must_use]
    pub const fn authenticated(&self) -> Option<&AuthenticatedUser> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(user) => Some(user),
        }
    }

    /// The authenticated user.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::Unauthorized`] for anonymous callers.
    pub fn require_authenticated(&self) -> Result<&AuthenticatedUser, MarketplaceError> {
        self.authenticated()
            .ok_or_else(|| MarketplaceError::Unauthorized("Authentication required".to_string()))
    }
}
