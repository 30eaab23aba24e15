//! Type-safe identifiers.
//!
//! Projects, platform users and rewards are keyed by UUIDs. Each gets its own
//! newtype so a project id can never be passed where a user id is expected.
//! GitHub-side identities (users, repos, issues) keep their numeric GitHub ids.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Creates a new random identifier (UUID v4).
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Wraps an existing [`uuid::Uuid`].
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner [`uuid::Uuid`].
            #[must_use]
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id!(
    /// Unique identifier of a project.
    ProjectId
);

uuid_id!(
    /// Unique identifier of a registered platform user.
    UserId
);

uuid_id!(
    /// Unique identifier of a reward (payment request).
    RewardId
);

uuid_id!(
    /// Unique identifier of a sponsor.
    SponsorId
);

/// Numeric GitHub account id. Recipients of rewards are GitHub users who may
/// not have signed up on the platform yet.
pub type GithubUserId = i64;

/// Numeric GitHub repository id.
pub type GithubRepoId = i64;

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_generates_unique_ids() {
        assert_ne!(ProjectId::new(), ProjectId::new());
    }

    #[test]
    fn serializes_as_bare_uuid() {
        let uuid = uuid::Uuid::new_v4();
        let Ok(json) = serde_json::to_string(&RewardId::from_uuid(uuid)) else {
            panic!("serialization failed");
        };
        assert_eq!(json, format!("\"{uuid}\""));
    }

    #[test]
    fn converts_to_and_from_uuid() {
        let uuid = uuid::Uuid::new_v4();
        let id = UserId::from(uuid);
        assert_eq!(*id.as_uuid(), uuid);
        assert_eq!(uuid::Uuid::from(id), uuid);
    }
}
