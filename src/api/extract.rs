//! Caller identity extractor.
//!
//! The identity provider in front of the service forwards the resolved user
//! in two headers. Both present means an authenticated caller, neither means
//! anonymous, anything else is a malformed request.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::domain::{Caller, GithubUserId, UserId};
use crate::error::MarketplaceError;

/// Platform user id header.
pub const USER_ID_HEADER: &str = "x-user-id";
/// GitHub account id header.
pub const GITHUB_USER_ID_HEADER: &str = "x-github-user-id";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, MarketplaceError> {
    headers
        .get(name)
        .map(|v| {
            v.to_str()
                .map(str::trim)
                .map_err(|_| MarketplaceError::BadRequest(format!("Invalid {name} header")))
        })
        .transpose()
}

/// Resolves the caller from request headers.
///
/// # Errors
///
/// Returns [`MarketplaceError::BadRequest`] when only one header is present
/// or a value does not parse.
pub fn caller_from_headers(headers: &HeaderMap) -> Result<Caller, MarketplaceError> {
    match (
        header(headers, USER_ID_HEADER)?,
        header(headers, GITHUB_USER_ID_HEADER)?,
    ) {
        (None, None) => Ok(Caller::Anonymous),
        (Some(user_id), Some(github_user_id)) => {
            let user_id = Uuid::parse_str(user_id)
                .map(UserId::from)
                .map_err(|_| MarketplaceError::BadRequest(format!("Invalid {USER_ID_HEADER} header")))?;
            let github_user_id: GithubUserId = github_user_id.parse().map_err(|_| {
                MarketplaceError::BadRequest(format!("Invalid {GITHUB_USER_ID_HEADER} header"))
            })?;
            Ok(Caller::user(user_id, github_user_id))
        }
        _ => Err(MarketplaceError::BadRequest(format!(
            "Both {USER_ID_HEADER} and {GITHUB_USER_ID_HEADER} headers are required"
        ))),
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = MarketplaceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        caller_from_headers(&parts.headers)
    }
}
