//! Contribution listing parameters.

use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use super::common_dto::{enum_value, parse_list};
use crate::domain::{
    ContributionFilters, ContributionSort, ContributionStatus, ContributionType, ProjectId,
    SortDirection,
};
use crate::error::MarketplaceError;

/// Query parameters of `GET /me/contributions`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ContributionParams {
    /// 0-based page index.
    pub page_index: Option<i32>,
    /// Page size, at most 100.
    pub page_size: Option<i32>,
    /// Comma-separated project ids.
    pub projects: Option<String>,
    /// Comma-separated repository ids.
    pub repositories: Option<String>,
    /// Comma-separated kinds (`ISSUE`, `PULL_REQUEST`, `CODE_REVIEW`).
    pub types: Option<String>,
    /// Comma-separated statuses (`IN_PROGRESS`, `COMPLETED`, `CANCELLED`).
    pub statuses: Option<String>,
    /// Match on title or number.
    pub search: Option<String>,
    /// Sort key, `CREATED_AT` by default.
    pub sort: Option<ContributionSort>,
    /// `ASC` or `DESC`.
    pub direction: Option<SortDirection>,
}

impl ContributionParams {
    /// Filters carried by the query string.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::BadRequest`] for an unparsable list
    /// element.
    pub fn filters(&self) -> Result<ContributionFilters, MarketplaceError> {
        Ok(ContributionFilters {
            project_ids: parse_list("projects", self.projects.as_deref(), |v| {
                Uuid::parse_str(v).ok().map(ProjectId::from)
            })?,
            repo_ids: parse_list("repositories", self.repositories.as_deref(), |v| {
                v.parse().ok()
            })?,
            types: parse_list(
                "types",
                self.types.as_deref(),
                enum_value::<ContributionType>,
            )?,
            statuses: parse_list(
                "statuses",
                self.statuses.as_deref(),
                enum_value::<ContributionStatus>,
            )?,
            search: self.search.clone(),
        })
    }
}

/// Query parameters of `GET /me/contributed-projects` and
/// `GET /me/contributed-repos`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ContributedParams {
    /// Comma-separated project ids.
    pub projects: Option<String>,
    /// Comma-separated repository ids.
    pub repositories: Option<String>,
}

impl ContributedParams {
    /// Project and repository restrictions carried by the query string.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError::BadRequest`] for an unparsable list
    /// element.
    pub fn filters(&self) -> Result<ContributionFilters, MarketplaceError> {
        ContributionParams {
            projects: self.projects.clone(),
            repositories: self.repositories.clone(),
            ..ContributionParams::default()
        }
        .filters()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_list() {
        let project = ProjectId::new();
        let params = ContributionParams {
            projects: Some(project.to_string()),
            repositories: Some("12,13".to_string()),
            types: Some("ISSUE,CODE_REVIEW".to_string()),
            statuses: Some("COMPLETED".to_string()),
            ..ContributionParams::default()
        };
        let Ok(filters) = params.filters() else {
            panic!("filters rejected");
        };
        assert_eq!(filters.project_ids, Some(vec![project]));
        assert_eq!(filters.repo_ids, Some(vec![12, 13]));
        assert_eq!(
            filters.types,
            Some(vec![ContributionType::Issue, ContributionType::CodeReview])
        );
        assert_eq!(filters.statuses, Some(vec![ContributionStatus::Completed]));
    }

    #[test]
    fn rejects_malformed_project_ids() {
        let params = ContributionParams {
            projects: Some("not-a-uuid".to_string()),
            ..ContributionParams::default()
        };
        let Err(err) = params.filters() else {
            panic!("malformed id accepted");
        };
        assert_eq!(err.to_string(), "Invalid value 'not-a-uuid' for projects");
    }

    #[test]
    fn contributed_params_keep_only_project_and_repo_lists() {
        let project = ProjectId::new();
        let params = ContributedParams {
            projects: Some(project.to_string()),
            repositories: Some("7".to_string()),
        };
        let Ok(filters) = params.filters() else {
            panic!("filters rejected");
        };
        assert_eq!(filters.project_ids, Some(vec![project]));
        assert_eq!(filters.repo_ids, Some(vec![7]));
        assert_eq!(filters.types, None);

        let bad = ContributedParams {
            repositories: Some("x".to_string()),
            ..ContributedParams::default()
        };
        let Err(err) = bad.filters() else {
            panic!("malformed repository accepted");
        };
        assert_eq!(err.to_string(), "Invalid value 'x' for repositories");
    }
}
