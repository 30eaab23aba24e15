//! Shared DTO helpers: pagination parameters and comma-separated lists.

use serde::de::DeserializeOwned;

use crate::domain::PageRequest;
use crate::error::MarketplaceError;

/// Builds the page request of a listing. `page_size` falls back to the
/// configured default and is clamped to `1..=100`.
#[must_use]
pub fn page_request(
    page_index: Option<i32>,
    page_size: Option<i32>,
    default_page_size: i32,
) -> PageRequest {
    PageRequest::new(
        page_index.unwrap_or(0),
        page_size.unwrap_or(default_page_size),
    )
}

/// Parses one boundary enum value such as `PULL_REQUEST` or `ETH`.
#[must_use]
pub fn enum_value<T: DeserializeOwned>(raw: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(raw.to_string())).ok()
}

/// Splits a comma-separated query value. A missing or blank value means
/// "no filter" and yields `None`, never an empty list.
///
/// # Errors
///
/// Returns [`MarketplaceError::BadRequest`] naming `field` when an element
/// does not parse.
pub fn parse_list<T>(
    field: &str,
    raw: Option<&str>,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<Vec<T>>, MarketplaceError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let values = raw
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            parse(v).ok_or_else(|| {
                MarketplaceError::BadRequest(format!("Invalid value '{v}' for {field}"))
            })
        })
        .collect::<Result<Vec<T>, _>>()?;
    Ok(Some(values).filter(|v| !v.is_empty()))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{ContributionType, Currency};

    #[test]
    fn blank_lists_are_no_filter() {
        let parse = |v: &str| v.parse::<i64>().ok();
        assert_eq!(parse_list("repositories", None, parse).ok(), Some(None));
        assert_eq!(parse_list("repositories", Some(""), parse).ok(), Some(None));
        assert_eq!(parse_list("repositories", Some(" , "), parse).ok(), Some(None));
        assert_eq!(
            parse_list("repositories", Some("1, 2"), parse).ok(),
            Some(Some(vec![1, 2]))
        );
    }

    #[test]
    fn bad_elements_are_rejected() {
        let Err(err) = parse_list("types", Some("ISSUE,BUG"), enum_value::<ContributionType>)
        else {
            panic!("BUG accepted");
        };
        assert_eq!(err.to_string(), "Invalid value 'BUG' for types");
    }

    #[test]
    fn enum_values_use_boundary_names() {
        assert_eq!(enum_value::<Currency>("STARK"), Some(Currency::Stark));
        assert_eq!(
            enum_value::<ContributionType>("CODE_REVIEW"),
            Some(ContributionType::CodeReview)
        );
        assert_eq!(enum_value::<Currency>("stark"), None);
    }

    #[test]
    fn page_size_defaults_and_clamps() {
        assert_eq!(page_request(None, None, 50), PageRequest::new(0, 50));
        assert_eq!(page_request(Some(-2), Some(500), 50), PageRequest::new(0, 100));
    }
}
