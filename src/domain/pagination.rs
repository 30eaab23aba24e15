//! Page arithmetic shared by every paginated listing.
//!
//! Page indexes are 0-based. Page sizes are clamped to `1..=100`. An empty
//! result still reports one page so clients always have a page to render.

use serde::Serialize;
use utoipa::ToSchema;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: i32 = 100;

/// Clamps a requested page size into `1..=MAX_PAGE_SIZE`.
#[must_use]
pub fn sanitize_page_size(page_size: i32) -> i32 {
    page_size.clamp(1, MAX_PAGE_SIZE)
}

/// Clamps a requested page index to be non-negative.
#[must_use]
pub fn sanitize_page_index(page_index: i32) -> i32 {
    page_index.max(0)
}

/// Number of pages needed for `total_item_number` items, never less than 1.
#[must_use]
pub fn calculate_total_number_of_page(page_size: i32, total_item_number: i64) -> i32 {
    let page_size = i64::from(sanitize_page_size(page_size));
    if total_item_number <= 0 {
        return 1;
    }
    let pages = (total_item_number + page_size - 1) / page_size;
    i32::try_from(pages).unwrap_or(i32::MAX)
}

/// `true` when a page follows `page_index`.
#[must_use]
pub fn has_more(page_index: i32, total_page_number: i32) -> bool {
    i64::from(page_index) + 1 < i64::from(total_page_number)
}

/// Number of items to skip before `page_index`.
#[must_use]
pub fn offset(page_size: i32, page_index: i32) -> usize {
    let skip = i64::from(sanitize_page_size(page_size)) * i64::from(sanitize_page_index(page_index));
    usize::try_from(skip).unwrap_or(usize::MAX)
}

/// Sanitized paging request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 0-based page index.
    pub page_index: i32,
    /// Items per page, within `1..=MAX_PAGE_SIZE`.
    pub page_size: i32,
}

impl PageRequest {
    /// Builds a request from raw caller input, sanitizing both values.
    #[must_use]
    pub fn new(page_index: i32, page_size: i32) -> Self {
        Self {
            page_index: sanitize_page_index(page_index),
            page_size: sanitize_page_size(page_size),
        }
    }

    /// Cuts the requested page out of an already ordered collection.
    #[must_use]
    pub fn slice<T>(&self, items: Vec<T>) -> Page<T> {
        let total = i64::try_from(items.len()).unwrap_or(i64::MAX);
        let content = items
            .into_iter()
            .skip(offset(self.page_size, self.page_index))
            .take(usize::try_from(self.page_size).unwrap_or(0))
            .collect();
        Page::new(content, total, *self)
    }
}

/// One page of results with the totals clients need to navigate.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page.
    pub content: Vec<T>,
    /// Number of items across all pages.
    pub total_item_number: i64,
    /// Number of pages, at least 1.
    pub total_page_number: i32,
    /// Whether a later page exists.
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Wraps `content` with totals derived from `total_item_number`.
    #[must_use]
    pub fn new(content: Vec<T>, total_item_number: i64, request: PageRequest) -> Self {
        let total_page_number = calculate_total_number_of_page(request.page_size, total_item_number);
        Self {
            content,
            total_item_number,
            total_page_number,
            has_more: has_more(request.page_index, total_page_number),
        }
    }

    /// Maps the page content while keeping the totals.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_item_number: self.total_item_number,
            total_page_number: self.total_page_number,
            has_more: self.has_more,
        }
    }

    /// Whether the result spans more than one page (served as HTTP 206).
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.total_page_number > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_capped_at_one_hundred() {
        for size in [101, 150, 1_000, i32::MAX] {
            assert_eq!(sanitize_page_size(size), 100);
        }
    }

    #[test]
    fn page_size_within_bounds_is_kept() {
        for size in 1..=100 {
            assert_eq!(sanitize_page_size(size), size);
        }
        assert_eq!(sanitize_page_size(0), 1);
        assert_eq!(sanitize_page_size(-3), 1);
    }

    #[test]
    fn negative_page_index_becomes_zero() {
        assert_eq!(sanitize_page_index(-1), 0);
        assert_eq!(sanitize_page_index(4), 4);
    }

    #[test]
    fn has_more_compares_next_index_with_total() {
        assert!(!has_more(0, 1));
        assert!(!has_more(1, 2));
        assert!(has_more(0, 2));
        for index in 0..10 {
            for total in 0..10 {
                assert_eq!(has_more(index, total), index + 1 < total);
            }
        }
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(calculate_total_number_of_page(5, 10), 2);
        assert_eq!(calculate_total_number_of_page(5, 9), 2);
        assert_eq!(calculate_total_number_of_page(5, 1), 1);
        assert_eq!(calculate_total_number_of_page(2, 25), 13);
    }

    #[test]
    fn empty_result_has_one_page() {
        assert_eq!(calculate_total_number_of_page(20, 0), 1);
        let page: Page<u8> = PageRequest::new(0, 20).slice(vec![]);
        assert_eq!(page.total_page_number, 1);
        assert!(!page.has_more);
        assert!(!page.is_partial());
    }

    #[test]
    fn slice_cuts_requested_window() {
        let items: Vec<i32> = (0..25).collect();
        let first = PageRequest::new(0, 2).slice(items.clone());
        assert_eq!(first.content, vec![0, 1]);
        assert!(first.has_more);
        assert_eq!(first.total_page_number, 13);

        let last = PageRequest::new(12, 2).slice(items);
        assert_eq!(last.content, vec![24]);
        assert!(!last.has_more);
        assert_eq!(last.total_item_number, 25);
    }

    #[test]
    fn page_beyond_last_is_empty_with_totals() {
        let page = PageRequest::new(7, 10).slice((0..15).collect::<Vec<_>>());
        assert!(page.content.is_empty());
        assert_eq!(page.total_item_number, 15);
        assert_eq!(page.total_page_number, 2);
        assert!(!page.has_more);
    }

    #[test]
    fn serializes_camel_case() {
        let page = PageRequest::new(0, 1).slice(vec!["a", "b"]);
        let json = serde_json::to_value(&page).unwrap_or_default();
        assert_eq!(json["totalItemNumber"], 2);
        assert_eq!(json["totalPageNumber"], 2);
        assert_eq!(json["hasMore"], true);
    }
}
