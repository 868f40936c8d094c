//! Shared pagination types for API query parameters.
//!
//! List endpoints use page-numbered pagination with `page` and `page_size` parameters, which is
//! translated to a SQL offset/limit. Out-of-range values are clamped rather than rejected.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Default number of items to return per page.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum number of items that can be requested per page.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Standard pagination parameters for list endpoints.
///
/// - `page`: 1-based page number (default: 1)
/// - `page_size`: Items per page (default: 20, max: 100)
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct Pagination {
    /// Page number, starting at 1 (default: 1)
    #[param(default = 1, minimum = 1)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub page: Option<i64>,

    /// Items per page (default: 20, max: 100)
    #[param(default = 20, minimum = 1, maximum = 100)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub page_size: Option<i64>,
}

impl Pagination {
    /// Get the page number, at least 1.
    #[inline]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Get the page size, clamped between 1 and MAX_PAGE_SIZE.
    #[inline]
    pub fn page_size(&self) -> i64 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Number of rows to skip for the requested page.
    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.page_size())
    }
}

/// Pagination metadata returned alongside a page of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PageMeta {
    pub page: i64,
    pub page_size: i64,
    /// Total number of items matching the query (before pagination)
    pub total_items: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page: Option<i64>,
    pub previous_page: Option<i64>,
}

impl PageMeta {
    pub fn new(pagination: &Pagination, total_items: i64) -> Self {
        let page = pagination.page();
        let page_size = pagination.page_size();
        let total_items = total_items.max(0);
        let total_pages = (total_items + page_size - 1) / page_size;
        let has_next = page < total_pages;
        let has_previous = page > 1;

        Self {
            page,
            page_size,
            total_items,
            total_pages,
            has_next,
            has_previous,
            next_page: has_next.then_some(page + 1),
            previous_page: has_previous.then_some(page - 1),
        }
    }
}

/// Generic paginated response wrapper for list endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedResponse<T: ToSchema> {
    /// The items for the current page
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T: ToSchema> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, pagination: &Pagination, total_items: i64) -> Self {
        Self {
            items,
            meta: PageMeta::new(pagination, total_items),
        }
    }
}
