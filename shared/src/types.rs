//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Page size used for bulk catalog/ledger reads. Reads are issued page by
/// page and concatenated until a short page signals the end of the table.
pub const FETCH_PAGE_SIZE: i64 = 1000;

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl Pagination {
    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * self.per_page as i64
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl PaginationMeta {
    /// Build metadata for a result set. A zero page size counts as one for
    /// the page total, so the math cannot divide by zero.
    pub fn new(page: u32, per_page: u32, total_items: u64) -> Self {
        let page_size = per_page.max(1) as u64;
        let total_pages = ((total_items + page_size - 1) / page_size) as u32;
        Self {
            page,
            per_page,
            total_items,
            total_pages,
        }
    }
}
