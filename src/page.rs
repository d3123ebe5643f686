//! Fetched pages and the paginated response shape.

use crate::pagination::PageRequest;
use serde::Serialize;
use utoipa::ToSchema;

/// A slice of the filtered result set as returned by a store.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    content: Vec<T>,
    request: PageRequest,
    total_elements: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            request,
            total_elements,
        }
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    pub fn request(&self) -> PageRequest {
        self.request
    }

    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }

    /// Whether this page carries no records.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn total_pages(&self) -> u64 {
        self.total_elements.div_ceil(u64::from(self.request.size()))
    }

    pub fn has_previous(&self) -> bool {
        self.request.page() > 0 && self.total_elements > 0
    }

    pub fn has_next(&self) -> bool {
        self.request.page().saturating_add(1) < self.total_pages()
    }

    pub fn is_first(&self) -> bool {
        !self.has_previous()
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }
}

/// Stable JSON shape for paginated endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[aliases(PaginatedCreditoResponse = PaginatedResponse<crate::models::Credito>)]
pub struct PaginatedResponse<T> {
    /// Records of this page, in sort order.
    pub content: Vec<T>,
    /// Effective (clamped) zero-based page index.
    pub page: u64,
    /// Effective (clamped) page size.
    pub size: u32,
    /// Number of records across all pages.
    pub total_elements: u64,
    /// Number of pages for the effective size.
    pub total_pages: u64,
    pub first: bool,
    pub last: bool,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> PaginatedResponse<T> {
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl<T> From<Page<T>> for PaginatedResponse<T> {
    fn from(page: Page<T>) -> Self {
        let request = page.request();
        let total_elements = page.total_elements();
        let total_pages = page.total_pages();
        let first = page.is_first();
        let last = page.is_last();
        let has_next = page.has_next();
        let has_previous = page.has_previous();

        Self {
            content: page.into_content(),
            page: request.page(),
            size: request.size(),
            total_elements,
            total_pages,
            first,
            last,
            has_next,
            has_previous,
        }
    }
}
