//! Pagination request normalization.
//!
//! Raw `page`/`size` values coming from a client are never rejected: they are
//! clamped into a bounded [`PageRequest`] that always sorts by constitution
//! date, most recent first.

/// Default number of items per page when not specified (or not positive).
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Maximum allowed items per page.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Default starting page number (pages are zero-based).
pub const DEFAULT_PAGE_NUMBER: u64 = 0;

/// Sort orders supported by the record store.
///
/// There is a single variant: the paginated lookups are always ordered by
/// constitution date, descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sort {
    #[default]
    DataConstituicaoDesc,
}

impl Sort {
    /// SQL `ORDER BY` clause body for this sort.
    ///
    /// `id` breaks ties between equal dates so a page boundary never shifts
    /// between two requests.
    pub fn order_by_clause(self) -> &'static str {
        match self {
            Sort::DataConstituicaoDesc => "data_constituicao DESC, id ASC",
        }
    }
}

/// A validated, bounded page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    size: u32,
    sort: Sort,
}

impl PageRequest {
    /// Normalizes raw client values.
    ///
    /// - negative `page` becomes 0
    /// - `size <= 0` becomes [`DEFAULT_PAGE_SIZE`]
    /// - `size > MAX_PAGE_SIZE` becomes [`MAX_PAGE_SIZE`]
    pub fn new(page: i64, size: i64) -> Self {
        let page = u64::try_from(page).unwrap_or(DEFAULT_PAGE_NUMBER);
        let size = if size <= 0 {
            DEFAULT_PAGE_SIZE
        } else {
            u32::try_from(size.min(i64::from(MAX_PAGE_SIZE))).unwrap_or(MAX_PAGE_SIZE)
        };

        Self {
            page,
            size,
            sort: Sort::default(),
        }
    }

    /// Builds a request from optional query values, applying the defaults
    /// for absent ones before clamping.
    pub fn from_optional(page: Option<i64>, size: Option<i64>) -> Self {
        Self::new(
            page.unwrap_or(DEFAULT_PAGE_NUMBER as i64),
            size.unwrap_or(i64::from(DEFAULT_PAGE_SIZE)),
        )
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn sort(&self) -> Sort {
        self.sort
    }

    /// Number of records to skip, saturating on absurdly large pages.
    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(u64::from(self.size))
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_NUMBER as i64, i64::from(DEFAULT_PAGE_SIZE))
    }
}
