use serde::{Deserialize, Serialize};

pub const DEFAULT_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 100;

/// Page selection as it arrives in a query string. Missing values fall back to
/// the defaults, out of range values are clamped.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
pub struct PageRequest {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct Pagination {
    page: u32,
    per_page: u32,
}

impl Pagination {
    #[must_use]
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    #[must_use]
    pub fn page(self) -> u32 {
        self.page
    }

    #[must_use]
    pub fn per_page(self) -> u32 {
        self.per_page
    }

    #[must_use]
    pub fn offset(self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }

    #[must_use]
    pub fn limit(self) -> u64 {
        u64::from(self.per_page)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, DEFAULT_PER_PAGE)
    }
}

impl From<PageRequest> for Pagination {
    fn from(value: PageRequest) -> Self {
        Self::new(
            value.page.unwrap_or(1),
            value.per_page.unwrap_or(DEFAULT_PER_PAGE),
        )
    }
}

/// A slice of a listing plus the total it was cut from.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct Listing<T> {
    pub total: u64,
    pub items: Vec<T>,
}

impl<T> Listing<T> {
    /// Cuts the requested page out of an already ordered, complete listing.
    #[must_use]
    pub fn paginate(all: Vec<T>, pagination: Pagination) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(usize::try_from(pagination.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(pagination.limit()).unwrap_or(usize::MAX))
            .collect();

        Self { total, items }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub page: u32,
    pub per_page: u32,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(listing: Listing<T>, pagination: Pagination) -> Self {
        Self {
            count: listing.total,
            page: pagination.page(),
            per_page: pagination.per_page(),
            results: listing.items,
        }
    }
}
