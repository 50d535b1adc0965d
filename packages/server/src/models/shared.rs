use serde::Serialize;

/// Pagination metadata included in list responses.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 2)]
    pub per_page: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 5)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 3)]
    pub total_pages: u64,
    /// Whether a page exists after this one.
    #[schema(example = true)]
    pub has_next_page: bool,
    /// Whether a page exists before this one.
    #[schema(example = false)]
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        let total_pages = total.div_ceil(per_page);
        Self {
            page,
            per_page,
            total,
            total_pages,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}
