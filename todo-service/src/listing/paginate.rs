//! Page arithmetic and the paginated envelope

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Projection;
use crate::repository::{Entity, EntityStore, QueryDescriptor, RepositoryResult, Window};

/// Page number used when none is given
pub const DEFAULT_PAGE: u64 = 1;

/// Page size used when none is given and no configuration overrides it
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Largest page size accepted when no configuration overrides it
pub const MAX_PAGE_SIZE: u64 = 100;

/// Rejected page parameters
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    /// Page numbers start at 1
    #[error("page must be at least 1")]
    InvalidPage,
    /// Page size outside `1..=max`
    #[error("page_size must be between 1 and {max}")]
    InvalidPageSize {
        /// Largest accepted page size
        max: u64,
    },
}

/// A validated page descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    page_size: u64,
}

impl PageRequest {
    /// Validate a page descriptor
    ///
    /// # Example
    ///
    /// ```rust
    /// use todo_service::listing::PageRequest;
    ///
    /// let request = PageRequest::new(2, 25, 100).unwrap();
    /// assert_eq!(request.offset(), 25);
    /// assert!(PageRequest::new(0, 25, 100).is_err());
    /// assert!(PageRequest::new(1, 101, 100).is_err());
    /// ```
    pub fn new(page: u64, page_size: u64, max_page_size: u64) -> Result<Self, PageError> {
        if page < 1 {
            return Err(PageError::InvalidPage);
        }
        if page_size < 1 || page_size > max_page_size {
            return Err(PageError::InvalidPageSize { max: max_page_size });
        }
        Ok(Self { page, page_size })
    }

    /// Fill in defaults for absent parameters, then validate
    pub fn from_parts(
        page: Option<u64>,
        page_size: Option<u64>,
        default_page_size: u64,
        max_page_size: u64,
    ) -> Result<Self, PageError> {
        Self::new(
            page.unwrap_or(DEFAULT_PAGE),
            page_size.unwrap_or(default_page_size),
            max_page_size,
        )
    }

    /// 1-indexed page number
    pub fn page(&self) -> u64 {
        self.page
    }

    /// Items per page
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Rows skipped before this page
    pub fn offset(&self) -> u64 {
        self.window().offset
    }

    /// Store window for this page
    pub fn window(&self) -> Window {
        Window::page(self.page, self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Number of pages needed for `total` items, zero when there are none
pub fn page_count(total: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// One page of results with navigation metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    /// Items matching the query across all pages
    pub total_cnt: u64,
    /// Number of pages
    pub page_cnt: u64,
    /// The page this response holds
    pub cur_page: u64,
    /// Following page, if there is one
    pub next_page: Option<u64>,
    /// Preceding page, if `cur_page > 1`
    pub previous_page: Option<u64>,
    /// Items on this page
    pub data: Vec<T>,
}

impl<T> PaginatedResponse<T> {
    /// Build the envelope for `data` fetched as `request` out of `total` items
    ///
    /// # Example
    ///
    /// ```rust
    /// use todo_service::listing::{PageRequest, PaginatedResponse};
    ///
    /// let request = PageRequest::new(2, 10, 100).unwrap();
    /// let page = PaginatedResponse::new(25, request, vec![0; 10]);
    /// assert_eq!(page.page_cnt, 3);
    /// assert_eq!(page.next_page, Some(3));
    /// assert_eq!(page.previous_page, Some(1));
    /// ```
    pub fn new(total: u64, request: PageRequest, data: Vec<T>) -> Self {
        let pages = page_count(total, request.page_size());
        let page = request.page();
        Self {
            total_cnt: total,
            page_cnt: pages,
            cur_page: page,
            next_page: (page < pages).then(|| page + 1),
            previous_page: (page > 1).then(|| page - 1),
            data,
        }
    }
}

/// Run a query through count, window and projection
///
/// The count and the fetch are separate store calls, so a concurrent write
/// between them can make `data` disagree slightly with `total_cnt`.
pub async fn paginate<R, E, S>(
    store: &S,
    query: &QueryDescriptor<E>,
    request: PageRequest,
) -> RepositoryResult<PaginatedResponse<R>>
where
    E: Entity,
    S: EntityStore<E>,
    R: Projection<E>,
{
    let total = store.count(query).await?;
    let rows = if request.offset() >= total {
        Vec::new()
    } else {
        store.fetch(query, request.window()).await?
    };

    tracing::debug!(
        entity = E::NAME,
        total,
        page = request.page(),
        page_size = request.page_size(),
        returned = rows.len(),
        "Paginated query"
    );

    let data = rows.into_iter().map(R::project).collect();
    Ok(PaginatedResponse::new(total, request, data))
}
