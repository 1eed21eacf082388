/// Pagination envelope for list endpoints
///
/// ```json
/// {
///   "items": [...],
///   "total": 12,
///   "page": 2,
///   "size": 5,
///   "pages": 3,
///   "links": {
///     "first": "/users/?page=1&size=5",
///     "previous": "/users/?page=1&size=5",
///     "next": "/users/?page=3&size=5",
///     "last": "/users/?page=3&size=5"
///   }
/// }
/// ```
///
/// `previous` and `next` are null at the edges. The query parameters are
/// parsed and range-checked by the [`PageParams`] extractor in
/// [`crate::extract`].

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Validated `page` / `size` query parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    /// 1-based page number
    pub page: i64,

    /// Items per page, 1..=100
    pub size: i64,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageParams {
    pub fn limit(&self) -> i64 {
        self.size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinks {
    pub first: String,
    pub previous: Option<String>,
    pub next: Option<String>,
    pub last: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub size: i64,
    pub pages: i64,
    pub links: PageLinks,
}

impl<T> Page<T> {
    /// Wraps one page of items; `base_path` is the collection path, e.g. `/users/`
    pub fn new(items: Vec<T>, total: i64, params: PageParams, base_path: &str) -> Self {
        let PageParams { page, size } = params;
        let pages = (total + size - 1) / size;

        let link = |page: i64| format!("{}?page={}&size={}", base_path, page, size);

        let links = PageLinks {
            first: link(1),
            previous: (page > 1).then(|| link(page - 1)),
            next: (page < pages).then(|| link(page + 1)),
            last: link(pages.max(1)),
        };

        Self {
            items,
            total,
            page,
            size,
            pages,
            links,
        }
    }
}
