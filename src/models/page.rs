//! Paging types for catalog listings

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Raw listing parameters as supplied by a caller
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookListQuery {
    pub page: Option<i64>,
    pub books_per_page: Option<i64>,
    pub sort_by_year: Option<bool>,
}

impl BookListQuery {
    pub fn page(page: i64, books_per_page: i64, sort_by_year: bool) -> Self {
        Self {
            page: Some(page),
            books_per_page: Some(books_per_page),
            sort_by_year: Some(sort_by_year),
        }
    }

    /// Resolve into a page request; `None` means the whole catalog, unpaged.
    pub fn to_request(&self, default_page_size: i64) -> AppResult<Option<PageRequest>> {
        if self.page.is_none() && self.books_per_page.is_none() && self.sort_by_year.is_none() {
            return Ok(None);
        }
        PageRequest::new(
            self.page.unwrap_or(0),
            self.books_per_page.unwrap_or(default_page_size),
            self.sort_by_year.unwrap_or(false),
        )
        .map(Some)
    }
}

/// Zero-indexed page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
    pub sort_by_year: bool,
}

impl PageRequest {
    pub fn new(page: i64, size: i64, sort_by_year: bool) -> AppResult<Self> {
        if page < 0 {
            return Err(AppError::InvalidOperation(format!(
                "Page index must not be negative, got {}",
                page
            )));
        }
        if size < 1 {
            return Err(AppError::InvalidOperation(format!(
                "Page size must be at least 1, got {}",
                size
            )));
        }
        Ok(Self {
            page,
            size,
            sort_by_year,
        })
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.size)
    }
}

/// One page of results plus what is needed to render page links
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: &PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            per_page: request.size,
            total_pages: total / request.size + i64::from(total % request.size != 0),
        }
    }

    /// Everything on a single page
    pub fn unpaged(items: Vec<T>) -> Self {
        let total = items.len() as i64;
        Self {
            items,
            total,
            page: 0,
            per_page: total,
            total_pages: 1,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages - 1
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_absent_is_unpaged() {
        assert_eq!(BookListQuery::default().to_request(10).unwrap(), None);
    }

    #[test]
    fn test_defaults() {
        let query = BookListQuery {
            sort_by_year: Some(true),
            ..Default::default()
        };
        let request = query.to_request(10).unwrap().unwrap();
        assert_eq!(request, PageRequest { page: 0, size: 10, sort_by_year: true });

        let query = BookListQuery {
            page: Some(2),
            ..Default::default()
        };
        let request = query.to_request(10).unwrap().unwrap();
        assert_eq!(request, PageRequest { page: 2, size: 10, sort_by_year: false });
        assert_eq!(request.offset(), 20);
    }

    #[test]
    fn test_rejects_bad_paging() {
        assert!(matches!(
            BookListQuery::page(-1, 5, false).to_request(10),
            Err(AppError::InvalidOperation(_))
        ));
        assert!(matches!(
            BookListQuery::page(0, 0, false).to_request(10),
            Err(AppError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_extreme_paging_values() {
        let huge = PageRequest::new(i64::MAX, i64::MAX, false).unwrap();
        assert_eq!(huge.offset(), i64::MAX);

        let page = Page::new(vec![(); 12], 12, &PageRequest::new(0, i64::MAX, false).unwrap());
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next());

        let far: Page<()> = Page::new(Vec::new(), 12, &huge);
        assert_eq!(far.total_pages, 1);
        assert!(!far.has_next());
        assert!(far.has_previous());
    }

    #[test]
    fn test_total_pages() {
        let request = PageRequest::new(1, 5, true).unwrap();
        let page = Page::new(vec![(); 5], 12, &request);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next());
        assert!(page.has_previous());

        let empty: Page<()> = Page::new(Vec::new(), 0, &request);
        assert_eq!(empty.total_pages, 0);

        let past_end: Page<()> = Page::new(Vec::new(), 12, &PageRequest::new(5, 5, false).unwrap());
        assert_eq!(past_end.total_pages, 3);
        assert!(!past_end.has_next());

        let all = Page::unpaged(vec![1, 2, 3]);
        assert_eq!((all.total, all.total_pages, all.per_page), (3, 1, 3));
        assert!(!all.has_next());
    }
}
