//! Pagination.

use serde::{Deserialize, Serialize};

use crate::validation::{ValidationError, ValidationErrorKind};

/// Page size when neither caller nor config gives one.
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Creates a request; `page` and `page_size` must be positive.
    pub fn new(page: u32, page_size: u32) -> Result<Self, ValidationError> {
        if page == 0 || page_size == 0 {
            return Err(ValidationError::new(
                ValidationErrorKind::InvalidPage,
                format!("Page {page} of size {page_size} is out of range"),
            ));
        }
        Ok(Self { page, page_size })
    }

    /// First page of the given size.
    pub fn first(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Same page with the size capped.
    pub fn capped(self, max_page_size: u32) -> Self {
        Self {
            page_size: self.page_size.min(max_page_size.max(1)),
            ..self
        }
    }

    /// Index of the first item on the page.
    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.page_size as usize
    }

    /// Slices one page out of `items`.
    pub fn slice<T>(&self, items: Vec<T>) -> Page<T> {
        let count = items.len();
        let page_items = items
            .into_iter()
            .skip(self.offset())
            .take(self.page_size as usize)
            .collect();
        Page {
            items: page_items,
            count,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total matching items across all pages.
    pub count: usize,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    /// Whether a later page exists.
    pub fn has_next(&self) -> bool {
        (self.page as usize) * (self.page_size as usize) < self.count
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.count.div_ceil(self.page_size.max(1) as usize)
    }

    /// Maps the items, keeping the paging data.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            count: self.count,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_pages() {
        let request = PageRequest::new(2, 3).unwrap();
        let page = request.slice((1..=8).collect::<Vec<_>>());
        assert_eq!(page.items, vec![4, 5, 6]);
        assert_eq!(page.count, 8);
        assert!(page.has_next());
        assert_eq!(page.page_count(), 3);

        let last = PageRequest::new(3, 3).unwrap().slice((1..=8).collect::<Vec<_>>());
        assert_eq!(last.items, vec![7, 8]);
        assert!(!last.has_next());
    }

    #[test]
    fn test_past_the_end_is_empty() {
        let page = PageRequest::new(9, 10).unwrap().slice(vec![1, 2]);
        assert!(page.items.is_empty());
        assert_eq!(page.count, 2);
    }

    #[test]
    fn test_invalid_request() {
        let err = PageRequest::new(0, 10).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidPage);
        assert!(PageRequest::new(1, 0).is_err());
        assert_eq!(PageRequest::new(1, 500).unwrap().capped(100).page_size, 100);
    }
}
