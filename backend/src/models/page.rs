//! Offset pagination shared by the listing endpoints.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A validated page request. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    /// Builds a request from raw query values, falling back to page 1 and
    /// the default limit, and clamping the limit to `1..=MAX_PAGE_LIMIT`.
    pub fn from_raw(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page
            .filter(|p| *p >= 1)
            .map(|p| p.min(u32::MAX as i64) as u32)
            .unwrap_or(1);
        let limit = limit
            .filter(|l| *l >= 1)
            .map(|l| l.min(MAX_PAGE_LIMIT as i64) as u32)
            .unwrap_or(DEFAULT_PAGE_LIMIT);
        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

/// One page of results plus the unpaginated total.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub request: PageRequest,
}

impl<T> Page<T> {
    /// Slices an already ordered collection.
    pub fn from_ordered(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit as usize)
            .collect();
        Self {
            items,
            total,
            request,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            request: self.request,
        }
    }

    pub fn info(&self) -> PageInfo {
        PageInfo {
            total: self.total,
            page: self.request.page,
            pages: self.total.div_ceil(self.request.limit as u64),
        }
    }
}

/// Pagination block returned to the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub total: u64,
    pub page: u32,
    pub pages: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults() {
        let req = PageRequest::from_raw(None, None);
        assert_eq!(req, PageRequest::default());
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_page_request_clamps() {
        let req = PageRequest::from_raw(Some(0), Some(5000));
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, MAX_PAGE_LIMIT);

        let req = PageRequest::from_raw(Some(3), Some(-4));
        assert_eq!(req.page, 3);
        assert_eq!(req.limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(req.offset(), 20);
    }

    #[test]
    fn test_page_info_rounds_up() {
        let page = Page::from_ordered((0..25).collect::<Vec<_>>(), PageRequest::from_raw(Some(3), Some(10)));
        assert_eq!(page.items, vec![20, 21, 22, 23, 24]);
        let info = page.info();
        assert_eq!(info.total, 25);
        assert_eq!(info.pages, 3);
        assert_eq!(info.page, 3);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let page = Page::from_ordered(vec![1, 2, 3], PageRequest::from_raw(Some(4), Some(2)));
        assert!(page.items.is_empty());
        assert_eq!(page.info().pages, 2);
    }
}
