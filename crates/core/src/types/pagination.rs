//! Page-number pagination.

use serde::{Deserialize, Serialize};

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Pagination {
    /// Build a page request, clamping `page` to at least 1 and `page_size`
    /// to `1..=max_page_size`.
    #[must_use]
    pub fn new(page: u32, page_size: u32, max_page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, max_page_size.max(1)),
        }
    }

    /// Rows to skip for this page.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }

    /// Rows to fetch for this page.
    #[must_use]
    pub const fn limit(&self) -> i64 {
        self.page_size as i64
    }

    /// Number of pages needed for `total` rows. An empty result is still one page.
    #[must_use]
    pub const fn page_count(&self, total: i64) -> i64 {
        if total <= 0 {
            return 1;
        }
        let size = self.page_size as i64;
        (total + size - 1) / size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset() {
        assert_eq!(Pagination::new(1, 20, 100).offset(), 0);
        assert_eq!(Pagination::new(3, 20, 100).offset(), 40);
    }

    #[test]
    fn test_clamping() {
        let p = Pagination::new(0, 500, 100);
        assert_eq!(p.page, 1);
        assert_eq!(p.page_size, 100);

        let p = Pagination::new(2, 0, 100);
        assert_eq!(p.page_size, 1);
    }

    #[test]
    fn test_page_count() {
        let p = Pagination::new(1, 20, 100);
        assert_eq!(p.page_count(0), 1);
        assert_eq!(p.page_count(1), 1);
        assert_eq!(p.page_count(20), 1);
        assert_eq!(p.page_count(21), 2);
        assert_eq!(p.page_count(100), 5);
    }
}
