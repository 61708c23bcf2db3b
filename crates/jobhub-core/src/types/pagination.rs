//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};

/// Default page size.
pub const DEFAULT_PAGE_SIZE: u64 = 10;
/// Maximum page size.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Normalized request parameters for paginated queries.
///
/// Construct through [`PageRequest::new`] so that `page` and `limit` are
/// always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-based).
    pub page: u64,
    /// Number of items per page.
    pub limit: u64,
}

impl PageRequest {
    /// Create a page request, clamping out-of-range input instead of
    /// rejecting it. A page below 1 becomes 1; a limit below 1 falls back
    /// to the default page size and a limit above the maximum is capped.
    pub fn new(page: i64, limit: i64) -> Self {
        let page = if page < 1 { 1 } else { page as u64 };
        let limit = if limit < 1 {
            DEFAULT_PAGE_SIZE
        } else {
            (limit as u64).min(MAX_PAGE_SIZE)
        };
        Self { page, limit }
    }

    /// Calculate the SQL `OFFSET` value, saturating at `i64::MAX`.
    pub fn offset(&self) -> i64 {
        let offset = self.page.saturating_sub(1).saturating_mul(self.limit);
        i64::try_from(offset).unwrap_or(i64::MAX)
    }

    /// Return the SQL `LIMIT` value.
    pub fn limit(&self) -> u64 {
        self.limit
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_invalid_input() {
        assert_eq!(PageRequest::new(0, 0), PageRequest::default());
        assert_eq!(PageRequest::new(-4, -1), PageRequest::default());
        assert_eq!(PageRequest::new(3, 1_000).limit(), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest::new(1, 10).offset(), 0);
        assert_eq!(PageRequest::new(3, 25).offset(), 50);
    }

    #[test]
    fn test_offset_saturates_for_huge_pages() {
        assert_eq!(
            PageRequest::new(100_000_000_000_000_000, 100).offset(),
            i64::MAX
        );
        assert_eq!(PageRequest::new(i64::MAX, MAX_PAGE_SIZE as i64).offset(), i64::MAX);
    }
}
