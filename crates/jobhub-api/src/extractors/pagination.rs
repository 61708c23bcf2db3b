//! Pagination query parameter extractor.

use serde::{Deserialize, Serialize};

use jobhub_core::types::PageRequest;
use jobhub_core::types::pagination::DEFAULT_PAGE_SIZE;

/// Query parameters for paginated endpoints.
///
/// Both values are taken as raw strings so malformed input falls back to
/// the defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaginationParams {
    /// Page number (1-based, default: 1).
    pub page: Option<String>,
    /// Items per page (default: 10, max: 100).
    pub limit: Option<String>,
}

impl PaginationParams {
    /// Converts to a `PageRequest`.
    pub fn into_page_request(self) -> PageRequest {
        let page = parse_or(self.page.as_deref(), 1);
        let limit = parse_or(self.limit.as_deref(), DEFAULT_PAGE_SIZE as i64);
        PageRequest::new(page, limit)
    }
}

fn parse_or(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}
