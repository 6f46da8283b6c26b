//! Pagination utilities for list responses.
//!
//! Supports both offset-based (`limit` + `offset`) and page-based
//! (`limit` + `page`, 1-indexed) pagination. When `page` is provided it
//! takes precedence over `offset`.

use serde::{Deserialize, Deserializer, Serialize};

/// Deserializes an optional string into an optional i64.
///
/// Query parameters may arrive as empty strings, which are treated as `None`.
fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse::<i64>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Metadata about a paginated response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// Total number of items across all pages
    pub total: i64,
    /// Maximum items per page
    pub limit: i64,
    /// Offset into the full result set
    pub offset: Option<i64>,
    /// 1-indexed page number, when page-based pagination was requested
    pub page: Option<i64>,
    /// Whether more items exist past this page
    pub has_more: bool,
}

/// Pagination query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub offset: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
}

impl PaginationParams {
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 100;

    /// Effective limit, clamped to `1..=MAX_LIMIT`.
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    /// Effective offset. `page` takes precedence over `offset`.
    pub fn offset(&self) -> i64 {
        match self.page {
            Some(page) => (page.max(1) - 1) * self.limit(),
            None => self.offset.unwrap_or(0).max(0),
        }
    }

    pub fn page(&self) -> Option<i64> {
        self.page.map(|p| p.max(1))
    }

    /// Builds response metadata for a page of `returned` items out of `total`.
    pub fn meta(&self, total: i64, returned: usize) -> PaginationMeta {
        let offset = self.offset();
        PaginationMeta {
            total,
            limit: self.limit(),
            offset: Some(offset),
            page: self.page(),
            has_more: offset + (returned as i64) < total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let params = PaginationParams::default();
        assert_eq!(params.limit(), 10);
        assert_eq!(params.offset(), 0);
        assert_eq!(params.page(), None);
    }

    #[test]
    fn limit_is_clamped() {
        let params = PaginationParams {
            limit: Some(1000),
            ..Default::default()
        };
        assert_eq!(params.limit(), PaginationParams::MAX_LIMIT);
    }

    #[test]
    fn page_overrides_offset() {
        let params = PaginationParams {
            limit: Some(20),
            offset: Some(5),
            page: Some(3),
        };
        assert_eq!(params.offset(), 40);
    }

    #[test]
    fn meta_has_more() {
        let params = PaginationParams {
            limit: Some(10),
            ..Default::default()
        };
        let meta = params.meta(25, 10);
        assert!(meta.has_more);
        let last = PaginationParams {
            limit: Some(10),
            offset: Some(20),
            page: None,
        };
        assert!(!last.meta(25, 5).has_more);
    }
}
