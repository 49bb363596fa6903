//! Pagination and filtering contract shared by all list operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default page size for list operations.
pub const DEFAULT_LIMIT: u32 = 20;

/// Default sort key: newest first.
pub const DEFAULT_SORT: &str = "-created_at";

/// Sort fields accepted by list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    /// Column name for SQL ORDER BY. Only allowlisted names ever reach
    /// a query string.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }
}

/// A parsed sort key: field plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

impl SortKey {
    /// Parses a sort expression. A leading `-` means descending.
    /// Unknown fields fall back to the default (newest first).
    pub fn parse(s: &str) -> SortKey {
        let (descending, name) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let field = match name {
            "created_at" | "createdAt" => SortField::CreatedAt,
            "updated_at" | "updatedAt" => SortField::UpdatedAt,
            _ => {
                return SortKey {
                    field: SortField::CreatedAt,
                    descending: true,
                };
            }
        };
        SortKey { field, descending }
    }
}

/// Query parameters for paginated list operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageQuery {
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
    /// Sort expression, `-` prefix for descending.
    pub sort: String,
    /// Filter by lifecycle status name.
    pub status: Option<String>,
    /// Inclusive lower bound on creation time.
    pub from_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on creation time.
    pub to_date: Option<DateTime<Utc>>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
            sort: DEFAULT_SORT.to_string(),
            status: None,
            from_date: None,
            to_date: None,
        }
    }
}

impl PageQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = sort.into();
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn from_date(mut self, from: DateTime<Utc>) -> Self {
        self.from_date = Some(from);
        self
    }

    pub fn to_date(mut self, to: DateTime<Utc>) -> Self {
        self.to_date = Some(to);
        self
    }

    /// Number of records to skip for the requested page.
    pub fn offset(&self) -> u64 {
        (self.page.max(1) as u64 - 1) * self.limit.max(1) as u64
    }

    /// The parsed sort key.
    pub fn sort_key(&self) -> SortKey {
        SortKey::parse(&self.sort)
    }
}

/// One page of results plus the pagination envelope fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
}

impl<T> Page<T> {
    /// Builds a page from a slice of the full result set.
    pub fn new(items: Vec<T>, total: u64, query: &PageQuery) -> Self {
        let limit = query.limit.max(1);
        let pages = total.div_ceil(limit as u64) as u32;
        Self {
            items,
            total,
            page: query.page.max(1),
            limit,
            pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let query = PageQuery::default();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 20);
        assert_eq!(query.sort, "-created_at");
        assert!(query.status.is_none());
    }

    #[test]
    fn sort_key_parsing() {
        let key = SortKey::parse("-created_at");
        assert_eq!(key.field, SortField::CreatedAt);
        assert!(key.descending);

        let key = SortKey::parse("updated_at");
        assert_eq!(key.field, SortField::UpdatedAt);
        assert!(!key.descending);

        // camelCase from query strings is accepted
        let key = SortKey::parse("-createdAt");
        assert_eq!(key.field, SortField::CreatedAt);
        assert!(key.descending);

        // unknown fields fall back to newest first
        let key = SortKey::parse("price; DROP TABLE orders");
        assert_eq!(key.field, SortField::CreatedAt);
        assert!(key.descending);
    }

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(PageQuery::new().offset(), 0);
        assert_eq!(PageQuery::new().page(3).limit(10).offset(), 20);
    }

    #[test]
    fn page_count_rounds_up() {
        let query = PageQuery::new().limit(20);
        let page = Page::new(vec![1, 2, 3], 41, &query);
        assert_eq!(page.pages, 3);
        assert_eq!(page.total, 41);

        let empty: Page<i32> = Page::new(vec![], 0, &query);
        assert_eq!(empty.pages, 0);
    }
}
