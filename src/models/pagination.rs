// src/models/pagination.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 100;

// Query de paginação (?page=N&limit=M)
#[derive(Debug, Clone, Copy, Default, Deserialize, utoipa::IntoParams)]
pub struct PaginationQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PaginationQuery {
    pub fn page(&self) -> u32 {
        self.page.filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE)
    }

    pub fn limit(&self) -> u32 {
        self.limit
            .filter(|l| *l >= 1)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * i64::from(self.limit())
    }
}

// Envelope de resposta paginada
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, query: &PaginationQuery) -> Self {
        let page = query.page();
        let limit = query.limit();
        let has_next = i64::from(page) * i64::from(limit) < total;
        Self {
            items,
            total,
            page,
            limit,
            has_next,
            has_prev: page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_absent_or_zero() {
        let q = PaginationQuery { page: Some(0), limit: None };
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), 10);
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn limit_is_capped() {
        let q = PaginationQuery { page: Some(2), limit: Some(500) };
        assert_eq!(q.limit(), 100);
        assert_eq!(q.offset(), 100);
    }

    #[test]
    fn page_envelope_flags() {
        let q = PaginationQuery { page: Some(2), limit: Some(10) };
        let page = Page::new(vec![1, 2, 3], 23, &q);
        assert!(page.has_next);
        assert!(page.has_prev);

        let last = Page::new(vec![4], 23, &PaginationQuery { page: Some(3), limit: Some(10) });
        assert!(!last.has_next);
    }
}
