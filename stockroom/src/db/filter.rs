//! Query filters: partially built WHERE predicates.
//!
//! A filter is a conjunction of named conditions plus pagination. Every read
//! is implicitly conjoined with "soft-delete timestamp is absent" unless the
//! caller explicitly opts into deleted rows.

use crate::db::record::SqlValue;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Operator {
    Eq,
    ILike,
}

#[derive(Debug, Clone)]
pub(crate) struct Condition {
    pub(crate) column: String,
    pub(crate) operator: Operator,
    pub(crate) value: SqlValue,
}

/// A conjunction of column conditions with optional pagination.
///
/// Pagination is page-based and only applied when both `page` and `limit` are
/// nonzero; otherwise the query returns the full result, which callers use to
/// compute total counts.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub(crate) conditions: Vec<Condition>,
    pub(crate) include_deleted: bool,
    pub(crate) page: i64,
    pub(crate) limit: i64,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality condition
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.conditions.push(Condition {
            column: column.into(),
            operator: Operator::Eq,
            value: value.into(),
        });
        self
    }

    /// Add a case-insensitive pattern condition (`ILIKE`)
    pub fn ilike(mut self, column: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.conditions.push(Condition {
            column: column.into(),
            operator: Operator::ILike,
            value: SqlValue::Text(pattern.into()),
        });
        self
    }

    /// Also return soft-deleted rows
    pub fn include_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    /// Request a page of results. Both values must be positive for the
    /// pagination clauses to be emitted; zero or negative values disable
    /// pagination.
    pub fn paginate(mut self, page: i64, limit: i64) -> Self {
        self.page = page.max(0);
        self.limit = limit.max(0);
        self
    }

    pub fn is_paginated(&self) -> bool {
        self.page != 0 && self.limit != 0
    }
}
