//! Table bindings: the declarative mapping between a typed record and its
//! relation.
//!
//! Each entity declares its table name and entity columns once, via the
//! [`Record`] trait; row scanning reuses the `sqlx::FromRow` derive on the
//! same type. The primary key and the bookkeeping timestamps (`created_at`,
//! `updated_at`, `deleted_at`) are managed by the generic storage layer and
//! are deliberately absent from [`Record::COLUMNS`].

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Postgres, QueryBuilder};

/// Columns every table carries in addition to the entity columns.
pub(crate) const META_COLUMNS: &[&str] = &["id", "created_at", "updated_at", "deleted_at"];

/// A domain entity persisted through the generic storage façade.
///
/// The constants form the table binding; `values` must yield one value per
/// entry in `COLUMNS`, in the same order. The primary key is assigned by the
/// database on insert and never written back.
pub trait Record: for<'r> FromRow<'r, PgRow> + Send + Sync + Unpin {
    /// Table name this record type is bound to
    const TABLE: &'static str;

    /// Entity columns, excluding the primary key and bookkeeping timestamps
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> i64;

    fn set_id(&mut self, id: i64);

    /// Current entity column values, ordered like [`Record::COLUMNS`]
    fn values(&self) -> Vec<SqlValue>;

    /// Mark the record as freshly created (sets both timestamps)
    fn stamp_created(&mut self, at: DateTime<Utc>);

    /// Refresh the update timestamp
    fn stamp_updated(&mut self, at: DateTime<Utc>);
}

/// An owned, bindable SQL value.
///
/// Keeping values owned lets statement builders outlive the records they were
/// derived from, and gives filters a uniform parameter representation.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(i64),
    Text(String),
    OptText(Option<String>),
    Timestamp(DateTime<Utc>),
    OptTimestamp(Option<DateTime<Utc>>),
}

impl SqlValue {
    /// Append this value as a bind parameter
    pub(crate) fn push_bind(&self, builder: &mut QueryBuilder<'static, Postgres>) {
        match self {
            SqlValue::Int(v) => builder.push_bind(*v),
            SqlValue::Text(v) => builder.push_bind(v.clone()),
            SqlValue::OptText(v) => builder.push_bind(v.clone()),
            SqlValue::Timestamp(v) => builder.push_bind(*v),
            SqlValue::OptTimestamp(v) => builder.push_bind(*v),
        };
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<Option<String>> for SqlValue {
    fn from(v: Option<String>) -> Self {
        SqlValue::OptText(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(v)
    }
}

impl From<Option<DateTime<Utc>>> for SqlValue {
    fn from(v: Option<DateTime<Utc>>) -> Self {
        SqlValue::OptTimestamp(v)
    }
}
