//! Parameterized statement construction for a known dialect (PostgreSQL).
//!
//! These builders translate a table binding plus record values or a
//! [`Filter`] into SQL fragments with bind parameters. No SQL is parsed and
//! no planning happens here; everything is assembled from the column metadata
//! the [`Record`] types declare.

use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};

use crate::db::errors::{DbError, Result};
use crate::db::filter::{Filter, Operator};
use crate::db::record::{META_COLUMNS, Record};

/// Check that every filtered column exists on the bound table.
///
/// Referencing an unknown column is a programmer error; it fails here, at
/// call time, instead of being silently dropped from the predicate.
fn validate<R: Record>(filter: &Filter) -> Result<()> {
    for condition in &filter.conditions {
        let known = R::COLUMNS.contains(&condition.column.as_str()) || META_COLUMNS.contains(&condition.column.as_str());
        if !known {
            return Err(DbError::UnknownColumn {
                table: R::TABLE,
                column: condition.column.clone(),
            });
        }
    }
    Ok(())
}

/// `SELECT * FROM <table> WHERE <soft-delete predicate> AND <conditions>
/// ORDER BY id DESC [LIMIT/OFFSET]`
///
/// The pagination clauses are appended only when the filter carries both a
/// nonzero page and limit; otherwise the full result is returned.
pub(crate) fn select<R: Record>(filter: &Filter) -> Result<QueryBuilder<'static, Postgres>> {
    validate::<R>(filter)?;

    let mut builder = QueryBuilder::new(format!(r#"SELECT * FROM "{}" WHERE "#, R::TABLE));
    if filter.include_deleted {
        builder.push("TRUE");
    } else {
        builder.push(r#""deleted_at" IS NULL"#);
    }

    for condition in &filter.conditions {
        builder.push(format!(r#" AND "{}" "#, condition.column));
        match condition.operator {
            Operator::Eq => builder.push("= "),
            Operator::ILike => builder.push("ILIKE "),
        };
        condition.value.push_bind(&mut builder);
    }

    builder.push(r#" ORDER BY "id" DESC"#);
    if filter.is_paginated() {
        builder.push(" LIMIT ");
        builder.push_bind(filter.limit);
        builder.push(" OFFSET ");
        builder.push_bind((filter.page - 1) * filter.limit);
    }

    Ok(builder)
}

/// `INSERT INTO <table> (<columns>, created_at, updated_at) VALUES (...)
/// RETURNING id`
///
/// The primary key is omitted (database-generated); both timestamps are set
/// to `now`.
pub(crate) fn insert<R: Record>(record: &R, now: DateTime<Utc>) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!(r#"INSERT INTO "{}" ("#, R::TABLE));
    for (i, column) in R::COLUMNS.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder.push(format!(r#""{column}""#));
    }
    builder.push(r#", "created_at", "updated_at") VALUES ("#);

    for (i, value) in record.values().iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        value.push_bind(&mut builder);
    }
    builder.push(", ");
    builder.push_bind(now);
    builder.push(", ");
    builder.push_bind(now);
    builder.push(r#") RETURNING "id""#);

    builder
}

/// `UPDATE <table> SET <columns>, updated_at = ... WHERE id = ... AND
/// deleted_at IS NULL`
///
/// Keyed by primary key and restricted to live rows, so updating a
/// soft-deleted record affects zero rows.
pub(crate) fn update<R: Record>(record: &R, now: DateTime<Utc>) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!(r#"UPDATE "{}" SET "#, R::TABLE));
    for (column, value) in R::COLUMNS.iter().zip(record.values()) {
        builder.push(format!(r#""{column}" = "#));
        value.push_bind(&mut builder);
        builder.push(", ");
    }
    builder.push(r#""updated_at" = "#);
    builder.push_bind(now);
    builder.push(r#" WHERE "id" = "#);
    builder.push_bind(record.id());
    builder.push(r#" AND "deleted_at" IS NULL"#);

    builder
}

/// Soft delete: set the delete timestamp instead of removing the row
pub(crate) fn soft_delete<R: Record>(id: i64, now: DateTime<Utc>) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!(r#"UPDATE "{}" SET "deleted_at" = "#, R::TABLE));
    builder.push_bind(now);
    builder.push(r#", "updated_at" = "#);
    builder.push_bind(now);
    builder.push(r#" WHERE "id" = "#);
    builder.push_bind(id);
    builder.push(r#" AND "deleted_at" IS NULL"#);

    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::products::Product;

    fn sample_product() -> Product {
        Product {
            id: 0,
            name: "plain tee".to_string(),
            qty: 5,
            price: 12000,
            created_at: Utc::now(),
            updated_at: None,
            deleted_at: None,
        }
    }

    #[test]
    fn select_applies_soft_delete_predicate_by_default() {
        let builder = select::<Product>(&Filter::new()).unwrap();
        assert_eq!(builder.sql(), r#"SELECT * FROM "products" WHERE "deleted_at" IS NULL ORDER BY "id" DESC"#);
    }

    #[test]
    fn select_can_include_deleted_rows() {
        let builder = select::<Product>(&Filter::new().include_deleted()).unwrap();
        assert_eq!(builder.sql(), r#"SELECT * FROM "products" WHERE TRUE ORDER BY "id" DESC"#);
    }

    #[test]
    fn select_renders_conditions_and_pagination() {
        let filter = Filter::new().eq("id", 3).ilike("name", "%tee%").paginate(2, 10);
        let builder = select::<Product>(&filter).unwrap();
        assert_eq!(
            builder.sql(),
            r#"SELECT * FROM "products" WHERE "deleted_at" IS NULL AND "id" = $1 AND "name" ILIKE $2 ORDER BY "id" DESC LIMIT $3 OFFSET $4"#
        );
    }

    #[test]
    fn select_omits_pagination_unless_both_values_set() {
        let builder = select::<Product>(&Filter::new().paginate(2, 0)).unwrap();
        assert!(!builder.sql().contains("LIMIT"));

        let builder = select::<Product>(&Filter::new().paginate(0, 10)).unwrap();
        assert!(!builder.sql().contains("LIMIT"));
    }

    #[test]
    fn select_rejects_unknown_columns() {
        let err = match select::<Product>(&Filter::new().eq("colour", "red")) {
            Err(err) => err,
            Ok(_) => panic!("expected an error for an unknown column"),
        };
        match err {
            DbError::UnknownColumn { table, column } => {
                assert_eq!(table, "products");
                assert_eq!(column, "colour");
            }
            other => panic!("expected UnknownColumn, got {other:?}"),
        }
    }

    #[test]
    fn insert_omits_primary_key_and_returns_id() {
        let builder = insert(&sample_product(), Utc::now());
        assert_eq!(
            builder.sql(),
            r#"INSERT INTO "products" ("name", "qty", "price", "created_at", "updated_at") VALUES ($1, $2, $3, $4, $5) RETURNING "id""#
        );
    }

    #[test]
    fn update_is_keyed_by_id_and_skips_deleted_rows() {
        let builder = update(&sample_product(), Utc::now());
        assert_eq!(
            builder.sql(),
            r#"UPDATE "products" SET "name" = $1, "qty" = $2, "price" = $3, "updated_at" = $4 WHERE "id" = $5 AND "deleted_at" IS NULL"#
        );
    }

    #[test]
    fn delete_only_marks_the_row() {
        let builder = soft_delete::<Product>(9, Utc::now());
        assert_eq!(
            builder.sql(),
            r#"UPDATE "products" SET "deleted_at" = $1, "updated_at" = $2 WHERE "id" = $3 AND "deleted_at" IS NULL"#
        );
    }
}
