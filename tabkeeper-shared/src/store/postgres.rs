/// PostgreSQL storage backend
///
/// Statements are assembled with `sqlx::QueryBuilder`. Table and column names come from
/// [`Entity`] constants; every value is a bound parameter.
///
/// | Condition | SQL |
/// |---|---|
/// | `Eq` / `Gte` / `Lte` / `Lt` | `col = $n` / `>=` / `<=` / `<` |
/// | `IsNull` / `IsNotNull` | `col IS NULL` / `col IS NOT NULL` |
/// | `AnyOf` | `col = ANY($n)` |
/// | `OnDate` | `(col AT TIME ZONE 'UTC')::date = $n` |

use super::{Store, StoreError};
use crate::{
    db::pool::health_check,
    models::Entity,
    query::{Condition, Filter, SqlValue},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn push_value(builder: &mut QueryBuilder<'_, Postgres>, value: SqlValue) {
    match value {
        SqlValue::Int(v) => builder.push_bind(v),
        SqlValue::Float(v) => builder.push_bind(v),
        SqlValue::Text(v) => builder.push_bind(v),
        SqlValue::Date(v) => builder.push_bind(v),
        SqlValue::Timestamp(v) => builder.push_bind(v),
        SqlValue::NullTimestamp => builder.push_bind(None::<DateTime<Utc>>),
    };
}

fn push_condition(builder: &mut QueryBuilder<'_, Postgres>, condition: &Condition) {
    match condition {
        Condition::Eq(column, value) => {
            builder.push(column).push(" = ");
            push_value(builder, value.clone());
        }
        Condition::Gte(column, value) => {
            builder.push(column).push(" >= ");
            push_value(builder, value.clone());
        }
        Condition::Lte(column, value) => {
            builder.push(column).push(" <= ");
            push_value(builder, value.clone());
        }
        Condition::Lt(column, value) => {
            builder.push(column).push(" < ");
            push_value(builder, value.clone());
        }
        Condition::IsNull(column) => {
            builder.push(column).push(" IS NULL");
        }
        Condition::IsNotNull(column) => {
            builder.push(column).push(" IS NOT NULL");
        }
        Condition::AnyOf(column, ids) => {
            builder
                .push(column)
                .push(" = ANY(")
                .push_bind(ids.clone())
                .push(")");
        }
        Condition::OnDate(column, date) => {
            builder
                .push("(")
                .push(column)
                .push(" AT TIME ZONE 'UTC')::date = ")
                .push_bind(*date);
        }
    }
}

/// Appends ` WHERE c1 AND c2 ...` (nothing for an empty filter)
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    for (i, condition) in filter.conditions().iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        push_condition(builder, condition);
    }
}

/// `SELECT * FROM table [WHERE ...] ORDER BY id`
pub fn select_query<E: Entity>(filter: &Filter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT * FROM ");
    builder.push(E::TABLE);
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY ").push(E::ID_COLUMN);
    builder
}

/// `INSERT INTO table (cols) VALUES (...) RETURNING *`
pub fn insert_query<E: Entity>(record: &E) -> QueryBuilder<'static, Postgres> {
    let columns = record.columns();

    let mut builder = QueryBuilder::new("INSERT INTO ");
    builder.push(E::TABLE).push(" (");
    for (i, (column, _)) in columns.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder.push(column);
    }
    builder.push(") VALUES (");
    for (i, (_, value)) in columns.into_iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        push_value(&mut builder, value);
    }
    builder.push(") RETURNING *");
    builder
}

/// `UPDATE table SET col = $n, ... WHERE id = $m RETURNING *`
pub fn update_query<E: Entity>(record: &E) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("UPDATE ");
    builder.push(E::TABLE).push(" SET ");
    for (i, (column, value)) in record.columns().into_iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder.push(column).push(" = ");
        push_value(&mut builder, value);
    }
    builder
        .push(" WHERE ")
        .push(E::ID_COLUMN)
        .push(" = ")
        .push_bind(record.id())
        .push(" RETURNING *");
    builder
}

#[async_trait]
impl Store for PgStore {
    async fn select<E: Entity>(&self, filter: &Filter) -> Result<Vec<E>, StoreError> {
        debug!(
            table = E::TABLE,
            conditions = filter.conditions().len(),
            "Selecting records"
        );

        let mut builder = select_query::<E>(filter);
        let records = builder.build_query_as::<E>().fetch_all(&self.pool).await?;

        Ok(records)
    }

    async fn insert<E: Entity>(&self, record: E) -> Result<E, StoreError> {
        debug!(table = E::TABLE, "Inserting record");

        let mut builder = insert_query(&record);
        builder
            .build_query_as::<E>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::from_write(E::TABLE, e))
    }

    async fn update<E: Entity>(&self, record: E) -> Result<Option<E>, StoreError> {
        debug!(table = E::TABLE, id = record.id(), "Updating record");

        let mut builder = update_query(&record);
        builder
            .build_query_as::<E>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::from_write(E::TABLE, e))
    }

    async fn delete<E: Entity>(&self, id: i64) -> Result<bool, StoreError> {
        debug!(table = E::TABLE, id, "Deleting record");

        let mut builder = QueryBuilder::<Postgres>::new("DELETE FROM ");
        builder
            .push(E::TABLE)
            .push(" WHERE ")
            .push(E::ID_COLUMN)
            .push(" = ")
            .push_bind(id);

        let result = builder.build().execute(&self.pool).await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        health_check(&self.pool).await?;
        Ok(())
    }
}
