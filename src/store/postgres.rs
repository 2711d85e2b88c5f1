//! PostgreSQL store over a shared `PgPool`.

use crate::config::ResolvedEntity;
use crate::error::StoreError;
use crate::sql::{self, OrderItem, QueryBuf};
use crate::store::{Record, Store};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::PgPool;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn bind_all<'q>(
        q: &'q QueryBuf,
    ) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        query
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<Record>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = Self::bind_all(q).fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_record).transpose()
    }

    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Record>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = Self::bind_all(q).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_record).collect()
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_page(
        &self,
        entity: &ResolvedEntity,
        order: &[OrderItem],
        limit: u64,
        offset: Option<u64>,
    ) -> Result<Vec<Record>, StoreError> {
        let q = sql::select_page(entity, order, limit, offset);
        self.fetch_all(&q).await
    }

    async fn count(&self, entity: &ResolvedEntity) -> Result<u64, StoreError> {
        let q = sql::count_all(entity);
        tracing::debug!(sql = %q.sql, "query");
        let n: i64 = sqlx::query_scalar(&q.sql).fetch_one(&self.pool).await?;
        Ok(n.max(0) as u64)
    }

    async fn find_one(&self, entity: &ResolvedEntity, id: &Value) -> Result<Option<Record>, StoreError> {
        let q = sql::select_by_id(entity, id);
        self.fetch_optional(&q).await
    }

    async fn insert(&self, entity: &ResolvedEntity, record: &Record) -> Result<Record, StoreError> {
        let q = sql::insert(entity, record);
        self.fetch_optional(&q)
            .await?
            .ok_or_else(|| StoreError::Rejected("insert returned no row".into()))
    }

    async fn update(
        &self,
        entity: &ResolvedEntity,
        id: &Value,
        changes: &Record,
    ) -> Result<Option<Record>, StoreError> {
        let q = sql::update(entity, id, changes);
        self.fetch_optional(&q).await
    }

    async fn delete(&self, entity: &ResolvedEntity, id: &Value) -> Result<u64, StoreError> {
        let q = sql::delete(entity, id);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let result = Self::bind_all(&q).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

fn row_to_record(row: &PgRow) -> Result<Record, StoreError> {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = Record::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name)?);
    }
    Ok(map)
}

fn cell_to_value(row: &PgRow, name: &str) -> Result<Value, StoreError> {
    use sqlx::Row;
    use sqlx::ValueRef;
    let raw = row.try_get_raw(name)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    if let Ok(n) = row.try_get::<i16, _>(name) {
        return Ok(Value::Number(n.into()));
    }
    if let Ok(n) = row.try_get::<i32, _>(name) {
        return Ok(Value::Number(n.into()));
    }
    if let Ok(n) = row.try_get::<i64, _>(name) {
        return Ok(Value::Number(n.into()));
    }
    if let Ok(n) = row.try_get::<f32, _>(name) {
        return Ok(float_value(n as f64));
    }
    if let Ok(n) = row.try_get::<f64, _>(name) {
        return Ok(float_value(n));
    }
    if let Ok(b) = row.try_get::<bool, _>(name) {
        return Ok(Value::Bool(b));
    }
    if let Ok(u) = row.try_get::<uuid::Uuid, _>(name) {
        return Ok(Value::String(u.to_string()));
    }
    if let Ok(d) = row.try_get::<chrono::DateTime<chrono::Utc>, _>(name) {
        return Ok(Value::String(d.to_rfc3339()));
    }
    if let Ok(d) = row.try_get::<chrono::NaiveDateTime, _>(name) {
        return Ok(Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string()));
    }
    if let Ok(d) = row.try_get::<chrono::NaiveDate, _>(name) {
        return Ok(Value::String(d.format("%Y-%m-%d").to_string()));
    }
    if let Ok(s) = row.try_get::<String, _>(name) {
        return Ok(Value::String(s));
    }
    if let Ok(j) = row.try_get::<Value, _>(name) {
        return Ok(j);
    }
    Err(StoreError::Decode {
        column: name.to_string(),
        reason: "unsupported column type".into(),
    })
}

/// NaN and infinities have no JSON form.
fn float_value(n: f64) -> Value {
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
