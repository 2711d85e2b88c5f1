//! Shared fixtures: an in-memory `Store`, a small registry and request helpers.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tablerest::config::{AutoTimestamp, ValidationRule};
use tablerest::sql::OrderItem;
use tablerest::{
    app_router, AppState, ColumnInfo, Hooks, Record, Registry, ResolvedEntity, Store, StoreError,
};
use tower::ServiceExt;

pub const NOW: &str = "2024-05-01T12:00:00";

#[derive(Default)]
struct Table {
    rows: BTreeMap<String, Record>,
    next_id: i64,
}

/// Rows per table in memory. Mirrors what PostgreSQL would do for the fixture tables:
/// serial keys, `NOW()` timestamps, unknown order columns rejected.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Table>>,
}

fn key(v: &Value) -> String {
    v.to_string()
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        _ => a.to_string().cmp(&b.to_string()),
    }
}

impl MemoryStore {
    pub fn row_count(&self, table: &str) -> usize {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .map(|t| t.rows.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_page(
        &self,
        entity: &ResolvedEntity,
        order: &[OrderItem],
        limit: u64,
        offset: Option<u64>,
    ) -> Result<Vec<Record>, StoreError> {
        for o in order {
            if entity.column(&o.column).is_none() {
                return Err(StoreError::Rejected(format!("column \"{}\" does not exist", o.column)));
            }
        }
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<Record> = tables
            .get(&entity.name)
            .map(|t| t.rows.values().cloned().collect())
            .unwrap_or_default();
        let default_order = [OrderItem {
            column: entity.primary_key.clone(),
            descending: false,
        }];
        let order = if order.is_empty() { &default_order[..] } else { order };
        rows.sort_by(|a, b| {
            for o in order {
                let ord = compare(&a[&o.column], &b[&o.column]);
                let ord = if o.descending { ord.reverse() } else { ord };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
        Ok(rows
            .into_iter()
            .skip(offset.unwrap_or(0) as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self, entity: &ResolvedEntity) -> Result<u64, StoreError> {
        Ok(self.row_count(&entity.name) as u64)
    }

    async fn find_one(&self, entity: &ResolvedEntity, id: &Value) -> Result<Option<Record>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.get(&entity.name).and_then(|t| t.rows.get(&key(id)).cloned()))
    }

    async fn insert(&self, entity: &ResolvedEntity, record: &Record) -> Result<Record, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let table = tables.entry(entity.name.clone()).or_default();
        let mut row = Record::new();
        for c in &entity.columns {
            let value = match record.get(&c.name) {
                Some(v) => v.clone(),
                None if c.primary_key && c.has_default => {
                    table.next_id += 1;
                    json!(table.next_id)
                }
                None if c.auto_timestamp.is_some() => json!(NOW),
                None => Value::Null,
            };
            if !c.nullable && value.is_null() {
                return Err(StoreError::Rejected(format!("null value in column \"{}\"", c.name)));
            }
            row.insert(c.name.clone(), value);
        }
        let k = key(&row[&entity.primary_key]);
        if table.rows.contains_key(&k) {
            return Err(StoreError::Rejected("duplicate key".into()));
        }
        if let Some(n) = row[&entity.primary_key].as_i64() {
            table.next_id = table.next_id.max(n);
        }
        table.rows.insert(k, row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        entity: &ResolvedEntity,
        id: &Value,
        changes: &Record,
    ) -> Result<Option<Record>, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let Some(row) = tables.get_mut(&entity.name).and_then(|t| t.rows.get_mut(&key(id))) else {
            return Ok(None);
        };
        if changes.is_empty() {
            return Ok(Some(row.clone()));
        }
        for c in &entity.columns {
            if c.primary_key {
                continue;
            }
            if let Some(v) = changes.get(&c.name) {
                row.insert(c.name.clone(), v.clone());
            } else if c.auto_timestamp == Some(AutoTimestamp::Updated) {
                row.insert(c.name.clone(), json!("2024-05-02T08:30:00"));
            }
        }
        Ok(Some(row.clone()))
    }

    async fn delete(&self, entity: &ResolvedEntity, id: &Value) -> Result<u64, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let removed = tables
            .get_mut(&entity.name)
            .and_then(|t| t.rows.remove(&key(id)))
            .is_some();
        Ok(removed as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

pub fn addresses() -> ResolvedEntity {
    let mut rules = HashMap::new();
    rules.insert(
        "zip".to_string(),
        ValidationRule {
            max_length: Some(10),
            ..Default::default()
        },
    );
    ResolvedEntity::new(
        "public",
        "addresses",
        "id",
        vec![
            ColumnInfo::new("id", "bigserial").not_null().with_default(),
            ColumnInfo::new("street", "character varying").not_null(),
            ColumnInfo::new("city", "character varying"),
            ColumnInfo::new("zip", "character varying"),
            ColumnInfo::new("created_at", "timestamp without time zone").not_null(),
            ColumnInfo::new("updated_at", "timestamp without time zone").not_null(),
        ],
    )
    .with_validation(rules)
}

pub fn schema_migrations() -> ResolvedEntity {
    ResolvedEntity::new(
        "public",
        "schema_migrations",
        "version",
        vec![ColumnInfo::new("version", "character varying").not_null()],
    )
}

pub fn users() -> ResolvedEntity {
    ResolvedEntity::new(
        "public",
        "users",
        "id",
        vec![
            ColumnInfo::new("id", "serial").not_null().with_default(),
            ColumnInfo::new("email", "text").not_null(),
            ColumnInfo::new("name", "text"),
        ],
    )
    .with_path("people")
}

pub fn registry() -> Registry {
    Registry::builder()
        .entity(addresses())
        .entity(schema_migrations())
        .entity(users())
        .build()
        .unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

pub fn app() -> TestApp {
    app_with(registry(), Hooks::default(), |s| s)
}

pub fn app_with(registry: Registry, hooks: Hooks, configure: impl FnOnce(AppState) -> AppState) -> TestApp {
    let store = Arc::new(MemoryStore::default());
    let state = configure(AppState::new(store.clone(), registry, hooks));
    TestApp {
        router: app_router(state, 64 * 1024),
        store,
    }
}

impl TestApp {
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send_with_headers(method, uri, body, &[]).await
    }

    pub async fn send_with_headers(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        for (k, v) in headers {
            req = req.header(*k, *v);
        }
        let req = match body {
            Some(b) => req
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, value)
    }

    /// Create `n` addresses with streets `street-01`..`street-n` and return their ids.
    pub async fn seed_addresses(&self, n: usize) -> Vec<i64> {
        let mut ids = Vec::with_capacity(n);
        for i in 1..=n {
            let (status, body) = self
                .send("POST", "/addresses", Some(json!({"street": format!("street-{:02}", i), "city": "Oslo"})))
                .await;
            assert_eq!(status, StatusCode::OK, "{}", body);
            ids.push(body["id"].as_i64().unwrap());
        }
        ids
    }
}
