//! Storage seam: raw row access per entity. Error translation happens in the CRUD service.

mod postgres;

pub use postgres::PgStore;

use crate::config::ResolvedEntity;
use crate::error::StoreError;
use crate::sql::OrderItem;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// A row as a JSON object keyed by column name.
pub type Record = Map<String, Value>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Rows ordered by `order` (primary key when empty), at most `limit`, skipping `offset`.
    async fn find_page(
        &self,
        entity: &ResolvedEntity,
        order: &[OrderItem],
        limit: u64,
        offset: Option<u64>,
    ) -> Result<Vec<Record>, StoreError>;

    async fn count(&self, entity: &ResolvedEntity) -> Result<u64, StoreError>;

    async fn find_one(&self, entity: &ResolvedEntity, id: &Value) -> Result<Option<Record>, StoreError>;

    /// Insert and return the stored row, defaults included.
    async fn insert(&self, entity: &ResolvedEntity, record: &Record) -> Result<Record, StoreError>;

    /// Overwrite the columns in `changes` in one statement. `None` when no row has `id`.
    async fn update(
        &self,
        entity: &ResolvedEntity,
        id: &Value,
        changes: &Record,
    ) -> Result<Option<Record>, StoreError>;

    /// Rows affected.
    async fn delete(&self, entity: &ResolvedEntity, id: &Value) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
