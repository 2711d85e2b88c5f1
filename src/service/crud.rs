//! Generic CRUD over any registered entity, with fixed error translation per operation.

use crate::config::ResolvedEntity;
use crate::error::{AppError, StoreError};
use crate::hooks::EntityHooks;
use crate::response::PagedResults;
use crate::service::{PageRequest, RuleValidator};
use crate::store::{Record, Store};
use serde_json::Value;

pub struct CrudService;

impl CrudService {
    /// One page plus the table's total row count. Any query failure is reported as not found.
    pub async fn list(
        store: &dyn Store,
        entity: &ResolvedEntity,
        page: &PageRequest,
    ) -> Result<PagedResults<Record>, AppError> {
        let rows = store
            .find_page(entity, &page.order, page.limit(), page.offset())
            .await
            .map_err(|e| collapse(entity, "list", e, |_| AppError::NotFound))?;
        let total = store
            .count(entity)
            .await
            .map_err(|e| collapse(entity, "count", e, |_| AppError::NotFound))?;
        Ok(PagedResults {
            page: page.page,
            page_size: page.page_size,
            data: rows,
            total_records: total,
        })
    }

    /// Fetch one row by key; a missing row and a failed query look the same.
    pub async fn read(store: &dyn Store, entity: &ResolvedEntity, id: &Value) -> Result<Record, AppError> {
        store
            .find_one(entity, id)
            .await
            .map_err(|e| collapse(entity, "read", e, |_| AppError::NotFound))?
            .ok_or(AppError::NotFound)
    }

    /// Run the create hooks and column rules, then insert. A failing `before_save` aborts.
    pub async fn create(
        store: &dyn Store,
        entity: &ResolvedEntity,
        hooks: &dyn EntityHooks,
        body: Value,
    ) -> Result<Record, AppError> {
        let mut record = body_to_record(entity, body)?;
        hooks.before_save(entity, &mut record)?;
        hooks.prepare(entity, &mut record);
        drop_defaulted_nulls(entity, &mut record);
        RuleValidator::validate(&record, entity)?;
        hooks.validate(entity, &record)?;
        store
            .insert(entity, &record)
            .await
            .map_err(|e| collapse(entity, "insert", e, |t| AppError::InsertFailed(format!("could not insert into {}", t))))
    }

    /// Merge `body` onto the stored row: present columns are overwritten, absent ones kept.
    pub async fn update(
        store: &dyn Store,
        entity: &ResolvedEntity,
        id: &Value,
        body: Value,
    ) -> Result<Record, AppError> {
        let mut changes = body_to_record(entity, body)?;
        changes.remove(&entity.primary_key);
        RuleValidator::validate_partial(&changes, entity)?;
        store
            .update(entity, id, &changes)
            .await
            .map_err(|e| collapse(entity, "update", e, |t| AppError::UpdateFailed(format!("could not update {}", t))))?
            .ok_or(AppError::NotFound)
    }

    /// Delete by key; returns rows affected, never zero.
    pub async fn delete(store: &dyn Store, entity: &ResolvedEntity, id: &Value) -> Result<u64, AppError> {
        let affected = store
            .delete(entity, id)
            .await
            .map_err(|e| collapse(entity, "delete", e, |t| AppError::DeleteFailed(format!("could not delete from {}", t))))?;
        if affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(affected)
    }
}

/// Body must be a JSON object; keys that are not columns are dropped.
fn body_to_record(entity: &ResolvedEntity, value: Value) -> Result<Record, AppError> {
    let Value::Object(map) = value else {
        return Err(AppError::BadParams("body must be a JSON object".into()));
    };
    let mut record = Record::new();
    for (k, v) in map {
        if entity.column(&k).is_some() {
            record.insert(k, v);
        } else {
            tracing::debug!(table = %entity.name, field = %k, "dropping unknown field");
        }
    }
    Ok(record)
}

/// An explicit null on a column the database or the insert fills itself means "use the default".
fn drop_defaulted_nulls(entity: &ResolvedEntity, record: &mut Record) {
    for c in &entity.columns {
        if (c.has_default || c.auto_timestamp.is_some()) && record.get(&c.name).is_some_and(Value::is_null) {
            record.remove(&c.name);
        }
    }
}

/// Log the store failure and map it to the operation's error kind. Undecodable rows are marshal failures.
fn collapse(
    entity: &ResolvedEntity,
    op: &'static str,
    err: StoreError,
    kind: impl FnOnce(&str) -> AppError,
) -> AppError {
    tracing::warn!(table = %entity.name, op, error = %err, "store failure");
    match err {
        StoreError::Decode { column, .. } => {
            AppError::MarshalFailed(format!("could not encode {}.{}", entity.name, column))
        }
        _ => kind(&entity.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnInfo;
    use crate::hooks::NoHooks;
    use crate::sql::OrderItem;
    use async_trait::async_trait;
    use serde_json::json;

    /// Every call fails with the configured error; deletes report zero rows when `fail` is false.
    struct BrokenStore {
        fail: bool,
        decode: bool,
    }

    impl BrokenStore {
        fn err(&self) -> StoreError {
            if self.decode {
                StoreError::Decode { column: "price".into(), reason: "bad".into() }
            } else {
                StoreError::Rejected("connection reset".into())
            }
        }
    }

    #[async_trait]
    impl Store for BrokenStore {
        async fn find_page(&self, _: &ResolvedEntity, _: &[OrderItem], _: u64, _: Option<u64>) -> Result<Vec<Record>, StoreError> {
            Err(self.err())
        }
        async fn count(&self, _: &ResolvedEntity) -> Result<u64, StoreError> {
            Err(self.err())
        }
        async fn find_one(&self, _: &ResolvedEntity, _: &Value) -> Result<Option<Record>, StoreError> {
            Err(self.err())
        }
        async fn insert(&self, _: &ResolvedEntity, _: &Record) -> Result<Record, StoreError> {
            Err(self.err())
        }
        async fn update(&self, _: &ResolvedEntity, _: &Value, _: &Record) -> Result<Option<Record>, StoreError> {
            Err(self.err())
        }
        async fn delete(&self, _: &ResolvedEntity, _: &Value) -> Result<u64, StoreError> {
            if self.fail {
                Err(self.err())
            } else {
                Ok(0)
            }
        }
        async fn ping(&self) -> Result<(), StoreError> {
            Err(self.err())
        }
    }

    fn items() -> ResolvedEntity {
        ResolvedEntity::new(
            "public",
            "items",
            "id",
            vec![
                ColumnInfo::new("id", "serial").not_null().with_default(),
                ColumnInfo::new("name", "text").not_null(),
            ],
        )
    }

    const BROKEN: BrokenStore = BrokenStore { fail: true, decode: false };

    #[tokio::test]
    async fn list_and_read_failures_collapse_to_not_found() {
        let page = PageRequest::new(1, 10, Vec::new()).unwrap();
        assert!(matches!(CrudService::list(&BROKEN, &items(), &page).await, Err(AppError::NotFound)));
        assert!(matches!(CrudService::read(&BROKEN, &items(), &json!(1)).await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn write_failures_keep_their_kind() {
        let e = items();
        let created = CrudService::create(&BROKEN, &e, &NoHooks, json!({"name": "x"})).await;
        assert!(matches!(created, Err(AppError::InsertFailed(_))));
        let updated = CrudService::update(&BROKEN, &e, &json!(1), json!({"name": "y"})).await;
        assert!(matches!(updated, Err(AppError::UpdateFailed(_))));
        let deleted = CrudService::delete(&BROKEN, &e, &json!(1)).await;
        assert!(matches!(deleted, Err(AppError::DeleteFailed(_))));
    }

    #[tokio::test]
    async fn delete_of_missing_row_is_not_found() {
        let store = BrokenStore { fail: false, decode: false };
        assert!(matches!(CrudService::delete(&store, &items(), &json!(9)).await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn undecodable_rows_are_marshal_failures() {
        let store = BrokenStore { fail: true, decode: true };
        let err = CrudService::read(&store, &items(), &json!(1)).await.unwrap_err();
        assert!(matches!(err, AppError::MarshalFailed(_)));
    }

    #[test]
    fn null_on_defaulted_columns_is_dropped() {
        let e = items();
        let mut record = match json!({"id": null, "name": null}) {
            Value::Object(m) => m,
            _ => unreachable!(),
        };
        drop_defaulted_nulls(&e, &mut record);
        assert!(!record.contains_key("id"));
        assert_eq!(record.get("name"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn null_on_not_null_column_is_bad_params_on_update() {
        let err = CrudService::update(&BROKEN, &items(), &json!(1), json!({"name": null})).await.unwrap_err();
        assert_eq!(err.to_string(), "bad params: name must not be null");
    }

    #[tokio::test]
    async fn create_validates_before_touching_the_store() {
        let err = CrudService::create(&BROKEN, &items(), &NoHooks, json!({"unknown": 1})).await.unwrap_err();
        assert_eq!(err.to_string(), "bad params: missing required fields: name");
        let err = CrudService::create(&BROKEN, &items(), &NoHooks, json!([1, 2])).await.unwrap_err();
        assert!(matches!(err, AppError::BadParams(_)));
    }
}
