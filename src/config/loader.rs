//! Build entities from an entity file or from the database catalog.

use crate::config::resolved::{ColumnInfo, ResolvedEntity};
use crate::config::types::*;
use crate::config::Settings;
use crate::error::ConfigError;
use sqlx::PgPool;
use std::collections::BTreeMap;
use std::path::Path;

/// Turn the raw entity file into resolved entities. Tables without `schema` use `default_schema`.
pub fn resolve(file: &EntityFile, default_schema: &str) -> Result<Vec<ResolvedEntity>, ConfigError> {
    let mut out = Vec::with_capacity(file.entities.len());
    for e in &file.entities {
        if !e.columns.iter().any(|c| c.name == e.primary_key) {
            return Err(ConfigError::InvalidPrimaryKey {
                table: e.table.clone(),
                column: e.primary_key.clone(),
            });
        }
        let columns = e
            .columns
            .iter()
            .map(|c| {
                let mut col = ColumnInfo::new(&c.name, &c.type_);
                col.nullable = c.nullable;
                col.default = c.default.as_ref().map(ColumnDefaultConfig::sql);
                col.has_default = col.default.is_some() || is_serial(&c.type_);
                col
            })
            .collect();
        let schema = e.schema.as_deref().unwrap_or(default_schema);
        let mut entity = ResolvedEntity::new(schema, &e.table, &e.primary_key, columns)
            .with_validation(e.validation.clone());
        if let Some(path) = &e.path {
            entity = entity.with_path(path);
        }
        out.push(entity);
    }
    Ok(out)
}

fn is_serial(db_type: &str) -> bool {
    db_type.trim().to_lowercase().ends_with("serial")
}

/// Read and parse the JSON entity file.
pub async fn load_from_path(path: impl AsRef<Path>) -> Result<EntityFile, ConfigError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))
}

/// Entities for the server: from `settings.entities_path` when set, else introspected from `settings.db_schema`.
pub async fn load_entities(pool: &PgPool, settings: &Settings) -> Result<Vec<ResolvedEntity>, ConfigError> {
    match &settings.entities_path {
        Some(path) => {
            let file = load_from_path(path).await?;
            resolve(&file, &settings.db_schema)
        }
        None => introspect(pool, &settings.db_schema).await,
    }
}

/// Every base table of `schema` with a single-column primary key, read from `information_schema`.
/// Tables without a key or with a composite key are skipped.
pub async fn introspect(pool: &PgPool, schema: &str) -> Result<Vec<ResolvedEntity>, ConfigError> {
    let columns_sql = r#"
        SELECT c.table_name::text, c.column_name::text, c.data_type::text, c.udt_schema::text,
               c.udt_name::text, c.is_nullable::text, c.column_default::text,
               (c.column_default IS NOT NULL OR c.is_identity::text = 'YES') AS has_default
        FROM information_schema.columns c
        JOIN information_schema.tables t
          ON t.table_schema = c.table_schema AND t.table_name = c.table_name
        WHERE c.table_schema = $1 AND t.table_type = 'BASE TABLE'
        ORDER BY c.table_name, c.ordinal_position
    "#;
    tracing::debug!(sql = %columns_sql, schema = %schema, "query");
    let rows = sqlx::query_as::<_, (String, String, String, String, String, String, Option<String>, bool)>(columns_sql)
        .bind(schema)
        .fetch_all(pool)
        .await
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let keys_sql = r#"
        SELECT tc.table_name::text, kcu.column_name::text
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
          ON kcu.constraint_name = tc.constraint_name
         AND kcu.table_schema = tc.table_schema
         AND kcu.table_name = tc.table_name
        WHERE tc.table_schema = $1 AND tc.constraint_type = 'PRIMARY KEY'
        ORDER BY tc.table_name, kcu.ordinal_position
    "#;
    tracing::debug!(sql = %keys_sql, schema = %schema, "query");
    let key_rows = sqlx::query_as::<_, (String, String)>(keys_sql)
        .bind(schema)
        .fetch_all(pool)
        .await
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let mut columns_by_table: BTreeMap<String, Vec<ColumnInfo>> = BTreeMap::new();
    for (table, column, data_type, udt_schema, udt_name, is_nullable, default, has_default) in rows {
        let db_type = match data_type.as_str() {
            "USER-DEFINED" => format!("{}.{}", udt_schema, udt_name),
            "ARRAY" => udt_name,
            _ => data_type,
        };
        let mut col = ColumnInfo::new(column, db_type);
        col.nullable = is_nullable.eq_ignore_ascii_case("YES");
        col.has_default = has_default;
        col.default = default;
        columns_by_table.entry(table).or_default().push(col);
    }

    let mut keys_by_table: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (table, column) in key_rows {
        keys_by_table.entry(table).or_default().push(column);
    }

    Ok(entities_from_catalog(schema, columns_by_table, &keys_by_table))
}

fn entities_from_catalog(
    schema: &str,
    columns_by_table: BTreeMap<String, Vec<ColumnInfo>>,
    keys_by_table: &BTreeMap<String, Vec<String>>,
) -> Vec<ResolvedEntity> {
    let mut out = Vec::new();
    for (table, columns) in columns_by_table {
        match keys_by_table.get(&table).map(Vec::as_slice) {
            Some([pk]) => out.push(ResolvedEntity::new(schema, &table, pk, columns)),
            Some(keys) => {
                tracing::warn!(table = %table, keys = ?keys, "composite primary key, skipping");
            }
            None => {
                tracing::warn!(table = %table, "no primary key, skipping");
            }
        }
    }
    out
}
