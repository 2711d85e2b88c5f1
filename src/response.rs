//! Response bodies for list and discovery endpoints.

use crate::config::{ColumnInfo, ResolvedEntity};
use serde::Serialize;

/// List envelope: `{page, page_size, data, total_records}`.
#[derive(Debug, Serialize)]
pub struct PagedResults<T> {
    pub page: i64,
    pub page_size: i64,
    pub data: Vec<T>,
    pub total_records: u64,
}

/// One registered entity as reported by `GET /ddl`.
#[derive(Debug, Serialize)]
pub struct TableInfo {
    pub name: String,
    pub schema: String,
    pub path: String,
    pub crud_endpoint: String,
    pub primary_key: String,
    pub pk_type: &'static str,
    pub columns: Vec<ColumnMeta>,
}

#[derive(Debug, Serialize)]
pub struct ColumnMeta {
    pub name: String,
    pub db_type: String,
    /// JSON kind of the column in responses; `numeric` and other non-native types are `string`.
    pub json_type: &'static str,
    pub nullable: bool,
    pub primary_key: bool,
    pub has_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl TableInfo {
    /// `prefix` is the router mount point, prepended to the endpoint URL.
    pub fn from_entity(entity: &ResolvedEntity, prefix: &str) -> Self {
        TableInfo {
            name: entity.name.clone(),
            schema: entity.schema_name.clone(),
            path: entity.path_segment.clone(),
            crud_endpoint: format!("{}{}", prefix, entity.crud_endpoint()),
            primary_key: entity.primary_key.clone(),
            pk_type: entity.pk_type.as_str(),
            columns: entity.columns.iter().map(ColumnMeta::from).collect(),
        }
    }
}

impl From<&ColumnInfo> for ColumnMeta {
    fn from(c: &ColumnInfo) -> Self {
        ColumnMeta {
            name: c.name.clone(),
            db_type: c.db_type.clone(),
            json_type: c.json_type(),
            nullable: c.nullable,
            primary_key: c.primary_key,
            has_default: c.has_default,
            default: c.default.clone(),
        }
    }
}
