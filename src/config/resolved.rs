//! Resolved entity model: validated and flattened for runtime use.

use crate::config::{validate, ValidationRule};
use crate::error::ConfigError;
use crate::hooks::{EntityHooks, NoHooks};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Primary key type for parsing path ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PkType {
    Int,
    Text,
    Uuid,
}

impl PkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PkType::Int => "int",
            PkType::Text => "text",
            PkType::Uuid => "uuid",
        }
    }
}

/// Timestamp columns filled with `NOW()` when the request does not set them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AutoTimestamp {
    Created,
    Updated,
}

#[derive(Clone, Debug)]
pub struct ColumnInfo {
    pub name: String,
    /// Type as declared in config or reported by the database.
    pub db_type: String,
    /// Canonical PostgreSQL type used for placeholder casts.
    pub pg_type: String,
    pub nullable: bool,
    /// Whether the column has a DB default (e.g. nextval(), gen_random_uuid()).
    pub has_default: bool,
    /// Default as declared (literal or SQL expression), when known.
    pub default: Option<String>,
    pub primary_key: bool,
    pub auto_timestamp: Option<AutoTimestamp>,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, db_type: impl Into<String>) -> Self {
        let name = name.into();
        let db_type = db_type.into();
        let pg_type = canonical_pg_type(&db_type);
        let auto_timestamp = auto_timestamp_for(&name, &pg_type);
        ColumnInfo {
            name,
            db_type,
            pg_type,
            nullable: true,
            has_default: false,
            default: None,
            primary_key: false,
            auto_timestamp,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    pub fn is_json(&self) -> bool {
        matches!(self.pg_type.as_str(), "json" | "jsonb")
    }

    /// JSON kind of this column's values in responses. Columns that are not decoded natively
    /// (`numeric`, enums, ...) come back as strings so no precision is lost.
    pub fn json_type(&self) -> &'static str {
        match self.pg_type.as_str() {
            "smallint" | "integer" | "bigint" => "integer",
            "real" | "double precision" | "float4" | "float8" => "number",
            "boolean" | "bool" => "boolean",
            "json" | "jsonb" => "json",
            _ => "string",
        }
    }

    /// Required on create: no value can be supplied by the database or by us.
    pub fn is_required(&self) -> bool {
        !self.nullable && !self.has_default && self.auto_timestamp.is_none()
    }

    /// Whether sqlx can decode this column directly; others are selected as `::text`.
    pub fn decodes_natively(&self) -> bool {
        let t = self.pg_type.as_str();
        matches!(
            t,
            "smallint" | "integer" | "bigint" | "real" | "double precision" | "float4" | "float8" | "boolean"
                | "bool" | "uuid" | "timestamptz" | "timestamp" | "date" | "text" | "json" | "jsonb"
        ) || t.starts_with("varchar")
            || t.starts_with("character varying")
            || t.starts_with("char")
            || t.starts_with("character")
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedEntity {
    /// Table name.
    pub name: String,
    pub schema_name: String,
    pub path_segment: String,
    pub primary_key: String,
    pub pk_type: PkType,
    pub columns: Vec<ColumnInfo>,
    pub validation: HashMap<String, ValidationRule>,
}

impl ResolvedEntity {
    /// Entity over `schema.table` keyed by `primary_key`. The path segment defaults to the table name.
    pub fn new(
        schema: impl Into<String>,
        table: impl Into<String>,
        primary_key: impl Into<String>,
        mut columns: Vec<ColumnInfo>,
    ) -> Self {
        let name = table.into();
        let primary_key = primary_key.into();
        let mut pk_type = PkType::Text;
        for c in columns.iter_mut() {
            if c.name == primary_key {
                c.primary_key = true;
                pk_type = infer_pk_type(&c.pg_type);
            }
        }
        ResolvedEntity {
            path_segment: name.clone(),
            name,
            schema_name: schema.into(),
            primary_key,
            pk_type,
            columns,
            validation: HashMap::new(),
        }
    }

    pub fn with_path(mut self, path_segment: impl Into<String>) -> Self {
        self.path_segment = path_segment.into();
        self
    }

    pub fn with_validation(mut self, validation: HashMap<String, ValidationRule>) -> Self {
        self.validation = validation;
        self
    }

    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn pk_column(&self) -> Option<&ColumnInfo> {
        self.column(&self.primary_key)
    }

    /// `/` + path segment.
    pub fn crud_endpoint(&self) -> String {
        format!("/{}", self.path_segment)
    }
}

/// Immutable set of registered entities, built once at startup and shared by the router.
pub struct Registry {
    entities: Vec<ResolvedEntity>,
    by_path: HashMap<String, usize>,
    hooks: HashMap<String, Arc<dyn EntityHooks>>,
}

static NO_HOOKS: NoHooks = NoHooks;

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn entity_by_path(&self, path: &str) -> Option<&ResolvedEntity> {
        self.by_path.get(path).map(|&i| &self.entities[i])
    }

    /// Lookup by table name first, then by path segment.
    pub fn entity_by_name_or_path(&self, name: &str) -> Option<&ResolvedEntity> {
        self.entities
            .iter()
            .find(|e| e.name == name)
            .or_else(|| self.entity_by_path(name))
    }

    /// All entities, sorted by table name.
    pub fn entities(&self) -> &[ResolvedEntity] {
        &self.entities
    }

    pub fn hooks_for(&self, entity: &ResolvedEntity) -> &dyn EntityHooks {
        self.hooks
            .get(&entity.name)
            .map(|h| h.as_ref())
            .unwrap_or(&NO_HOOKS)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("entities", &self.entities.iter().map(|e| &e.name).collect::<Vec<_>>())
            .field("hooks", &self.hooks.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Collects entities and per-table hooks; `build` validates and freezes them.
#[derive(Default)]
pub struct RegistryBuilder {
    entities: Vec<ResolvedEntity>,
    hooks: HashMap<String, Arc<dyn EntityHooks>>,
}

impl RegistryBuilder {
    pub fn entity(mut self, entity: ResolvedEntity) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn entities(mut self, entities: impl IntoIterator<Item = ResolvedEntity>) -> Self {
        self.entities.extend(entities);
        self
    }

    /// Install create-time hooks for the table `name`.
    pub fn hooks(mut self, name: impl Into<String>, hooks: Arc<dyn EntityHooks>) -> Self {
        self.hooks.insert(name.into(), hooks);
        self
    }

    pub fn build(mut self) -> Result<Registry, ConfigError> {
        validate(&self.entities)?;
        self.entities.sort_by(|a, b| a.name.cmp(&b.name));
        let by_path = self
            .entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.path_segment.clone(), i))
            .collect();
        for name in self.hooks.keys() {
            if !self.entities.iter().any(|e| &e.name == name) {
                tracing::warn!(table = %name, "hooks registered for unknown table");
            }
        }
        Ok(Registry {
            entities: self.entities,
            by_path,
            hooks: self.hooks,
        })
    }
}

/// Normalize a declared type into a name usable in `$n::type` casts.
pub fn canonical_pg_type(db_type: &str) -> String {
    let lower = db_type.trim().to_lowercase();
    match lower.as_str() {
        "serial" | "serial4" | "int" | "int4" => "integer".into(),
        "bigserial" | "serial8" | "int8" => "bigint".into(),
        "smallserial" | "serial2" | "int2" => "smallint".into(),
        "timestamp with time zone" => "timestamptz".into(),
        "timestamp without time zone" => "timestamp".into(),
        "double" => "double precision".into(),
        // Schema-qualified custom type (e.g. sample.order_status); keep its case
        _ if lower.contains('.') => db_type.trim().to_string(),
        _ => lower,
    }
}

fn infer_pk_type(pg_type: &str) -> PkType {
    match pg_type {
        "uuid" => PkType::Uuid,
        "smallint" | "integer" | "bigint" => PkType::Int,
        _ => PkType::Text,
    }
}

fn auto_timestamp_for(name: &str, pg_type: &str) -> Option<AutoTimestamp> {
    if !pg_type.starts_with("timestamp") {
        return None;
    }
    match name {
        "created_at" | "inserted_at" => Some(AutoTimestamp::Created),
        "updated_at" => Some(AutoTimestamp::Updated),
        _ => None,
    }
}
