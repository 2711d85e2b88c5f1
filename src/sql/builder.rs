//! Builds parameterized SELECT, COUNT, INSERT, UPDATE, DELETE from a resolved entity.

use crate::config::{AutoTimestamp, ColumnInfo, ResolvedEntity};
use crate::sql::{OrderItem, PgBindValue};
use serde_json::{Map, Value};

/// Quote identifier for PostgreSQL.
pub(crate) fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
fn qualified_table(entity: &ResolvedEntity) -> String {
    format!("{}.{}", quoted(&entity.schema_name), quoted(&entity.name))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Push a value bound for `column` and return its placeholder, cast to the column type.
    fn push_param(&mut self, v: &Value, column: &ColumnInfo) -> String {
        self.params.push(PgBindValue::for_column(v, column));
        format!("${}::{}", self.params.len(), column.pg_type)
    }
}

/// SELECT list: natively decodable columns as-is, everything else (numeric, enums, ...) as text.
fn select_column_list(entity: &ResolvedEntity) -> String {
    entity
        .columns
        .iter()
        .map(|c| {
            let q = quoted(&c.name);
            if c.decodes_natively() {
                q
            } else {
                format!("{}::text AS {}", q, q)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn order_clause(entity: &ResolvedEntity, order: &[OrderItem]) -> String {
    if order.is_empty() {
        return format!(" ORDER BY {}", quoted(&entity.primary_key));
    }
    let items: Vec<String> = order
        .iter()
        .map(|o| {
            if o.descending {
                format!("{} DESC", quoted(&o.column))
            } else {
                format!("{} ASC", quoted(&o.column))
            }
        })
        .collect();
    format!(" ORDER BY {}", items.join(", "))
}

/// One page of rows. Order columns are not checked against the entity; the database rejects unknown ones.
pub fn select_page(entity: &ResolvedEntity, order: &[OrderItem], limit: u64, offset: Option<u64>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let offset_clause = offset.map(|n| format!(" OFFSET {}", n)).unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {}{} LIMIT {}{}",
        select_column_list(entity),
        qualified_table(entity),
        order_clause(entity, order),
        limit,
        offset_clause
    );
    q
}

pub fn count_all(entity: &ResolvedEntity) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!("SELECT COUNT(*) FROM {}", qualified_table(entity));
    q
}

/// SELECT by primary key.
pub fn select_by_id(entity: &ResolvedEntity, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = match entity.pk_column() {
        Some(pk) => q.push_param(id, pk),
        None => {
            q.params.push(PgBindValue::from_json(id));
            "$1".to_string()
        }
    };
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        select_column_list(entity),
        qualified_table(entity),
        quoted(&entity.primary_key),
        ph
    );
    q
}

/// INSERT of the columns present in `record`. Absent columns fall back to the database default,
/// except auto timestamps which are set to `NOW()`.
pub fn insert(entity: &ResolvedEntity, record: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut values = Vec::new();
    for c in &entity.columns {
        match record.get(&c.name) {
            Some(v) => {
                let ph = q.push_param(v, c);
                cols.push(quoted(&c.name));
                values.push(ph);
            }
            None if c.auto_timestamp.is_some() => {
                cols.push(quoted(&c.name));
                values.push("NOW()".to_string());
            }
            None => {}
        }
    }
    let returning = select_column_list(entity);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", qualified_table(entity), returning)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            qualified_table(entity),
            cols.join(", "),
            values.join(", "),
            returning
        )
    };
    q
}

/// Single-statement UPDATE by id: SET only columns present in `changes`; the key is never updated.
/// With nothing to set this degrades to a SELECT of the current row.
pub fn update(entity: &ResolvedEntity, id: &Value, changes: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for c in &entity.columns {
        if c.primary_key {
            continue;
        }
        if let Some(v) = changes.get(&c.name) {
            let ph = q.push_param(v, c);
            sets.push(format!("{} = {}", quoted(&c.name), ph));
        }
    }
    if sets.is_empty() {
        return select_by_id(entity, id);
    }
    for c in &entity.columns {
        if c.auto_timestamp == Some(AutoTimestamp::Updated) && !changes.contains_key(&c.name) {
            sets.push(format!("{} = NOW()", quoted(&c.name)));
        }
    }
    let id_ph = match entity.pk_column() {
        Some(pk) => q.push_param(id, pk),
        None => {
            q.params.push(PgBindValue::from_json(id));
            format!("${}", q.params.len())
        }
    };
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        qualified_table(entity),
        sets.join(", "),
        quoted(&entity.primary_key),
        id_ph,
        select_column_list(entity)
    );
    q
}

/// DELETE by id; the caller reads rows affected.
pub fn delete(entity: &ResolvedEntity, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = match entity.pk_column() {
        Some(pk) => q.push_param(id, pk),
        None => {
            q.params.push(PgBindValue::from_json(id));
            "$1".to_string()
        }
    };
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {}",
        qualified_table(entity),
        quoted(&entity.primary_key),
        ph
    );
    q
}
