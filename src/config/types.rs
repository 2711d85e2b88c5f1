//! Raw entity config types matching the JSON entity file.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Top-level shape of the entity file (`ENTITIES_PATH`).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EntityFile {
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityConfig {
    /// Table name.
    pub table: String,
    #[serde(default)]
    pub schema: Option<String>,
    /// URL segment; defaults to the table name.
    #[serde(default)]
    pub path: Option<String>,
    pub primary_key: String,
    pub columns: Vec<ColumnConfig>,
    #[serde(default)]
    pub validation: HashMap<String, ValidationRule>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub default: Option<ColumnDefaultConfig>,
}

fn default_true() -> bool {
    true
}

/// Column default, either a literal or `{ "expression": "..." }`.
#[derive(Clone, Debug, Serialize)]
pub enum ColumnDefaultConfig {
    Literal(String),
    Expression { expression: String },
}

impl ColumnDefaultConfig {
    /// SQL text of the default: literals quoted, expressions verbatim. Reported by `/ddl`.
    pub fn sql(&self) -> String {
        match self {
            ColumnDefaultConfig::Literal(s) => format!("'{}'", s.replace('\'', "''")),
            ColumnDefaultConfig::Expression { expression } => expression.clone(),
        }
    }
}

impl<'de> Deserialize<'de> for ColumnDefaultConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = serde_json::Value::deserialize(deserializer)?;
        match v {
            serde_json::Value::String(s) => Ok(ColumnDefaultConfig::Literal(s)),
            serde_json::Value::Number(n) => Ok(ColumnDefaultConfig::Literal(n.to_string())),
            serde_json::Value::Bool(b) => Ok(ColumnDefaultConfig::Literal(b.to_string())),
            serde_json::Value::Object(mut obj) => match obj.remove("expression") {
                Some(serde_json::Value::String(s)) => Ok(ColumnDefaultConfig::Expression { expression: s }),
                _ => Err(serde::de::Error::custom(format!(
                    "column default object must be {{ \"expression\": \"...\" }}; got keys: {:?}",
                    obj.keys().collect::<Vec<_>>()
                ))),
            },
            other => Err(serde::de::Error::custom(format!(
                "column default must be a string, number, boolean or {{ \"expression\": \"...\" }}; got {}",
                type_name_of_json(&other)
            ))),
        }
    }
}

fn type_name_of_json(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Per-column request rules applied on create (all) and update (present fields only).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub allowed: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
}
