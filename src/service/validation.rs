//! Column rules: required columns from the schema plus configured `ValidationRule`s.

use crate::config::{ResolvedEntity, ValidationRule};
use crate::error::AppError;
use crate::store::Record;
use regex::Regex;
use serde_json::Value;

pub struct RuleValidator;

impl RuleValidator {
    /// Full check for create: every required column present and non-null, then all rules.
    pub fn validate(record: &Record, entity: &ResolvedEntity) -> Result<(), AppError> {
        let mut missing: Vec<&str> = entity
            .columns
            .iter()
            .filter(|c| c.is_required())
            .map(|c| c.name.as_str())
            .chain(
                entity
                    .validation
                    .iter()
                    .filter(|(_, rule)| rule.required == Some(true))
                    .map(|(col, _)| col.as_str()),
            )
            .filter(|col| matches!(record.get(*col), None | Some(Value::Null)))
            .collect();
        missing.sort_unstable();
        missing.dedup();
        if !missing.is_empty() {
            return Err(AppError::BadParams(format!("missing required fields: {}", missing.join(", "))));
        }
        for (col, rule) in &entity.validation {
            if let Some(v) = record.get(col) {
                validate_field(col, v, rule)?;
            }
        }
        Ok(())
    }

    /// Only the fields present in the record (for update). Required is not enforced, but a
    /// NOT NULL column cannot be set to null.
    pub fn validate_partial(record: &Record, entity: &ResolvedEntity) -> Result<(), AppError> {
        for (col, v) in record {
            if v.is_null() && entity.column(col).is_some_and(|c| !c.nullable) {
                return Err(AppError::BadParams(format!("{} must not be null", col)));
            }
            if let Some(rule) = entity.validation.get(col) {
                validate_field(col, v, rule)?;
            }
        }
        Ok(())
    }
}

fn validate_field(col: &str, v: &Value, rule: &ValidationRule) -> Result<(), AppError> {
    if v.is_null() {
        return Ok(());
    }
    if let Some(format) = &rule.format {
        validate_format(col, v, format)?;
    }
    if let Some(max) = rule.max_length {
        if let Some(s) = v.as_str() {
            if s.chars().count() > max as usize {
                return Err(AppError::BadParams(format!("{} must be at most {} characters", col, max)));
            }
        }
    }
    if let Some(min) = rule.min_length {
        if let Some(s) = v.as_str() {
            if s.chars().count() < min as usize {
                return Err(AppError::BadParams(format!("{} must be at least {} characters", col, min)));
            }
        }
    }
    if let Some(ref pattern) = rule.pattern {
        let re = Regex::new(pattern).map_err(|_| AppError::BadParams(format!("invalid pattern for {}", col)))?;
        if let Some(s) = v.as_str() {
            if !re.is_match(s) {
                return Err(AppError::BadParams(format!("{} does not match required pattern", col)));
            }
        }
    }
    if let Some(ref allowed) = rule.allowed {
        if !allowed.iter().any(|a| value_eq(v, a)) {
            return Err(AppError::BadParams(format!(
                "{} must be one of: {:?}",
                col,
                allowed.iter().take(5).collect::<Vec<_>>()
            )));
        }
    }
    if let Some(min) = rule.minimum {
        if let Some(n) = v.as_f64() {
            if n < min {
                return Err(AppError::BadParams(format!("{} must be at least {}", col, min)));
            }
        }
    }
    if let Some(max) = rule.maximum {
        if let Some(n) = v.as_f64() {
            if n > max {
                return Err(AppError::BadParams(format!("{} must be at most {}", col, max)));
            }
        }
    }
    Ok(())
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

fn validate_format(col: &str, v: &Value, format: &str) -> Result<(), AppError> {
    let Some(s) = v.as_str() else {
        return Ok(());
    };
    match format.to_lowercase().as_str() {
        "email" => {
            if !s.contains('@') || s.len() < 3 {
                return Err(AppError::BadParams(format!("{} must be a valid email", col)));
            }
        }
        "uuid" => {
            if uuid::Uuid::parse_str(s).is_err() {
                return Err(AppError::BadParams(format!("{} must be a valid UUID", col)));
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnInfo;
    use serde_json::json;
    use std::collections::HashMap;

    fn users() -> ResolvedEntity {
        let mut rules = HashMap::new();
        rules.insert(
            "email".to_string(),
            ValidationRule {
                format: Some("email".into()),
                max_length: Some(40),
                ..Default::default()
            },
        );
        rules.insert(
            "role".to_string(),
            ValidationRule {
                required: Some(true),
                allowed: Some(vec![json!("admin"), json!("member")]),
                ..Default::default()
            },
        );
        rules.insert(
            "age".to_string(),
            ValidationRule {
                minimum: Some(0.0),
                maximum: Some(150.0),
                ..Default::default()
            },
        );
        ResolvedEntity::new(
            "public",
            "users",
            "id",
            vec![
                ColumnInfo::new("id", "serial").not_null().with_default(),
                ColumnInfo::new("email", "text").not_null(),
                ColumnInfo::new("role", "text"),
                ColumnInfo::new("age", "integer"),
            ],
        )
        .with_validation(rules)
    }

    fn record(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn reports_all_missing_fields() {
        let err = RuleValidator::validate(&record(json!({"age": 3})), &users()).unwrap_err();
        assert_eq!(err.to_string(), "bad params: missing required fields: email, role");
    }

    #[test]
    fn null_counts_as_missing() {
        let err = RuleValidator::validate(&record(json!({"email": null, "role": "admin"})), &users()).unwrap_err();
        assert!(err.to_string().contains("email"));
    }

    #[test]
    fn applies_rules() {
        let e = users();
        assert!(RuleValidator::validate(&record(json!({"email": "a@b.io", "role": "admin", "age": 30})), &e).is_ok());
        assert!(RuleValidator::validate(&record(json!({"email": "nope", "role": "admin"})), &e).is_err());
        assert!(RuleValidator::validate(&record(json!({"email": "a@b.io", "role": "root"})), &e).is_err());
        assert!(RuleValidator::validate(&record(json!({"email": "a@b.io", "role": "member", "age": 200})), &e).is_err());
    }

    #[test]
    fn partial_skips_required() {
        let e = users();
        assert!(RuleValidator::validate_partial(&record(json!({"age": 41})), &e).is_ok());
        assert!(RuleValidator::validate_partial(&record(json!({"age": -1})), &e).is_err());
    }

    #[test]
    fn partial_rejects_null_on_not_null_columns() {
        let e = users();
        let err = RuleValidator::validate_partial(&record(json!({"email": null})), &e).unwrap_err();
        assert_eq!(err.to_string(), "bad params: email must not be null");
        assert!(RuleValidator::validate_partial(&record(json!({"age": null, "role": null})), &e).is_ok());
    }
}
