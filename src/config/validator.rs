//! Registry validation: key columns, path uniqueness, reserved paths.

use crate::config::ResolvedEntity;
use crate::error::ConfigError;
use std::collections::HashSet;

/// Path segments taken by the discovery and common routes.
pub const RESERVED_PATHS: &[&str] = &["ddl", "health", "ready", "version"];

pub fn validate(entities: &[ResolvedEntity]) -> Result<(), ConfigError> {
    let mut path_segments = HashSet::new();
    for e in entities {
        if e.columns.is_empty() {
            return Err(ConfigError::NoColumns(e.name.clone()));
        }
        if e.pk_column().is_none() {
            return Err(ConfigError::InvalidPrimaryKey {
                table: e.name.clone(),
                column: e.primary_key.clone(),
            });
        }
        if e.path_segment.is_empty() || e.path_segment.contains('/') {
            return Err(ConfigError::Load(format!(
                "invalid path segment '{}' for {}",
                e.path_segment, e.name
            )));
        }
        if RESERVED_PATHS.contains(&e.path_segment.as_str()) {
            return Err(ConfigError::ReservedPathSegment(e.path_segment.clone()));
        }
        if !path_segments.insert(e.path_segment.as_str()) {
            return Err(ConfigError::DuplicatePathSegment(e.path_segment.clone()));
        }
    }
    Ok(())
}
