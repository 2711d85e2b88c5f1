//! HTTP handlers for entity CRUD and table discovery.

pub mod entity;
pub mod ddl;
pub use entity::*;
pub use ddl::*;
