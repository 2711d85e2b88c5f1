//! CrudService: generic CRUD over a `Store`, plus paging and column rules.

mod crud;
mod page;
mod validation;
pub use crud::CrudService;
pub use page::{PageRequest, DEFAULT_PAGE_SIZE};
pub use validation::RuleValidator;
