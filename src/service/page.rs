//! List query parameters: `page`, `pagesize`, `order`.

use crate::error::AppError;
use crate::sql::{parse_order, OrderItem};
use std::collections::HashMap;

pub const DEFAULT_PAGE_SIZE: i64 = 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
    pub order: Vec<OrderItem>,
}

impl PageRequest {
    pub fn new(page: i64, page_size: i64, order: Vec<OrderItem>) -> Result<Self, AppError> {
        if page_size <= 0 {
            return Err(AppError::BadParams(format!("pagesize must be positive, got {}", page_size)));
        }
        Ok(PageRequest { page, page_size, order })
    }

    /// Parse the list query string. Missing values take defaults; malformed numbers are bad params.
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self, AppError> {
        let page = parse_int(params, "page", 0)?;
        let page_size = parse_int(params, "pagesize", DEFAULT_PAGE_SIZE)?;
        let order = match params.get("order") {
            Some(raw) => parse_order(raw)?,
            None => Vec::new(),
        };
        Self::new(page, page_size, order)
    }

    /// Pages below 1 read from the start.
    pub fn offset(&self) -> Option<u64> {
        if self.page < 1 {
            None
        } else {
            Some((self.page as u64 - 1).saturating_mul(self.page_size as u64))
        }
    }

    pub fn limit(&self) -> u64 {
        self.page_size as u64
    }
}

fn parse_int(params: &HashMap<String, String>, name: &str, default: i64) -> Result<i64, AppError> {
    match params.get(name).map(|s| s.trim()) {
        None | Some("") => Ok(default),
        Some(s) => s
            .parse()
            .map_err(|_| AppError::BadParams(format!("{} must be an integer, got {}", name, s))),
    }
}
