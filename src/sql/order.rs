//! `order` query parameter: comma-separated `column [asc|desc]` items.

use crate::error::AppError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderItem {
    pub column: String,
    pub descending: bool,
}

/// Parse the raw `order` value. Column existence is not checked here.
pub fn parse_order(raw: &str) -> Result<Vec<OrderItem>, AppError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    raw.split(',').map(parse_item).collect()
}

fn parse_item(item: &str) -> Result<OrderItem, AppError> {
    let mut parts = item.split_whitespace();
    let column = parts
        .next()
        .ok_or_else(|| AppError::BadParams("empty order item".into()))?;
    let descending = match parts.next() {
        None => false,
        Some(d) if d.eq_ignore_ascii_case("asc") => false,
        Some(d) if d.eq_ignore_ascii_case("desc") => true,
        Some(d) => return Err(AppError::BadParams(format!("invalid order direction: {}", d))),
    };
    if parts.next().is_some() {
        return Err(AppError::BadParams(format!("invalid order item: {}", item.trim())));
    }
    Ok(OrderItem {
        column: column.to_string(),
        descending,
    })
}
