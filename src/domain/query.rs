//! Listing query parameters
//!
//! `price` is an exact match, `search` is a case-insensitive substring match
//! over name and author, `ordering` is a comma-separated list of field names
//! where a leading `-` sorts descending. Unknown ordering fields are dropped.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

use super::DomainError;

/// Raw query parameters accepted by the book listing
#[derive(Debug, Default, Clone, Deserialize)]
pub struct BookQuery {
    pub price: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

/// Fields a listing may be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    Price,
    Author,
    Rating,
}

impl OrderField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "price" => Some(OrderField::Price),
            "author" => Some(OrderField::Author),
            "rating" => Some(OrderField::Rating),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderingKey {
    pub field: OrderField,
    pub descending: bool,
}

impl OrderingKey {
    /// Parse a signed field name such as `price` or `-rating`
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (descending, name) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        OrderField::parse(name).map(|field| OrderingKey { field, descending })
    }
}

impl BookQuery {
    /// Exact price filter. Empty values are treated as absent.
    pub fn price_filter(&self) -> Result<Option<Decimal>, DomainError> {
        match self.price.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => Decimal::from_str(raw)
                .map(Some)
                .map_err(|_| DomainError::Validation(format!("price: '{}' is not a number", raw))),
        }
    }

    /// Search text, if any non-blank text was given
    pub fn search_text(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Recognized ordering keys in the order they were requested
    pub fn ordering_keys(&self) -> Vec<OrderingKey> {
        self.ordering
            .as_deref()
            .map(|raw| raw.split(',').filter_map(OrderingKey::parse).collect())
            .unwrap_or_default()
    }
}
