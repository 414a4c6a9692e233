//! Read-side book record returned by listing and detail queries.
//!
//! `discount_price`, `owner_name` and `readers` are derived at read time and
//! never stored. Amounts serialize as strings with two fractional digits.

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use utoipa::ToSchema;

use super::{book, user};

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookListing {
    pub id: i32,
    pub name: String,
    #[serde(serialize_with = "money")]
    #[schema(value_type = String, example = "100.00")]
    pub price: Decimal,
    #[serde(serialize_with = "optional_money")]
    #[schema(value_type = Option<String>, example = "21.00")]
    pub discount: Option<Decimal>,
    pub author: String,
    /// Username of the owner, `None` once the owner is deleted
    pub owner_name: Option<String>,
    #[serde(serialize_with = "optional_money")]
    #[schema(value_type = Option<String>, example = "79.00")]
    pub discount_price: Option<Decimal>,
    #[serde(serialize_with = "optional_money")]
    #[schema(value_type = Option<String>, example = "4.67")]
    pub rating: Option<Decimal>,
    /// Display names of every user holding a relation to the book,
    /// in relation creation order
    pub readers: Vec<String>,
}

impl BookListing {
    pub fn new(book: book::Model, owner: Option<&user::Model>, readers: Vec<String>) -> Self {
        // Amounts come back from storage as floats
        let price = book.price.round_dp(2);
        let discount = book.discount.map(|d| d.round_dp(2));

        Self {
            id: book.id,
            discount_price: discount_price(price, discount),
            owner_name: owner.map(|o| o.username.clone()),
            name: book.name,
            price,
            discount,
            author: book.author,
            rating: book.rating.map(|r| r.round_dp(2)),
            readers,
        }
    }
}

pub fn discount_price(price: Decimal, discount: Option<Decimal>) -> Option<Decimal> {
    discount.map(|d| price - d)
}

fn money<S: Serializer>(value: &Decimal, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format!("{:.2}", value))
}

fn optional_money<S: Serializer>(value: &Option<Decimal>, s: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => money(v, s),
        None => s.serialize_none(),
    }
}
