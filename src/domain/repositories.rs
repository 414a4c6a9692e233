//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BookQuery, DomainError, RelationPatch, RelationState};
use crate::models::listing::BookListing;
use crate::models::{book, user};

const MAX_TEXT_LEN: usize = 255;
/// DECIMAL(7, 2): five integer digits, two fractional
const MAX_AMOUNT: i64 = 100_000;

/// Writable fields of a book. `rating` and `owner` are never client-writable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BookInput {
    pub name: String,
    pub price: Decimal,
    pub discount: Option<Decimal>,
    pub author: String,
}

impl BookInput {
    pub fn validate(&self) -> Result<(), DomainError> {
        check_text("name", &self.name)?;
        check_text("author", &self.author)?;
        check_amount("price", self.price)?;
        if let Some(discount) = self.discount {
            check_amount("discount", discount)?;
        }
        Ok(())
    }
}

fn check_text(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{}: may not be blank", field)));
    }
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(DomainError::Validation(format!(
            "{}: at most {} characters",
            field, MAX_TEXT_LEN
        )));
    }
    Ok(())
}

fn check_amount(field: &str, value: Decimal) -> Result<(), DomainError> {
    if value.is_sign_negative() {
        return Err(DomainError::Validation(format!("{}: must not be negative", field)));
    }
    if value.normalize().scale() > 2 {
        return Err(DomainError::Validation(format!(
            "{}: at most 2 decimal places",
            field
        )));
    }
    if value >= Decimal::from(MAX_AMOUNT) {
        return Err(DomainError::Validation(format!(
            "{}: at most 5 digits before the decimal point",
            field
        )));
    }
    Ok(())
}

/// A user's relation to a book, as exposed to that user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    pub book_id: i32,
    pub like: bool,
    pub in_bookmarks: bool,
    pub rate: Option<i32>,
}

impl Relation {
    pub fn from_state(book_id: i32, state: RelationState) -> Self {
        Self {
            book_id,
            like: state.like,
            in_bookmarks: state.in_bookmarks,
            rate: state.rate,
        }
    }
}

/// Input for registering a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

/// Repository trait for Book entity
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Books matching `query`, annotated with derived fields and readers
    async fn list(&self, query: BookQuery) -> Result<Vec<BookListing>, DomainError>;

    /// A single annotated book
    async fn find_listing(&self, id: i32) -> Result<Option<BookListing>, DomainError>;

    /// The stored book row, for permission checks
    async fn find_by_id(&self, id: i32) -> Result<Option<book::Model>, DomainError>;

    /// Create a new book owned by `owner_id`
    async fn create(
        &self,
        owner_id: Option<i32>,
        input: BookInput,
    ) -> Result<BookListing, DomainError>;

    /// Replace the writable fields of an existing book
    async fn update(&self, id: i32, input: BookInput) -> Result<BookListing, DomainError>;

    /// Delete a book by ID
    async fn delete(&self, id: i32) -> Result<(), DomainError>;
}

/// Repository trait for per-user book relations
#[async_trait]
pub trait RelationRepository: Send + Sync {
    /// The relation between `user_id` and `book_id`, if one was ever created
    async fn find(&self, user_id: i32, book_id: i32) -> Result<Option<Relation>, DomainError>;

    /// Get-or-create the relation and apply `patch`, recomputing the book's
    /// rating in the same transaction when required
    async fn save(
        &self,
        user_id: i32,
        book_id: i32,
        patch: RelationPatch,
    ) -> Result<Relation, DomainError>;

    /// Remove the relation; the book itself is kept
    async fn delete(&self, user_id: i32, book_id: i32) -> Result<(), DomainError>;
}

/// Repository trait for User entity
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<user::Model>, DomainError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<user::Model>, DomainError>;

    /// Register a user, hashing the password
    async fn create(&self, input: NewUser) -> Result<user::Model, DomainError>;

    async fn delete(&self, id: i32) -> Result<(), DomainError>;
}
