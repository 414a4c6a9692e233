//! Domain layer - Pure business abstractions
//!
//! Trait definitions, domain error types, and the pure rules the
//! infrastructure layer applies: rating aggregation, listing query
//! parameters and the write permission predicate.

pub mod errors;
pub mod permissions;
pub mod query;
pub mod rating;
pub mod repositories;

pub use errors::DomainError;
pub use permissions::can_mutate;
pub use query::{BookQuery, OrderField, OrderingKey};
pub use rating::{RelationPatch, RelationState, mean_rating, should_recompute};
pub use repositories::*;
