//! Repository implementations using SeaORM

pub mod book_repository;
pub mod rating_aggregator;
pub mod relation_repository;
pub mod user_repository;

pub use book_repository::SeaOrmBookRepository;
pub use rating_aggregator::{RatingAggregator, RelationHook, SeaOrmRatingAggregator};
pub use relation_repository::SeaOrmRelationRepository;
pub use user_repository::SeaOrmUserRepository;
