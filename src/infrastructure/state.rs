//! Application state containing repositories and shared resources

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::{BookRepository, RelationRepository, UserRepository};
use crate::infrastructure::{
    RatingAggregator, RelationHook, SeaOrmBookRepository, SeaOrmRatingAggregator,
    SeaOrmRelationRepository, SeaOrmUserRepository,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    /// Book repository
    pub book_repo: Arc<dyn BookRepository>,
    /// Relation repository, wired to the rating aggregator
    pub relation_repo: Arc<dyn RelationRepository>,
    /// User repository
    pub user_repo: Arc<dyn UserRepository>,
}

impl AppState {
    /// Create a new AppState with all repositories initialized
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_aggregator(db, Arc::new(SeaOrmRatingAggregator))
    }

    /// Create an AppState whose relation writes use `aggregator`
    pub fn with_aggregator(db: DatabaseConnection, aggregator: Arc<dyn RatingAggregator>) -> Self {
        let hook = RelationHook::new(aggregator.clone());

        Self {
            book_repo: Arc::new(SeaOrmBookRepository::new(db.clone())),
            relation_repo: Arc::new(SeaOrmRelationRepository::new(db.clone(), hook)),
            user_repo: Arc::new(SeaOrmUserRepository::new(db.clone(), aggregator)),
            db,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

// Implement FromRef to allow extracting DatabaseConnection from AppState
impl axum::extract::FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
