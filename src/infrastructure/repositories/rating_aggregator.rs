//! Rating aggregation and the post-write relation hook
//!
//! The relation repository calls [`RelationHook`] after persisting a relation
//! and before committing. A hook error vetoes the commit.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QuerySelect, Set,
};
use std::sync::Arc;

use crate::domain::{DomainError, RelationState, mean_rating, should_recompute};
use crate::models::book::{ActiveModel as BookActiveModel, Entity as BookEntity};
use crate::models::user_book_relation::{self, Column, Entity as RelationEntity};

/// Recomputes and persists a book's mean rating
#[async_trait]
pub trait RatingAggregator: Send + Sync {
    /// Runs inside the caller's transaction so the read of relation rates and
    /// the write of the book rating see the same snapshot as the triggering write.
    async fn recompute_rating(
        &self,
        txn: &DatabaseTransaction,
        book_id: i32,
    ) -> Result<Option<Decimal>, DomainError>;
}

/// SeaORM-based implementation of RatingAggregator
#[derive(Debug, Default, Clone, Copy)]
pub struct SeaOrmRatingAggregator;

#[async_trait]
impl RatingAggregator for SeaOrmRatingAggregator {
    async fn recompute_rating(
        &self,
        txn: &DatabaseTransaction,
        book_id: i32,
    ) -> Result<Option<Decimal>, DomainError> {
        let rates: Vec<i32> = RelationEntity::find()
            .select_only()
            .column(Column::Rate)
            .filter(Column::BookId.eq(book_id))
            .filter(Column::Rate.is_not_null())
            .into_tuple()
            .all(txn)
            .await?;

        let rating = mean_rating(&rates);

        let book = BookEntity::find_by_id(book_id)
            .one(txn)
            .await?
            .ok_or(DomainError::NotFound)?;

        let mut active: BookActiveModel = book.into();
        active.rating = Set(rating);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(txn).await?;

        tracing::debug!(
            "Book {} rating recomputed from {} rates: {:?}",
            book_id,
            rates.len(),
            rating
        );

        Ok(rating)
    }
}

/// Post-write hook for relation changes
#[derive(Clone)]
pub struct RelationHook {
    aggregator: Arc<dyn RatingAggregator>,
}

impl RelationHook {
    pub fn new(aggregator: Arc<dyn RatingAggregator>) -> Self {
        Self { aggregator }
    }

    /// Called after `saved` was written; `previous` is `None` when the write
    /// created the relation. Returns whether the rating was recomputed.
    pub async fn on_relation_saved(
        &self,
        txn: &DatabaseTransaction,
        previous: Option<&RelationState>,
        saved: &user_book_relation::Model,
    ) -> Result<bool, DomainError> {
        let current = RelationState::from(saved);
        if !should_recompute(previous, &current) {
            return Ok(false);
        }

        self.aggregator.recompute_rating(txn, saved.book_id).await?;
        Ok(true)
    }

    /// Called after `removed` was deleted. A relation without a rate never
    /// contributed to the mean, so nothing needs recomputing.
    pub async fn on_relation_deleted(
        &self,
        txn: &DatabaseTransaction,
        removed: &user_book_relation::Model,
    ) -> Result<bool, DomainError> {
        if removed.rate.is_none() {
            return Ok(false);
        }

        self.aggregator.recompute_rating(txn, removed.book_id).await?;
        Ok(true)
    }
}

impl Default for RelationHook {
    fn default() -> Self {
        Self::new(Arc::new(SeaOrmRatingAggregator))
    }
}
