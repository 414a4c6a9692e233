//! SeaORM implementation of RelationRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    ModelTrait, QueryFilter, Set, TransactionTrait,
};

use super::RelationHook;
use crate::domain::{DomainError, Relation, RelationPatch, RelationRepository, RelationState};
use crate::models::book::Entity as BookEntity;
use crate::models::user_book_relation::{self, ActiveModel, Column, Entity as RelationEntity};

/// SeaORM-based implementation of RelationRepository
pub struct SeaOrmRelationRepository {
    db: DatabaseConnection,
    hook: RelationHook,
}

impl SeaOrmRelationRepository {
    pub fn new(db: DatabaseConnection, hook: RelationHook) -> Self {
        Self { db, hook }
    }

    async fn find_model(
        txn: &DatabaseTransaction,
        user_id: i32,
        book_id: i32,
    ) -> Result<Option<user_book_relation::Model>, DomainError> {
        Ok(RelationEntity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::BookId.eq(book_id))
            .one(txn)
            .await?)
    }

    /// Write the relation and run the hook; the caller commits or rolls back
    async fn save_in(
        &self,
        txn: &DatabaseTransaction,
        user_id: i32,
        book_id: i32,
        patch: RelationPatch,
    ) -> Result<user_book_relation::Model, DomainError> {
        if BookEntity::find_by_id(book_id).one(txn).await?.is_none() {
            return Err(DomainError::NotFound);
        }

        let existing = Self::find_model(txn, user_id, book_id).await?;
        let previous = existing.as_ref().map(RelationState::from);
        let next = patch.apply(previous.unwrap_or_default());
        let now = chrono::Utc::now().to_rfc3339();

        let saved = match existing {
            Some(model) => {
                let mut active: ActiveModel = model.into();
                active.like = Set(next.like);
                active.in_bookmarks = Set(next.in_bookmarks);
                active.rate = Set(next.rate);
                active.updated_at = Set(now);
                active.update(txn).await?
            }
            None => {
                let active = ActiveModel {
                    user_id: Set(user_id),
                    book_id: Set(book_id),
                    like: Set(next.like),
                    in_bookmarks: Set(next.in_bookmarks),
                    rate: Set(next.rate),
                    created_at: Set(now.clone()),
                    updated_at: Set(now),
                    ..Default::default()
                };
                active.insert(txn).await?
            }
        };

        let recomputed = self
            .hook
            .on_relation_saved(txn, previous.as_ref(), &saved)
            .await?;

        tracing::debug!(
            "Relation user={} book={} saved (created={}, rating recomputed={})",
            user_id,
            book_id,
            previous.is_none(),
            recomputed
        );

        Ok(saved)
    }
}

#[async_trait]
impl RelationRepository for SeaOrmRelationRepository {
    async fn find(&self, user_id: i32, book_id: i32) -> Result<Option<Relation>, DomainError> {
        let relation = RelationEntity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::BookId.eq(book_id))
            .one(&self.db)
            .await?;

        Ok(relation.map(|r| Relation::from_state(r.book_id, RelationState::from(&r))))
    }

    async fn save(
        &self,
        user_id: i32,
        book_id: i32,
        patch: RelationPatch,
    ) -> Result<Relation, DomainError> {
        // Rejected before anything touches storage
        patch.validate()?;

        let txn = self.db.begin().await?;

        match self.save_in(&txn, user_id, book_id, patch).await {
            Ok(saved) => {
                txn.commit().await?;
                tracing::info!(
                    "User {} updated relation to book {}: like={}, in_bookmarks={}, rate={:?}",
                    user_id,
                    book_id,
                    saved.like,
                    saved.in_bookmarks,
                    saved.rate
                );
                Ok(Relation::from_state(saved.book_id, RelationState::from(&saved)))
            }
            Err(e) => {
                if !matches!(e, DomainError::NotFound) {
                    tracing::error!(
                        "Relation write user={} book={} rolled back: {}",
                        user_id,
                        book_id,
                        e
                    );
                }
                txn.rollback().await?;
                Err(e)
            }
        }
    }

    async fn delete(&self, user_id: i32, book_id: i32) -> Result<(), DomainError> {
        let txn = self.db.begin().await?;

        let removed = match Self::find_model(&txn, user_id, book_id).await? {
            Some(model) => model,
            None => {
                txn.rollback().await?;
                return Err(DomainError::NotFound);
            }
        };

        let result = async {
            removed.clone().delete(&txn).await?;
            self.hook.on_relation_deleted(&txn, &removed).await
        }
        .await;

        match result {
            Ok(_) => {
                txn.commit().await?;
                tracing::info!("User {} removed relation to book {}", user_id, book_id);
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    "Relation delete user={} book={} rolled back: {}",
                    user_id,
                    book_id,
                    e
                );
                txn.rollback().await?;
                Err(e)
            }
        }
    }
}
