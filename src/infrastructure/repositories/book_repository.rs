//! SeaORM implementation of BookRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use crate::domain::{BookInput, BookQuery, BookRepository, DomainError};
use crate::models::book::{self, ActiveModel, Entity as BookEntity};
use crate::models::listing::BookListing;
use crate::models::user_book_relation;
use crate::services::catalog_service;

/// SeaORM-based implementation of BookRepository
pub struct SeaOrmBookRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn listing(&self, id: i32) -> Result<BookListing, DomainError> {
        catalog_service::get_book(&self.db, id)
            .await?
            .ok_or(DomainError::NotFound)
    }
}

#[async_trait]
impl BookRepository for SeaOrmBookRepository {
    async fn list(&self, query: BookQuery) -> Result<Vec<BookListing>, DomainError> {
        catalog_service::list_books(&self.db, &query).await
    }

    async fn find_listing(&self, id: i32) -> Result<Option<BookListing>, DomainError> {
        catalog_service::get_book(&self.db, id).await
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<book::Model>, DomainError> {
        Ok(BookEntity::find_by_id(id).one(&self.db).await?)
    }

    async fn create(
        &self,
        owner_id: Option<i32>,
        input: BookInput,
    ) -> Result<BookListing, DomainError> {
        let now = chrono::Utc::now().to_rfc3339();

        let new_book = ActiveModel {
            name: Set(input.name),
            price: Set(input.price),
            discount: Set(input.discount),
            author: Set(input.author),
            owner_id: Set(owner_id),
            rating: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = new_book.insert(&self.db).await?;
        tracing::info!("Book {} created (owner={:?})", result.id, owner_id);

        self.listing(result.id).await
    }

    async fn update(&self, id: i32, input: BookInput) -> Result<BookListing, DomainError> {
        let existing = BookEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;

        // rating and owner are left as stored
        let mut active: ActiveModel = existing.into();
        active.name = Set(input.name);
        active.price = Set(input.price);
        active.discount = Set(input.discount);
        active.author = Set(input.author);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        active.update(&self.db).await?;
        tracing::info!("Book {} updated", id);

        self.listing(id).await
    }

    async fn delete(&self, id: i32) -> Result<(), DomainError> {
        let txn = self.db.begin().await?;

        user_book_relation::Entity::delete_many()
            .filter(user_book_relation::Column::BookId.eq(id))
            .exec(&txn)
            .await?;
        let result = BookEntity::delete_by_id(id).exec(&txn).await?;

        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(DomainError::NotFound);
        }

        txn.commit().await?;

        tracing::info!("Book {} deleted", id);
        Ok(())
    }
}
