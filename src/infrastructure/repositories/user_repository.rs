//! SeaORM implementation of UserRepository

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;

use super::RatingAggregator;
use crate::domain::{DomainError, NewUser, UserRepository};
use crate::infrastructure::auth::hash_password;
use crate::models::user::{self, ActiveModel, Column, Entity as UserEntity};
use crate::models::{book, user_book_relation};

/// SeaORM-based implementation of UserRepository
pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
    aggregator: Arc<dyn RatingAggregator>,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection, aggregator: Arc<dyn RatingAggregator>) -> Self {
        Self { db, aggregator }
    }

    /// Remove the user's relations and ownerships, then the user.
    /// Books the user had rated get their rating recomputed.
    async fn delete_in(&self, txn: &DatabaseTransaction, id: i32) -> Result<(), DomainError> {
        let rated_books: Vec<i32> = user_book_relation::Entity::find()
            .select_only()
            .column(user_book_relation::Column::BookId)
            .filter(user_book_relation::Column::UserId.eq(id))
            .filter(user_book_relation::Column::Rate.is_not_null())
            .into_tuple()
            .all(txn)
            .await?;

        user_book_relation::Entity::delete_many()
            .filter(user_book_relation::Column::UserId.eq(id))
            .exec(txn)
            .await?;

        book::Entity::update_many()
            .col_expr(book::Column::OwnerId, Expr::value(Option::<i32>::None))
            .filter(book::Column::OwnerId.eq(id))
            .exec(txn)
            .await?;

        let result = UserEntity::delete_by_id(id).exec(txn).await?;
        if result.rows_affected == 0 {
            return Err(DomainError::NotFound);
        }

        for book_id in rated_books {
            self.aggregator.recompute_rating(txn, book_id).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<user::Model>, DomainError> {
        Ok(UserEntity::find_by_id(id).one(&self.db).await?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<user::Model>, DomainError> {
        Ok(UserEntity::find()
            .filter(Column::Username.eq(username))
            .one(&self.db)
            .await?)
    }

    async fn create(&self, input: NewUser) -> Result<user::Model, DomainError> {
        let username = input.username.trim().to_string();
        if username.is_empty() {
            return Err(DomainError::Validation("username: may not be blank".to_string()));
        }
        if input.password.is_empty() {
            return Err(DomainError::Validation("password: may not be blank".to_string()));
        }
        if self.find_by_username(&username).await?.is_some() {
            return Err(DomainError::Conflict(format!(
                "username '{}' is already taken",
                username
            )));
        }

        let password_hash = hash_password(&input.password).map_err(DomainError::Internal)?;
        let now = chrono::Utc::now().to_rfc3339();

        let user = ActiveModel {
            username: Set(username),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            password_hash: Set(password_hash),
            role: Set(input.role),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = user.insert(&self.db).await?;
        tracing::info!("User {} registered with role {}", result.username, result.role);
        Ok(result)
    }

    async fn delete(&self, id: i32) -> Result<(), DomainError> {
        let txn = self.db.begin().await?;

        match self.delete_in(&txn, id).await {
            Ok(()) => {
                txn.commit().await?;
                tracing::info!("User {} deleted", id);
                Ok(())
            }
            Err(e) => {
                txn.rollback().await?;
                Err(e)
            }
        }
    }
}
