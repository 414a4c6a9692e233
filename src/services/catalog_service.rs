//! Catalog Service - book listing queries and permission-checked writes
//!
//! Listings are built by [`build_listing_query`] and annotated in Rust with
//! the derived fields. Readers for a whole page are fetched with a single
//! query so the cost does not grow with the number of books.

use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Select,
};
use std::collections::HashMap;

use crate::domain::{
    BookInput, BookQuery, BookRepository, DomainError, OrderField, OrderingKey, can_mutate,
};
use crate::models::book::{self, Column, Entity as BookEntity};
use crate::models::listing::BookListing;
use crate::models::{user, user_book_relation};

/// Build the filtered, ordered book query for `query`.
///
/// Results are always tie-broken by id so pages are stable.
pub fn build_listing_query(query: &BookQuery) -> Result<Select<BookEntity>, DomainError> {
    let mut select = BookEntity::find();

    if let Some(price) = query.price_filter()? {
        select = select.filter(Column::Price.eq(price));
    }

    if let Some(text) = query.search_text() {
        let pattern = format!("%{}%", escape_like(&text.to_lowercase()));
        let contains = |column: Column| {
            Expr::expr(Func::lower(Expr::col((BookEntity, column))))
                .like(LikeExpr::new(pattern.clone()).escape('\\'))
        };
        select = select.filter(
            Condition::any()
                .add(contains(Column::Name))
                .add(contains(Column::Author)),
        );
    }

    for OrderingKey { field, descending } in query.ordering_keys() {
        let column = match field {
            OrderField::Price => Column::Price,
            OrderField::Author => Column::Author,
            OrderField::Rating => Column::Rating,
        };
        select = if descending {
            select.order_by_desc(column)
        } else {
            select.order_by_asc(column)
        };
    }

    Ok(select.order_by_asc(Column::Id))
}

/// Escape LIKE wildcards so `text` only matches literally
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Display names of the readers of each book in `book_ids`, keyed by book id,
/// in relation creation order. Issues one query regardless of the batch size.
pub async fn fetch_readers<C: ConnectionTrait>(
    db: &C,
    book_ids: &[i32],
) -> Result<HashMap<i32, Vec<String>>, DomainError> {
    let mut readers: HashMap<i32, Vec<String>> = HashMap::new();
    if book_ids.is_empty() {
        return Ok(readers);
    }

    let rows = user_book_relation::Entity::find()
        .filter(user_book_relation::Column::BookId.is_in(book_ids.iter().copied()))
        .find_also_related(user::Entity)
        .order_by_asc(user_book_relation::Column::Id)
        .all(db)
        .await?;

    for (relation, reader) in rows {
        if let Some(reader) = reader {
            readers
                .entry(relation.book_id)
                .or_default()
                .push(reader.display_name());
        }
    }

    Ok(readers)
}

/// Run `select` with owners joined and readers batch-fetched
async fn annotate<C: ConnectionTrait>(
    db: &C,
    select: Select<BookEntity>,
) -> Result<Vec<BookListing>, DomainError> {
    let rows = select.find_also_related(user::Entity).all(db).await?;

    let ids: Vec<i32> = rows.iter().map(|(b, _)| b.id).collect();
    let mut readers = fetch_readers(db, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|(book, owner)| {
            let book_readers = readers.remove(&book.id).unwrap_or_default();
            BookListing::new(book, owner.as_ref(), book_readers)
        })
        .collect())
}

/// List books matching `query`
pub async fn list_books<C: ConnectionTrait>(
    db: &C,
    query: &BookQuery,
) -> Result<Vec<BookListing>, DomainError> {
    tracing::info!(
        "List books - Filters: price={:?}, search={:?}, ordering={:?}",
        query.price,
        query.search,
        query.ordering
    );

    let select = build_listing_query(query)?;
    let listings = annotate(db, select).await?;

    tracing::debug!("Listing returned {} books", listings.len());
    Ok(listings)
}

/// A single annotated book
pub async fn get_book<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<BookListing>, DomainError> {
    let select = BookEntity::find().filter(Column::Id.eq(id));
    Ok(annotate(db, select).await?.into_iter().next())
}

/// Load `id` and check that `acting` may mutate it.
///
/// Missing books are reported before permissions so an unknown id is a
/// not-found rather than a forbidden.
async fn authorize(
    repo: &dyn BookRepository,
    acting: Option<&user::Model>,
    id: i32,
) -> Result<book::Model, DomainError> {
    let book = repo.find_by_id(id).await?.ok_or(DomainError::NotFound)?;

    if !can_mutate(acting, &book) {
        tracing::warn!(
            "Denied mutation of book {} by {:?}",
            id,
            acting.map(|u| u.username.as_str())
        );
        return Err(DomainError::Forbidden);
    }

    Ok(book)
}

/// Update a book after checking ownership
pub async fn update_book(
    repo: &dyn BookRepository,
    acting: Option<&user::Model>,
    id: i32,
    input: BookInput,
) -> Result<BookListing, DomainError> {
    update_book_with(repo, acting, id, || Ok(input)).await
}

/// Update a book, decoding its input only after the ownership check
pub async fn update_book_with<F>(
    repo: &dyn BookRepository,
    acting: Option<&user::Model>,
    id: i32,
    decode: F,
) -> Result<BookListing, DomainError>
where
    F: FnOnce() -> Result<BookInput, DomainError> + Send,
{
    authorize(repo, acting, id).await?;
    let input = decode()?;
    input.validate()?;
    repo.update(id, input).await
}

/// Delete a book after checking ownership
pub async fn delete_book(
    repo: &dyn BookRepository,
    acting: Option<&user::Model>,
    id: i32,
) -> Result<(), DomainError> {
    authorize(repo, acting, id).await?;
    repo.delete(id).await
}

/// Create a book owned by `owner`
pub async fn create_book(
    repo: &dyn BookRepository,
    owner: &user::Model,
    input: BookInput,
) -> Result<BookListing, DomainError> {
    input.validate()?;
    repo.create(Some(owner.id), input).await
}
