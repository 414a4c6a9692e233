//! Book API handlers
//!
//! Reads are public. Writes need a bearer token; updates and deletes are
//! further restricted to the book's owner or staff.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

use super::{current_user, error_response};
use crate::domain::{BookInput, BookQuery, DomainError};
use crate::infrastructure::AppState;
use crate::infrastructure::auth::Claims;
use crate::services::catalog_service;

/// Request DTO for creating or replacing a book
#[derive(Debug, Deserialize, ToSchema)]
pub struct BookRequest {
    pub name: String,
    #[schema(value_type = String, example = "100.00")]
    pub price: Decimal,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "21.00")]
    pub discount: Option<Decimal>,
    pub author: String,
}

impl From<BookRequest> for BookInput {
    fn from(req: BookRequest) -> Self {
        Self {
            name: req.name,
            price: req.price,
            discount: req.discount,
            author: req.author,
        }
    }
}

fn parse_book_request(body: &[u8]) -> Result<BookInput, DomainError> {
    serde_json::from_slice::<BookRequest>(body)
        .map(BookInput::from)
        .map_err(|e| DomainError::Validation(e.to_string()))
}

#[utoipa::path(
    get,
    path = "/api/books",
    params(
        ("price" = Option<String>, Query, description = "Exact price match"),
        ("search" = Option<String>, Query, description = "Case-insensitive match on name or author"),
        ("ordering" = Option<String>, Query, description = "price, author or rating; prefix with - for descending"),
    ),
    responses(
        (status = 200, description = "Matching books", body = [crate::models::listing::BookListing]),
        (status = 400, description = "Invalid price filter")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<BookQuery>,
) -> Response {
    match state.book_repo.list(query).await {
        Ok(books) => Json(books).into_response(),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/books/{id}",
    params(("id" = i32, Path, description = "Book id")),
    responses(
        (status = 200, description = "The book", body = crate::models::listing::BookListing),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(State(state): State<AppState>, Path(id): Path<i32>) -> Response {
    match state.book_repo.find_listing(id).await {
        Ok(Some(book)) => Json(book).into_response(),
        Ok(None) => error_response(DomainError::NotFound),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    post,
    path = "/api/books",
    request_body = BookRequest,
    responses(
        (status = 201, description = "Book created, owned by the caller", body = crate::models::listing::BookListing),
        (status = 400, description = "Invalid book"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<BookRequest>,
) -> Response {
    let result = async {
        let owner = current_user(&state, &claims).await?;
        catalog_service::create_book(state.book_repo.as_ref(), &owner, payload.into()).await
    }
    .await;

    match result {
        Ok(book) => (StatusCode::CREATED, Json(book)).into_response(),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    put,
    path = "/api/books/{id}",
    params(("id" = i32, Path, description = "Book id")),
    request_body = BookRequest,
    responses(
        (status = 200, description = "Book updated", body = crate::models::listing::BookListing),
        (status = 400, description = "Invalid book"),
        (status = 403, description = "Caller is neither the owner nor staff"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
    body: Bytes,
) -> Response {
    let result = async {
        let acting = current_user(&state, &claims).await?;
        // The body is only parsed after the ownership check
        catalog_service::update_book_with(state.book_repo.as_ref(), Some(&acting), id, || {
            parse_book_request(&body)
        })
        .await
    }
    .await;

    match result {
        Ok(book) => Json(book).into_response(),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    params(("id" = i32, Path, description = "Book id")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 403, description = "Caller is neither the owner nor staff"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> Response {
    let result = async {
        let acting = current_user(&state, &claims).await?;
        catalog_service::delete_book(state.book_repo.as_ref(), Some(&acting), id).await
    }
    .await;

    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}
