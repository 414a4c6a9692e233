//! Handlers for the caller's like/bookmark/rating relation to a book

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Deserializer};
use utoipa::ToSchema;

use super::{current_user, error_response};
use crate::domain::{DomainError, Relation, RelationPatch, RelationState};
use crate::infrastructure::AppState;
use crate::infrastructure::auth::Claims;

/// Partial relation update. Omitted fields are left alone, `"rate": null`
/// clears the rating.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RelationRequest {
    pub like: Option<bool>,
    pub in_bookmarks: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<i32>, minimum = 1, maximum = 5)]
    pub rate: Option<Option<i32>>,
}

// Distinguishes an explicit null from an absent field
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl From<RelationRequest> for RelationPatch {
    fn from(req: RelationRequest) -> Self {
        Self {
            like: req.like,
            in_bookmarks: req.in_bookmarks,
            rate: req.rate,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/books/{id}/relation",
    params(("id" = i32, Path, description = "Book id")),
    responses(
        (status = 200, description = "The caller's relation, defaults if none exists yet"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_relation(
    State(state): State<AppState>,
    claims: Claims,
    Path(book_id): Path<i32>,
) -> Response {
    let result = async {
        let user = current_user(&state, &claims).await?;
        if state.book_repo.find_by_id(book_id).await?.is_none() {
            return Err(DomainError::NotFound);
        }
        let relation = state.relation_repo.find(user.id, book_id).await?;
        Ok(relation.unwrap_or_else(|| Relation::from_state(book_id, RelationState::default())))
    }
    .await;

    match result {
        Ok(relation) => Json(relation).into_response(),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    patch,
    path = "/api/books/{id}/relation",
    params(("id" = i32, Path, description = "Book id")),
    request_body = RelationRequest,
    responses(
        (status = 200, description = "Relation saved and book rating refreshed"),
        (status = 400, description = "Rate outside 1..=5"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_relation(
    State(state): State<AppState>,
    claims: Claims,
    Path(book_id): Path<i32>,
    Json(payload): Json<RelationRequest>,
) -> Response {
    let result = async {
        let user = current_user(&state, &claims).await?;
        state
            .relation_repo
            .save(user.id, book_id, payload.into())
            .await
    }
    .await;

    match result {
        Ok(relation) => Json(relation).into_response(),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    delete,
    path = "/api/books/{id}/relation",
    params(("id" = i32, Path, description = "Book id")),
    responses(
        (status = 204, description = "Relation removed"),
        (status = 404, description = "No relation to remove")
    )
)]
pub async fn delete_relation(
    State(state): State<AppState>,
    claims: Claims,
    Path(book_id): Path<i32>,
) -> Response {
    let result = async {
        let user = current_user(&state, &claims).await?;
        state.relation_repo.delete(user.id, book_id).await
    }
    .await;

    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}
