pub mod auth;
pub mod books;
pub mod health;
pub mod relations;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;

use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::infrastructure::auth::Claims;
use crate::models::user;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        // The caller's own relation to a book
        .route(
            "/books/:id/relation",
            get(relations::get_relation)
                .patch(relations::update_relation)
                .delete(relations::delete_relation),
        )
        .with_state(state)
}

/// Map a domain failure to its HTTP status with an `{"error": ...}` body
pub fn error_response(e: DomainError) -> Response {
    let status = match &e {
        DomainError::NotFound => StatusCode::NOT_FOUND,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Forbidden => StatusCode::FORBIDDEN,
        DomainError::Unauthorized => StatusCode::UNAUTHORIZED,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::Database(_) | DomainError::Internal(_) => {
            tracing::error!("Request failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, Json(json!({ "error": e.to_string() }))).into_response()
}

/// Resolve the authenticated user behind `claims`
pub(crate) async fn current_user(
    state: &AppState,
    claims: &Claims,
) -> Result<user::Model, DomainError> {
    state
        .user_repo
        .find_by_username(&claims.sub)
        .await?
        .ok_or(DomainError::Unauthorized)
}
