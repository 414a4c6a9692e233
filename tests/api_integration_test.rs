use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use book_catalog::auth::create_jwt;
use book_catalog::db;
use book_catalog::infrastructure::AppState;
use book_catalog::{api, models::user};
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use serde_json::{Value, json};
use tower::util::ServiceExt; // for `oneshot`

// Helper to create a test database
async fn setup_test_db() -> DatabaseConnection {
    db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB")
}

// Helper to create a test user and a bearer token for it
async fn create_test_user(db: &DatabaseConnection, username: &str, role: &str) -> String {
    let now = chrono::Utc::now().to_rfc3339();
    let user = user::ActiveModel {
        username: Set(username.to_string()),
        first_name: Set(String::new()),
        last_name: Set(String::new()),
        password_hash: Set("$argon2id$dummy_hash".to_string()),
        role: Set(role.to_string()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    user::Entity::insert(user)
        .exec(db)
        .await
        .expect("Failed to create user");
    create_jwt(username, role).expect("Failed to create JWT")
}

async fn setup_app() -> (Router, DatabaseConnection) {
    let db = setup_test_db().await;
    let app = api::api_router(AppState::new(db.clone()));
    (app, db)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().uri(uri).method(method);
    if let Some(token) = token {
        req = req.header("Authorization", format!("Bearer {}", token));
    }
    let req = match body {
        Some(body) => req
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create_book(app: &Router, token: &str, name: &str, price: u32, discount: Option<u32>, author: &str) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/books",
        Some(token),
        Some(json!({
            "name": name,
            "price": price,
            "discount": discount,
            "author": author,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_i64().expect("id missing")
}

#[tokio::test]
async fn test_create_sets_caller_as_owner() {
    let (app, db) = setup_app().await;
    let token = create_test_user(&db, "test_username", "user").await;

    let (status, body) = send(
        &app,
        "POST",
        "/books",
        Some(&token),
        Some(json!({ "name": "Test book 3", "price": 890, "author": "Author Name" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["owner_name"], "test_username");
    assert_eq!(body["price"], "890.00");
    assert_eq!(body["discount"], Value::Null);
    assert_eq!(body["discount_price"], Value::Null);
    assert_eq!(body["rating"], Value::Null);
    assert_eq!(body["readers"], json!([]));
}

#[tokio::test]
async fn test_create_requires_authentication() {
    let (app, _db) = setup_app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/books",
        None,
        Some(json!({ "name": "Test book 3", "price": 890, "author": "Author Name" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_rejects_client_rating_and_bad_prices() {
    let (app, db) = setup_app().await;
    let token = create_test_user(&db, "test_username", "user").await;

    // rating is read-only: silently ignored
    let (status, body) = send(
        &app,
        "POST",
        "/books",
        Some(&token),
        Some(json!({ "name": "Rated", "price": "12.50", "author": "A", "rating": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["rating"], Value::Null);
    assert_eq!(body["price"], "12.50");

    let (status, _) = send(
        &app,
        "POST",
        "/books",
        Some(&token),
        Some(json!({ "name": "Too precise", "price": "1.005", "author": "A" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_filter_search_and_ordering() {
    let (app, db) = setup_app().await;
    let token = create_test_user(&db, "test_username", "user").await;
    let book_1 = create_book(&app, &token, "Test book 1", 100, Some(21), "Author1").await;
    let book_2 = create_book(&app, &token, "Test book 2", 200, Some(144), "Author1").await;
    let book_3 = create_book(&app, &token, "Test book Author1", 300, None, "Author2").await;

    let ids = |body: &Value| -> Vec<i64> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|b| b["id"].as_i64().unwrap())
            .collect()
    };

    let (status, body) = send(&app, "GET", "/books", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![book_1, book_2, book_3]);
    assert_eq!(body[0]["discount_price"], "79.00");
    assert_eq!(body[1]["discount_price"], "56.00");
    assert_eq!(body[2]["discount_price"], Value::Null);

    let (_, body) = send(&app, "GET", "/books?price=200", None, None).await;
    assert_eq!(ids(&body), vec![book_2]);

    let (_, body) = send(&app, "GET", "/books?search=Author2", None, None).await;
    assert_eq!(ids(&body), vec![book_3]);

    let (_, body) = send(&app, "GET", "/books?ordering=-price", None, None).await;
    assert_eq!(ids(&body), vec![book_3, book_2, book_1]);

    // Unrecognized parameters are ignored
    let (status, body) = send(&app, "GET", "/books?page=2&colour=red", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![book_1, book_2, book_3]);

    let (status, _) = send(&app, "GET", "/books?price=abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_treats_wildcards_literally() {
    let (app, db) = setup_app().await;
    let token = create_test_user(&db, "test_username", "user").await;
    create_book(&app, &token, "Test book 1", 100, None, "Author1").await;
    create_book(&app, &token, "Test book 2", 200, None, "Author2").await;

    let (status, body) = send(&app, "GET", "/books?search=_", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (_, body) = send(&app, "GET", "/books?search=%25", None, None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_get_detail() {
    let (app, db) = setup_app().await;
    let token = create_test_user(&db, "test_username", "user").await;
    let book_1 = create_book(&app, &token, "Test book 1", 100, Some(21), "Author1").await;

    let (status, body) = send(&app, "GET", &format!("/books/{}", book_1), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "id": book_1,
            "name": "Test book 1",
            "price": "100.00",
            "discount": "21.00",
            "author": "Author1",
            "owner_name": "test_username",
            "discount_price": "79.00",
            "rating": null,
            "readers": [],
        })
    );

    let (status, _) = send(&app, "GET", "/books/999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_by_owner() {
    let (app, db) = setup_app().await;
    let token = create_test_user(&db, "test_username", "user").await;
    let book_1 = create_book(&app, &token, "Test book 1", 100, Some(21), "Author1").await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/books/{}", book_1),
        Some(&token),
        Some(json!({ "name": "Test book 1", "price": 890, "author": "Author1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], "890.00");
}

#[tokio::test]
async fn test_update_not_owner() {
    let (app, db) = setup_app().await;
    let owner = create_test_user(&db, "test_username", "user").await;
    let other = create_test_user(&db, "test-username2", "user").await;
    let book_1 = create_book(&app, &owner, "Test book 1", 100, Some(21), "Author1").await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/books/{}", book_1),
        Some(&other),
        Some(json!({ "name": "Test book 1", "price": 890, "author": "Author1" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body,
        json!({ "error": "You do not have permission to perform this action." })
    );

    let (_, body) = send(&app, "GET", &format!("/books/{}", book_1), None, None).await;
    assert_eq!(body["price"], "100.00");

    let (status, _) = send(&app, "DELETE", &format!("/books/{}", book_1), Some(&other), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_update_not_owner_with_bad_body() {
    let (app, db) = setup_app().await;
    let owner = create_test_user(&db, "test_username", "user").await;
    let other = create_test_user(&db, "test-username2", "user").await;
    let book_1 = create_book(&app, &owner, "Test book 1", 100, Some(21), "Author1").await;
    let uri = format!("/books/{}", book_1);

    // Incomplete payload from a non-owner is still a permission failure
    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&other),
        Some(json!({ "name": "Test book 1" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body,
        json!({ "error": "You do not have permission to perform this action." })
    );

    // Same for a body that is not JSON at all
    let req = Request::builder()
        .uri(&uri)
        .method("PUT")
        .header("Authorization", format!("Bearer {}", other))
        .body(Body::from("not json"))
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The owner sending the same incomplete payload gets a validation error
    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&owner),
        Some(json!({ "name": "Test book 1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Validation error"));

    let (status, _) = send(
        &app,
        "PUT",
        "/books/999",
        Some(&other),
        Some(json!({ "name": "Test book 1" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_not_owner_but_staff() {
    let (app, db) = setup_app().await;
    let owner = create_test_user(&db, "test_username", "user").await;
    let staff = create_test_user(&db, "test-username2", "staff").await;
    let book_1 = create_book(&app, &owner, "Test book 1", 100, Some(21), "Author1").await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/books/{}", book_1),
        Some(&staff),
        Some(json!({ "name": "Test book 1", "price": 890, "author": "Author1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], "890.00");
}

#[tokio::test]
async fn test_delete() {
    let (app, db) = setup_app().await;
    let token = create_test_user(&db, "test_username", "user").await;
    let book_1 = create_book(&app, &token, "Test book 1", 100, Some(21), "Author1").await;
    create_book(&app, &token, "Test book 2", 200, None, "Author1").await;

    let (status, _) = send(&app, "DELETE", &format!("/books/{}", book_1), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, "GET", "/books", None, None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", &format!("/books/{}", book_1), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_like_bookmark_and_rate() {
    let (app, db) = setup_app().await;
    let token = create_test_user(&db, "test_username", "user").await;
    let book_1 = create_book(&app, &token, "Test book 1", 100, Some(21), "Author1").await;
    let uri = format!("/books/{}/relation", book_1);

    let (status, body) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "book_id": book_1, "like": false, "in_bookmarks": false, "rate": null })
    );

    let (status, body) = send(&app, "PATCH", &uri, Some(&token), Some(json!({ "like": true }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["like"], true);

    let (_, body) = send(&app, "PATCH", &uri, Some(&token), Some(json!({ "in_bookmarks": true }))).await;
    assert_eq!(body["like"], true);
    assert_eq!(body["in_bookmarks"], true);

    let (_, body) = send(&app, "PATCH", &uri, Some(&token), Some(json!({ "rate": 4 }))).await;
    assert_eq!(body["rate"], 4);

    let (_, book) = send(&app, "GET", &format!("/books/{}", book_1), None, None).await;
    assert_eq!(book["rating"], "4.00");
    assert_eq!(book["readers"], json!(["test_username"]));

    let (_, body) = send(&app, "PATCH", &uri, Some(&token), Some(json!({ "rate": null }))).await;
    assert_eq!(body["rate"], Value::Null);
    assert_eq!(body["like"], true);

    let (_, book) = send(&app, "GET", &format!("/books/{}", book_1), None, None).await;
    assert_eq!(book["rating"], Value::Null);
}

#[tokio::test]
async fn test_rating_is_mean_of_all_readers() {
    let (app, db) = setup_app().await;
    let owner = create_test_user(&db, "user1", "user").await;
    let user2 = create_test_user(&db, "user2", "user").await;
    let user3 = create_test_user(&db, "user3", "user").await;
    let user4 = create_test_user(&db, "user4", "user").await;
    let book_1 = create_book(&app, &owner, "Test book 1", 54, Some(21), "Author1").await;
    let uri = format!("/books/{}/relation", book_1);

    for (token, rate) in [(&owner, 5), (&user2, 5), (&user3, 4)] {
        let (status, _) = send(&app, "PATCH", &uri, Some(token.as_str()), Some(json!({ "rate": rate }))).await;
        assert_eq!(status, StatusCode::OK);
    }
    send(&app, "PATCH", &uri, Some(&user4), Some(json!({ "like": true }))).await;

    let (_, book) = send(&app, "GET", &format!("/books/{}", book_1), None, None).await;
    assert_eq!(book["rating"], "4.67");
    assert_eq!(book["discount_price"], "33.00");
    assert_eq!(book["readers"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_invalid_rate() {
    let (app, db) = setup_app().await;
    let token = create_test_user(&db, "test_username", "user").await;
    let book_1 = create_book(&app, &token, "Test book 1", 100, Some(21), "Author1").await;
    let uri = format!("/books/{}/relation", book_1);

    let (status, _) = send(&app, "PATCH", &uri, Some(&token), Some(json!({ "rate": 6 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, book) = send(&app, "GET", &format!("/books/{}", book_1), None, None).await;
    assert_eq!(book["readers"], json!([]));
}

#[tokio::test]
async fn test_relation_errors() {
    let (app, db) = setup_app().await;
    let token = create_test_user(&db, "test_username", "user").await;

    let (status, _) = send(&app, "PATCH", "/books/999/relation", Some(&token), Some(json!({ "like": true }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/books/999/relation", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "PATCH", "/books/999/relation", None, Some(json!({ "like": true }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_remove_relation() {
    let (app, db) = setup_app().await;
    let token = create_test_user(&db, "test_username", "user").await;
    let book_1 = create_book(&app, &token, "Test book 1", 100, None, "Author1").await;
    let uri = format!("/books/{}/relation", book_1);

    send(&app, "PATCH", &uri, Some(&token), Some(json!({ "rate": 2 }))).await;
    let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, book) = send(&app, "GET", &format!("/books/{}", book_1), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["rating"], Value::Null);
    assert_eq!(book["readers"], json!([]));
}

#[tokio::test]
async fn test_health() {
    let (app, _db) = setup_app().await;

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
