use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::books::list_books,
        api::books::get_book,
        api::books::create_book,
        api::books::update_book,
        api::books::delete_book,
        api::relations::get_relation,
        api::relations::update_relation,
        api::relations::delete_relation,
    ),
    components(
        schemas(
            crate::models::listing::BookListing,
            api::books::BookRequest,
            api::relations::RelationRequest,
        )
    ),
    tags(
        (name = "book-catalog", description = "Book catalog API")
    )
)]
pub struct ApiDoc;
