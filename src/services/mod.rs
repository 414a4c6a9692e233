pub mod catalog_service;

pub use catalog_service::{build_listing_query, fetch_readers, get_book, list_books};
