pub mod book;
pub mod listing;
pub mod user;
pub mod user_book_relation;

pub use listing::BookListing;
