//! Write permission rule for books.

use crate::models::{book, user};

/// Whether `acting` may update or delete `book`.
///
/// Only the book's owner or a staff user may mutate it. Anonymous callers
/// never may, and a book whose owner was deleted can only be mutated by staff.
pub fn can_mutate(acting: Option<&user::Model>, book: &book::Model) -> bool {
    match acting {
        Some(user) => user.is_staff() || book.owner_id == Some(user.id),
        None => false,
    }
}
