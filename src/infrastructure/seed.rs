//! Demo data, inserted through the repositories so ratings are aggregated
//! exactly as they are for API writes.

use rust_decimal::Decimal;

use crate::domain::{BookInput, DomainError, NewUser, RelationPatch};
use crate::infrastructure::AppState;

fn demo_user(username: &str, first_name: &str, last_name: &str, role: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        password: username.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        role: role.to_string(),
    }
}

fn rate(rate: i32, like: bool) -> RelationPatch {
    RelationPatch {
        like: Some(like),
        in_bookmarks: None,
        rate: Some(Some(rate)),
    }
}

pub async fn seed_demo_data(state: &AppState) -> Result<(), DomainError> {
    if state.user_repo.find_by_username("admin").await?.is_some() {
        tracing::info!("Demo data already present, skipping");
        return Ok(());
    }

    let admin = state
        .user_repo
        .create(demo_user("admin", "", "", "admin"))
        .await?;
    let alice = state
        .user_repo
        .create(demo_user("alice", "Alice", "Martin", "user"))
        .await?;
    let bob = state
        .user_repo
        .create(demo_user("bob", "Bob", "Durand", "user"))
        .await?;

    let books = [
        ("The Hobbit", 2499, Some(500), "J.R.R. Tolkien", Some(alice.id)),
        ("Foundation", 1850, None, "Isaac Asimov", Some(alice.id)),
        ("Dune", 2000, Some(250), "Frank Herbert", Some(bob.id)),
        ("I, Robot", 1200, None, "Isaac Asimov", None),
    ];

    let mut ids = Vec::with_capacity(books.len());
    for (name, price, discount, author, owner_id) in books {
        let input = BookInput {
            name: name.to_string(),
            price: Decimal::new(price, 2),
            discount: discount.map(|d| Decimal::new(d, 2)),
            author: author.to_string(),
        };
        ids.push(state.book_repo.create(owner_id, input).await?.id);
    }

    let relations = [
        (admin.id, ids[0], rate(5, true)),
        (alice.id, ids[0], rate(5, true)),
        (bob.id, ids[0], rate(4, false)),
        (alice.id, ids[1], rate(3, false)),
        (bob.id, ids[2], rate(4, true)),
        (
            alice.id,
            ids[2],
            RelationPatch {
                in_bookmarks: Some(true),
                ..Default::default()
            },
        ),
    ];

    let relation_count = relations.len();
    for (user_id, book_id, patch) in relations {
        state.relation_repo.save(user_id, book_id, patch).await?;
    }

    tracing::info!(
        "Seeded {} users, {} books and {} relations",
        3,
        ids.len(),
        relation_count
    );
    Ok(())
}
