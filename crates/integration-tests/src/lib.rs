//! Integration tests for Storefinder.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storefinder-integration-tests
//! ```
//!
//! The suites drive the public services against the in-memory backend, so
//! no database is needed.
//!
//! # Test Categories
//!
//! - `slugs` - Slug assignment on create and rename
//! - `aggregations` - Tag counts and the top stores ranking
//! - `hearts` - Heart toggling and hearted stores
//! - `stores` - Store writes, reads, pagination, search and proximity
//! - `users` - Registration and account edits

use storefinder_core::UserId;
use storefinder_data::models::{RegisterInput, ReviewInput, Store, StoreInput, User};
use storefinder_data::{Backend, Directory, MemoryStore, Result, Settings};

/// A fresh, empty in-memory directory with default settings.
#[must_use]
pub fn directory() -> Directory {
    Directory::in_memory(Settings::default())
}

/// A fresh directory that also exposes its memory store for direct writes.
#[must_use]
pub fn directory_with_store() -> (Directory, MemoryStore) {
    let memory = MemoryStore::new();
    let directory = Directory::new(Backend::Memory(memory.clone()), Settings::default());
    (directory, memory)
}

/// Valid store input at `(lng, lat)`.
#[must_use]
pub fn store_input(name: &str, lng: f64, lat: f64, tags: &[&str]) -> StoreInput {
    StoreInput {
        name: name.to_owned(),
        description: String::new(),
        tags: tags.iter().map(|t| (*t).to_owned()).collect(),
        lng: Some(lng),
        lat: Some(lat),
        address: "1 King St W, Toronto".to_owned(),
        photo: None,
    }
}

/// Register a user whose password is `hunter22`.
///
/// # Errors
///
/// Propagates any `DirectoryError` from registration.
pub async fn register(directory: &Directory, name: &str, email: &str) -> Result<User> {
    directory
        .users()
        .register(RegisterInput {
            name: name.to_owned(),
            email: email.to_owned(),
            password: "hunter22".to_owned(),
            password_confirm: "hunter22".to_owned(),
        })
        .await
}

/// Create a store named `name` near downtown Toronto.
///
/// # Errors
///
/// Propagates any `DirectoryError` from the write.
pub async fn create_named(directory: &Directory, author: UserId, name: &str) -> Result<Store> {
    directory
        .stores()
        .create_store(author, store_input(name, -79.38, 43.65, &[]))
        .await
}

/// Review `store` as `author` with `rating`.
///
/// # Errors
///
/// Propagates any `DirectoryError` from the write.
pub async fn review(directory: &Directory, author: UserId, store: &Store, rating: i64) -> Result<()> {
    directory
        .stores()
        .add_review(
            author,
            store.id,
            ReviewInput {
                text: format!("Rated {rating}"),
                rating,
            },
        )
        .await
        .map(|_| ())
}
