//! Seed the directory from a YAML file.
//!
//! # File Format
//!
//! ```yaml
//! users:
//!   - name: Wes
//!     email: wes@example.com
//!     password: hunter22
//! stores:
//!   - name: Wes's Coffee
//!     description: Espresso and donuts
//!     tags: [Wifi, Open Late]
//!     lng: -79.38
//!     lat: 43.65
//!     address: 1 King St W, Toronto
//!     author: wes@example.com
//! reviews:
//!   - store: Wes's Coffee
//!     author: wes@example.com
//!     text: Great espresso
//!     rating: 5
//! ```
//!
//! Stores reference their author by email; reviews reference their store by
//! name. Entries are written in file order through the regular services, so
//! slugs, validation and password hashing behave exactly as for live writes.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use storefinder_core::{Email, StoreId, UserId};
use storefinder_data::models::{RegisterInput, ReviewInput, StoreInput};
use storefinder_data::{Directory, DirectoryError};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("No seeded user with email {0}")]
    UnknownAuthor(String),

    #[error("No seeded store named {0:?}")]
    UnknownStore(String),

    #[error("Failed to seed {what}: {source}")]
    Directory {
        what: String,
        #[source]
        source: DirectoryError,
    },
}

/// Contents of a seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeedFile {
    pub users: Vec<SeedUser>,
    pub stores: Vec<SeedStore>,
    pub reviews: Vec<SeedReview>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedStore {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub lng: f64,
    pub lat: f64,
    pub address: String,
    #[serde(default)]
    pub photo: Option<String>,
    /// Author's email.
    pub author: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedReview {
    /// Store name.
    pub store: String,
    /// Author's email.
    pub author: String,
    pub text: String,
    pub rating: i64,
}

/// What a seed run wrote.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub users: usize,
    pub stores: usize,
    pub reviews: usize,
}

/// Read `path` and seed `directory` from it.
///
/// # Errors
///
/// Returns `SeedError` if the file cannot be read or parsed, or any entry is
/// rejected.
pub async fn from_file(directory: &Directory, path: &Path) -> Result<SeedSummary, SeedError> {
    info!(path = %path.display(), "Loading seed file");

    let content = tokio::fs::read_to_string(path).await?;
    let file: SeedFile = serde_yaml::from_str(&content)?;

    info!(
        users = file.users.len(),
        stores = file.stores.len(),
        reviews = file.reviews.len(),
        "Parsed seed file"
    );

    seed(directory, file).await
}

/// Write every entry of `file` to `directory`.
///
/// # Errors
///
/// Returns `SeedError` on the first rejected entry; earlier entries stay written.
pub async fn seed(directory: &Directory, file: SeedFile) -> Result<SeedSummary, SeedError> {
    let mut summary = SeedSummary::default();
    let mut users: HashMap<String, UserId> = HashMap::new();
    let mut stores: HashMap<String, StoreId> = HashMap::new();

    for user in file.users {
        let what = format!("user {}", user.email);
        let created = directory
            .users()
            .register(RegisterInput {
                name: user.name,
                email: user.email,
                password_confirm: user.password.clone(),
                password: user.password,
            })
            .await
            .map_err(|source| SeedError::Directory { what, source })?;

        users.insert(created.email.as_str().to_owned(), created.id);
        summary.users += 1;
    }

    for store in file.stores {
        let author = lookup_user(&users, &store.author)?;
        let what = format!("store {:?}", store.name);
        let name = store.name.clone();

        let created = directory
            .stores()
            .create_store(
                author,
                StoreInput {
                    name: store.name,
                    description: store.description,
                    tags: store.tags,
                    lng: Some(store.lng),
                    lat: Some(store.lat),
                    address: store.address,
                    photo: store.photo,
                },
            )
            .await
            .map_err(|source| SeedError::Directory { what, source })?;

        stores.entry(name).or_insert(created.id);
        summary.stores += 1;
    }

    for review in file.reviews {
        let author = lookup_user(&users, &review.author)?;
        let store = *stores
            .get(&review.store)
            .ok_or_else(|| SeedError::UnknownStore(review.store.clone()))?;
        let what = format!("review of {:?}", review.store);

        directory
            .stores()
            .add_review(
                author,
                store,
                ReviewInput {
                    text: review.text,
                    rating: review.rating,
                },
            )
            .await
            .map_err(|source| SeedError::Directory { what, source })?;

        summary.reviews += 1;
    }

    info!(
        users = summary.users,
        stores = summary.stores,
        reviews = summary.reviews,
        "Seeding complete"
    );
    Ok(summary)
}

fn lookup_user(users: &HashMap<String, UserId>, email: &str) -> Result<UserId, SeedError> {
    Email::parse(email)
        .ok()
        .and_then(|e| users.get(e.as_str()).copied())
        .ok_or_else(|| SeedError::UnknownAuthor(email.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storefinder_data::Settings;

    use super::*;

    const SAMPLE: &str = r"
users:
  - name: Wes
    email: Wes@Example.com
    password: hunter22
  - name: Scott
    email: scott@example.com
    password: hunter22
stores:
  - name: Coffee Spot
    tags: [Wifi, Open Late]
    lng: -79.38
    lat: 43.65
    address: 1 King St W
    author: wes@example.com
  - name: Coffee Spot
    tags: [Wifi]
    lng: -79.39
    lat: 43.66
    address: 2 King St W
    author: scott@example.com
reviews:
  - store: Coffee Spot
    author: scott@example.com
    text: Great
    rating: 5
  - store: Coffee Spot
    author: wes@example.com
    text: Fine
    rating: 3
";

    #[test]
    fn test_parse_sample() {
        let file: SeedFile = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(file.users.len(), 2);
        assert_eq!(file.stores.len(), 2);
        assert_eq!(file.stores[0].tags, vec!["Wifi", "Open Late"]);
        assert!(file.stores[0].description.is_empty());
        assert_eq!(file.reviews[1].rating, 3);
    }

    #[test]
    fn test_parse_rejects_unknown_fields() {
        let result: Result<SeedFile, _> = serde_yaml::from_str("products: []");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_seed_in_memory() {
        let directory = Directory::in_memory(Settings::default());
        let file: SeedFile = serde_yaml::from_str(SAMPLE).unwrap();

        let summary = seed(&directory, file).await.unwrap();
        assert_eq!(
            summary,
            SeedSummary {
                users: 2,
                stores: 2,
                reviews: 2
            }
        );

        let page = directory.stores().list_stores(1).await.unwrap();
        let mut slugs: Vec<&str> = page.stores.iter().map(|s| s.slug.as_str()).collect();
        slugs.sort_unstable();
        assert_eq!(slugs, vec!["coffee-spot", "coffee-spot-2"]);

        // Reviews attach to the first store seeded under the name.
        let top = directory.stores().top_stores().await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].slug.as_str(), "coffee-spot");
        assert!((top[0].average_rating - 4.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_seed_unknown_author() {
        let directory = Directory::in_memory(Settings::default());
        let file: SeedFile = serde_yaml::from_str(
            r"
stores:
  - name: Orphan
    lng: 0
    lat: 0
    address: Nowhere
    author: ghost@example.com
",
        )
        .unwrap();

        let err = seed(&directory, file).await.unwrap_err();
        assert!(matches!(err, SeedError::UnknownAuthor(ref e) if e == "ghost@example.com"));
    }
}
