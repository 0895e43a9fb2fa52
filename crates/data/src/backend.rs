//! Storage backend selection.
//!
//! Every operation the services need is defined once here and dispatched to
//! either the `PostgreSQL` repositories or the in-memory store. Aggregations
//! are implemented natively by each variant.

use sqlx::PgPool;

use storefinder_core::{Email, GeoPoint, HeartState, Slug, StoreId, UserId};

use crate::db::{RepositoryError, ReviewRepository, StoreRepository, UserRepository};
use crate::memory::MemoryStore;
use crate::models::{
    NearbyStore, NewReview, NewUser, Review, Store, StoreDraft, TagCount, TopStore, User,
};

/// Where directory data lives. Cheap to clone.
#[derive(Debug, Clone)]
pub enum Backend {
    /// `PostgreSQL` through a connection pool.
    Postgres(PgPool),
    /// Process-local store.
    Memory(MemoryStore),
}

impl Backend {
    /// A fresh, empty in-memory backend.
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    /// Short name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }

    /// Check the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if `PostgreSQL` does not answer.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        match self {
            Self::Postgres(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
                Ok(())
            }
            Self::Memory(_) => Ok(()),
        }
    }

    // =========================================================================
    // Stores
    // =========================================================================

    pub async fn colliding_slugs(
        &self,
        base: &Slug,
        exclude: Option<StoreId>,
    ) -> Result<Vec<Slug>, RepositoryError> {
        match self {
            Self::Postgres(pool) => StoreRepository::new(pool).colliding_slugs(base, exclude).await,
            Self::Memory(mem) => mem.colliding_slugs(base, exclude).await,
        }
    }

    pub async fn insert_store(
        &self,
        draft: &StoreDraft,
        slug: &Slug,
        author: UserId,
    ) -> Result<Store, RepositoryError> {
        match self {
            Self::Postgres(pool) => StoreRepository::new(pool).insert(draft, slug, author).await,
            Self::Memory(mem) => mem.insert_store(draft, slug, author).await,
        }
    }

    pub async fn replace_store(
        &self,
        id: StoreId,
        draft: &StoreDraft,
        slug: &Slug,
    ) -> Result<Store, RepositoryError> {
        match self {
            Self::Postgres(pool) => StoreRepository::new(pool).replace(id, draft, slug).await,
            Self::Memory(mem) => mem.replace_store(id, draft, slug).await,
        }
    }

    pub async fn store_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        match self {
            Self::Postgres(pool) => StoreRepository::new(pool).get_by_id(id).await,
            Self::Memory(mem) => mem.store_by_id(id).await,
        }
    }

    pub async fn store_by_slug(&self, slug: &str) -> Result<Option<Store>, RepositoryError> {
        match self {
            Self::Postgres(pool) => StoreRepository::new(pool).get_by_slug(slug).await,
            Self::Memory(mem) => mem.store_by_slug(slug).await,
        }
    }

    pub async fn list_stores(&self, offset: u64, limit: u64) -> Result<Vec<Store>, RepositoryError> {
        match self {
            Self::Postgres(pool) => StoreRepository::new(pool).list(offset, limit).await,
            Self::Memory(mem) => mem.list_stores(offset, limit).await,
        }
    }

    pub async fn count_stores(&self) -> Result<u64, RepositoryError> {
        match self {
            Self::Postgres(pool) => StoreRepository::new(pool).count().await,
            Self::Memory(mem) => mem.count_stores().await,
        }
    }

    pub async fn stores_with_tag(&self, tag: Option<&str>) -> Result<Vec<Store>, RepositoryError> {
        match self {
            Self::Postgres(pool) => StoreRepository::new(pool).with_tag(tag).await,
            Self::Memory(mem) => mem.stores_with_tag(tag).await,
        }
    }

    pub async fn search_stores(&self, query: &str, limit: u64) -> Result<Vec<Store>, RepositoryError> {
        match self {
            Self::Postgres(pool) => StoreRepository::new(pool).search(query, limit).await,
            Self::Memory(mem) => mem.search_stores(query, limit).await,
        }
    }

    pub async fn stores_near(
        &self,
        origin: &GeoPoint,
        max_distance_meters: f64,
        limit: u64,
    ) -> Result<Vec<NearbyStore>, RepositoryError> {
        match self {
            Self::Postgres(pool) => {
                StoreRepository::new(pool)
                    .near(origin, max_distance_meters, limit)
                    .await
            }
            Self::Memory(mem) => mem.stores_near(origin, max_distance_meters, limit).await,
        }
    }

    pub async fn stores_by_ids(&self, ids: &[StoreId]) -> Result<Vec<Store>, RepositoryError> {
        match self {
            Self::Postgres(pool) => StoreRepository::new(pool).by_ids(ids).await,
            Self::Memory(mem) => mem.stores_by_ids(ids).await,
        }
    }

    pub async fn tag_counts(&self) -> Result<Vec<TagCount>, RepositoryError> {
        match self {
            Self::Postgres(pool) => StoreRepository::new(pool).tag_counts().await,
            Self::Memory(mem) => mem.tag_counts().await,
        }
    }

    pub async fn top_stores(
        &self,
        min_reviews: u64,
        limit: u64,
    ) -> Result<Vec<TopStore>, RepositoryError> {
        match self {
            Self::Postgres(pool) => {
                StoreRepository::new(pool)
                    .top_stores(min_reviews, limit, &ReviewRepository::new(pool))
                    .await
            }
            Self::Memory(mem) => mem.top_stores(min_reviews, limit).await,
        }
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    pub async fn reviews_for_store(&self, store: StoreId) -> Result<Vec<Review>, RepositoryError> {
        match self {
            Self::Postgres(pool) => ReviewRepository::new(pool).for_store(store).await,
            Self::Memory(mem) => mem.reviews_for_store(store).await,
        }
    }

    pub async fn insert_review(&self, review: &NewReview) -> Result<Review, RepositoryError> {
        match self {
            Self::Postgres(pool) => ReviewRepository::new(pool).create(review).await,
            Self::Memory(mem) => mem.insert_review(review).await,
        }
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub async fn insert_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        match self {
            Self::Postgres(pool) => UserRepository::new(pool).create(user).await,
            Self::Memory(mem) => mem.insert_user(user).await,
        }
    }

    pub async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        match self {
            Self::Postgres(pool) => UserRepository::new(pool).get_by_id(id).await,
            Self::Memory(mem) => mem.user_by_id(id).await,
        }
    }

    pub async fn user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        match self {
            Self::Postgres(pool) => UserRepository::new(pool).get_by_email(email).await,
            Self::Memory(mem) => mem.user_by_email(email).await,
        }
    }

    pub async fn update_user_profile(
        &self,
        id: UserId,
        name: &str,
        email: &Email,
    ) -> Result<User, RepositoryError> {
        match self {
            Self::Postgres(pool) => {
                UserRepository::new(pool)
                    .update_profile(id, name, email)
                    .await
            }
            Self::Memory(mem) => mem.update_user_profile(id, name, email).await,
        }
    }

    pub async fn toggle_heart(
        &self,
        user: UserId,
        store: StoreId,
    ) -> Result<(User, HeartState), RepositoryError> {
        match self {
            Self::Postgres(pool) => UserRepository::new(pool).toggle_heart(user, store).await,
            Self::Memory(mem) => mem.toggle_heart(user, store).await,
        }
    }
}
