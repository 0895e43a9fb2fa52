//! Review repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use storefinder_core::{Rating, ReviewId, StoreId, UserId};

use super::{RepositoryError, map_constraint};
use crate::models::{NewReview, Review};

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i32,
    store_id: i32,
    author_id: i32,
    text: String,
    rating: i16,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(r: ReviewRow) -> Result<Self, Self::Error> {
        let rating = Rating::new(i64::from(r.rating)).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid rating for review {}: {e}", r.id))
        })?;

        Ok(Self {
            id: ReviewId::new(r.id),
            store: StoreId::new(r.store_id),
            author: UserId::new(r.author_id),
            text: r.text,
            rating,
            created_at: r.created_at,
        })
    }
}

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store or author doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, review), fields(store = %review.store, rating = %review.rating))]
    pub async fn create(&self, review: &NewReview) -> Result<Review, RepositoryError> {
        let row: ReviewRow = sqlx::query_as(
            r"
            INSERT INTO reviews (store_id, author_id, text, rating)
            VALUES ($1, $2, $3, $4)
            RETURNING id, store_id, author_id, text, rating, created_at
            ",
        )
        .bind(review.store)
        .bind(review.author)
        .bind(&review.text)
        .bind(i16::from(review.rating.get()))
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_constraint(e, "review", "store or author"))?;

        Review::try_from(row)
    }

    /// Reviews of the given stores, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_stores(&self, stores: &[StoreId]) -> Result<Vec<Review>, RepositoryError> {
        if stores.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = stores.iter().map(StoreId::as_i32).collect();
        let rows: Vec<ReviewRow> = sqlx::query_as(
            r"
            SELECT id, store_id, author_id, text, rating, created_at
            FROM reviews
            WHERE store_id = ANY($1)
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Review::try_from).collect()
    }

    /// Reviews of one store, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_store(&self, store: StoreId) -> Result<Vec<Review>, RepositoryError> {
        self.for_stores(&[store]).await
    }
}
