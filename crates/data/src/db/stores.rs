//! Store repository for database operations.
//!
//! Aggregations (tag counts, top stores) and the text/proximity queries run
//! inside `PostgreSQL`; only the final rows are decoded here.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use storefinder_core::{EARTH_RADIUS_METERS, GeoPoint, Slug, StoreId, UserId};

use super::{RepositoryError, count_to_u64, map_constraint, to_bigint};
use crate::models::{Location, NearbyStore, Review, Store, StoreDraft, TagCount, TopStore};

macro_rules! store_columns {
    () => {
        "id, name, slug, description, tags, created_at, longitude, latitude, address, photo, author_id"
    };
}

/// Raw `stores` row.
#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: i32,
    name: String,
    slug: String,
    description: String,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    longitude: f64,
    latitude: f64,
    address: String,
    photo: Option<String>,
    author_id: i32,
}

impl TryFrom<StoreRow> for Store {
    type Error = RepositoryError;

    fn try_from(r: StoreRow) -> Result<Self, Self::Error> {
        let point = GeoPoint::new(r.longitude, r.latitude).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid coordinates for store {}: {e}", r.id))
        })?;

        Ok(Self {
            id: StoreId::new(r.id),
            name: r.name,
            slug: Slug::from_stored(r.slug),
            description: r.description,
            tags: r.tags,
            created_at: r.created_at,
            location: Location {
                point,
                address: r.address,
            },
            photo: r.photo,
            author: UserId::new(r.author_id),
        })
    }
}

fn decode_all(rows: Vec<StoreRow>) -> Result<Vec<Store>, RepositoryError> {
    rows.into_iter().map(Store::try_from).collect()
}

#[derive(Debug, sqlx::FromRow)]
struct NearbyRow {
    #[sqlx(flatten)]
    store: StoreRow,
    distance_meters: f64,
}

#[derive(Debug, sqlx::FromRow)]
struct TagCountRow {
    tag: String,
    count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct RankedRow {
    id: i32,
    name: String,
    slug: String,
    photo: Option<String>,
    average_rating: f64,
}

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Slugs of stores whose slug is `base` or `base-<digits>`, ignoring case.
    ///
    /// `exclude` leaves one store out (the store being renamed).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, base), fields(base = %base))]
    pub async fn colliding_slugs(
        &self,
        base: &Slug,
        exclude: Option<StoreId>,
    ) -> Result<Vec<Slug>, RepositoryError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r"
            SELECT slug
            FROM stores
            WHERE slug ~* $1
              AND ($2::INTEGER IS NULL OR id <> $2)
            ",
        )
        .bind(base.collision_pattern())
        .bind(exclude)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(slug,)| Slug::from_stored(slug))
            .collect())
    }

    /// Insert a new store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the author does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, draft, slug), fields(name = %draft.name, slug = %slug))]
    pub async fn insert(
        &self,
        draft: &StoreDraft,
        slug: &Slug,
        author: UserId,
    ) -> Result<Store, RepositoryError> {
        let row: StoreRow = sqlx::query_as(concat!(
            r"
            INSERT INTO stores
                (name, slug, description, tags, longitude, latitude, address, photo, author_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING ",
            store_columns!()
        ))
        .bind(&draft.name)
        .bind(slug.as_str())
        .bind(&draft.description)
        .bind(&draft.tags)
        .bind(draft.location.point.lng())
        .bind(draft.location.point.lat())
        .bind(&draft.location.address)
        .bind(draft.photo.as_deref())
        .bind(author)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_constraint(e, "store", "author"))?;

        debug!(id = row.id, "Inserted store");
        Store::try_from(row)
    }

    /// Replace every editable field of a store.
    ///
    /// `author` and `created_at` are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, id, draft, slug), fields(id = %id, slug = %slug))]
    pub async fn replace(
        &self,
        id: StoreId,
        draft: &StoreDraft,
        slug: &Slug,
    ) -> Result<Store, RepositoryError> {
        let row: Option<StoreRow> = sqlx::query_as(concat!(
            r"
            UPDATE stores
            SET name = $2, slug = $3, description = $4, tags = $5,
                longitude = $6, latitude = $7, address = $8, photo = $9
            WHERE id = $1
            RETURNING ",
            store_columns!()
        ))
        .bind(id)
        .bind(&draft.name)
        .bind(slug.as_str())
        .bind(&draft.description)
        .bind(&draft.tags)
        .bind(draft.location.point.lng())
        .bind(draft.location.point.lat())
        .bind(&draft.location.address)
        .bind(draft.photo.as_deref())
        .fetch_optional(self.pool)
        .await?;

        row.ok_or_else(|| RepositoryError::NotFound(format!("store {id}")))
            .and_then(Store::try_from)
    }

    /// Get a store by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let row: Option<StoreRow> =
            sqlx::query_as(concat!("SELECT ", store_columns!(), " FROM stores WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        row.map(Store::try_from).transpose()
    }

    /// Get a store by slug.
    ///
    /// If a slug race left duplicates behind, the oldest store wins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Store>, RepositoryError> {
        let row: Option<StoreRow> = sqlx::query_as(concat!(
            "SELECT ",
            store_columns!(),
            " FROM stores WHERE slug = $1 ORDER BY id LIMIT 1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        row.map(Store::try_from).transpose()
    }

    /// Newest stores first, one page at a time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, offset: u64, limit: u64) -> Result<Vec<Store>, RepositoryError> {
        let rows: Vec<StoreRow> = sqlx::query_as(concat!(
            "SELECT ",
            store_columns!(),
            " FROM stores ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(to_bigint(limit))
        .bind(to_bigint(offset))
        .fetch_all(self.pool)
        .await?;

        decode_all(rows)
    }

    /// Total number of stores.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<u64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM stores")
            .fetch_one(self.pool)
            .await?;
        count_to_u64(count)
    }

    /// Stores carrying `tag`, or every store when `tag` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn with_tag(&self, tag: Option<&str>) -> Result<Vec<Store>, RepositoryError> {
        let rows: Vec<StoreRow> = sqlx::query_as(concat!(
            "SELECT ",
            store_columns!(),
            r"
            FROM stores
            WHERE $1::TEXT IS NULL OR $1 = ANY(tags)
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(tag)
        .fetch_all(self.pool)
        .await?;

        decode_all(rows)
    }

    /// Stores whose name or description match `query`, most relevant first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, limit: u64) -> Result<Vec<Store>, RepositoryError> {
        let rows: Vec<StoreRow> = sqlx::query_as(concat!(
            "SELECT ",
            store_columns!(),
            r"
            FROM stores
            WHERE to_tsvector('english', name || ' ' || description)
                  @@ plainto_tsquery('english', $1)
            ORDER BY ts_rank(
                         to_tsvector('english', name || ' ' || description),
                         plainto_tsquery('english', $1)
                     ) DESC,
                     id ASC
            LIMIT $2
            "
        ))
        .bind(query)
        .bind(to_bigint(limit))
        .fetch_all(self.pool)
        .await?;

        decode_all(rows)
    }

    /// Stores within `max_distance_meters` of `origin`, nearest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, origin), fields(lng = origin.lng(), lat = origin.lat()))]
    pub async fn near(
        &self,
        origin: &GeoPoint,
        max_distance_meters: f64,
        limit: u64,
    ) -> Result<Vec<NearbyStore>, RepositoryError> {
        let rows: Vec<NearbyRow> = sqlx::query_as(concat!(
            "SELECT * FROM (SELECT ",
            store_columns!(),
            r",
                2 * $3 * asin(least(1, sqrt(
                    power(sin(radians(latitude - $2) / 2), 2)
                    + cos(radians($2)) * cos(radians(latitude))
                      * power(sin(radians(longitude - $1) / 2), 2)
                ))) AS distance_meters
            FROM stores) AS d
            WHERE distance_meters <= $4
            ORDER BY distance_meters ASC, id ASC
            LIMIT $5
            "
        ))
        .bind(origin.lng())
        .bind(origin.lat())
        .bind(EARTH_RADIUS_METERS)
        .bind(max_distance_meters)
        .bind(to_bigint(limit))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|r| Ok(NearbyStore::from_store(Store::try_from(r.store)?, r.distance_meters)))
            .collect()
    }

    /// Stores with the given IDs, in the order the IDs are listed.
    ///
    /// Unknown IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn by_ids(&self, ids: &[StoreId]) -> Result<Vec<Store>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = ids.iter().map(StoreId::as_i32).collect();
        let rows: Vec<StoreRow> = sqlx::query_as(concat!(
            "SELECT ",
            store_columns!(),
            " FROM stores WHERE id = ANY($1) ORDER BY array_position($1, id)"
        ))
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        decode_all(rows)
    }

    /// Every tag with its usage count, most used first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn tag_counts(&self) -> Result<Vec<TagCount>, RepositoryError> {
        let rows: Vec<TagCountRow> = sqlx::query_as(
            r#"
            SELECT tag, COUNT(*) AS count
            FROM stores
            CROSS JOIN LATERAL unnest(tags) AS tag
            GROUP BY tag
            ORDER BY count DESC, tag COLLATE "C" ASC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(TagCount {
                    tag: r.tag,
                    count: count_to_u64(r.count)?,
                })
            })
            .collect()
    }

    /// Stores ranked by average review rating.
    ///
    /// Only stores with at least `min_reviews` reviews are ranked. `reviews`
    /// loads the review lists for the ranked store IDs.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self, reviews))]
    pub async fn top_stores(
        &self,
        min_reviews: u64,
        limit: u64,
        reviews: &super::ReviewRepository<'_>,
    ) -> Result<Vec<TopStore>, RepositoryError> {
        let ranked: Vec<RankedRow> = sqlx::query_as(
            r"
            SELECT s.id, s.name, s.slug, s.photo,
                   AVG(r.rating)::DOUBLE PRECISION AS average_rating
            FROM stores s
            JOIN reviews r ON r.store_id = s.id
            GROUP BY s.id
            HAVING COUNT(r.id) >= $1
            ORDER BY average_rating DESC, s.id ASC
            LIMIT $2
            ",
        )
        .bind(to_bigint(min_reviews))
        .bind(to_bigint(limit))
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<StoreId> = ranked.iter().map(|r| StoreId::new(r.id)).collect();
        let mut by_store: HashMap<StoreId, Vec<Review>> = HashMap::new();
        for review in reviews.for_stores(&ids).await? {
            by_store.entry(review.store).or_default().push(review);
        }

        Ok(ranked
            .into_iter()
            .map(|r| {
                let id = StoreId::new(r.id);
                TopStore {
                    id,
                    photo: r.photo,
                    name: r.name,
                    slug: Slug::from_stored(r.slug),
                    reviews: by_store.remove(&id).unwrap_or_default(),
                    average_rating: r.average_rating,
                }
            })
            .collect())
    }
}
