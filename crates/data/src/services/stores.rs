//! Store service: listing, reads, writes, reviews and aggregations.

use tracing::{info, instrument};

use storefinder_core::{GeoPoint, StoreId, UserId};

use super::bounded;
use super::slug::SlugAssigner;
use crate::aggregate::{MIN_REVIEWS_FOR_RANKING, TOP_STORES_LIMIT};
use crate::backend::Backend;
use crate::config::Settings;
use crate::error::{DirectoryError, Result};
use crate::models::{
    NearbyStore, Populate, Review, ReviewInput, Store, StoreDetail, StoreInput, StorePage,
    TagCount, TagListing, TopStore, UserSummary,
};

/// Most results a text search returns.
pub const SEARCH_LIMIT: u64 = 5;

/// Most results a proximity search returns.
pub const NEAR_LIMIT: u64 = 10;

/// Store operations over a backend.
pub struct StoreService<'a> {
    backend: &'a Backend,
    settings: &'a Settings,
}

impl<'a> StoreService<'a> {
    /// Create a new store service.
    #[must_use]
    pub const fn new(backend: &'a Backend, settings: &'a Settings) -> Self {
        Self { backend, settings }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// List a new store owned by `author`.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Validation` listing every invalid field.
    /// Returns `DirectoryError::NotFound` if the author doesn't exist.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_store(&self, author: UserId, input: StoreInput) -> Result<Store> {
        let draft = input.validate()?;

        bounded(self.settings.operation_timeout, async {
            let slug = SlugAssigner::new(self.backend).assign(&draft.name, None).await?;
            let store = self
                .backend
                .insert_store(&draft, &slug, author)
                .await
                .map_err(DirectoryError::on_write)?;

            info!(id = %store.id, slug = %store.slug, "Created store");
            Ok(store)
        })
        .await
    }

    /// Replace every editable field of a store.
    ///
    /// The slug is recomputed only when the name changes.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::NotFound` if the store doesn't exist.
    /// Returns `DirectoryError::Forbidden` if `editor` is not the author.
    /// Returns `DirectoryError::Validation` listing every invalid field.
    #[instrument(skip(self, input))]
    pub async fn update_store(
        &self,
        editor: UserId,
        id: StoreId,
        input: StoreInput,
    ) -> Result<Store> {
        bounded(self.settings.operation_timeout, async {
            let existing = self
                .backend
                .store_by_id(id)
                .await?
                .ok_or_else(|| DirectoryError::NotFound(format!("store {id}")))?;

            if existing.author != editor {
                return Err(DirectoryError::Forbidden(
                    "You must own a store in order to edit it!".to_owned(),
                ));
            }

            let draft = input.validate()?;
            let slug = SlugAssigner::new(self.backend)
                .reassign(&existing, &draft.name)
                .await?;

            let store = self
                .backend
                .replace_store(id, &draft, &slug)
                .await
                .map_err(DirectoryError::on_write)?;

            info!(slug = %store.slug, "Updated store");
            Ok(store)
        })
        .await
    }

    /// Record `author`'s review of `store`.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Validation` for blank text or a rating outside 1..=5.
    /// Returns `DirectoryError::NotFound` if the store or author doesn't exist.
    #[instrument(skip(self, input))]
    pub async fn add_review(
        &self,
        author: UserId,
        store: StoreId,
        input: ReviewInput,
    ) -> Result<Review> {
        let review = input.validate(store, author)?;

        bounded(self.settings.operation_timeout, async {
            if self.backend.store_by_id(store).await?.is_none() {
                return Err(DirectoryError::NotFound(format!("store {store}")));
            }

            let review = self
                .backend
                .insert_review(&review)
                .await
                .map_err(DirectoryError::on_write)?;

            info!(id = %review.id, rating = %review.rating, "Added review");
            Ok(review)
        })
        .await
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Look a store up by slug, joining what `populate` asks for.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Repository` if the lookup fails.
    #[instrument(skip(self))]
    pub async fn store_by_slug(
        &self,
        slug: &str,
        populate: Populate,
    ) -> Result<Option<StoreDetail>> {
        bounded(self.settings.operation_timeout, async {
            match self.backend.store_by_slug(slug).await? {
                Some(store) => Ok(Some(self.populate(store, populate).await?)),
                None => Ok(None),
            }
        })
        .await
    }

    /// Look a store up by id, joining what `populate` asks for.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Repository` if the lookup fails.
    #[instrument(skip(self))]
    pub async fn store_by_id(
        &self,
        id: StoreId,
        populate: Populate,
    ) -> Result<Option<StoreDetail>> {
        bounded(self.settings.operation_timeout, async {
            match self.backend.store_by_id(id).await? {
                Some(store) => Ok(Some(self.populate(store, populate).await?)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn populate(&self, store: Store, populate: Populate) -> Result<StoreDetail> {
        let (store_id, author_id) = (store.id, store.author);
        let author = async {
            if populate.author {
                self.backend
                    .user_by_id(author_id)
                    .await
                    .map(|u| u.as_ref().map(UserSummary::from))
            } else {
                Ok(None)
            }
        };
        let reviews = async {
            if populate.reviews {
                self.backend.reviews_for_store(store_id).await.map(Some)
            } else {
                Ok(None)
            }
        };

        let (author, reviews) = tokio::try_join!(author, reviews)?;
        Ok(StoreDetail {
            store,
            author,
            reviews,
        })
    }

    /// One page of stores, newest first. Pages are 1-based; 0 reads as 1.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::PageOutOfRange` when `page` is past the last
    /// page, so the caller can redirect there.
    #[instrument(skip(self))]
    pub async fn list_stores(&self, page: u32) -> Result<StorePage> {
        let page = page.max(1);
        let page_size = u64::from(self.settings.page_size.max(1));
        let skip = u64::from(page - 1) * page_size;

        bounded(self.settings.operation_timeout, async {
            let (stores, count) = tokio::try_join!(
                self.backend.list_stores(skip, page_size),
                self.backend.count_stores(),
            )?;

            let pages = u32::try_from(count.div_ceil(page_size)).unwrap_or(u32::MAX);
            if stores.is_empty() && skip > 0 {
                return Err(DirectoryError::PageOutOfRange { last_page: pages });
            }

            Ok(StorePage {
                stores,
                page,
                pages,
                count,
            })
        })
        .await
    }

    /// The tag cloud together with the stores carrying `tag`.
    ///
    /// With no tag (or a blank one), every store is listed.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Repository` if either query fails.
    #[instrument(skip(self))]
    pub async fn stores_by_tag(&self, tag: Option<&str>) -> Result<TagListing> {
        let tag = tag.map(str::trim).filter(|t| !t.is_empty());

        bounded(self.settings.operation_timeout, async {
            let (tags, stores) = tokio::try_join!(
                self.backend.tag_counts(),
                self.backend.stores_with_tag(tag),
            )?;

            Ok(TagListing {
                tag: tag.map(str::to_owned),
                tags,
                stores,
            })
        })
        .await
    }

    /// Stores whose name or description match `query`, best match first.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Repository` if the search fails.
    #[instrument(skip(self))]
    pub async fn search_stores(&self, query: &str) -> Result<Vec<Store>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        bounded(self.settings.operation_timeout, async {
            Ok(self.backend.search_stores(query, SEARCH_LIMIT).await?)
        })
        .await
    }

    /// Stores within the configured radius of `origin`, nearest first.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Repository` if the query fails.
    #[instrument(skip(self))]
    pub async fn stores_near(&self, origin: GeoPoint) -> Result<Vec<NearbyStore>> {
        bounded(self.settings.operation_timeout, async {
            Ok(self
                .backend
                .stores_near(&origin, self.settings.near_radius_meters, NEAR_LIMIT)
                .await?)
        })
        .await
    }

    /// Stores `user` has hearted, in the order they were hearted.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::NotFound` if the user doesn't exist.
    #[instrument(skip(self))]
    pub async fn hearted_stores(&self, user: UserId) -> Result<Vec<Store>> {
        bounded(self.settings.operation_timeout, async {
            let user = self
                .backend
                .user_by_id(user)
                .await?
                .ok_or_else(|| DirectoryError::NotFound(format!("user {user}")))?;

            Ok(self.backend.stores_by_ids(user.hearts.as_slice()).await?)
        })
        .await
    }

    /// Up to ten stores with at least two reviews, best average first.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Repository` if the aggregation fails.
    #[instrument(skip(self))]
    pub async fn top_stores(&self) -> Result<Vec<TopStore>> {
        bounded(self.settings.operation_timeout, async {
            Ok(self
                .backend
                .top_stores(MIN_REVIEWS_FOR_RANKING as u64, TOP_STORES_LIMIT as u64)
                .await?)
        })
        .await
    }

    /// Every tag with the number of stores using it, most used first.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Repository` if the aggregation fails.
    #[instrument(skip(self))]
    pub async fn tags(&self) -> Result<Vec<TagCount>> {
        bounded(self.settings.operation_timeout, async {
            Ok(self.backend.tag_counts().await?)
        })
        .await
    }
}
