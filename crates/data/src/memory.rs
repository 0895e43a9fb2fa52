//! In-process document store.
//!
//! Mirrors the `PostgreSQL` repositories operation for operation so the
//! services can run without a database (tests, demos). Aggregations go
//! through [`crate::aggregate`].

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use storefinder_core::{Email, GeoPoint, HeartState, Hearts, ReviewId, Slug, StoreId, UserId};

use crate::aggregate;
use crate::db::RepositoryError;
use crate::models::{
    NearbyStore, NewReview, NewUser, Review, Store, StoreDraft, TagCount, TopStore, User,
};

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<UserId, User>,
    stores: BTreeMap<StoreId, Store>,
    reviews: Vec<Review>,
    last_id: i32,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    fn stores_newest_first(&self) -> Vec<&Store> {
        let mut stores: Vec<&Store> = self.stores.values().collect();
        stores.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        stores
    }
}

/// Shared in-memory store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn colliding_slugs(
        &self,
        base: &Slug,
        exclude: Option<StoreId>,
    ) -> Result<Vec<Slug>, RepositoryError> {
        let matcher = base
            .collision_matcher()
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;
        let state = self.state.read().await;

        Ok(state
            .stores
            .values()
            .filter(|s| Some(s.id) != exclude && matcher.is_match(s.slug.as_str()))
            .map(|s| s.slug.clone())
            .collect())
    }

    pub async fn insert_store(
        &self,
        draft: &StoreDraft,
        slug: &Slug,
        author: UserId,
    ) -> Result<Store, RepositoryError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&author) {
            return Err(RepositoryError::NotFound("author".to_owned()));
        }

        let store = Store {
            id: StoreId::new(state.next_id()),
            name: draft.name.clone(),
            slug: slug.clone(),
            description: draft.description.clone(),
            tags: draft.tags.clone(),
            created_at: Utc::now(),
            location: draft.location.clone(),
            photo: draft.photo.clone(),
            author,
        };
        state.stores.insert(store.id, store.clone());
        Ok(store)
    }

    pub async fn replace_store(
        &self,
        id: StoreId,
        draft: &StoreDraft,
        slug: &Slug,
    ) -> Result<Store, RepositoryError> {
        let mut state = self.state.write().await;
        let store = state
            .stores
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("store {id}")))?;

        store.name.clone_from(&draft.name);
        store.slug = slug.clone();
        store.description.clone_from(&draft.description);
        store.tags.clone_from(&draft.tags);
        store.location = draft.location.clone();
        store.photo.clone_from(&draft.photo);
        Ok(store.clone())
    }

    pub async fn store_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        Ok(self.state.read().await.stores.get(&id).cloned())
    }

    pub async fn store_by_slug(&self, slug: &str) -> Result<Option<Store>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .stores
            .values()
            .find(|s| s.slug.as_str() == slug)
            .cloned())
    }

    pub async fn list_stores(&self, offset: u64, limit: u64) -> Result<Vec<Store>, RepositoryError> {
        let state = self.state.read().await;
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        Ok(state
            .stores_newest_first()
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    pub async fn count_stores(&self) -> Result<u64, RepositoryError> {
        Ok(self.state.read().await.stores.len() as u64)
    }

    pub async fn stores_with_tag(&self, tag: Option<&str>) -> Result<Vec<Store>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .stores_newest_first()
            .into_iter()
            .filter(|s| tag.is_none_or(|t| s.tags.iter().any(|st| st == t)))
            .cloned()
            .collect())
    }

    pub async fn search_stores(&self, query: &str, limit: u64) -> Result<Vec<Store>, RepositoryError> {
        let state = self.state.read().await;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(aggregate::text_search(state.stores.values(), query, limit))
    }

    pub async fn stores_near(
        &self,
        origin: &GeoPoint,
        max_distance_meters: f64,
        limit: u64,
    ) -> Result<Vec<NearbyStore>, RepositoryError> {
        let state = self.state.read().await;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(aggregate::nearby(
            state.stores.values(),
            origin,
            max_distance_meters,
            limit,
        ))
    }

    pub async fn stores_by_ids(&self, ids: &[StoreId]) -> Result<Vec<Store>, RepositoryError> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.stores.get(id).cloned())
            .collect())
    }

    pub async fn tag_counts(&self) -> Result<Vec<TagCount>, RepositoryError> {
        let state = self.state.read().await;
        Ok(aggregate::tag_counts(
            state.stores.values().map(|s| s.tags.as_slice()),
        ))
    }

    pub async fn top_stores(
        &self,
        min_reviews: u64,
        limit: u64,
    ) -> Result<Vec<TopStore>, RepositoryError> {
        let state = self.state.read().await;
        Ok(aggregate::top_stores(
            state.stores.values(),
            &state.reviews,
            usize::try_from(min_reviews).unwrap_or(usize::MAX),
            usize::try_from(limit).unwrap_or(usize::MAX),
        ))
    }

    pub async fn reviews_for_store(&self, store: StoreId) -> Result<Vec<Review>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .reviews
            .iter()
            .filter(|r| r.store == store)
            .cloned()
            .collect())
    }

    pub async fn insert_review(&self, review: &NewReview) -> Result<Review, RepositoryError> {
        let mut state = self.state.write().await;
        if !state.stores.contains_key(&review.store) || !state.users.contains_key(&review.author) {
            return Err(RepositoryError::NotFound("store or author".to_owned()));
        }

        let review = Review {
            id: ReviewId::new(state.next_id()),
            store: review.store,
            author: review.author,
            text: review.text.clone(),
            rating: review.rating,
            created_at: Utc::now(),
        };
        state.reviews.push(review.clone());
        Ok(review)
    }

    pub async fn insert_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let created = User {
            id: UserId::new(state.next_id()),
            name: user.name.clone(),
            email: user.email.clone(),
            hearts: Hearts::new(),
            created_at: Utc::now(),
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    pub async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    pub async fn user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }

    pub async fn update_user_profile(
        &self,
        id: UserId,
        name: &str,
        email: &Email,
    ) -> Result<User, RepositoryError> {
        let mut state = self.state.write().await;
        if state
            .users
            .values()
            .any(|u| u.id != id && &u.email == email)
        {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let record = state
            .users
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("user {id}")))?;
        name.clone_into(&mut record.name);
        record.email = email.clone();
        Ok(record.clone())
    }

    pub async fn toggle_heart(
        &self,
        user: UserId,
        store: StoreId,
    ) -> Result<(User, HeartState), RepositoryError> {
        let mut state = self.state.write().await;
        let store_exists = state.stores.contains_key(&store);

        let record = state
            .users
            .get_mut(&user)
            .ok_or_else(|| RepositoryError::NotFound(format!("user {user}")))?;

        if !record.hearts.contains(store) && !store_exists {
            return Err(RepositoryError::NotFound(format!("store {store}")));
        }

        let heart = record.hearts.toggle(store);
        Ok((record.clone(), heart))
    }
}
