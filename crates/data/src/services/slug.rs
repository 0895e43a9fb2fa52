//! Slug assignment.
//!
//! The collision lookup and the write that follows are separate operations,
//! so two stores created concurrently with the same name can end up with the
//! same slug. Reads by slug then return the oldest of them.

use tracing::{debug, instrument};

use storefinder_core::{Slug, StoreId};

use crate::backend::Backend;
use crate::db::RepositoryError;
use crate::models::Store;

/// Picks unique-by-convention slugs for store names.
pub struct SlugAssigner<'a> {
    backend: &'a Backend,
}

impl<'a> SlugAssigner<'a> {
    #[must_use]
    pub const fn new(backend: &'a Backend) -> Self {
        Self { backend }
    }

    /// Slug for `name`, given the slugs of every store except `exclude`.
    ///
    /// The result is free among those stores unless another writer inserts
    /// the same slug between the read and the caller's write.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the collision lookup fails.
    #[instrument(skip(self), fields(backend = self.backend.kind()))]
    pub async fn assign(
        &self,
        name: &str,
        exclude: Option<StoreId>,
    ) -> Result<Slug, RepositoryError> {
        let base = Slug::from_name(name);
        let taken = self.backend.colliding_slugs(&base, exclude).await?;
        let slug = base.next_available(&taken);

        debug!(%base, collisions = taken.len(), %slug, "Assigned slug");
        Ok(slug)
    }

    /// Slug for `store` after it is renamed to `name`.
    ///
    /// The stored slug is returned untouched when the trimmed name is
    /// unchanged, even if it would not be produced from the name today.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the collision lookup fails.
    pub async fn reassign(&self, store: &Store, name: &str) -> Result<Slug, RepositoryError> {
        if name.trim() == store.name {
            return Ok(store.slug.clone());
        }
        self.assign(name, Some(store.id)).await
    }
}
