//! Shared directory handle.

use std::sync::Arc;

use tracing::info;

use crate::backend::Backend;
use crate::config::{DirectoryConfig, Settings};
use crate::db::{self, RepositoryError};
use crate::memory::MemoryStore;
use crate::services::{StoreService, UserService};

/// Entry point to every directory operation.
///
/// Cheaply cloneable via `Arc`; clones share the backend and settings.
#[derive(Clone)]
pub struct Directory {
    inner: Arc<DirectoryInner>,
}

struct DirectoryInner {
    backend: Backend,
    settings: Settings,
}

impl std::fmt::Debug for Directory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Directory")
            .field("backend", &self.inner.backend.kind())
            .field("settings", &self.inner.settings)
            .finish()
    }
}

impl Directory {
    /// Wrap an existing backend.
    #[must_use]
    pub fn new(backend: Backend, settings: Settings) -> Self {
        Self {
            inner: Arc::new(DirectoryInner { backend, settings }),
        }
    }

    /// Connect to `PostgreSQL` using `config`.
    ///
    /// Migrations are not applied here; see [`db::run_migrations`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the pool cannot connect.
    pub async fn connect(config: &DirectoryConfig) -> Result<Self, RepositoryError> {
        let pool = db::create_pool(&config.database_url, config.max_connections).await?;
        info!(
            max_connections = config.max_connections,
            "Connected to PostgreSQL"
        );
        Ok(Self::new(Backend::Postgres(pool), config.settings))
    }

    /// An empty directory held in process memory.
    #[must_use]
    pub fn in_memory(settings: Settings) -> Self {
        Self::new(Backend::Memory(MemoryStore::new()), settings)
    }

    /// The storage backend.
    #[must_use]
    pub fn backend(&self) -> &Backend {
        &self.inner.backend
    }

    /// Service tunables.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// Store listing, reads, reviews and aggregations.
    #[must_use]
    pub fn stores(&self) -> StoreService<'_> {
        StoreService::new(&self.inner.backend, &self.inner.settings)
    }

    /// Registration, account edits and hearts.
    #[must_use]
    pub fn users(&self) -> UserService<'_> {
        UserService::new(&self.inner.backend, &self.inner.settings)
    }
}
