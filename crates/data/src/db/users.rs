//! User repository for database operations.
//!
//! Hearts live in `user_hearts`; every user read aggregates them back into
//! an ordered array so callers always see the full set.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use storefinder_core::{Email, HeartState, Hearts, StoreId, UserId};

use super::{RepositoryError, map_constraint};
use crate::models::{NewUser, User};

macro_rules! select_user {
    ($filter:literal) => {
        concat!(
            r"
            SELECT u.id, u.name, u.email, u.created_at,
                   ARRAY(
                       SELECT h.store_id FROM user_hearts h
                       WHERE h.user_id = u.id
                       ORDER BY h.seq
                   ) AS hearts
            FROM users u
            WHERE ",
            $filter
        )
    };
}

/// Raw `users` row with aggregated hearts.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
    hearts: Vec<i32>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&r.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(r.id),
            name: r.name,
            email,
            hearts: r.hearts.into_iter().map(StoreId::new).collect::<Hearts>(),
            created_at: r.created_at,
        })
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(select_user!("u.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user by their (normalized) email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(select_user!("u.email = $1"))
            .bind(email)
            .fetch_optional(self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, user), fields(email = %user.email))]
    pub async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let (id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_constraint(e, "email", "user"))?;

        debug!(id, "Created user");
        self.require(UserId::new(id)).await
    }

    /// Update a user's name and email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Conflict` if another user has the email.
    #[instrument(skip(self, name, email), fields(email = %email))]
    pub async fn update_profile(
        &self,
        id: UserId,
        name: &str,
        email: &Email,
    ) -> Result<User, RepositoryError> {
        let result = sqlx::query("UPDATE users SET name = $2, email = $3 WHERE id = $1")
            .bind(id)
            .bind(name)
            .bind(email)
            .execute(self.pool)
            .await
            .map_err(|e| map_constraint(e, "email", "user"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("user {id}")));
        }

        self.require(id).await
    }

    /// Flip whether `store` is in the user's hearts.
    ///
    /// Runs in one transaction holding a row lock on the user, so concurrent
    /// toggles for the same user are applied one after another.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user or the store doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self))]
    pub async fn toggle_heart(
        &self,
        user: UserId,
        store: StoreId,
    ) -> Result<(User, HeartState), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<(i32,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(RepositoryError::NotFound(format!("user {user}")));
        }

        let removed = sqlx::query("DELETE FROM user_hearts WHERE user_id = $1 AND store_id = $2")
            .bind(user)
            .bind(store)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let state = if removed > 0 {
            HeartState::Unhearted
        } else {
            sqlx::query(
                r"
                INSERT INTO user_hearts (user_id, store_id)
                VALUES ($1, $2)
                ON CONFLICT (user_id, store_id) DO NOTHING
                ",
            )
            .bind(user)
            .bind(store)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_constraint(e, "heart", &format!("store {store}")))?;
            HeartState::Hearted
        };

        tx.commit().await?;
        debug!(?state, "Toggled heart");

        Ok((self.require(user).await?, state))
    }

    async fn require(&self, id: UserId) -> Result<User, RepositoryError> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("user {id}")))
    }
}
