//! User service: registration, account edits and hearts.

use tracing::{info, instrument};

use storefinder_core::{Email, HeartState, StoreId, UserId, ValidationErrors};

use super::{bounded, password};
use crate::backend::Backend;
use crate::config::Settings;
use crate::db::RepositoryError;
use crate::error::{DirectoryError, Result};
use crate::models::{AccountInput, NewUser, RegisterInput, User};

const EMAIL_TAKEN: &str = "That email is already registered!";

/// User operations over a backend.
pub struct UserService<'a> {
    backend: &'a Backend,
    settings: &'a Settings,
}

impl<'a> UserService<'a> {
    /// Create a new user service.
    #[must_use]
    pub const fn new(backend: &'a Backend, settings: &'a Settings) -> Self {
        Self { backend, settings }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Validation` listing every invalid field,
    /// including an `email` entry when the address is already registered.
    /// Returns `DirectoryError::PasswordHash` if hashing fails.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<User> {
        bounded(self.settings.operation_timeout, async {
            let taken = self.email_held_by_other(&input.email, None).await?;
            let registration = with_taken_email(input.validate(), taken)?;

            let new_user = NewUser {
                name: registration.name,
                email: registration.email,
                password_hash: password::hash(&registration.password)?,
            };

            let user = self
                .backend
                .insert_user(&new_user)
                .await
                .map_err(conflict_as_email_taken)?;

            info!(id = %user.id, "Registered user");
            Ok(user)
        })
        .await
    }

    /// Change a user's name and email.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Validation` listing every invalid field,
    /// including an `email` entry when another user has the address.
    /// Returns `DirectoryError::NotFound` if the user doesn't exist.
    #[instrument(skip(self, input))]
    pub async fn update_account(&self, user: UserId, input: AccountInput) -> Result<User> {
        bounded(self.settings.operation_timeout, async {
            let taken = self.email_held_by_other(&input.email, Some(user)).await?;
            let update = with_taken_email(input.validate(), taken)?;

            let user = self
                .backend
                .update_user_profile(user, &update.name, &update.email)
                .await
                .map_err(conflict_as_email_taken)?;

            info!("Updated account");
            Ok(user)
        })
        .await
    }

    /// Heart `store` if `user` hasn't, otherwise un-heart it.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::NotFound` if the user or the store doesn't exist.
    #[instrument(skip(self))]
    pub async fn toggle_heart(&self, user: UserId, store: StoreId) -> Result<(User, HeartState)> {
        bounded(self.settings.operation_timeout, async {
            let (user, state) = self
                .backend
                .toggle_heart(user, store)
                .await
                .map_err(DirectoryError::on_write)?;

            info!(?state, hearts = user.hearts.len(), "Toggled heart");
            Ok((user, state))
        })
        .await
    }

    /// Look a user up by id.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Repository` if the lookup fails.
    pub async fn user_by_id(&self, id: UserId) -> Result<Option<User>> {
        bounded(self.settings.operation_timeout, async {
            Ok(self.backend.user_by_id(id).await?)
        })
        .await
    }

    /// Whether `raw` parses to an address registered to someone other than `owner`.
    async fn email_held_by_other(&self, raw: &str, owner: Option<UserId>) -> Result<bool> {
        let Ok(email) = Email::parse(raw) else {
            return Ok(false);
        };
        let holder = self.backend.user_by_email(&email).await?;
        Ok(holder.is_some_and(|u| Some(u.id) != owner))
    }
}

/// Add the taken-address error to whatever field errors `checked` carries.
fn with_taken_email<T>(
    checked: std::result::Result<T, ValidationErrors>,
    taken: bool,
) -> Result<T> {
    match (checked, taken) {
        (Ok(value), false) => Ok(value),
        (Ok(_), true) => Err(email_taken()),
        (Err(mut errors), true) => {
            errors.push("email", EMAIL_TAKEN);
            Err(errors.into())
        }
        (Err(errors), false) => Err(errors.into()),
    }
}

fn email_taken() -> DirectoryError {
    DirectoryError::Validation(ValidationErrors::single("email", EMAIL_TAKEN))
}

fn conflict_as_email_taken(e: RepositoryError) -> DirectoryError {
    match e {
        RepositoryError::Conflict(_) => email_taken(),
        other => DirectoryError::on_write(other),
    }
}
