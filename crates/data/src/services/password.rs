//! Password hashing.

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};

use crate::error::DirectoryError;

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `DirectoryError::PasswordHash` if hashing fails.
pub fn hash(password: &str) -> Result<String, DirectoryError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| DirectoryError::PasswordHash)
}
