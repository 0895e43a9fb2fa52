//! User domain types.
//!
//! The password hash never leaves the repository layer, so none of these
//! types carry it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefinder_core::{Email, Hearts, UserId, ValidationErrors};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Normalized, unique email address.
    pub email: Email,
    /// Hearted stores in the order they were hearted.
    pub hearts: Hearts,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}

/// Public profile of a store's author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub email: Email,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// A user row ready to insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    /// Argon2 PHC string.
    pub password_hash: String,
}

/// Registration form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Account edit form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccountInput {
    pub name: String,
    pub email: String,
}

/// Validated registration fields. The password is still plaintext here.
#[derive(Debug)]
pub struct Registration {
    pub name: String,
    pub email: Email,
    pub password: String,
}

/// Validated account fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountUpdate {
    pub name: String,
    pub email: Email,
}

fn check_name_and_email(
    name: &str,
    email: &str,
    errors: &mut ValidationErrors,
) -> (String, Option<Email>) {
    let name = name.trim().to_owned();
    if name.is_empty() {
        errors.push("name", "You must supply a name!");
    }

    let email = Email::parse(email).ok();
    if email.is_none() {
        errors.push("email", "That email is not valid!");
    }

    (name, email)
}

impl RegisterInput {
    /// Check every field, collecting all violations.
    ///
    /// # Errors
    ///
    /// Returns `ValidationErrors` listing each violated field.
    pub fn validate(self) -> Result<Registration, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let (name, email) = check_name_and_email(&self.name, &self.email, &mut errors);

        if self.password.is_empty() {
            errors.push("password", "Password cannot be blank!");
        }
        if self.password_confirm.is_empty() {
            errors.push("password_confirm", "Confirmed password cannot be blank!");
        }
        if self.password_confirm != self.password {
            errors.push("password_confirm", "Your passwords do not match!");
        }

        match (errors.into_result(), email) {
            (Ok(()), Some(email)) => Ok(Registration {
                name,
                email,
                password: self.password,
            }),
            (Err(errors), _) => Err(errors),
            (Ok(()), None) => Err(ValidationErrors::single(
                "email",
                "That email is not valid!",
            )),
        }
    }
}

impl AccountInput {
    /// Check name and email, collecting all violations.
    ///
    /// # Errors
    ///
    /// Returns `ValidationErrors` listing each violated field.
    pub fn validate(self) -> Result<AccountUpdate, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let (name, email) = check_name_and_email(&self.name, &self.email, &mut errors);

        match (errors.into_result(), email) {
            (Ok(()), Some(email)) => Ok(AccountUpdate { name, email }),
            (Err(errors), _) => Err(errors),
            (Ok(()), None) => Err(ValidationErrors::single(
                "email",
                "That email is not valid!",
            )),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_register_normalizes_email() {
        let reg = RegisterInput {
            name: " Wes ".to_owned(),
            email: "Wes@Example.com".to_owned(),
            password: "hunter22".to_owned(),
            password_confirm: "hunter22".to_owned(),
        }
        .validate()
        .unwrap();

        assert_eq!(reg.name, "Wes");
        assert_eq!(reg.email.as_str(), "wes@example.com");
    }

    #[test]
    fn test_register_collects_all_errors() {
        let errors = RegisterInput {
            name: "   ".to_owned(),
            email: "nope".to_owned(),
            password: "a".to_owned(),
            password_confirm: String::new(),
        }
        .validate()
        .unwrap_err();

        let fields: Vec<&str> = errors.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["name", "email", "password_confirm", "password_confirm"]
        );
    }

    #[test]
    fn test_register_password_mismatch() {
        let errors = RegisterInput {
            name: "Wes".to_owned(),
            email: "wes@example.com".to_owned(),
            password: "one".to_owned(),
            password_confirm: "two".to_owned(),
        }
        .validate()
        .unwrap_err();

        assert_eq!(
            errors.messages().collect::<Vec<_>>(),
            vec!["Your passwords do not match!"]
        );
    }

    #[test]
    fn test_account_validate() {
        let update = AccountInput {
            name: "New Name".to_owned(),
            email: " NEW@example.com ".to_owned(),
        }
        .validate()
        .unwrap();
        assert_eq!(update.email.as_str(), "new@example.com");

        assert!(AccountInput::default().validate().is_err());
    }
}
