//! Integration tests for registration and account edits.

#![allow(clippy::unwrap_used)]

use storefinder_core::UserId;
use storefinder_data::DirectoryError;
use storefinder_data::models::{AccountInput, RegisterInput};
use storefinder_integration_tests::{directory, register};

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn test_register_normalizes_email() {
    let dir = directory();
    let user = register(&dir, " Wes ", "Wes@Example.COM").await.unwrap();

    assert_eq!(user.name, "Wes");
    assert_eq!(user.email.as_str(), "wes@example.com");
    assert!(user.hearts.is_empty());
}

#[tokio::test]
async fn test_register_reports_every_invalid_field() {
    let dir = directory();
    let err = dir
        .users()
        .register(RegisterInput {
            name: String::new(),
            email: "not-an-email".to_owned(),
            password: String::new(),
            password_confirm: "x".to_owned(),
        })
        .await
        .unwrap_err();

    let errors = err.validation_errors().unwrap();
    for field in ["name", "email", "password", "password_confirm"] {
        assert!(errors.has_field(field), "missing error for {field}");
    }
    assert!(errors.messages().any(|m| m == "Your passwords do not match!"));
}

#[tokio::test]
async fn test_duplicate_email_is_a_validation_error() {
    let dir = directory();
    register(&dir, "Wes", "wes@example.com").await.unwrap();

    let err = register(&dir, "Other Wes", "WES@example.com")
        .await
        .unwrap_err();

    let errors = err.validation_errors().unwrap();
    assert!(errors.has_field("email"));
}

#[tokio::test]
async fn test_taken_email_reported_with_other_field_errors() {
    let dir = directory();
    register(&dir, "Wes", "wes@example.com").await.unwrap();

    let err = dir
        .users()
        .register(RegisterInput {
            name: "  ".to_owned(),
            email: "Wes@Example.com".to_owned(),
            password: "hunter22".to_owned(),
            password_confirm: "hunter22".to_owned(),
        })
        .await
        .unwrap_err();

    let errors = err.validation_errors().unwrap();
    assert!(errors.has_field("name"));
    assert!(errors.messages().any(|m| m == "That email is already registered!"));
}

#[tokio::test]
async fn test_user_json_has_no_password() {
    let dir = directory();
    let user = register(&dir, "Wes", "wes@example.com").await.unwrap();

    let json = serde_json::to_string(&user).unwrap();
    assert!(!json.contains("hunter22"));
    assert!(!json.contains("argon2"));
    assert!(!json.contains("password"));
}

// =============================================================================
// Account Edits
// =============================================================================

#[tokio::test]
async fn test_update_account() {
    let dir = directory();
    let wes = register(&dir, "Wes", "wes@example.com").await.unwrap();

    let updated = dir
        .users()
        .update_account(
            wes.id,
            AccountInput {
                name: "Wesley".to_owned(),
                email: "Wesley@Example.com".to_owned(),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.id, wes.id);
    assert_eq!(updated.name, "Wesley");
    assert_eq!(updated.email.as_str(), "wesley@example.com");

    let stored = dir.users().user_by_id(wes.id).await.unwrap().unwrap();
    assert_eq!(stored, updated);
}

#[tokio::test]
async fn test_update_account_keeping_own_email() {
    let dir = directory();
    let wes = register(&dir, "Wes", "wes@example.com").await.unwrap();

    let updated = dir
        .users()
        .update_account(
            wes.id,
            AccountInput {
                name: "Wes B".to_owned(),
                email: "wes@example.com".to_owned(),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Wes B");
}

#[tokio::test]
async fn test_update_account_to_taken_email() {
    let dir = directory();
    let wes = register(&dir, "Wes", "wes@example.com").await.unwrap();
    register(&dir, "Scott", "scott@example.com").await.unwrap();

    let err = dir
        .users()
        .update_account(
            wes.id,
            AccountInput {
                name: "Wes".to_owned(),
                email: "Scott@example.com".to_owned(),
            },
        )
        .await
        .unwrap_err();
    assert!(err.validation_errors().unwrap().has_field("email"));

    let stored = dir.users().user_by_id(wes.id).await.unwrap().unwrap();
    assert_eq!(stored.email.as_str(), "wes@example.com");
}

#[tokio::test]
async fn test_update_account_reports_blank_name_and_taken_email() {
    let dir = directory();
    let wes = register(&dir, "Wes", "wes@example.com").await.unwrap();
    register(&dir, "Scott", "scott@example.com").await.unwrap();

    let err = dir
        .users()
        .update_account(
            wes.id,
            AccountInput {
                name: String::new(),
                email: "scott@example.com".to_owned(),
            },
        )
        .await
        .unwrap_err();

    let errors = err.validation_errors().unwrap();
    assert!(errors.has_field("name"));
    assert!(errors.messages().any(|m| m == "That email is already registered!"));
}

#[tokio::test]
async fn test_update_unknown_account_is_not_found() {
    let dir = directory();
    let err = dir
        .users()
        .update_account(
            UserId::new(7),
            AccountInput {
                name: "Ghost".to_owned(),
                email: "ghost@example.com".to_owned(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::NotFound(_)));
}
