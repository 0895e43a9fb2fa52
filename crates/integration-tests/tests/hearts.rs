//! Integration tests for the favorites toggle.

#![allow(clippy::unwrap_used)]

use storefinder_core::{HeartState, StoreId, UserId};
use storefinder_data::DirectoryError;
use storefinder_integration_tests::{create_named, directory, register};

// =============================================================================
// Toggle
// =============================================================================

#[tokio::test]
async fn test_toggle_twice_restores_hearts() {
    let dir = directory();
    let wes = register(&dir, "Wes", "wes@example.com").await.unwrap();
    let store = create_named(&dir, wes.id, "Cafe").await.unwrap();
    assert!(wes.hearts.is_empty());

    let (user, state) = dir.users().toggle_heart(wes.id, store.id).await.unwrap();
    assert_eq!(state, HeartState::Hearted);
    assert!(user.hearts.contains(store.id));

    let (user, state) = dir.users().toggle_heart(wes.id, store.id).await.unwrap();
    assert_eq!(state, HeartState::Unhearted);
    assert_eq!(user.hearts, wes.hearts);
}

#[tokio::test]
async fn test_toggle_keeps_other_hearts_in_order() {
    let dir = directory();
    let wes = register(&dir, "Wes", "wes@example.com").await.unwrap();
    let a = create_named(&dir, wes.id, "A").await.unwrap();
    let b = create_named(&dir, wes.id, "B").await.unwrap();
    let c = create_named(&dir, wes.id, "C").await.unwrap();

    for store in [&c, &a, &b] {
        dir.users().toggle_heart(wes.id, store.id).await.unwrap();
    }
    let (user, _) = dir.users().toggle_heart(wes.id, a.id).await.unwrap();

    assert_eq!(user.hearts.as_slice(), &[c.id, b.id]);

    let hearted = dir.stores().hearted_stores(wes.id).await.unwrap();
    let ids: Vec<StoreId> = hearted.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![c.id, b.id]);
}

#[tokio::test]
async fn test_hearts_are_per_user() {
    let dir = directory();
    let wes = register(&dir, "Wes", "wes@example.com").await.unwrap();
    let scott = register(&dir, "Scott", "scott@example.com").await.unwrap();
    let store = create_named(&dir, wes.id, "Cafe").await.unwrap();

    dir.users().toggle_heart(wes.id, store.id).await.unwrap();

    let scott = dir.users().user_by_id(scott.id).await.unwrap().unwrap();
    assert!(scott.hearts.is_empty());
}

#[tokio::test]
async fn test_concurrent_toggles_apply_one_at_a_time() {
    let dir = directory();
    let wes = register(&dir, "Wes", "wes@example.com").await.unwrap();
    let store = create_named(&dir, wes.id, "Cafe").await.unwrap();

    let (user_id, store_id) = (wes.id, store.id);
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let dir = dir.clone();
            tokio::spawn(async move { dir.users().toggle_heart(user_id, store_id).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // An even number of flips lands back where it started.
    let user = dir.users().user_by_id(wes.id).await.unwrap().unwrap();
    assert!(user.hearts.is_empty());
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn test_unknown_store_is_not_found() {
    let dir = directory();
    let wes = register(&dir, "Wes", "wes@example.com").await.unwrap();

    let err = dir
        .users()
        .toggle_heart(wes.id, StoreId::new(999))
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::NotFound(_)));

    let user = dir.users().user_by_id(wes.id).await.unwrap().unwrap();
    assert!(user.hearts.is_empty());
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let dir = directory();
    let wes = register(&dir, "Wes", "wes@example.com").await.unwrap();
    let store = create_named(&dir, wes.id, "Cafe").await.unwrap();

    let err = dir
        .users()
        .toggle_heart(UserId::new(999), store.id)
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::NotFound(_)));

    let err = dir
        .stores()
        .hearted_stores(UserId::new(999))
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::NotFound(_)));
}
