//! Integration tests for tag counts and the top stores ranking.

#![allow(clippy::unwrap_used, clippy::float_cmp, clippy::indexing_slicing)]

use storefinder_core::StoreId;
use storefinder_data::models::TagCount;
use storefinder_integration_tests::{create_named, directory, register, review, store_input};

fn tag(tag: &str, count: u64) -> TagCount {
    TagCount {
        tag: tag.to_owned(),
        count,
    }
}

// =============================================================================
// Tag Aggregator
// =============================================================================

#[tokio::test]
async fn test_tag_counts_sorted_by_count() {
    let dir = directory();
    let wes = register(&dir, "Wes", "wes@example.com").await.unwrap();
    for (name, tags) in [
        ("One", &["a", "b"][..]),
        ("Two", &["b"][..]),
        ("Three", &["b", "c"][..]),
    ] {
        dir.stores()
            .create_store(wes.id, store_input(name, -79.38, 43.65, tags))
            .await
            .unwrap();
    }

    let tags = dir.stores().tags().await.unwrap();
    assert_eq!(tags, vec![tag("b", 3), tag("a", 1), tag("c", 1)]);
}

#[tokio::test]
async fn test_tag_counts_empty_directory() {
    let dir = directory();
    assert!(dir.stores().tags().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_repeated_tag_on_one_store_counts_once() {
    let dir = directory();
    let wes = register(&dir, "Wes", "wes@example.com").await.unwrap();
    dir.stores()
        .create_store(wes.id, store_input("One", 0.0, 0.0, &["Wifi", " Wifi ", "Wifi"]))
        .await
        .unwrap();

    assert_eq!(dir.stores().tags().await.unwrap(), vec![tag("Wifi", 1)]);
}

#[tokio::test]
async fn test_stores_by_tag_lists_tags_and_matches() {
    let dir = directory();
    let wes = register(&dir, "Wes", "wes@example.com").await.unwrap();
    let wifi = dir
        .stores()
        .create_store(wes.id, store_input("Wifi Cafe", 0.0, 0.0, &["Wifi"]))
        .await
        .unwrap();
    dir.stores()
        .create_store(wes.id, store_input("Quiet Cafe", 0.0, 0.0, &["Quiet"]))
        .await
        .unwrap();

    let listing = dir.stores().stores_by_tag(Some("Wifi")).await.unwrap();
    assert_eq!(listing.tag.as_deref(), Some("Wifi"));
    assert_eq!(listing.tags.len(), 2);
    assert_eq!(listing.stores.len(), 1);
    assert_eq!(listing.stores[0].id, wifi.id);

    let all = dir.stores().stores_by_tag(None).await.unwrap();
    assert!(all.tag.is_none());
    assert_eq!(all.stores.len(), 2);

    let blank = dir.stores().stores_by_tag(Some("  ")).await.unwrap();
    assert!(blank.tag.is_none());
    assert_eq!(blank.stores.len(), 2);
}

// =============================================================================
// Ranking Aggregator
// =============================================================================

#[tokio::test]
async fn test_top_stores_mean_and_minimum_reviews() {
    let dir = directory();
    let wes = register(&dir, "Wes", "wes@example.com").await.unwrap();
    let pair = create_named(&dir, wes.id, "Pair").await.unwrap();
    let single = create_named(&dir, wes.id, "Single").await.unwrap();
    create_named(&dir, wes.id, "Unreviewed").await.unwrap();

    review(&dir, wes.id, &pair, 3).await.unwrap();
    review(&dir, wes.id, &pair, 5).await.unwrap();
    review(&dir, wes.id, &single, 5).await.unwrap();

    let top = dir.stores().top_stores().await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].id, pair.id);
    assert_eq!(top[0].slug, pair.slug);
    assert_eq!(top[0].average_rating, 4.0);
    assert_eq!(top[0].reviews.len(), 2);
}

#[tokio::test]
async fn test_top_stores_average_is_unrounded() {
    let dir = directory();
    let wes = register(&dir, "Wes", "wes@example.com").await.unwrap();
    let store = create_named(&dir, wes.id, "Thirds").await.unwrap();
    for rating in [4, 4, 5] {
        review(&dir, wes.id, &store, rating).await.unwrap();
    }

    let top = dir.stores().top_stores().await.unwrap();
    assert!((top[0].average_rating - 13.0 / 3.0).abs() < 1e-12);
}

#[tokio::test]
async fn test_top_stores_sorted_and_limited_to_ten() {
    let dir = directory();
    let wes = register(&dir, "Wes", "wes@example.com").await.unwrap();

    let mut ids: Vec<StoreId> = Vec::new();
    for i in 1..=12 {
        let store = create_named(&dir, wes.id, &format!("Store {i}")).await.unwrap();
        let rating = i64::from(i % 5) + 1;
        review(&dir, wes.id, &store, rating).await.unwrap();
        review(&dir, wes.id, &store, rating).await.unwrap();
        ids.push(store.id);
    }

    let top = dir.stores().top_stores().await.unwrap();
    assert_eq!(top.len(), 10);
    assert!(
        top.windows(2)
            .all(|w| w[0].average_rating >= w[1].average_rating)
    );
    // Stores 4 and 9 both average 5; the earlier store ranks first.
    assert_eq!(top[0].id, ids[3]);
    assert_eq!(top[1].id, ids[8]);
}

#[tokio::test]
async fn test_top_stores_empty_without_reviews() {
    let dir = directory();
    let wes = register(&dir, "Wes", "wes@example.com").await.unwrap();
    create_named(&dir, wes.id, "Lonely").await.unwrap();

    assert!(dir.stores().top_stores().await.unwrap().is_empty());
}
