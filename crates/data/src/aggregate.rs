//! In-memory restatements of the directory's aggregation queries.
//!
//! `PostgreSQL` computes these with `GROUP BY`/`JOIN`; the memory backend
//! calls the functions here. Both must agree on ordering:
//!
//! - tag counts: count descending, then tag ascending (byte order)
//! - top stores: average descending, then store ID ascending
//! - nearby stores: distance ascending, then store ID ascending
//! - text search: score descending, then store ID ascending

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use storefinder_core::{GeoPoint, StoreId};

use crate::models::{NearbyStore, Review, Store, TagCount, TopStore};

/// Stores need at least this many reviews to be ranked.
pub const MIN_REVIEWS_FOR_RANKING: usize = 2;

/// Length of the top stores ranking.
pub const TOP_STORES_LIMIT: usize = 10;

/// Count tag usage across stores.
///
/// Every occurrence counts, one row per (store, tag) pair.
pub fn tag_counts<'a, I>(tag_lists: I) -> Vec<TagCount>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for tags in tag_lists {
        for tag in tags {
            *counts.entry(tag.as_str()).or_insert(0) += 1;
        }
    }

    let mut rows: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_owned(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    rows
}

/// Arithmetic mean of the ratings, `None` for no reviews.
#[must_use]
pub fn mean_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let sum: f64 = reviews.iter().map(|r| f64::from(r.rating)).sum();
    #[allow(clippy::cast_precision_loss)] // review counts never approach 2^52
    let len = reviews.len() as f64;
    Some(sum / len)
}

/// Rank stores by mean review rating.
///
/// Stores with fewer than `min_reviews` reviews are left out entirely.
pub fn top_stores<'a, S, R>(stores: S, reviews: R, min_reviews: usize, limit: usize) -> Vec<TopStore>
where
    S: IntoIterator<Item = &'a Store>,
    R: IntoIterator<Item = &'a Review>,
{
    let mut by_store: BTreeMap<StoreId, Vec<Review>> = BTreeMap::new();
    for review in reviews {
        by_store.entry(review.store).or_default().push(review.clone());
    }

    let mut rows: Vec<TopStore> = stores
        .into_iter()
        .filter_map(|store| {
            let reviews = by_store.remove(&store.id)?;
            if reviews.len() < min_reviews.max(1) {
                return None;
            }
            let average_rating = mean_rating(&reviews)?;
            Some(TopStore {
                id: store.id,
                photo: store.photo.clone(),
                name: store.name.clone(),
                slug: store.slug.clone(),
                reviews,
                average_rating,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.average_rating
            .total_cmp(&a.average_rating)
            .then_with(|| a.id.cmp(&b.id))
    });
    rows.truncate(limit);
    rows
}

/// Stores within `max_distance_meters` of `origin`, nearest first.
pub fn nearby<'a, S>(
    stores: S,
    origin: &GeoPoint,
    max_distance_meters: f64,
    limit: usize,
) -> Vec<NearbyStore>
where
    S: IntoIterator<Item = &'a Store>,
{
    let mut rows: Vec<NearbyStore> = stores
        .into_iter()
        .filter_map(|store| {
            let distance = origin.distance_to(&store.location.point);
            (distance <= max_distance_meters)
                .then(|| NearbyStore::from_store(store.clone(), distance))
        })
        .collect();

    rows.sort_by(|a, b| {
        a.distance_meters
            .partial_cmp(&b.distance_meters)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    rows.truncate(limit);
    rows
}

/// Lowercase alphanumeric words of `text`.
fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

/// Relevance of a store for the query terms: how often the terms occur in
/// the name and description, with name hits counting double.
fn text_score(store: &Store, terms: &[String]) -> u32 {
    let mut score = 0;
    for word in words(&store.name) {
        if terms.contains(&word) {
            score += 2;
        }
    }
    for word in words(&store.description) {
        if terms.contains(&word) {
            score += 1;
        }
    }
    score
}

/// Full-text search over name and description, best match first.
///
/// Stores matching no query term are left out; an empty query matches nothing.
pub fn text_search<'a, S>(stores: S, query: &str, limit: usize) -> Vec<Store>
where
    S: IntoIterator<Item = &'a Store>,
{
    let terms: Vec<String> = words(query).collect();
    if terms.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(u32, &Store)> = stores
        .into_iter()
        .map(|store| (text_score(store, &terms), store))
        .filter(|(score, _)| *score > 0)
        .collect();

    scored.sort_by(|(sa, a), (sb, b)| sb.cmp(sa).then_with(|| a.id.cmp(&b.id)));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, store)| store.clone())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use chrono::Utc;
    use storefinder_core::{Rating, ReviewId, Slug, UserId};

    use super::*;
    use crate::models::Location;

    fn store(id: i32, name: &str, tags: &[&str]) -> Store {
        Store {
            id: StoreId::new(id),
            name: name.to_owned(),
            slug: Slug::from_name(name),
            description: String::new(),
            tags: tags.iter().map(|t| (*t).to_owned()).collect(),
            created_at: Utc::now(),
            location: Location {
                point: GeoPoint::new(0.0, 0.0).unwrap(),
                address: "1 Main St".to_owned(),
            },
            photo: None,
            author: UserId::new(1),
        }
    }

    fn review(id: i32, store: i32, rating: i64) -> Review {
        Review {
            id: ReviewId::new(id),
            store: StoreId::new(store),
            author: UserId::new(1),
            text: "ok".to_owned(),
            rating: Rating::new(rating).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_tag_counts_unwinds_and_sorts() {
        let stores = [
            store(1, "One", &["a", "b"]),
            store(2, "Two", &["b"]),
            store(3, "Three", &["b", "c"]),
        ];
        let counts = tag_counts(stores.iter().map(|s| s.tags.as_slice()));

        let flat: Vec<(&str, u64)> = counts.iter().map(|c| (c.tag.as_str(), c.count)).collect();
        assert_eq!(flat, vec![("b", 3), ("a", 1), ("c", 1)]);
    }

    #[test]
    fn test_tag_counts_empty() {
        assert!(tag_counts(std::iter::empty()).is_empty());
    }

    #[test]
    fn test_top_stores_requires_two_reviews() {
        let stores = [store(1, "Pair", &[]), store(2, "Single", &[])];
        let reviews = [review(1, 1, 3), review(2, 1, 5), review(3, 2, 4)];

        let top = top_stores(&stores, &reviews, MIN_REVIEWS_FOR_RANKING, TOP_STORES_LIMIT);

        assert_eq!(top.len(), 1);
        assert_eq!(top[0].id, StoreId::new(1));
        assert_eq!(top[0].average_rating, 4.0);
        assert_eq!(top[0].reviews.len(), 2);
    }

    #[test]
    fn test_top_stores_orders_and_limits() {
        let stores: Vec<Store> = (1..=12).map(|i| store(i, &format!("S{i}"), &[])).collect();
        let mut reviews = Vec::new();
        let mut next = 0;
        for i in 1..=12 {
            let rating = i64::from(i % 5) + 1;
            for _ in 0..2 {
                next += 1;
                reviews.push(review(next, i, rating));
            }
        }

        let top = top_stores(&stores, &reviews, MIN_REVIEWS_FOR_RANKING, TOP_STORES_LIMIT);

        assert_eq!(top.len(), TOP_STORES_LIMIT);
        assert!(
            top.windows(2)
                .all(|w| w[0].average_rating >= w[1].average_rating)
        );
        // Stores 4 and 9 both average 5.0; the lower ID ranks first.
        assert_eq!(top[0].id, StoreId::new(4));
        assert_eq!(top[1].id, StoreId::new(9));
    }

    #[test]
    fn test_mean_rating_unrounded() {
        let reviews = [review(1, 1, 5), review(2, 1, 4), review(3, 1, 4)];
        let mean = mean_rating(&reviews).unwrap();
        assert!((mean - 13.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(mean_rating(&[]), None);
    }

    #[test]
    fn test_nearby_filters_and_sorts() {
        let mut near = store(1, "Near", &[]);
        near.location.point = GeoPoint::new(0.01, 0.0).unwrap();
        let mut far = store(2, "Far", &[]);
        far.location.point = GeoPoint::new(1.0, 0.0).unwrap();
        let here = store(3, "Here", &[]);

        let origin = GeoPoint::new(0.0, 0.0).unwrap();
        let rows = nearby([&near, &far, &here], &origin, 10_000.0, 10);

        let ids: Vec<StoreId> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![StoreId::new(3), StoreId::new(1)]);
        assert!(rows[1].distance_meters > 1_000.0);
    }

    #[test]
    fn test_text_search_ranks_name_hits_higher() {
        let mut a = store(1, "Bakery", &[]);
        a.description = "Fresh coffee".to_owned();
        let b = store(2, "Coffee Corner", &[]);
        let c = store(3, "Tea House", &[]);

        let results = text_search([&a, &b, &c], "coffee", 5);
        let ids: Vec<StoreId> = results.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![StoreId::new(2), StoreId::new(1)]);

        assert!(text_search([&a, &b, &c], "  ", 5).is_empty());
    }
}
