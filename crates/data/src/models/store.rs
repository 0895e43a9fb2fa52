//! Store domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefinder_core::{GeoPoint, Slug, StoreId, UserId, ValidationErrors};

use super::review::Review;
use super::user::UserSummary;

/// Where a store is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Longitude/latitude pair.
    pub point: GeoPoint,
    /// Street address (required, trimmed).
    pub address: String,
}

/// A listed store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    /// Unique store ID.
    pub id: StoreId,
    /// Display name (non-empty, trimmed).
    pub name: String,
    /// URL slug, assigned from the name.
    pub slug: Slug,
    /// Free-form description (trimmed, may be empty).
    pub description: String,
    /// Tags in the order they were given.
    pub tags: Vec<String>,
    /// When the store was listed.
    pub created_at: DateTime<Utc>,
    /// Point and street address.
    pub location: Location,
    /// Photo filename, if one was uploaded.
    pub photo: Option<String>,
    /// User who listed the store.
    pub author: UserId,
}

/// Unvalidated store fields as submitted by a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreInput {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub lng: Option<f64>,
    pub lat: Option<f64>,
    pub address: String,
    pub photo: Option<String>,
}

/// Store fields that passed validation and are ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreDraft {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub location: Location,
    pub photo: Option<String>,
}

impl StoreInput {
    /// Trim and check every field, collecting all violations.
    ///
    /// Tags are trimmed, blanks dropped and repeats removed (first
    /// occurrence wins). An empty photo name counts as no photo.
    ///
    /// # Errors
    ///
    /// Returns `ValidationErrors` listing each missing or invalid field.
    pub fn validate(self) -> Result<StoreDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = self.name.trim().to_owned();
        if name.is_empty() {
            errors.push("name", "Please enter a name!");
        }

        let point = match (self.lng, self.lat) {
            (Some(lng), Some(lat)) => match GeoPoint::new(lng, lat) {
                Ok(point) => Some(point),
                Err(e) => {
                    errors.push("location.coordinates", e.to_string());
                    None
                }
            },
            _ => {
                errors.push("location.coordinates", "You must supply coordinates!");
                None
            }
        };

        let address = self.address.trim().to_owned();
        if address.is_empty() {
            errors.push("location.address", "You must supply an address!");
        }

        errors.into_result()?;

        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags {
            let tag = tag.trim();
            if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_owned());
            }
        }

        let Some(point) = point else {
            return Err(ValidationErrors::single(
                "location.coordinates",
                "You must supply coordinates!",
            ));
        };

        Ok(StoreDraft {
            name,
            description: self.description.trim().to_owned(),
            tags,
            location: Location { point, address },
            photo: self
                .photo
                .map(|p| p.trim().to_owned())
                .filter(|p| !p.is_empty()),
        })
    }
}

impl From<&Store> for StoreInput {
    fn from(store: &Store) -> Self {
        Self {
            name: store.name.clone(),
            description: store.description.clone(),
            tags: store.tags.clone(),
            lng: Some(store.location.point.lng()),
            lat: Some(store.location.point.lat()),
            address: store.location.address.clone(),
            photo: store.photo.clone(),
        }
    }
}

/// Which related records to load alongside a store.
///
/// Nothing is joined unless asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Populate {
    /// Load the author's public profile.
    pub author: bool,
    /// Load every review of the store.
    pub reviews: bool,
}

impl Populate {
    /// Load nothing extra.
    pub const NONE: Self = Self {
        author: false,
        reviews: false,
    };

    /// Load author and reviews.
    pub const ALL: Self = Self {
        author: true,
        reviews: true,
    };

    /// Load reviews only.
    pub const REVIEWS: Self = Self {
        author: false,
        reviews: true,
    };
}

/// A store with the joins requested through [`Populate`].
///
/// A `None` field means the join was not requested.
#[derive(Debug, Clone, Serialize)]
pub struct StoreDetail {
    #[serde(flatten)]
    pub store: Store,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<Review>>,
}

/// One page of the newest-first store listing.
#[derive(Debug, Clone, Serialize)]
pub struct StorePage {
    pub stores: Vec<Store>,
    /// 1-based page number.
    pub page: u32,
    /// Total number of pages.
    pub pages: u32,
    /// Total number of stores.
    pub count: u64,
}

/// A tag and how many times stores use it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

/// Tag cloud plus the stores matching the selected tag.
#[derive(Debug, Clone, Serialize)]
pub struct TagListing {
    /// The selected tag, if any.
    pub tag: Option<String>,
    pub tags: Vec<TagCount>,
    pub stores: Vec<Store>,
}

/// A row of the top-rated stores ranking.
#[derive(Debug, Clone, Serialize)]
pub struct TopStore {
    pub id: StoreId,
    pub photo: Option<String>,
    pub name: String,
    pub slug: Slug,
    /// Every review the average was computed from.
    pub reviews: Vec<Review>,
    /// Unrounded arithmetic mean of the ratings.
    pub average_rating: f64,
}

/// A store returned by a proximity query.
#[derive(Debug, Clone, Serialize)]
pub struct NearbyStore {
    pub id: StoreId,
    pub slug: Slug,
    pub name: String,
    pub description: String,
    pub location: Location,
    pub photo: Option<String>,
    /// Great-circle distance from the query point.
    pub distance_meters: f64,
}

impl NearbyStore {
    /// Project a store for the map, with its distance from the query point.
    #[must_use]
    pub fn from_store(store: Store, distance_meters: f64) -> Self {
        Self {
            id: store.id,
            slug: store.slug,
            name: store.name,
            description: store.description,
            location: store.location,
            photo: store.photo,
            distance_meters,
        }
    }
}
