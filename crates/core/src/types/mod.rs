//! Core types for Storefinder.
//!
//! This module provides type-safe wrappers for the directory's domain concepts.

pub mod email;
pub mod geo;
pub mod hearts;
pub mod id;
pub mod rating;
pub mod slug;
pub mod validation;

pub use email::{Email, EmailError};
pub use geo::{EARTH_RADIUS_METERS, GeoError, GeoPoint};
pub use hearts::{HeartState, Hearts};
pub use id::*;
pub use rating::{Rating, RatingError};
pub use slug::{FALLBACK_SLUG, Slug, SlugError};
pub use validation::{FieldError, ValidationErrors};
