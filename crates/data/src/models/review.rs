//! Review domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefinder_core::{Rating, ReviewId, StoreId, UserId, ValidationErrors};

/// A user's rating of a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub store: StoreId,
    pub author: UserId,
    pub text: String,
    pub rating: Rating,
    pub created_at: DateTime<Utc>,
}

/// Unvalidated review form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReviewInput {
    pub text: String,
    pub rating: i64,
}

/// A review row ready to insert.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub store: StoreId,
    pub author: UserId,
    pub text: String,
    pub rating: Rating,
}

impl ReviewInput {
    /// Validate the form for `store` written by `author`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationErrors` when the text is blank or the rating is out of range.
    pub fn validate(self, store: StoreId, author: UserId) -> Result<NewReview, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let text = self.text.trim().to_owned();
        if text.is_empty() {
            errors.push("text", "Your review must have text!");
        }

        let rating = Rating::new(self.rating);
        if let Err(e) = &rating {
            errors.push("rating", e.to_string());
        }

        errors.into_result()?;

        rating
            .map(|rating| NewReview {
                store,
                author,
                text,
                rating,
            })
            .map_err(|e| ValidationErrors::single("rating", e.to_string()))
    }
}
