//! Domain models for the store directory.
//!
//! Input types (`*Input`) hold raw user submissions; `validate()` turns them
//! into the checked values the repositories accept.

pub mod review;
pub mod store;
pub mod user;

pub use review::{NewReview, Review, ReviewInput};
pub use store::{
    Location, NearbyStore, Populate, Store, StoreDetail, StoreDraft, StoreInput, StorePage,
    TagCount, TagListing, TopStore,
};
pub use user::{
    AccountInput, AccountUpdate, NewUser, RegisterInput, Registration, User, UserSummary,
};
