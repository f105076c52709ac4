//! Domain models for the store directory.
//!
//! These are validated domain objects, separate from the `sqlx::FromRow`
//! row types in [`crate::db`]. They serialize to the JSON shapes the API and
//! map client consume.

pub mod review;
pub mod session;
pub mod store;
pub mod user;

pub use review::{Review, ReviewWithAuthor};
pub use session::{CurrentUser, FlashKind, FlashMessage, keys as session_keys};
pub use store::{
    Location, NearbyStore, RatedStore, SearchHit, Store, StoreDetail, TagCount,
};
pub use user::{User, UserSummary};
