//! Review domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use delicious_core::{Rating, ReviewId, StoreId, UserId};

use super::user::UserSummary;

/// A review of a store. Immutable once written.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub author: UserId,
    pub store: StoreId,
    pub text: String,
    pub rating: Rating,
    pub created: DateTime<Utc>,
}

/// A review with its author joined in, as shown on the store page.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewWithAuthor {
    #[serde(flatten)]
    pub review: Review,
    #[serde(rename = "authorSummary")]
    pub author: UserSummary,
}
