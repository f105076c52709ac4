//! Store domain types.

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use delicious_core::{GeoPoint, Slug, StoreId, UserId};

use super::review::ReviewWithAuthor;
use super::user::UserSummary;

/// Where a store is.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub point: GeoPoint,
    pub address: String,
}

/// Serializes as a GeoJSON-style point plus the street address:
/// `{ "type": "Point", "coordinates": [lng, lat], "address": "..." }`.
impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Location", 3)?;
        state.serialize_field("type", "Point")?;
        state.serialize_field("coordinates", &self.point.coordinates())?;
        state.serialize_field("address", &self.address)?;
        state.end()
    }
}

/// A store listing.
#[derive(Debug, Clone, Serialize)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub location: Location,
    pub photo: Option<String>,
    pub tags: Vec<String>,
    pub author: UserId,
    pub created: DateTime<Utc>,
}

impl Store {
    /// Whether `user` may edit this store.
    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.author == user
    }
}

/// A store with its author and reviews joined in.
#[derive(Debug, Clone, Serialize)]
pub struct StoreDetail {
    #[serde(flatten)]
    pub store: Store,
    #[serde(rename = "authorSummary")]
    pub author_summary: UserSummary,
    pub reviews: Vec<ReviewWithAuthor>,
}

/// Reduced projection returned by geo searches, sized for map markers.
#[derive(Debug, Clone, Serialize)]
pub struct NearbyStore {
    pub slug: Slug,
    pub name: String,
    pub description: Option<String>,
    pub photo: Option<String>,
    pub location: Location,
    /// Distance from the query point in meters.
    pub distance: f64,
}

/// A text search match and its relevance.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub store: Store,
    pub score: f32,
}

/// How many stores carry a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

/// A store ranked by its average review rating.
#[derive(Debug, Clone, Serialize)]
pub struct RatedStore {
    #[serde(flatten)]
    pub store: Store,
    #[serde(rename = "averageRating")]
    pub average_rating: f64,
    #[serde(rename = "reviewCount")]
    pub review_count: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store() -> Store {
        Store {
            id: StoreId::new(3),
            name: "Bagel Barn".to_owned(),
            slug: Slug::from_name("Bagel Barn"),
            description: None,
            location: Location {
                point: GeoPoint::new(-79.4, 43.6).unwrap(),
                address: "1 King St".to_owned(),
            },
            photo: None,
            tags: vec!["Wifi".to_owned()],
            author: UserId::new(9),
            created: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_location_serializes_as_point() {
        let json = serde_json::to_value(&store().location).unwrap();
        assert_eq!(json["type"], "Point");
        assert_eq!(json["coordinates"][0], -79.4);
        assert_eq!(json["coordinates"][1], 43.6);
        assert_eq!(json["address"], "1 King St");
    }

    #[test]
    fn test_rated_store_flattens_store_fields() {
        let rated = RatedStore {
            store: store(),
            average_rating: 4.5,
            review_count: 2,
        };
        let json = serde_json::to_value(&rated).unwrap();
        assert_eq!(json["slug"], "bagel-barn");
        assert_eq!(json["averageRating"], 4.5);
        assert_eq!(json["reviewCount"], 2);
    }

    #[test]
    fn test_is_owned_by() {
        assert!(store().is_owned_by(UserId::new(9)));
        assert!(!store().is_owned_by(UserId::new(1)));
    }
}
