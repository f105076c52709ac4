//! JSON API route handlers: search, geo lookup, and hearts.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use delicious_core::StoreId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{NearbyStore, SearchHit};
use crate::services::StoreDirectory;
use crate::state::AppState;

/// `?q=` for the search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// `?lng=&lat=` for the nearby endpoint.
#[derive(Debug, Deserialize)]
pub struct NearQuery {
    pub lng: f64,
    pub lat: f64,
}

/// Response of the heart toggle.
#[derive(Debug, Serialize)]
pub struct HeartsResponse {
    pub hearts: Vec<StoreId>,
}

/// Full-text store search.
#[tracing::instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SearchHit>>> {
    let hits = StoreDirectory::new(state.pool()).search(&query.q).await?;
    Ok(Json(hits))
}

/// Stores near a point, nearest first.
#[tracing::instrument(skip(state))]
pub async fn near(
    State(state): State<AppState>,
    Query(query): Query<NearQuery>,
) -> Result<Json<Vec<NearbyStore>>> {
    let stores = StoreDirectory::new(state.pool())
        .near(query.lng, query.lat)
        .await?;
    Ok(Json(stores))
}

/// Toggle the current user's heart on a store.
#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn toggle_heart(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(store_id): Path<i32>,
) -> Result<Json<HeartsResponse>> {
    let hearts = StoreDirectory::new(state.pool())
        .toggle_heart(user.id, StoreId::new(store_id))
        .await?;
    Ok(Json(HeartsResponse { hearts }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hearts_response_shape() {
        let body = HeartsResponse {
            hearts: vec![StoreId::new(2), StoreId::new(5)],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "hearts": [2, 5] })
        );
    }
}
