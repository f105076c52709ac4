//! Geographic points.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters (the value PostGIS uses for spheroid-free
/// approximations).
const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Errors for out-of-range or non-numeric coordinates.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum GeoError {
    #[error("longitude must be a finite number between -180 and 180 (got {0})")]
    Longitude(f64),
    #[error("latitude must be a finite number between -90 and 90 (got {0})")]
    Latitude(f64),
}

/// A WGS84 point, longitude first (the order GeoJSON and PostGIS use).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    lng: f64,
    lat: f64,
}

impl GeoPoint {
    /// Create a point, rejecting NaN, infinities, and out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] naming the offending axis.
    pub fn new(lng: f64, lat: f64) -> Result<Self, GeoError> {
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(GeoError::Longitude(lng));
        }
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(GeoError::Latitude(lat));
        }
        Ok(Self { lng, lat })
    }

    #[must_use]
    pub const fn lng(&self) -> f64 {
        self.lng
    }

    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    /// `[lng, lat]`, the shape map clients expect.
    #[must_use]
    pub const fn coordinates(&self) -> [f64; 2] {
        [self.lng, self.lat]
    }

    /// Great-circle distance in meters (haversine on a sphere).
    ///
    /// The database computes spheroidal distances; this is only used to
    /// sanity-check ordering, where the two agree to well under a percent.
    #[must_use]
    pub fn haversine_meters(&self, other: &Self) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
    }
}
