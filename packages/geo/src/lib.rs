#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geographic primitives and distance math.
//!
//! Provides the validated [`GeoPoint`] type, haversine great-circle
//! distance, and radius-to-[`BoundingBox`] derivation. The bounding box
//! is a coarse prefilter; callers that need an exact radius must still
//! filter by [`haversine_km`].

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Approximate meters per degree of latitude.
const METERS_PER_DEGREE: f64 = 111_000.0;

/// Lower clamp for `cos(lat)` when deriving longitude deltas. Keeps
/// bounding boxes finite near the poles.
const MIN_LAT_COS: f64 = 0.2;

/// Errors produced when constructing geographic values.
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    /// Latitude outside [-90, 90] or not finite.
    #[error("invalid latitude: {0}")]
    InvalidLatitude(f64),

    /// Longitude outside [-180, 180] or not finite.
    #[error("invalid longitude: {0}")]
    InvalidLongitude(f64),
}

/// A validated WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl GeoPoint {
    /// Creates a point, rejecting non-finite or out-of-range coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] if either coordinate is not finite or falls
    /// outside [-90, 90] / [-180, 180].
    pub fn new(lat: f64, lon: f64) -> Result<Self, GeoError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(GeoError::InvalidLatitude(lat));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(GeoError::InvalidLongitude(lon));
        }
        Ok(Self { lat, lon })
    }
}

/// An axis-aligned lat/lon rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southern latitude boundary.
    pub lat_min: f64,
    /// Northern latitude boundary.
    pub lat_max: f64,
    /// Western longitude boundary.
    pub lon_min: f64,
    /// Eastern longitude boundary.
    pub lon_max: f64,
}

impl BoundingBox {
    /// Creates a bounding box from explicit boundaries.
    #[must_use]
    pub const fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    /// Derives the box covering `radius_m` meters around `center` using
    /// the equirectangular approximation. The longitude delta carries a
    /// `cos(lat)` correction, so boxes are not transferable across
    /// latitudes without recomputation.
    #[must_use]
    pub fn around(center: GeoPoint, radius_m: f64) -> Self {
        let delta_lat = radius_m / METERS_PER_DEGREE;
        let cos_lat = center.lat.to_radians().cos().abs().max(MIN_LAT_COS);
        let delta_lon = radius_m / (METERS_PER_DEGREE * cos_lat);
        Self {
            lat_min: center.lat - delta_lat,
            lat_max: center.lat + delta_lat,
            lon_min: center.lon - delta_lon,
            lon_max: center.lon + delta_lon,
        }
    }

    /// Returns `true` if the point lies inside the box (inclusive).
    #[must_use]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max && lon >= self.lon_min && lon <= self.lon_max
    }
}

/// Great-circle distance between two points in kilometers.
///
/// Haversine with the `atan2(sqrt(a), sqrt(1-a))` form, which stays
/// numerically stable for antipodal and near-zero separations.
#[must_use]
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lon - a.lon).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}
