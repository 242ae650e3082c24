#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Typed tool arguments and response payloads.
//!
//! Inbound `args` maps are deserialized into one of the per-tool
//! argument structs at the transport boundary, so the core only ever
//! sees validated, typed input. Field names match the wire format
//! exactly (snake_case, no renaming).

use std::collections::BTreeMap;

use hoodscope_geo::BoundingBox;
use serde::{Deserialize, Serialize};

/// The request envelope: a tool name plus a tool-specific argument map.
#[derive(Debug, Clone, Deserialize)]
pub struct McpRequest {
    /// Tool to invoke.
    pub tool: String,
    /// Tool-specific arguments; defaults to an empty map for the tools
    /// whose arguments are all optional.
    #[serde(default = "empty_args")]
    pub args: serde_json::Value,
}

fn empty_args() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// The response envelope. Exactly one of `data` / `error` is present.
#[derive(Debug, Clone, Serialize)]
pub struct McpResponse {
    /// Whether the tool call succeeded.
    pub ok: bool,
    /// Tool-specific payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Error description on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl McpResponse {
    /// Builds a success envelope.
    #[must_use]
    pub const fn success(data: serde_json::Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Builds a failure envelope.
    #[must_use]
    pub const fn failure(error: String) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error),
        }
    }
}

/// Liveness probe response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `true` when the process can answer at all.
    pub ok: bool,
    /// Current server time, ISO 8601.
    pub time: String,
}

/// Arguments for `crime_summary`.
#[derive(Debug, Clone, Deserialize)]
pub struct CrimeSummaryArgs {
    /// Query latitude.
    pub lat: f64,
    /// Query longitude.
    pub lon: f64,
    /// Search radius in meters.
    pub radius_m: f64,
    /// Look-back window in days.
    pub window_days: i64,
}

/// Arguments for `commute_proxy`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommuteProxyArgs {
    /// Home latitude.
    pub lat: f64,
    /// Home longitude.
    pub lon: f64,
    /// Destination latitude.
    pub campus_lat: f64,
    /// Destination longitude.
    pub campus_lon: f64,
}

/// Arguments for `nearby_pois`.
#[derive(Debug, Clone, Deserialize)]
pub struct NearbyPoisArgs {
    /// Query latitude.
    pub lat: f64,
    /// Query longitude.
    pub lon: f64,
    /// Amenity categories to search for. An empty list short-circuits
    /// to an empty result without an external call.
    pub categories: Vec<String>,
    /// Search radius in meters.
    #[serde(default = "default_poi_radius")]
    pub radius_m: f64,
}

/// Arguments for `rent_grid`.
#[derive(Debug, Clone, Deserialize)]
pub struct RentGridArgs {
    /// Explicit grid bounds. When omitted the grid anchors at the
    /// data's own minimum corner, making cell IDs call-relative.
    pub bounds: Option<BoundingBox>,
    /// Cell edge length in kilometers.
    #[serde(default = "default_cell_km")]
    pub cell_km: f64,
    /// Minimum listings per emitted cell.
    #[serde(default = "default_min_count")]
    pub min_count: u64,
    /// Lower price filter.
    pub price_min: Option<f64>,
    /// Upper price filter.
    pub price_max: Option<f64>,
}

/// Arguments for `crime_grid`.
#[derive(Debug, Clone, Deserialize)]
pub struct CrimeGridArgs {
    /// Explicit grid bounds.
    pub bounds: Option<BoundingBox>,
    /// Cell edge length in kilometers.
    #[serde(default = "default_cell_km")]
    pub cell_km: f64,
    /// Minimum events per emitted cell.
    #[serde(default = "default_min_count")]
    pub min_count: u64,
}

/// Arguments for `rent_points`.
#[derive(Debug, Clone, Deserialize)]
pub struct RentPointsArgs {
    /// Bounding box filter.
    pub bounds: Option<BoundingBox>,
    /// Maximum number of point features returned.
    #[serde(default = "default_point_limit")]
    pub limit: usize,
}

const fn default_poi_radius() -> f64 {
    600.0
}

const fn default_cell_km() -> f64 {
    1.0
}

const fn default_min_count() -> u64 {
    3
}

const fn default_point_limit() -> usize {
    200
}

// Manual `Default` impls so defaults agree with the serde attributes.

impl Default for RentGridArgs {
    fn default() -> Self {
        Self {
            bounds: None,
            cell_km: default_cell_km(),
            min_count: default_min_count(),
            price_min: None,
            price_max: None,
        }
    }
}

impl Default for CrimeGridArgs {
    fn default() -> Self {
        Self {
            bounds: None,
            cell_km: default_cell_km(),
            min_count: default_min_count(),
        }
    }
}

impl Default for RentPointsArgs {
    fn default() -> Self {
        Self {
            bounds: None,
            limit: default_point_limit(),
        }
    }
}

/// Payload for `crime_summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrimeSummaryData {
    /// Event counts grouped by offence type.
    pub counts_by_type: BTreeMap<String, u64>,
    /// `"lower"` / `"moderate"` / `"higher"` / `"unknown"`.
    pub rate_hint: String,
    /// `"upward"` / `"downward"` / `"stable"` / `"unknown"`.
    pub trend_hint: String,
    /// Label of the source that actually answered.
    pub source: String,
    /// Date the summary was computed, `YYYY-MM-DD`.
    pub updated_at: String,
}

/// Payload for `commute_proxy`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommuteProxyData {
    /// Straight-line distance in kilometers, 2 decimal places.
    pub distance_km: f64,
    /// Crude travel-time estimate in minutes.
    pub est_minutes: i64,
    /// Nearest-stop proximity bucket.
    pub near_transit_hint: String,
    /// Label of the transit source used.
    pub source: String,
}

/// One amenity hit in a `nearby_pois` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoiHit {
    /// Amenity name.
    pub name: String,
    /// Matched category.
    pub category: String,
    /// Distance from the query point in meters.
    pub dist_m: i64,
}

/// Payload for `nearby_pois`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyPoisData {
    /// Closest hits, sorted by distance.
    pub results: Vec<PoiHit>,
    /// Hit counts per category (all hits, not just the returned page).
    pub counts_by_category: BTreeMap<String, u64>,
    /// Label of the source that actually answered.
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_args_apply_defaults() {
        let args: RentGridArgs = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(args.bounds.is_none());
        assert!((args.cell_km - 1.0).abs() < f64::EPSILON);
        assert_eq!(args.min_count, 3);
    }

    #[test]
    fn bounds_deserialize_from_wire_shape() {
        let args: RentGridArgs = serde_json::from_value(serde_json::json!({
            "bounds": {"lat_min": 43.58, "lat_max": 43.86, "lon_min": -79.64, "lon_max": -79.12},
            "cell_km": 0.5
        }))
        .unwrap();
        let bounds = args.bounds.unwrap();
        assert!((bounds.lat_min - 43.58).abs() < f64::EPSILON);
        assert!((args.cell_km - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let result: Result<CrimeSummaryArgs, _> = serde_json::from_value(serde_json::json!({
            "lat": 43.65, "lon": -79.38, "radius_m": 1000.0
        }));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("window_days"), "unexpected error: {err}");
    }

    #[test]
    fn response_envelope_omits_absent_half() {
        let ok = serde_json::to_value(McpResponse::success(serde_json::json!({"x": 1}))).unwrap();
        assert_eq!(ok["ok"], true);
        assert!(ok.get("error").is_none());

        let err = serde_json::to_value(McpResponse::failure("Unknown tool".to_string())).unwrap();
        assert_eq!(err["ok"], false);
        assert_eq!(err["error"], "Unknown tool");
        assert!(err.get("data").is_none());
    }
}
