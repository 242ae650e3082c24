//! The tool implementations.
//!
//! Each tool validates its already-typed arguments, resolves records
//! through the source chain, and shapes a payload. Scalar tools echo
//! the label of the source that answered; grid tools carry it as a
//! foreign member on the `FeatureCollection`.

use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue};
use hoodscope_cache::cache_key;
use hoodscope_geo::{BoundingBox, GeoPoint, haversine_km};
use hoodscope_source::overpass;
use hoodscope_source_models::AmenityPoint;
use hoodscope_tools_models::{
    CommuteProxyArgs, CommuteProxyData, CrimeGridArgs, CrimeSummaryArgs, CrimeSummaryData,
    NearbyPoisArgs, NearbyPoisData, PoiHit, RentGridArgs, RentPointsArgs,
};

use crate::context::ToolContext;
use crate::grid::{self, GridPoint};
use crate::{ToolError, classify, resolver};

/// Max hits returned by `nearby_pois`; counts still cover every hit.
const MAX_POI_RESULTS: usize = 25;

/// Transit stops are searched inside a fixed box around home; the
/// proximity buckets top out well inside it.
const TRANSIT_SEARCH_RADIUS_M: f64 = 1500.0;

/// Summarizes recent crime around a point: counts by offence type plus
/// density and trend hints.
///
/// # Errors
///
/// Returns [`ToolError::InvalidArgs`] for out-of-range coordinates or a
/// non-positive radius or window.
pub async fn crime_summary(
    ctx: &ToolContext,
    args: CrimeSummaryArgs,
) -> Result<CrimeSummaryData, ToolError> {
    let center = GeoPoint::new(args.lat, args.lon)?;
    if args.radius_m <= 0.0 || !args.radius_m.is_finite() {
        return Err(ToolError::InvalidArgs(
            "radius_m must be positive".to_string(),
        ));
    }
    if args.window_days <= 0 {
        return Err(ToolError::InvalidArgs(
            "window_days must be positive".to_string(),
        ));
    }

    let cutoff = Utc::now() - Duration::days(args.window_days);
    let bbox = BoundingBox::around(center, args.radius_m);
    let resolved = resolver::crime_events(ctx, &bbox, cutoff).await;

    // The bbox is a coarse prefilter; enforce the exact radius here.
    let radius_km = args.radius_m / 1000.0;
    let mut events = resolved.records;
    events.retain(|e| haversine_km(center, e.location()) <= radius_km);

    let mut counts_by_type: BTreeMap<String, u64> = BTreeMap::new();
    for event in &events {
        *counts_by_type.entry(event.event_type.clone()).or_insert(0) += 1;
    }

    Ok(CrimeSummaryData {
        counts_by_type,
        rate_hint: classify::rate_hint(events.len(), radius_km).to_string(),
        trend_hint: classify::trend_hint(&events, cutoff, args.window_days).to_string(),
        source: resolved.source,
        updated_at: Utc::now().format("%Y-%m-%d").to_string(),
    })
}

/// Estimates a commute from home to a fixed destination and buckets
/// transit proximity around home.
///
/// # Errors
///
/// Returns [`ToolError::InvalidArgs`] for out-of-range coordinates.
pub fn commute_proxy(
    ctx: &ToolContext,
    args: CommuteProxyArgs,
) -> Result<CommuteProxyData, ToolError> {
    let home = GeoPoint::new(args.lat, args.lon)?;
    let campus = GeoPoint::new(args.campus_lat, args.campus_lon)?;

    let distance_km = haversine_km(home, campus);
    let bbox = BoundingBox::around(home, TRANSIT_SEARCH_RADIUS_M);
    let resolved = resolver::transit_stops(ctx, &bbox);
    let nearest_km = resolved
        .records
        .iter()
        .map(|stop| haversine_km(home, stop.location()))
        .min_by(f64::total_cmp);

    Ok(CommuteProxyData {
        distance_km: grid::round2(distance_km),
        est_minutes: classify::commute_minutes(distance_km),
        near_transit_hint: classify::transit_hint(nearest_km).to_string(),
        source: resolved.source,
    })
}

/// Finds amenities around a point: cache, then Overpass, then the
/// seeded POI snapshot.
///
/// # Errors
///
/// Returns [`ToolError::InvalidArgs`] for out-of-range coordinates or a
/// non-positive radius.
pub async fn nearby_pois(
    ctx: &ToolContext,
    args: NearbyPoisArgs,
) -> Result<NearbyPoisData, ToolError> {
    let center = GeoPoint::new(args.lat, args.lon)?;
    if args.radius_m <= 0.0 || !args.radius_m.is_finite() {
        return Err(ToolError::InvalidArgs(
            "radius_m must be positive".to_string(),
        ));
    }
    if args.categories.is_empty() {
        return Ok(NearbyPoisData {
            results: Vec::new(),
            counts_by_category: BTreeMap::new(),
            source: "none".to_string(),
        });
    }

    let key = cache_key(args.lat, args.lon, args.radius_m, &args.categories);
    if let Some(cache) = &ctx.cache {
        match cache.get(&key) {
            Ok(Some(value)) => {
                if let Ok(data) = serde_json::from_value::<NearbyPoisData>(value) {
                    log::debug!("Amenity cache hit: {key}");
                    return Ok(data);
                }
                // A payload that no longer deserializes is a stale
                // schema; treat it as a miss and overwrite below.
            }
            Ok(None) => {}
            Err(e) => log::warn!("Amenity cache read failed: {e}"),
        }
    }

    match overpass::search_amenities(
        &ctx.http,
        &ctx.config.overpass_url,
        center,
        args.radius_m,
        &args.categories,
    )
    .await
    {
        Ok(points) => {
            let data = poi_payload(center, args.radius_m, &points, "Overpass amenity search");
            if let Some(cache) = &ctx.cache {
                match serde_json::to_value(&data) {
                    Ok(value) => {
                        if let Err(e) = cache.put(&key, &value, ctx.config.cache_ttl_secs) {
                            log::warn!("Amenity cache write failed: {e}");
                        }
                    }
                    Err(e) => log::warn!("Amenity payload not cacheable: {e}"),
                }
            }
            Ok(data)
        }
        Err(e) => {
            log::warn!("Overpass search failed, trying seeded POIs: {e}");
            match ctx.snapshots.pois() {
                Ok(pois) => {
                    let wanted: Vec<String> =
                        args.categories.iter().map(|c| c.to_lowercase()).collect();
                    let matching: Vec<AmenityPoint> = pois
                        .iter()
                        .filter(|p| wanted.contains(&p.category.to_lowercase()))
                        .cloned()
                        .collect();
                    Ok(poi_payload(
                        center,
                        args.radius_m,
                        &matching,
                        "Seeded POI dataset",
                    ))
                }
                Err(e) => {
                    log::warn!("POI snapshot unavailable: {e}");
                    Ok(NearbyPoisData {
                        results: Vec::new(),
                        counts_by_category: BTreeMap::new(),
                        source: "amenity data unavailable".to_string(),
                    })
                }
            }
        }
    }
}

fn poi_payload(
    center: GeoPoint,
    radius_m: f64,
    points: &[AmenityPoint],
    source: &str,
) -> NearbyPoisData {
    let mut results: Vec<PoiHit> = points
        .iter()
        .filter_map(|point| {
            let dist_m = haversine_km(center, point.location()) * 1000.0;
            if dist_m > radius_m {
                return None;
            }
            #[allow(clippy::cast_possible_truncation)]
            let dist_m = dist_m.round() as i64;
            Some(PoiHit {
                name: point.name.clone(),
                category: point.category.clone(),
                dist_m,
            })
        })
        .collect();

    let mut counts_by_category: BTreeMap<String, u64> = BTreeMap::new();
    for hit in &results {
        *counts_by_category.entry(hit.category.clone()).or_insert(0) += 1;
    }

    results.sort_by_key(|hit| hit.dist_m);
    results.truncate(MAX_POI_RESULTS);

    NearbyPoisData {
        results,
        counts_by_category,
        source: source.to_string(),
    }
}

/// Bins rental listings into a price grid.
///
/// # Errors
///
/// Returns [`ToolError::InvalidArgs`] for a non-positive cell size.
pub fn rent_grid(ctx: &ToolContext, args: RentGridArgs) -> Result<FeatureCollection, ToolError> {
    if args.cell_km <= 0.0 || !args.cell_km.is_finite() {
        return Err(ToolError::InvalidArgs(
            "cell_km must be positive".to_string(),
        ));
    }

    let resolved = resolver::rentals(ctx, args.bounds.as_ref(), args.price_min, args.price_max);
    let points: Vec<GridPoint> = resolved
        .records
        .iter()
        .map(|listing| GridPoint {
            lat: listing.lat,
            lon: listing.lon,
            value: listing.price,
        })
        .collect();

    let features = grid::bin_points(
        &points,
        args.bounds.as_ref(),
        args.cell_km,
        args.min_count,
        Some("avg_price"),
    );
    Ok(grid::feature_collection(features, &resolved.source))
}

/// Bins crime events into a count grid.
///
/// # Errors
///
/// Returns [`ToolError::InvalidArgs`] for a non-positive cell size.
pub fn crime_grid(ctx: &ToolContext, args: CrimeGridArgs) -> Result<FeatureCollection, ToolError> {
    if args.cell_km <= 0.0 || !args.cell_km.is_finite() {
        return Err(ToolError::InvalidArgs(
            "cell_km must be positive".to_string(),
        ));
    }

    let resolved = resolver::crime_events_all(ctx, args.bounds.as_ref());
    let points: Vec<GridPoint> = resolved
        .records
        .iter()
        .map(|event| GridPoint {
            lat: event.lat,
            lon: event.lon,
            value: 0.0,
        })
        .collect();

    let features = grid::bin_points(&points, args.bounds.as_ref(), args.cell_km, args.min_count, None);
    Ok(grid::feature_collection(features, &resolved.source))
}

/// Returns individual rental listings as `GeoJSON` point features.
///
/// # Errors
///
/// Infallible today; kept fallible for uniformity with the other tools.
pub fn rent_points(ctx: &ToolContext, args: RentPointsArgs) -> Result<FeatureCollection, ToolError> {
    let resolved = resolver::rentals(ctx, args.bounds.as_ref(), None, None);

    let features: Vec<Feature> = resolved
        .records
        .iter()
        .take(args.limit)
        .map(|listing| {
            let mut properties = JsonObject::new();
            properties.insert(
                "price".to_string(),
                JsonValue::from(grid::round2(listing.price)),
            );
            properties.insert("bedrooms".to_string(), JsonValue::from(listing.bedrooms));
            properties.insert("bathrooms".to_string(), JsonValue::from(listing.bathrooms));
            properties.insert("den".to_string(), JsonValue::from(listing.den));

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(geojson::Value::Point(vec![
                    listing.lon,
                    listing.lat,
                ]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    Ok(grid::feature_collection(features, &resolved.source))
}
