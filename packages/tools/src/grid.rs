//! Fixed-cell grid aggregation over point records.
//!
//! Points are binned into square cells of `cell_km` edge length on an
//! equirectangular grid anchored at the south-west corner of the
//! requested bounds (or of the data itself when no bounds are given).
//! Cells below a minimum occupancy are suppressed, and each surviving
//! cell is emitted as a closed `GeoJSON` polygon feature.

use std::collections::BTreeMap;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue};
use hoodscope_geo::BoundingBox;

/// Kilometers per degree of latitude.
const KM_PER_DEGREE: f64 = 111.0;

/// Lower clamp for `cos(lat)`, mirroring the bounding-box derivation.
const MIN_LAT_COS: f64 = 0.2;

/// One point to be binned, with an optional value to average per cell.
#[derive(Debug, Clone, Copy)]
pub struct GridPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Value aggregated into the cell average (ignored when the caller
    /// asks for counts only).
    pub value: f64,
}

/// Rounds to 2 decimal places, the precision used in emitted payloads.
#[must_use]
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Bins points into grid cells and emits one polygon feature per cell
/// with at least `min_count` points.
///
/// Each feature carries a `cell_id` (`"x-y"` relative to the grid
/// anchor), a `count`, and — when `value_key` is given — the cell's
/// mean value rounded to 2 decimal places under that key. Cell IDs are
/// only comparable across calls that share explicit bounds; without
/// bounds the anchor is the data's own minimum corner.
#[must_use]
pub fn bin_points(
    points: &[GridPoint],
    bounds: Option<&BoundingBox>,
    cell_km: f64,
    min_count: u64,
    value_key: Option<&str>,
) -> Vec<Feature> {
    if points.is_empty() || cell_km <= 0.0 {
        return Vec::new();
    }

    let (anchor_lat, anchor_lon) = bounds.map_or_else(
        || {
            let lat = points.iter().map(|p| p.lat).fold(f64::INFINITY, f64::min);
            let lon = points.iter().map(|p| p.lon).fold(f64::INFINITY, f64::min);
            (lat, lon)
        },
        |b| (b.lat_min, b.lon_min),
    );

    #[allow(clippy::cast_precision_loss)]
    let mean_lat = points.iter().map(|p| p.lat).sum::<f64>() / points.len() as f64;
    let delta_lat = cell_km / KM_PER_DEGREE;
    let cos_lat = mean_lat.to_radians().cos().abs().max(MIN_LAT_COS);
    let delta_lon = cell_km / (KM_PER_DEGREE * cos_lat);

    struct Cell {
        count: u64,
        sum: f64,
    }

    let mut cells: BTreeMap<(i64, i64), Cell> = BTreeMap::new();
    for point in points {
        #[allow(clippy::cast_possible_truncation)]
        let x = ((point.lon - anchor_lon) / delta_lon).floor() as i64;
        #[allow(clippy::cast_possible_truncation)]
        let y = ((point.lat - anchor_lat) / delta_lat).floor() as i64;
        let cell = cells.entry((x, y)).or_insert(Cell { count: 0, sum: 0.0 });
        cell.count += 1;
        cell.sum += point.value;
    }

    let mut features = Vec::new();
    for ((x, y), cell) in &cells {
        if cell.count < min_count {
            continue;
        }

        #[allow(clippy::cast_precision_loss)]
        let (fx, fy) = (*x as f64, *y as f64);
        let lon_lo = anchor_lon + fx * delta_lon;
        let lon_hi = lon_lo + delta_lon;
        let lat_lo = anchor_lat + fy * delta_lat;
        let lat_hi = lat_lo + delta_lat;

        // Closed ring, counter-clockwise from the south-west corner.
        let ring = vec![
            vec![lon_lo, lat_lo],
            vec![lon_hi, lat_lo],
            vec![lon_hi, lat_hi],
            vec![lon_lo, lat_hi],
            vec![lon_lo, lat_lo],
        ];

        let mut properties = JsonObject::new();
        properties.insert("cell_id".to_string(), JsonValue::from(format!("{x}-{y}")));
        properties.insert("count".to_string(), JsonValue::from(cell.count));
        if let Some(key) = value_key {
            #[allow(clippy::cast_precision_loss)]
            let mean = cell.sum / cell.count as f64;
            properties.insert(key.to_string(), JsonValue::from(round2(mean)));
        }

        features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(geojson::Value::Polygon(vec![ring]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }

    features
}

/// Wraps features into a `FeatureCollection` carrying the source label
/// as a top-level foreign member.
#[must_use]
pub fn feature_collection(features: Vec<Feature>, source: &str) -> FeatureCollection {
    let mut foreign = JsonObject::new();
    foreign.insert("source".to_string(), JsonValue::from(source));
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(foreign),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn downtown_bounds() -> BoundingBox {
        BoundingBox::new(43.6, 43.7, -79.45, -79.35)
    }

    #[allow(clippy::cast_precision_loss)]
    fn cluster(lat: f64, lon: f64, n: usize, value: f64) -> Vec<GridPoint> {
        (0..n)
            .map(|i| GridPoint {
                lat: lat + i as f64 * 1e-5,
                lon,
                value,
            })
            .collect()
    }

    #[test]
    fn empty_input_yields_no_features() {
        assert!(bin_points(&[], None, 1.0, 3, None).is_empty());
    }

    #[test]
    fn sparse_cells_are_suppressed() {
        let mut points = cluster(43.65, -79.40, 4, 0.0);
        // Two points in a far cell, below min_count.
        points.extend(cluster(43.69, -79.36, 2, 0.0));

        let features = bin_points(&points, Some(&downtown_bounds()), 1.0, 3, None);
        assert_eq!(features.len(), 1);
        let props = features[0].properties.as_ref().unwrap();
        assert_eq!(props["count"], JsonValue::from(4u64));
    }

    #[test]
    fn lowering_min_count_never_drops_cells() {
        let mut points = cluster(43.65, -79.40, 4, 0.0);
        points.extend(cluster(43.69, -79.36, 2, 0.0));

        let strict = bin_points(&points, Some(&downtown_bounds()), 1.0, 3, None);
        let loose = bin_points(&points, Some(&downtown_bounds()), 1.0, 1, None);
        assert!(loose.len() >= strict.len());

        let loose_ids: Vec<&JsonValue> = loose
            .iter()
            .map(|f| &f.properties.as_ref().unwrap()["cell_id"])
            .collect();
        for feature in &strict {
            let id = &feature.properties.as_ref().unwrap()["cell_id"];
            assert!(loose_ids.contains(&id));
        }
    }

    #[test]
    fn cell_rings_are_closed() {
        let points = cluster(43.65, -79.40, 3, 0.0);
        let features = bin_points(&points, Some(&downtown_bounds()), 1.0, 1, None);

        let Some(Geometry {
            value: geojson::Value::Polygon(rings),
            ..
        }) = &features[0].geometry
        else {
            panic!("expected a polygon");
        };
        let ring = &rings[0];
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn cell_value_is_mean_rounded_to_cents() {
        let mut points = cluster(43.65, -79.40, 2, 1800.0);
        points.push(GridPoint {
            lat: 43.65,
            lon: -79.40,
            value: 1900.005,
        });

        let features = bin_points(&points, Some(&downtown_bounds()), 1.0, 3, Some("avg_price"));
        assert_eq!(features.len(), 1);
        let props = features[0].properties.as_ref().unwrap();
        let avg = props["avg_price"].as_f64().unwrap();
        assert!((avg - 1833.34).abs() < 0.01, "unexpected mean: {avg}");
    }

    #[test]
    fn binning_is_deterministic() {
        let mut points = cluster(43.65, -79.40, 4, 100.0);
        points.extend(cluster(43.66, -79.41, 3, 200.0));

        let a = bin_points(&points, Some(&downtown_bounds()), 0.5, 1, Some("avg_price"));
        let b = bin_points(&points, Some(&downtown_bounds()), 0.5, 1, Some("avg_price"));
        assert_eq!(a.len(), b.len());
        for (fa, fb) in a.iter().zip(&b) {
            assert_eq!(fa.properties, fb.properties);
        }
    }

    #[test]
    fn explicit_bounds_anchor_cell_ids() {
        // Same cluster, different unrelated far point: with explicit
        // bounds the cluster's cell_id must not move.
        let cluster_a = cluster(43.65, -79.40, 3, 0.0);
        let mut cluster_b = cluster(43.65, -79.40, 3, 0.0);
        cluster_b.extend(cluster(43.62, -79.44, 3, 0.0));

        let bounds = downtown_bounds();
        let ids = |features: &[Feature]| -> Vec<String> {
            features
                .iter()
                .map(|f| {
                    f.properties.as_ref().unwrap()["cell_id"]
                        .as_str()
                        .unwrap()
                        .to_string()
                })
                .collect()
        };

        let a = bin_points(&cluster_a, Some(&bounds), 1.0, 3, None);
        let b = bin_points(&cluster_b, Some(&bounds), 1.0, 3, None);
        let a_ids = ids(&a);
        for id in &a_ids {
            assert!(ids(&b).contains(id), "cell {id} moved");
        }
    }

    #[test]
    fn collection_carries_source_label() {
        let fc = feature_collection(Vec::new(), "rent-prices (sample)");
        let json = serde_json::to_value(&fc).unwrap();
        assert_eq!(json["source"], "rent-prices (sample)");
        assert_eq!(json["type"], "FeatureCollection");
    }
}
