//! Amenity search against the Overpass API.
//!
//! Builds one Overpass QL query per requested category so each result
//! keeps its category attribution, and merges the results. Like the
//! other fetchers this module does not retry; a failed search is the
//! resolver's cue to fall back to the seeded POI snapshot.

use hoodscope_geo::GeoPoint;
use hoodscope_source_models::AmenityPoint;

use crate::{SourceError, parsing};

/// Maps a query category to an Overpass tag selector.
///
/// Unrecognized categories fall through to `amenity=<category>`, which
/// matches the long tail of OSM amenity values (`bank`, `dentist`, ...).
fn tag_selector(category: &str) -> String {
    match category {
        "grocery" => "[\"shop\"~\"supermarket|convenience|greengrocer\"]".to_string(),
        "cafe" => "[\"amenity\"=\"cafe\"]".to_string(),
        "restaurant" => "[\"amenity\"=\"restaurant\"]".to_string(),
        "pharmacy" => "[\"amenity\"=\"pharmacy\"]".to_string(),
        "gym" => "[\"leisure\"=\"fitness_centre\"]".to_string(),
        "park" => "[\"leisure\"=\"park\"]".to_string(),
        "school" => "[\"amenity\"=\"school\"]".to_string(),
        "library" => "[\"amenity\"=\"library\"]".to_string(),
        other => format!("[\"amenity\"=\"{other}\"]"),
    }
}

/// Builds the Overpass QL body for one category around a point.
fn build_query(center: GeoPoint, radius_m: f64, category: &str) -> String {
    let selector = tag_selector(category);
    format!(
        "[out:json][timeout:10];\n\
         (\n\
           node{selector}(around:{radius:.0},{lat},{lon});\n\
           way{selector}(around:{radius:.0},{lat},{lon});\n\
         );\n\
         out center;",
        radius = radius_m,
        lat = center.lat,
        lon = center.lon,
    )
}

/// Searches Overpass for amenities in the given categories around a
/// point. Runs one query per category and concatenates the results.
///
/// # Errors
///
/// Returns [`SourceError`] if any HTTP request fails or a response
/// cannot be parsed.
pub async fn search_amenities(
    client: &reqwest::Client,
    overpass_url: &str,
    center: GeoPoint,
    radius_m: f64,
    categories: &[String],
) -> Result<Vec<AmenityPoint>, SourceError> {
    let mut points = Vec::new();

    for category in categories {
        let query = build_query(center, radius_m, category);
        let response = client.post(overpass_url).body(query).send().await?;

        if !response.status().is_success() {
            return Err(SourceError::Upstream {
                message: format!("Overpass HTTP {}", response.status()),
            });
        }

        let body: serde_json::Value = response.json().await?;
        let elements = body
            .get("elements")
            .and_then(serde_json::Value::as_array)
            .cloned()
            .unwrap_or_default();

        for element in &elements {
            if let Some(point) = parse_element(element, category) {
                points.push(point);
            }
        }
    }

    log::debug!(
        "Overpass returned {} amenities for {} categories",
        points.len(),
        categories.len()
    );
    Ok(points)
}

/// Maps one Overpass element to an [`AmenityPoint`]. Ways carry their
/// coordinates under `"center"`; nodes inline. Nameless elements are
/// kept with a placeholder name.
fn parse_element(element: &serde_json::Value, category: &str) -> Option<AmenityPoint> {
    let (lat, lon) = element.get("center").map_or_else(
        || {
            Some((
                element.get("lat")?.as_f64()?,
                element.get("lon")?.as_f64()?,
            ))
        },
        |center| Some((center.get("lat")?.as_f64()?, center.get("lon")?.as_f64()?)),
    )?;
    if !parsing::valid_lat_lon(lat, lon) {
        return None;
    }

    let name = element
        .get("tags")
        .and_then(|tags| tags.get("name"))
        .and_then(serde_json::Value::as_str)
        .unwrap_or("(unnamed)")
        .to_string();

    Some(AmenityPoint {
        name,
        category: category.to_string(),
        lat,
        lon,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_includes_radius_and_selector() {
        let center = GeoPoint {
            lat: 43.6532,
            lon: -79.3832,
        };
        let query = build_query(center, 600.0, "cafe");
        assert!(query.contains("around:600,43.6532,-79.3832"));
        assert!(query.contains("[\"amenity\"=\"cafe\"]"));
        assert!(query.contains("out center;"));
    }

    #[test]
    fn parses_node_element() {
        let element = serde_json::json!({
            "type": "node",
            "lat": 43.6532,
            "lon": -79.3832,
            "tags": {"name": "Sam James Coffee"}
        });
        let point = parse_element(&element, "cafe").unwrap();
        assert_eq!(point.name, "Sam James Coffee");
        assert_eq!(point.category, "cafe");
    }

    #[test]
    fn parses_way_element_via_center() {
        let element = serde_json::json!({
            "type": "way",
            "center": {"lat": 43.66, "lon": -79.39},
            "tags": {"name": "Loblaws"}
        });
        let point = parse_element(&element, "grocery").unwrap();
        assert!((point.lat - 43.66).abs() < f64::EPSILON);
    }

    #[test]
    fn nameless_element_gets_placeholder() {
        let element = serde_json::json!({
            "type": "node",
            "lat": 43.66,
            "lon": -79.39
        });
        let point = parse_element(&element, "park").unwrap();
        assert_eq!(point.name, "(unnamed)");
    }

    #[test]
    fn element_without_coordinates_is_dropped() {
        let element = serde_json::json!({"type": "node", "tags": {"name": "x"}});
        assert!(parse_element(&element, "cafe").is_none());
    }
}
