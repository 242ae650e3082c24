//! Live crime fetcher for the Toronto Police `ArcGIS` open-data API.
//!
//! Queries the Major Crime Indicators `FeatureServer` layer by bounding
//! box and occurrence-date cutoff. Pagination follows the
//! `exceededTransferLimit` flag; there are no retries — any failure is
//! reported to the resolver, which falls back to the next source.

use chrono::{DateTime, Utc};
use hoodscope_geo::BoundingBox;
use hoodscope_source_models::CrimeEvent;

use crate::{SourceError, parsing};

/// Max records per page. The layer caps responses at 2000.
const PAGE_SIZE: u64 = 2000;

/// Hard ceiling on records fetched for a single query, so a huge
/// bounding box cannot stall a request indefinitely.
const MAX_RECORDS: usize = 50_000;

/// Fetches crime events inside `bbox` that occurred on or after `cutoff`.
///
/// # Errors
///
/// Returns [`SourceError`] if an HTTP request fails, the server reports
/// an error payload, or the response cannot be parsed.
pub async fn fetch_crime_events(
    client: &reqwest::Client,
    api_url: &str,
    bbox: &BoundingBox,
    cutoff: DateTime<Utc>,
) -> Result<Vec<CrimeEvent>, SourceError> {
    let where_clause = format!(
        "LAT_WGS84 >= {} AND LAT_WGS84 <= {} AND LONG_WGS84 >= {} AND LONG_WGS84 <= {} \
         AND OCC_DATE >= TIMESTAMP '{}'",
        bbox.lat_min,
        bbox.lat_max,
        bbox.lon_min,
        bbox.lon_max,
        cutoff.format("%Y-%m-%d %H:%M:%S"),
    );

    let mut events = Vec::new();
    let mut offset: u64 = 0;

    loop {
        let response = client
            .get(api_url)
            .query(&[
                ("where", where_clause.as_str()),
                ("outFields", "MCI_CATEGORY,OCC_DATE,LAT_WGS84,LONG_WGS84"),
                ("outSR", "4326"),
                ("f", "json"),
                ("resultRecordCount", &PAGE_SIZE.to_string()),
                ("resultOffset", &offset.to_string()),
            ])
            .send()
            .await?;
        let body: serde_json::Value = response.json().await?;

        // ArcGIS reports errors with HTTP 200 and an "error" object.
        if let Some(error) = body.get("error") {
            return Err(SourceError::Upstream {
                message: format!("ArcGIS error: {error}"),
            });
        }

        let features = body
            .get("features")
            .and_then(serde_json::Value::as_array)
            .cloned()
            .unwrap_or_default();
        let count = features.len() as u64;

        for feature in &features {
            if let Some(event) = parse_feature(feature) {
                events.push(event);
            }
        }

        offset += count;
        let exceeded = body
            .get("exceededTransferLimit")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);

        if count == 0 || !exceeded || events.len() >= MAX_RECORDS {
            break;
        }
    }

    log::debug!("live crime API returned {} events", events.len());
    Ok(events)
}

/// Maps one `ArcGIS` feature to a [`CrimeEvent`]. Rows with missing or
/// out-of-range fields are dropped.
fn parse_feature(feature: &serde_json::Value) -> Option<CrimeEvent> {
    let attrs = feature.get("attributes")?;

    let event_type = attrs.get("MCI_CATEGORY")?.as_str()?.to_string();
    let lat = attrs.get("LAT_WGS84")?.as_f64()?;
    let lon = attrs.get("LONG_WGS84")?.as_f64()?;
    if !parsing::valid_lat_lon(lat, lon) {
        return None;
    }

    // OCC_DATE is epoch milliseconds.
    let occ_ms = attrs.get("OCC_DATE")?.as_i64()?;
    let occurred_at = DateTime::<Utc>::from_timestamp_millis(occ_ms)?;

    Some(CrimeEvent {
        event_type,
        occurred_at,
        lat,
        lon,
    })
}
