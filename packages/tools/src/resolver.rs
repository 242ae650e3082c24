//! Ordered source-resolution chains.
//!
//! Each dataset has a fixed preference order; a stage that fails or is
//! not configured is logged and skipped, and the next stage is tried
//! exactly once — no retries. When every stage fails the resolver
//! returns an empty record set with an "unavailable" label rather than
//! an error, so availability problems never surface as tool failures.

use chrono::{DateTime, Utc};
use hoodscope_geo::BoundingBox;
use hoodscope_source::live_crime;
use hoodscope_source_models::{CrimeEvent, RentalListing, TransitStop};

use crate::context::ToolContext;

/// A resolved record set together with the label of the source that
/// actually answered. The label is echoed in tool payloads.
pub struct Resolved<T> {
    /// Records from the first source that answered.
    pub records: Vec<T>,
    /// Human-readable source label.
    pub source: String,
}

impl<T> Resolved<T> {
    fn unavailable(label: &str) -> Self {
        Self {
            records: Vec::new(),
            source: label.to_string(),
        }
    }
}

/// Resolves recent crime events inside `bbox`.
///
/// Chain: live API, then warehouse, then CSV snapshot, then empty.
pub async fn crime_events(
    ctx: &ToolContext,
    bbox: &BoundingBox,
    cutoff: DateTime<Utc>,
) -> Resolved<CrimeEvent> {
    match live_crime::fetch_crime_events(&ctx.http, &ctx.config.crime_api_url, bbox, cutoff).await {
        Ok(records) => {
            return Resolved {
                records,
                source: "Toronto Police open data (live)".to_string(),
            };
        }
        Err(e) => log::warn!("Live crime API failed, trying warehouse: {e}"),
    }

    if let Some(warehouse) = &ctx.warehouse {
        match warehouse.fetch_crime_events(bbox, cutoff) {
            Ok(records) => {
                return Resolved {
                    records,
                    source: "warehouse: crime_events".to_string(),
                };
            }
            Err(e) => log::warn!("Warehouse crime query failed, trying snapshot: {e}"),
        }
    }

    match ctx.snapshots.crime_events() {
        Ok(events) => Resolved {
            records: events
                .iter()
                .filter(|e| e.occurred_at >= cutoff && bbox.contains(e.lat, e.lon))
                .cloned()
                .collect(),
            source: "Toronto Police open data (sample)".to_string(),
        },
        Err(e) => {
            log::warn!("Crime snapshot unavailable: {e}");
            Resolved::unavailable("crime data unavailable")
        }
    }
}

/// Resolves crime events for grid aggregation. The live API is skipped
/// here: an unbounded or city-wide box would page through the whole
/// dataset on every call. The warehouse only participates when explicit
/// bounds constrain the query.
pub fn crime_events_all(ctx: &ToolContext, bounds: Option<&BoundingBox>) -> Resolved<CrimeEvent> {
    if let (Some(warehouse), Some(bbox)) = (&ctx.warehouse, bounds) {
        match warehouse.fetch_crime_events(bbox, DateTime::UNIX_EPOCH) {
            Ok(records) => {
                return Resolved {
                    records,
                    source: "warehouse: crime_events".to_string(),
                };
            }
            Err(e) => log::warn!("Warehouse crime query failed, trying snapshot: {e}"),
        }
    }

    match ctx.snapshots.crime_events() {
        Ok(events) => Resolved {
            records: events
                .iter()
                .filter(|e| bounds.is_none_or(|b| b.contains(e.lat, e.lon)))
                .cloned()
                .collect(),
            source: "Toronto Police open data (sample)".to_string(),
        },
        Err(e) => {
            log::warn!("Crime snapshot unavailable: {e}");
            Resolved::unavailable("crime data unavailable")
        }
    }
}

/// Resolves transit stops inside `bbox`: warehouse, then snapshot.
pub fn transit_stops(ctx: &ToolContext, bbox: &BoundingBox) -> Resolved<TransitStop> {
    if let Some(warehouse) = &ctx.warehouse {
        match warehouse.fetch_transit_stops(bbox) {
            Ok(records) => {
                return Resolved {
                    records,
                    source: "warehouse: transit_stops".to_string(),
                };
            }
            Err(e) => log::warn!("Warehouse transit query failed, trying snapshot: {e}"),
        }
    }

    match ctx.snapshots.transit_stops() {
        Ok(stops) => Resolved {
            records: stops
                .iter()
                .filter(|s| bbox.contains(s.lat, s.lon))
                .cloned()
                .collect(),
            source: "TTC stops (sample)".to_string(),
        },
        Err(e) => {
            log::warn!("Transit snapshot unavailable: {e}");
            Resolved::unavailable("transit data unavailable")
        }
    }
}

/// Resolves rental listings, optionally bounded and price-filtered.
///
/// The warehouse only participates when explicit bounds are given (an
/// unbounded scan of the rental table is never wanted); otherwise the
/// merged snapshot CSVs answer.
pub fn rentals(
    ctx: &ToolContext,
    bounds: Option<&BoundingBox>,
    price_min: Option<f64>,
    price_max: Option<f64>,
) -> Resolved<RentalListing> {
    if let (Some(warehouse), Some(bbox)) = (&ctx.warehouse, bounds) {
        match warehouse.fetch_rentals(bbox, price_min, price_max) {
            Ok(records) => {
                return Resolved {
                    records,
                    source: "warehouse: rentals".to_string(),
                };
            }
            Err(e) => log::warn!("Warehouse rental query failed, trying snapshot: {e}"),
        }
    }

    match ctx.snapshots.rentals() {
        Ok(listings) => Resolved {
            records: listings
                .iter()
                .filter(|l| bounds.is_none_or(|b| b.contains(l.lat, l.lon)))
                .filter(|l| price_min.is_none_or(|min| l.price >= min))
                .filter(|l| price_max.is_none_or(|max| l.price <= max))
                .cloned()
                .collect(),
            source: "rent-prices (sample)".to_string(),
        },
        Err(e) => {
            log::warn!("Rental snapshot unavailable: {e}");
            Resolved::unavailable("rental data unavailable")
        }
    }
}
