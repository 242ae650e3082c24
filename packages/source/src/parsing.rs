//! Shared parsing utilities for data sources.
//!
//! Date, price, and coordinate parsing used by the snapshot loader and
//! the warehouse client.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parses an event date as either `YYYY-MM-DD` or ISO 8601 datetime
/// (space- or `T`-separated, optional fractional seconds).
#[must_use]
pub fn parse_event_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    None
}

/// Parses a formatted price string like `"$1,850.00"` into dollars.
/// Strips currency symbols, thousands separators, and stray quotes.
#[must_use]
pub fn parse_price(s: &str) -> Option<f64> {
    let cleaned: String = s
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '"'))
        .collect();
    let value = cleaned.trim().parse::<f64>().ok()?;
    if value.is_finite() { Some(value) } else { None }
}

/// Validates a coordinate pair: both finite and inside WGS84 ranges.
/// Loaders drop rows that fail this check.
#[must_use]
pub fn valid_lat_lon(lat: f64, lon: f64) -> bool {
    lat.is_finite()
        && lon.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lon)
}
