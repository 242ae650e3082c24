#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geo-tagged record types produced by the data sources.
//!
//! Every source (live API, warehouse, CSV snapshot) normalizes its rows
//! into one of these shapes. Records live for a single request; they are
//! never persisted — the amenity cache stores response payloads, not raw
//! records.

use chrono::{DateTime, Utc};
use hoodscope_geo::GeoPoint;
use serde::{Deserialize, Serialize};

/// A single crime occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrimeEvent {
    /// Source-reported offence type (e.g. `"Assault"`).
    pub event_type: String,
    /// When the offence occurred.
    pub occurred_at: DateTime<Utc>,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

/// A transit stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitStop {
    /// Agency stop identifier.
    pub stop_id: String,
    /// Human-readable stop name.
    pub stop_name: String,
    /// Transit mode (`"bus"`, `"streetcar"`, `"subway"`), when known.
    pub mode: Option<String>,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

/// An amenity / point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmenityPoint {
    /// Amenity name.
    pub name: String,
    /// Query category this point matched (e.g. `"grocery"`).
    pub category: String,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

/// A rental listing with a cleaned numeric price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalListing {
    /// Monthly price in dollars.
    pub price: f64,
    /// Bedroom count.
    pub bedrooms: i64,
    /// Bathroom count.
    pub bathrooms: i64,
    /// Whether the unit has a den.
    pub den: bool,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

macro_rules! impl_location {
    ($ty:ty) => {
        impl $ty {
            /// The record's coordinates as a [`GeoPoint`].
            ///
            /// Records are filtered for finite, in-range coordinates at
            /// load time, so this is infallible.
            #[must_use]
            pub const fn location(&self) -> GeoPoint {
                GeoPoint {
                    lat: self.lat,
                    lon: self.lon,
                }
            }
        }
    };
}

impl_location!(CrimeEvent);
impl_location!(TransitStop);
impl_location!(AmenityPoint);
impl_location!(RentalListing);
