#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Data source fetchers.
//!
//! Each module fetches one kind of geo-tagged record from one backend:
//! the live Toronto Police `ArcGIS` API, the Overpass amenity search
//! service, the `DuckDB` warehouse, or the local CSV snapshots. None of
//! them implement fallback — the resolver in `hoodscope_tools` owns the
//! chain ordering and degrades to the next source when a fetch here
//! returns an error.

pub mod live_crime;
pub mod overpass;
pub mod parsing;
pub mod snapshot;
pub mod warehouse;

/// Errors that can occur while fetching from a data source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// Warehouse query failed.
    #[error("warehouse error: {0}")]
    Db(#[from] duckdb::Error),

    /// The backend answered, but with something unusable.
    #[error("upstream error: {message}")]
    Upstream {
        /// Description of what went wrong.
        message: String,
    },

    /// A shared connection lock was poisoned.
    #[error("source lock poisoned")]
    Lock,
}
