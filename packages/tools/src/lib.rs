#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The aggregation engine behind the hoodscope tool surface.
//!
//! A request names a tool and supplies arguments. The [`dispatch`]
//! module validates and types the arguments, the [`resolver`] fetches a
//! bounded record set by walking an ordered source chain, and either
//! the [`classify`] heuristics produce scalar summaries or the [`grid`]
//! binner aggregates records into polygon features. Source availability
//! failures never escape this crate — they degrade along the chain —
//! while argument errors are surfaced to the caller verbatim.

pub mod classify;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod grid;
pub mod resolver;
pub mod tools;

/// Errors surfaced to the caller through the response envelope.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The request named a tool this server does not provide.
    #[error("Unknown tool")]
    UnknownTool,

    /// The arguments were missing or malformed.
    #[error("{0}")]
    InvalidArgs(String),

    /// A payload failed to serialize. Should not happen for the types
    /// this crate produces.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<hoodscope_geo::GeoError> for ToolError {
    fn from(e: hoodscope_geo::GeoError) -> Self {
        Self::InvalidArgs(e.to_string())
    }
}
