//! Environment-driven configuration.
//!
//! Every knob has a default suitable for local development against the
//! bundled sample data; the optional stores (warehouse, amenity cache)
//! are only attached when their database paths are set.

use std::path::PathBuf;

/// Default endpoint for the Toronto Police Major Crime Indicators layer.
pub const DEFAULT_CRIME_API_URL: &str = "https://services.arcgis.com/S9th0jAJ7bqgIRjw/arcgis/rest/services/Major_Crime_Indicators_Open_Data/FeatureServer/0/query";

/// Default Overpass API endpoint.
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the CSV snapshot datasets.
    pub data_dir: PathBuf,
    /// Directory holding scraped rental-listing CSVs.
    pub rent_data_dir: PathBuf,
    /// Path to the analytical warehouse database, if any.
    pub warehouse_db: Option<PathBuf>,
    /// Warehouse table holding rental listings.
    pub rental_table: String,
    /// Path to the amenity cache database, if any.
    pub cache_db: Option<PathBuf>,
    /// Cache table name.
    pub cache_table: String,
    /// Cache entry lifetime in seconds.
    pub cache_ttl_secs: i64,
    /// Live crime API endpoint.
    pub crime_api_url: String,
    /// Overpass API endpoint.
    pub overpass_url: String,
    /// Timeout applied to every outbound HTTP request.
    pub http_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/sample"),
            rent_data_dir: PathBuf::from("data/rent-prices"),
            warehouse_db: None,
            rental_table: "rentals".to_string(),
            cache_db: None,
            cache_table: "amenity_cache".to_string(),
            cache_ttl_secs: 86_400,
            crime_api_url: DEFAULT_CRIME_API_URL.to_string(),
            overpass_url: DEFAULT_OVERPASS_URL.to_string(),
            http_timeout_secs: 10,
        }
    }
}

impl AppConfig {
    /// Reads the configuration from the process environment, falling
    /// back to defaults for anything unset. Unparseable numeric values
    /// are logged and replaced with their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_dir: env_path("DATA_DIR").unwrap_or(defaults.data_dir),
            rent_data_dir: env_path("RENT_DATA_DIR").unwrap_or(defaults.rent_data_dir),
            warehouse_db: env_path("WAREHOUSE_DB"),
            rental_table: env_string("RENTAL_TABLE").unwrap_or(defaults.rental_table),
            cache_db: env_path("CACHE_DB"),
            cache_table: env_string("CACHE_TABLE").unwrap_or(defaults.cache_table),
            cache_ttl_secs: env_parsed("CACHE_TTL_SECS", defaults.cache_ttl_secs),
            crime_api_url: env_string("CRIME_API_URL").unwrap_or(defaults.crime_api_url),
            overpass_url: env_string("OVERPASS_URL").unwrap_or(defaults.overpass_url),
            http_timeout_secs: env_parsed("HTTP_TIMEOUT_SECS", defaults.http_timeout_secs),
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_path(name: &str) -> Option<PathBuf> {
    env_string(name).map(PathBuf::from)
}

fn env_parsed<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    match env_string(name) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("Invalid {name} value {raw:?}; using default");
            default
        }),
        None => default,
    }
}
