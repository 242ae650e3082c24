//! Shared tool execution context.

use hoodscope_cache::TtlCache;
use hoodscope_source::snapshot::SnapshotStore;
use hoodscope_source::warehouse::Warehouse;

use crate::config::AppConfig;

/// Everything a tool invocation needs: configuration, the outbound HTTP
/// client, and the attached data sources. Built once at startup and
/// shared across requests.
pub struct ToolContext {
    /// Runtime configuration.
    pub config: AppConfig,
    /// HTTP client for the live crime API and Overpass. Carries the
    /// configured timeout; requests are never retried.
    pub http: reqwest::Client,
    /// Analytical warehouse, when configured and openable.
    pub warehouse: Option<Warehouse>,
    /// Amenity search cache, when configured and openable.
    pub cache: Option<TtlCache>,
    /// Lazily loaded CSV snapshot datasets.
    pub snapshots: SnapshotStore,
}

impl ToolContext {
    /// Builds the context from a configuration. The optional stores are
    /// attached best-effort: a warehouse or cache that fails to open is
    /// logged and left detached, and the affected tools degrade to the
    /// remaining sources.
    ///
    /// # Errors
    ///
    /// Returns [`reqwest::Error`] if the HTTP client cannot be built.
    pub fn new(config: AppConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.http_timeout_secs))
            .build()?;

        let warehouse = config.warehouse_db.as_ref().and_then(|path| {
            match Warehouse::open(path, &config.rental_table) {
                Ok(warehouse) => {
                    log::info!("Attached warehouse at {}", path.display());
                    Some(warehouse)
                }
                Err(e) => {
                    log::warn!("Warehouse unavailable ({e}); continuing without it");
                    None
                }
            }
        });

        let cache = config.cache_db.as_ref().and_then(|path| {
            match TtlCache::open(path, &config.cache_table) {
                Ok(cache) => {
                    log::info!("Attached amenity cache at {}", path.display());
                    Some(cache)
                }
                Err(e) => {
                    log::warn!("Amenity cache unavailable ({e}); continuing without it");
                    None
                }
            }
        });

        let snapshots = SnapshotStore::new(config.data_dir.clone(), config.rent_data_dir.clone());

        Ok(Self {
            config,
            http,
            warehouse,
            cache,
            snapshots,
        })
    }
}
