#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! TTL key-value cache stored in `DuckDB`.
//!
//! Caches expensive external lookups (currently amenity searches) as
//! opaque JSON payloads. Entries expire after a configured TTL; expired
//! rows are logically absent and purged on the next read of the same
//! key. Writes are upserts, so concurrent writers racing on the same
//! key resolve last-writer-wins.

use std::path::Path;
use std::sync::Mutex;

use duckdb::{Connection, params};

/// Errors that can occur during cache operations.
///
/// Callers are expected to treat every variant as non-fatal: a broken
/// cache degrades to "always miss, never store".
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Underlying `DuckDB` operation failed.
    #[error("cache database error: {0}")]
    Db(#[from] duckdb::Error),

    /// Stored payload could not be parsed back as JSON.
    #[error("cache payload parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while preparing the cache directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection mutex was poisoned by a panicking thread.
    #[error("cache lock poisoned")]
    Lock,
}

/// A `DuckDB`-backed cache with per-entry expiry.
pub struct TtlCache {
    conn: Mutex<Connection>,
    table: String,
}

impl TtlCache {
    /// Opens (or creates) the cache database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the connection or schema creation fails.
    pub fn open(path: &Path, table: &str) -> Result<Self, CacheError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn, table)
    }

    /// Opens an in-memory cache. Used by tests.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the connection or schema creation fails.
    pub fn open_in_memory(table: &str) -> Result<Self, CacheError> {
        Self::with_connection(Connection::open_in_memory()?, table)
    }

    fn with_connection(conn: Connection, table: &str) -> Result<Self, CacheError> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                key TEXT NOT NULL PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at BIGINT NOT NULL
            );"
        ))?;
        Ok(Self {
            conn: Mutex::new(conn),
            table: table.to_string(),
        })
    }

    /// Looks up a key, returning the stored payload if present and not
    /// expired. Expired rows are deleted on the way out.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the query fails.
    pub fn get(&self, key: &str) -> Result<Option<serde_json::Value>, CacheError> {
        let conn = self.conn.lock().map_err(|_| CacheError::Lock)?;
        let now = chrono::Utc::now().timestamp();

        let sql = format!("SELECT value, expires_at FROM {} WHERE key = ?", self.table);
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params![key])?;

        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let value: String = row.get(0)?;
        let expires_at: i64 = row.get(1)?;
        drop(rows);

        if expires_at <= now {
            conn.execute(
                &format!("DELETE FROM {} WHERE key = ?", self.table),
                params![key],
            )?;
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&value)?))
    }

    /// Upserts a payload under `key`, expiring `ttl_secs` from now.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if serialization or the insert fails.
    pub fn put(
        &self,
        key: &str,
        value: &serde_json::Value,
        ttl_secs: i64,
    ) -> Result<(), CacheError> {
        let conn = self.conn.lock().map_err(|_| CacheError::Lock)?;
        let expires_at = chrono::Utc::now().timestamp() + ttl_secs;
        let payload = serde_json::to_string(value)?;

        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {} (key, value, expires_at) VALUES (?, ?, ?)",
                self.table
            ),
            params![key, payload, expires_at],
        )?;
        Ok(())
    }
}

/// Builds the canonical cache key for a point-radius-categories lookup.
///
/// Lat/lon are rounded to 4 decimal places (~11 m) and the radius is
/// truncated to whole meters, so near-duplicate queries intentionally
/// collide onto the same entry. Categories are lowercased and sorted.
#[must_use]
pub fn cache_key(lat: f64, lon: f64, radius_m: f64, categories: &[String]) -> String {
    let mut cats: Vec<String> = categories
        .iter()
        .map(|c| c.trim().to_lowercase())
        .collect();
    cats.sort();

    #[allow(clippy::cast_possible_truncation)]
    let radius = radius_m as i64;
    format!("{lat:.4}|{lon:.4}|{radius}|{}", cats.join(","))
}
