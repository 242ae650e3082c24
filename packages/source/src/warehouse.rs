//! `DuckDB` warehouse client.
//!
//! The warehouse is an optional analytical database holding the
//! `crime_events` and `transit_stops` tables plus a configurable rental
//! table. It is only attached when `WAREHOUSE_DB` is configured; query
//! failures surface as [`SourceError`] so the resolver can degrade to
//! the snapshot source.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use duckdb::{Connection, params};
use hoodscope_geo::BoundingBox;
use hoodscope_source_models::{CrimeEvent, RentalListing, TransitStop};

use crate::{SourceError, parsing};

/// A connection to the analytical warehouse.
pub struct Warehouse {
    conn: Mutex<Connection>,
    rental_table: String,
}

impl Warehouse {
    /// Opens the warehouse database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the file does not exist or the
    /// connection fails. A missing file is an error rather than an
    /// implicit empty database so a misconfigured path degrades to the
    /// snapshot source instead of silently returning nothing.
    pub fn open(path: &Path, rental_table: &str) -> Result<Self, SourceError> {
        if !path.exists() {
            return Err(SourceError::Upstream {
                message: format!("warehouse database not found: {}", path.display()),
            });
        }
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
            rental_table: rental_table.to_string(),
        })
    }

    /// Fetches crime events inside `bbox` on or after `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the query fails.
    pub fn fetch_crime_events(
        &self,
        bbox: &BoundingBox,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<CrimeEvent>, SourceError> {
        let conn = self.conn.lock().map_err(|_| SourceError::Lock)?;
        let mut stmt = conn.prepare(
            "SELECT event_type, CAST(event_date AS VARCHAR) AS event_date, lat, lon
             FROM crime_events
             WHERE lat BETWEEN ? AND ?
               AND lon BETWEEN ? AND ?
               AND event_date >= CAST(? AS TIMESTAMP)",
        )?;

        let cutoff_str = cutoff.format("%Y-%m-%d %H:%M:%S").to_string();
        let mut rows = stmt.query(params![
            bbox.lat_min,
            bbox.lat_max,
            bbox.lon_min,
            bbox.lon_max,
            cutoff_str,
        ])?;

        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            let event_type: String = row.get(0)?;
            let event_date: String = row.get(1)?;
            let lat: f64 = row.get(2)?;
            let lon: f64 = row.get(3)?;

            let Some(occurred_at) = parsing::parse_event_date(&event_date) else {
                continue;
            };
            if !parsing::valid_lat_lon(lat, lon) {
                continue;
            }
            events.push(CrimeEvent {
                event_type,
                occurred_at,
                lat,
                lon,
            });
        }

        Ok(events)
    }

    /// Fetches transit stops inside `bbox`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the query fails.
    pub fn fetch_transit_stops(&self, bbox: &BoundingBox) -> Result<Vec<TransitStop>, SourceError> {
        let conn = self.conn.lock().map_err(|_| SourceError::Lock)?;
        let mut stmt = conn.prepare(
            "SELECT stop_id, stop_name, lat, lon, mode
             FROM transit_stops
             WHERE lat BETWEEN ? AND ?
               AND lon BETWEEN ? AND ?",
        )?;

        let mut rows = stmt.query(params![
            bbox.lat_min,
            bbox.lat_max,
            bbox.lon_min,
            bbox.lon_max,
        ])?;

        let mut stops = Vec::new();
        while let Some(row) = rows.next()? {
            let stop_id: String = row.get(0)?;
            let stop_name: String = row.get(1)?;
            let lat: f64 = row.get(2)?;
            let lon: f64 = row.get(3)?;
            let mode: Option<String> = row.get(4)?;

            if !parsing::valid_lat_lon(lat, lon) {
                continue;
            }
            stops.push(TransitStop {
                stop_id,
                stop_name,
                mode,
                lat,
                lon,
            });
        }

        Ok(stops)
    }

    /// Fetches rental listings inside `bounds`, optionally constrained
    /// to a price range. Prices are stored as formatted strings in the
    /// warehouse, so the range filter is applied after cleaning.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the query fails.
    pub fn fetch_rentals(
        &self,
        bounds: &BoundingBox,
        price_min: Option<f64>,
        price_max: Option<f64>,
    ) -> Result<Vec<RentalListing>, SourceError> {
        let conn = self.conn.lock().map_err(|_| SourceError::Lock)?;
        let sql = format!(
            "SELECT bedroom, bathroom, den, lat, lon, price
             FROM {}
             WHERE lat BETWEEN ? AND ?
               AND lon BETWEEN ? AND ?",
            self.rental_table
        );
        let mut stmt = conn.prepare(&sql)?;

        let mut rows = stmt.query(params![
            bounds.lat_min,
            bounds.lat_max,
            bounds.lon_min,
            bounds.lon_max,
        ])?;

        let mut listings = Vec::new();
        while let Some(row) = rows.next()? {
            let bedrooms: i64 = row.get(0)?;
            let bathrooms: i64 = row.get(1)?;
            let den: i64 = row.get(2)?;
            let lat: f64 = row.get(3)?;
            let lon: f64 = row.get(4)?;
            let price_raw: String = row.get(5)?;

            let Some(price) = parsing::parse_price(&price_raw) else {
                continue;
            };
            if !parsing::valid_lat_lon(lat, lon) {
                continue;
            }
            if price_min.is_some_and(|min| price < min) {
                continue;
            }
            if price_max.is_some_and(|max| price > max) {
                continue;
            }

            listings.push(RentalListing {
                price,
                bedrooms,
                bathrooms,
                den: den != 0,
                lat,
                lon,
            });
        }

        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_warehouse() -> Warehouse {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE crime_events (
                event_type TEXT, event_date TIMESTAMP, lat DOUBLE, lon DOUBLE
             );
             INSERT INTO crime_events VALUES
               ('Assault', TIMESTAMP '2024-06-01 12:00:00', 43.6540, -79.3840),
               ('Robbery', TIMESTAMP '2024-01-01 12:00:00', 43.6540, -79.3840),
               ('Assault', TIMESTAMP '2024-06-01 12:00:00', 44.5000, -79.3840);
             CREATE TABLE transit_stops (
                stop_id TEXT, stop_name TEXT, lat DOUBLE, lon DOUBLE, mode TEXT
             );
             INSERT INTO transit_stops VALUES
               ('1', 'Queen St', 43.6525, -79.3790, 'streetcar'),
               ('2', 'Far Stop', 44.9000, -79.3790, NULL);
             CREATE TABLE rentals (
                bedroom BIGINT, bathroom BIGINT, den BIGINT,
                address TEXT, lat DOUBLE, lon DOUBLE, price TEXT, synthetic BOOLEAN
             );
             INSERT INTO rentals VALUES
               (1, 1, 0, 'a', 43.6540, -79.3840, '$1,850.00', true),
               (2, 2, 1, 'b', 43.6545, -79.3845, '$2,600.00', true),
               (1, 1, 0, 'c', 43.6540, -79.3840, 'n/a', true);",
        )
        .unwrap();
        Warehouse {
            conn: Mutex::new(conn),
            rental_table: "rentals".to_string(),
        }
    }

    fn downtown_bbox() -> BoundingBox {
        BoundingBox::new(43.64, 43.67, -79.40, -79.37)
    }

    #[test]
    fn crime_query_applies_bbox_and_cutoff() {
        let wh = seeded_warehouse();
        let cutoff = parsing::parse_event_date("2024-03-01").unwrap();
        let events = wh.fetch_crime_events(&downtown_bbox(), cutoff).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "Assault");
    }

    #[test]
    fn transit_query_applies_bbox() {
        let wh = seeded_warehouse();
        let stops = wh.fetch_transit_stops(&downtown_bbox()).unwrap();
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].stop_name, "Queen St");
        assert_eq!(stops[0].mode.as_deref(), Some("streetcar"));
    }

    #[test]
    fn rental_query_cleans_prices_and_filters_range() {
        let wh = seeded_warehouse();
        let all = wh.fetch_rentals(&downtown_bbox(), None, None).unwrap();
        // The 'n/a' price row is dropped.
        assert_eq!(all.len(), 2);

        let cheap = wh
            .fetch_rentals(&downtown_bbox(), None, Some(2000.0))
            .unwrap();
        assert_eq!(cheap.len(), 1);
        assert!((cheap[0].price - 1850.0).abs() < f64::EPSILON);
        assert!(!cheap[0].den);
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = Warehouse::open(Path::new("/nonexistent/warehouse.duckdb"), "rentals");
        assert!(result.is_err());
    }
}
