//! Local CSV snapshot store.
//!
//! Holds the flat-file fallback datasets: crime events, transit stops,
//! seeded POIs, and rental listings. Each dataset is loaded lazily on
//! first access and kept for the lifetime of the process; `OnceCell`
//! guarantees at-most-once initialization when concurrent first
//! requests race. A failed load is not cached, so a snapshot that
//! appears later (e.g. a mounted volume) becomes visible on the next
//! request.

use std::path::{Path, PathBuf};

use hoodscope_source_models::{AmenityPoint, CrimeEvent, RentalListing, TransitStop};
use once_cell::sync::OnceCell;
use serde::Deserialize;

use crate::{SourceError, parsing};

/// Process-wide, read-only snapshot datasets.
pub struct SnapshotStore {
    data_dir: PathBuf,
    rent_dir: PathBuf,
    crime: OnceCell<Vec<CrimeEvent>>,
    transit: OnceCell<Vec<TransitStop>>,
    pois: OnceCell<Vec<AmenityPoint>>,
    rentals: OnceCell<Vec<RentalListing>>,
}

impl SnapshotStore {
    /// Creates a store rooted at the given directories. Nothing is read
    /// until a dataset is first requested.
    #[must_use]
    pub fn new(data_dir: PathBuf, rent_dir: PathBuf) -> Self {
        Self {
            data_dir,
            rent_dir,
            crime: OnceCell::new(),
            transit: OnceCell::new(),
            pois: OnceCell::new(),
            rentals: OnceCell::new(),
        }
    }

    /// Crime events from `crime_events.csv`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the file is missing or unreadable.
    pub fn crime_events(&self) -> Result<&[CrimeEvent], SourceError> {
        self.crime
            .get_or_try_init(|| load_crime_events(&self.data_dir.join("crime_events.csv")))
            .map(Vec::as_slice)
    }

    /// Transit stops from `ttc_stops.csv`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the file is missing or unreadable.
    pub fn transit_stops(&self) -> Result<&[TransitStop], SourceError> {
        self.transit
            .get_or_try_init(|| load_transit_stops(&self.data_dir.join("ttc_stops.csv")))
            .map(Vec::as_slice)
    }

    /// Seeded POIs from `pois.csv`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the file is missing or unreadable.
    pub fn pois(&self) -> Result<&[AmenityPoint], SourceError> {
        self.pois
            .get_or_try_init(|| load_pois(&self.data_dir.join("pois.csv")))
            .map(Vec::as_slice)
    }

    /// Rental listings merged from every CSV under the rent directory.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the directory cannot be read.
    pub fn rentals(&self) -> Result<&[RentalListing], SourceError> {
        self.rentals
            .get_or_try_init(|| load_rentals(&self.rent_dir))
            .map(Vec::as_slice)
    }
}

#[derive(Debug, Deserialize)]
struct CrimeRow {
    event_type: String,
    event_date: String,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct TransitRow {
    stop_id: String,
    stop_name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    mode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PoiRow {
    name: String,
    category: String,
    lat: f64,
    lon: f64,
}

/// Rental CSVs use the original scraped headers; every field is
/// optional so files with unrelated schemas simply yield no rows.
#[derive(Debug, Deserialize)]
struct RentRow {
    #[serde(rename = "Bedroom", default)]
    bedroom: Option<i64>,
    #[serde(rename = "Bathroom", default)]
    bathroom: Option<i64>,
    #[serde(rename = "Den", default)]
    den: Option<i64>,
    #[serde(rename = "Lat", default)]
    lat: Option<f64>,
    #[serde(rename = "Long", default)]
    lon: Option<f64>,
    #[serde(rename = "Price", default)]
    price: Option<String>,
}

fn load_crime_events(path: &Path) -> Result<Vec<CrimeEvent>, SourceError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut events = Vec::new();

    for row in reader.deserialize::<CrimeRow>() {
        let row = row?;
        let Some(occurred_at) = parsing::parse_event_date(&row.event_date) else {
            continue;
        };
        if !parsing::valid_lat_lon(row.lat, row.lon) {
            continue;
        }
        events.push(CrimeEvent {
            event_type: row.event_type,
            occurred_at,
            lat: row.lat,
            lon: row.lon,
        });
    }

    log::info!("Loaded {} crime events from {}", events.len(), path.display());
    Ok(events)
}

fn load_transit_stops(path: &Path) -> Result<Vec<TransitStop>, SourceError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut stops = Vec::new();

    for row in reader.deserialize::<TransitRow>() {
        let row = row?;
        if !parsing::valid_lat_lon(row.lat, row.lon) {
            continue;
        }
        stops.push(TransitStop {
            stop_id: row.stop_id,
            stop_name: row.stop_name,
            mode: row.mode.filter(|m| !m.is_empty()),
            lat: row.lat,
            lon: row.lon,
        });
    }

    log::info!("Loaded {} transit stops from {}", stops.len(), path.display());
    Ok(stops)
}

fn load_pois(path: &Path) -> Result<Vec<AmenityPoint>, SourceError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut pois = Vec::new();

    for row in reader.deserialize::<PoiRow>() {
        let row = row?;
        if !parsing::valid_lat_lon(row.lat, row.lon) {
            continue;
        }
        pois.push(AmenityPoint {
            name: row.name,
            category: row.category,
            lat: row.lat,
            lon: row.lon,
        });
    }

    log::info!("Loaded {} POIs from {}", pois.len(), path.display());
    Ok(pois)
}

fn load_rentals(dir: &Path) -> Result<Vec<RentalListing>, SourceError> {
    let mut listings = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if !is_csv {
            continue;
        }

        let mut reader = match csv::Reader::from_path(&path) {
            Ok(reader) => reader,
            Err(e) => {
                log::warn!("Skipping unreadable rental file {}: {e}", path.display());
                continue;
            }
        };

        let before = listings.len();
        for row in reader.deserialize::<RentRow>() {
            // Rows with a foreign schema or malformed fields are skipped,
            // not fatal — rental CSVs come from scrapes of varying shape.
            let Ok(row) = row else { continue };
            let (Some(lat), Some(lon), Some(price_raw)) = (row.lat, row.lon, row.price) else {
                continue;
            };
            let Some(price) = parsing::parse_price(&price_raw) else {
                continue;
            };
            if !parsing::valid_lat_lon(lat, lon) {
                continue;
            }
            listings.push(RentalListing {
                price,
                bedrooms: row.bedroom.unwrap_or(0),
                bathrooms: row.bathroom.unwrap_or(0),
                den: row.den.unwrap_or(0) != 0,
                lat,
                lon,
            });
        }
        log::info!(
            "Loaded {} rental listings from {}",
            listings.len() - before,
            path.display()
        );
    }

    Ok(listings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hoodscope_snapshot_{name}_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn loads_crime_events_and_drops_bad_rows() {
        let dir = temp_dir("crime");
        let path = dir.join("crime_events.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "event_type,event_date,lat,lon").unwrap();
        writeln!(f, "Assault,2024-06-01,43.6532,-79.3832").unwrap();
        writeln!(f, "Robbery,garbage-date,43.6532,-79.3832").unwrap();
        writeln!(f, "Theft,2024-06-02,95.0,-79.3832").unwrap();

        let events = load_crime_events(&path).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "Assault");
    }

    #[test]
    fn loads_rentals_cleaning_prices() {
        let dir = temp_dir("rent");
        let path = dir.join("listings.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "Bedroom,Bathroom,Den,Address,Lat,Long,Price,Synthetic").unwrap();
        writeln!(f, "1,1,0,somewhere,43.6532,-79.3832,\"$1,850.00\",True").unwrap();
        writeln!(f, "2,2,1,elsewhere,43.6600,-79.3900,not a price,True").unwrap();

        let listings = load_rentals(&dir).unwrap();
        assert_eq!(listings.len(), 1);
        assert!((listings[0].price - 1850.0).abs() < f64::EPSILON);
        assert_eq!(listings[0].bedrooms, 1);
        assert!(!listings[0].den);
    }

    #[test]
    fn missing_snapshot_file_is_an_error() {
        let store = SnapshotStore::new(PathBuf::from("/nonexistent"), PathBuf::from("/nonexistent"));
        assert!(store.crime_events().is_err());
        assert!(store.rentals().is_err());
    }

    #[test]
    fn snapshot_loads_once_and_is_reused() {
        let dir = temp_dir("once");
        let path = dir.join("pois.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "name,category,lat,lon").unwrap();
        writeln!(f, "Loblaws,grocery,43.6532,-79.3832").unwrap();
        drop(f);

        let store = SnapshotStore::new(dir.clone(), dir.clone());
        let first = store.pois().unwrap().as_ptr();
        // Delete the backing file; the cached load must still serve.
        std::fs::remove_file(&path).unwrap();
        let second = store.pois().unwrap().as_ptr();
        assert_eq!(first, second);
    }
}
