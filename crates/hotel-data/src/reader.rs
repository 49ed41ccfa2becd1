//! CSV discovery and loading for the booking exports.
//!
//! Each export is located by file name anywhere below the data directory and
//! deserialised into the typed records of [`hotel_core::models`].

use std::fs::File;
use std::path::{Path, PathBuf};

use hotel_core::error::{HotelError, Result};
use hotel_core::models::{AggregatedBooking, Booking, DateDim, EnrichedOccupancy, Hotel, Room};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

pub const BOOKINGS_FILE: &str = "fact_bookings.csv";
pub const AGGREGATED_BOOKINGS_FILE: &str = "fact_aggregated_bookings.csv";
pub const HOTELS_FILE: &str = "dim_hotels.csv";
pub const ROOMS_FILE: &str = "dim_rooms.csv";
pub const DATES_FILE: &str = "dim_date.csv";
pub const SUPPLEMENTARY_FILE: &str = "new_data_august.csv";

// ── DatasetPaths ──────────────────────────────────────────────────────────────

/// Resolved locations of the five exports plus the optional extra month.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetPaths {
    pub bookings: PathBuf,
    pub aggregated_bookings: PathBuf,
    pub hotels: PathBuf,
    pub rooms: PathBuf,
    pub dates: PathBuf,
    pub supplementary: Option<PathBuf>,
}

impl DatasetPaths {
    /// Find every export under `data_dir`.
    ///
    /// A missing required file is [`HotelError::MissingDataset`]; the
    /// supplementary file is optional.
    pub fn discover(data_dir: &Path) -> Result<Self> {
        if !data_dir.is_dir() {
            return Err(HotelError::DataPathNotFound(data_dir.to_path_buf()));
        }

        let files = find_csv_files(data_dir);
        let locate = |name: &str| -> Option<PathBuf> {
            files
                .iter()
                .find(|p| p.file_name().map(|f| f == name).unwrap_or(false))
                .cloned()
        };
        let require = |name: &str| -> Result<PathBuf> {
            locate(name).ok_or_else(|| HotelError::MissingDataset(name.to_string()))
        };

        let paths = Self {
            bookings: require(BOOKINGS_FILE)?,
            aggregated_bookings: require(AGGREGATED_BOOKINGS_FILE)?,
            hotels: require(HOTELS_FILE)?,
            rooms: require(ROOMS_FILE)?,
            dates: require(DATES_FILE)?,
            supplementary: locate(SUPPLEMENTARY_FILE),
        };

        if paths.supplementary.is_none() {
            debug!("No {} under {}", SUPPLEMENTARY_FILE, data_dir.display());
        }
        Ok(paths)
    }

    /// Replace the supplementary file with an explicit path.
    pub fn with_supplementary(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.supplementary = path;
        }
        self
    }
}

// ── RawTables ─────────────────────────────────────────────────────────────────

/// Every table as loaded, before any cleaning.
#[derive(Debug, Clone, Default)]
pub struct RawTables {
    pub bookings: Vec<Booking>,
    pub aggregated_bookings: Vec<AggregatedBooking>,
    pub hotels: Vec<Hotel>,
    pub rooms: Vec<Room>,
    pub dates: Vec<DateDim>,
    /// An additional month of already-enriched occupancy rows.
    pub supplementary: Option<Vec<EnrichedOccupancy>>,
}

/// Load all tables named by `paths`.
pub fn load_tables(paths: &DatasetPaths) -> Result<RawTables> {
    let tables = RawTables {
        bookings: read_csv(&paths.bookings)?,
        aggregated_bookings: read_csv(&paths.aggregated_bookings)?,
        hotels: read_csv(&paths.hotels)?,
        rooms: read_csv(&paths.rooms)?,
        dates: read_csv(&paths.dates)?,
        supplementary: match &paths.supplementary {
            Some(path) => Some(read_csv(path)?),
            None => None,
        },
    };

    info!(
        "Loaded {} bookings, {} aggregated rows, {} hotels, {} rooms, {} dates",
        tables.bookings.len(),
        tables.aggregated_bookings.len(),
        tables.hotels.len(),
        tables.rooms.len(),
        tables.dates.len(),
    );
    Ok(tables)
}

/// Find all `.csv` files recursively under `data_dir`, sorted by path.
pub fn find_csv_files(data_dir: &Path) -> Vec<PathBuf> {
    if !data_dir.exists() {
        warn!("Data path does not exist: {}", data_dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Deserialize every row of a headed CSV file into `T`.
///
/// Rows that fail to deserialize are skipped and counted. When the file has
/// rows but none of them deserialize, the schema is wrong and the first row
/// error is returned instead.
pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).map_err(|source| HotelError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut rows: Vec<T> = Vec::new();
    let mut skipped = 0usize;
    let mut first_error: Option<csv::Error> = None;

    for result in reader.deserialize::<T>() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                debug!("Skipping malformed row in {}: {}", path.display(), e);
                skipped += 1;
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    if rows.is_empty() {
        if let Some(source) = first_error {
            return Err(HotelError::Csv {
                path: path.to_path_buf(),
                source,
            });
        }
    }

    if skipped > 0 {
        warn!(
            "{}: {} rows read, {} malformed rows skipped",
            path.display(),
            rows.len(),
            skipped
        );
    } else {
        debug!("{}: {} rows read", path.display(), rows.len());
    }

    Ok(rows)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
