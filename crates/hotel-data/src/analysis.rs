//! The cleaning and enrichment pipeline.
//!
//! Runs the stages in their fixed order over the loaded tables and returns
//! every intermediate table a report needs, together with per-stage counts.

use std::time::Instant;

use chrono::Utc;
use hotel_core::error::{HotelError, Result};
use hotel_core::models::{
    AggregatedBooking, Booking, EnrichedBooking, EnrichedOccupancy, HotelBooking, OccupancyRecord,
};
use hotel_core::settings::ZeroCapacityPolicy;
use hotel_core::stats::SigmaBounds;
use serde::Serialize;
use tracing::info;

use crate::cleaner::Cleaner;
use crate::profile::{profile_tables, DataProfile};
use crate::reader::{load_tables, DatasetPaths, RawTables};
use crate::transformer::{add_occupancy, append, enrich_bookings, enrich_occupancy};

// ── Public types ──────────────────────────────────────────────────────────────

/// Knobs of the cleaning stage.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Standard deviations used by the revenue rule and the realized diagnostic.
    pub sigma: f64,
    pub zero_capacity: ZeroCapacityPolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            sigma: 3.0,
            zero_capacity: ZeroCapacityPolicy::Drop,
        }
    }
}

/// Row counts after each stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StageCounts {
    pub raw_bookings: usize,
    pub after_guest_rule: usize,
    pub after_revenue_rule: usize,
    pub raw_aggregates: usize,
    pub imputed_capacity: usize,
    pub after_capacity_rule: usize,
    pub occupancy: usize,
    pub enriched_occupancy: usize,
    pub supplementary: usize,
    pub combined_occupancy: usize,
    pub hotel_bookings: usize,
    pub enriched_bookings: usize,
}

/// Metadata produced alongside the pipeline output.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineMetadata {
    /// RFC 3339 timestamp of the run.
    pub generated_at: String,
    pub counts: StageCounts,
    /// Band used by the revenue rule, `None` when the rule was skipped.
    pub revenue_bounds: Option<SigmaBounds>,
    /// Median used to fill missing capacities.
    pub capacity_median: Option<f64>,
    /// Wall-clock seconds spent reading the CSV files (zero when the tables
    /// were handed in already loaded).
    pub load_time_seconds: f64,
    pub transform_time_seconds: f64,
}

/// Rows dropped by each stage.
#[derive(Debug, Default)]
pub struct Rejections {
    pub guest_count: Vec<HotelError>,
    pub revenue: Vec<HotelError>,
    pub capacity: Vec<HotelError>,
    pub occupancy_join: Vec<HotelError>,
    pub booking_join: Vec<HotelError>,
}

impl Rejections {
    pub fn total(&self) -> usize {
        self.guest_count.len()
            + self.revenue.len()
            + self.capacity.len()
            + self.occupancy_join.len()
            + self.booking_join.len()
    }
}

/// Every table produced by [`run_pipeline`].
#[derive(Debug)]
pub struct PipelineOutput {
    pub bookings: Vec<Booking>,
    pub aggregates: Vec<AggregatedBooking>,
    pub occupancy: Vec<OccupancyRecord>,
    pub enriched_occupancy: Vec<EnrichedOccupancy>,
    /// `enriched_occupancy` followed by the supplementary rows, if any.
    pub combined_occupancy: Vec<EnrichedOccupancy>,
    /// Cleaned bookings joined with hotels only.
    pub hotel_bookings: Vec<HotelBooking>,
    pub enriched_bookings: Vec<EnrichedBooking>,
    pub profile: DataProfile,
    pub rejections: Rejections,
    pub metadata: PipelineMetadata,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run every stage over already-loaded tables.
///
/// 1. Clean bookings (guest rule, then revenue rule).
/// 2. Impute and filter capacity.
/// 3. Derive occupancy percentages.
/// 4. Join the dimensions onto occupancy and bookings.
/// 5. Append the supplementary month.
///
/// Row-level problems become rejections; a zero capacity that survives to
/// step 3 (policy `error`) fails the run with [`HotelError::DivisionByZero`].
pub fn run_pipeline(tables: &RawTables, options: &PipelineOptions) -> Result<PipelineOutput> {
    let start = Instant::now();
    let cleaner = Cleaner::new(options.sigma, options.zero_capacity);

    // ── Clean ─────────────────────────────────────────────────────────────────
    let bookings = cleaner.clean_bookings(&tables.bookings);
    let aggregates = cleaner.clean_aggregates(&tables.aggregated_bookings)?;
    let profile = profile_tables(tables, &bookings.rows, options.sigma);

    // ── Transform ─────────────────────────────────────────────────────────────
    let occupancy = add_occupancy(&aggregates.rows)?;
    let enriched = enrich_occupancy(&occupancy, &tables.rooms, &tables.hotels, &tables.dates);
    let enriched_bookings = enrich_bookings(&bookings.rows, &tables.hotels, &tables.dates);

    let supplementary = tables.supplementary.as_deref().unwrap_or_default();
    let combined = append(&enriched.rows, supplementary);

    let counts = StageCounts {
        raw_bookings: tables.bookings.len(),
        after_guest_rule: tables.bookings.len() - bookings.guest_rejections.len(),
        after_revenue_rule: bookings.rows.len(),
        raw_aggregates: tables.aggregated_bookings.len(),
        imputed_capacity: aggregates.imputed,
        after_capacity_rule: aggregates.rows.len(),
        occupancy: occupancy.len(),
        enriched_occupancy: enriched.rows.len(),
        supplementary: supplementary.len(),
        combined_occupancy: combined.len(),
        hotel_bookings: enriched_bookings.with_hotels.len(),
        enriched_bookings: enriched_bookings.rows.len(),
    };

    let mut occupancy_join = enriched.room_rejections;
    occupancy_join.extend(enriched.hotel_rejections);
    occupancy_join.extend(enriched.date_rejections);
    let mut booking_join = enriched_bookings.hotel_rejections;
    booking_join.extend(enriched_bookings.date_rejections);

    let rejections = Rejections {
        guest_count: bookings.guest_rejections,
        revenue: bookings.revenue_rejections,
        capacity: aggregates.capacity_rejections,
        occupancy_join,
        booking_join,
    };

    info!(
        "Pipeline finished: {} combined occupancy rows, {} enriched bookings, {} rejections",
        counts.combined_occupancy,
        counts.enriched_bookings,
        rejections.total()
    );

    let metadata = PipelineMetadata {
        generated_at: Utc::now().to_rfc3339(),
        counts,
        revenue_bounds: bookings.revenue_bounds,
        capacity_median: aggregates.capacity_median,
        load_time_seconds: 0.0,
        transform_time_seconds: start.elapsed().as_secs_f64(),
    };

    Ok(PipelineOutput {
        bookings: bookings.rows,
        aggregates: aggregates.rows,
        occupancy,
        enriched_occupancy: enriched.rows,
        combined_occupancy: combined,
        hotel_bookings: enriched_bookings.with_hotels,
        enriched_bookings: enriched_bookings.rows,
        profile,
        rejections,
        metadata,
    })
}

/// Load the tables named by `paths` and run the pipeline over them.
pub fn analyze_dataset(paths: &DatasetPaths, options: &PipelineOptions) -> Result<PipelineOutput> {
    let load_start = Instant::now();
    let tables = load_tables(paths)?;
    let load_time = load_start.elapsed().as_secs_f64();

    let mut output = run_pipeline(&tables, options)?;
    output.metadata.load_time_seconds = load_time;
    Ok(output)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
