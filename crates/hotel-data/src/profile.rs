//! Exploratory profile of the raw exports.
//!
//! Nothing here changes data. The profile records what the cleaning rules are
//! about to act on, plus a diagnostic band for `revenue_realized`.

use hotel_core::models::{AggregatedBooking, Booking};
use hotel_core::stats::SigmaBounds;
use serde::Serialize;

use crate::aggregator::{self, GroupStat};
use crate::reader::RawTables;

/// Null counts of the optional booking columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NullCounts {
    pub ratings_given: usize,
    pub booking_date: usize,
    pub checkout_date: usize,
}

/// `mean + k·σ` of `revenue_realized` for one slice of the bookings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealizedThreshold {
    /// `"all"` or a room category.
    pub scope: String,
    pub mean: f64,
    pub std: f64,
    pub threshold: f64,
    /// Rows strictly above `threshold`.
    pub above: usize,
}

/// Everything the exploration step reports.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DataProfile {
    pub booking_rows: usize,
    pub room_categories: Vec<String>,
    pub bookings_per_platform: Vec<GroupStat>,
    pub min_revenue_generated: Option<f64>,
    pub max_revenue_generated: Option<f64>,
    pub non_positive_guest_rows: usize,
    pub null_counts: NullCounts,
    pub hotels_by_category: Vec<GroupStat>,
    pub hotels_by_city: Vec<GroupStat>,
    pub successful_bookings_per_property: Vec<GroupStat>,
    pub over_capacity_rows: Vec<AggregatedBooking>,
    pub max_capacity: Option<f64>,
    pub max_capacity_rows: Vec<AggregatedBooking>,
    pub null_capacity: usize,
    pub realized_thresholds: Vec<RealizedThreshold>,
}

/// Profile `raw`; the revenue-realized band is computed over `cleaned`.
pub fn profile_tables(raw: &RawTables, cleaned: &[Booking], sigma: f64) -> DataProfile {
    let bookings = &raw.bookings;
    let aggregates = &raw.aggregated_bookings;

    let revenue = bookings.iter().map(|b| b.revenue_generated);
    let max_capacity = aggregates
        .iter()
        .filter_map(|r| r.capacity)
        .reduce(f64::max);

    DataProfile {
        booking_rows: bookings.len(),
        room_categories: aggregator::unique(bookings, |b| b.room_category.clone()),
        bookings_per_platform: aggregator::value_counts(bookings, |b| b.booking_platform.clone()),
        min_revenue_generated: revenue.clone().reduce(f64::min),
        max_revenue_generated: revenue.reduce(f64::max),
        non_positive_guest_rows: bookings.iter().filter(|b| b.no_guests <= 0).count(),
        null_counts: NullCounts {
            ratings_given: bookings.iter().filter(|b| b.ratings_given.is_none()).count(),
            booking_date: bookings.iter().filter(|b| b.booking_date.is_none()).count(),
            checkout_date: bookings.iter().filter(|b| b.checkout_date.is_none()).count(),
        },
        hotels_by_category: aggregator::value_counts(&raw.hotels, |h| h.category.clone()),
        hotels_by_city: aggregator::value_counts(&raw.hotels, |h| h.city.clone()),
        successful_bookings_per_property: aggregator::sum_by(
            aggregates,
            |r| r.property_id.to_string(),
            |r| f64::from(r.successful_bookings),
        ),
        over_capacity_rows: aggregates
            .iter()
            .filter(|r| matches!(r.capacity, Some(c) if f64::from(r.successful_bookings) > c))
            .cloned()
            .collect(),
        max_capacity,
        max_capacity_rows: match max_capacity {
            Some(max) => aggregates
                .iter()
                .filter(|r| r.capacity == Some(max))
                .cloned()
                .collect(),
            None => Vec::new(),
        },
        null_capacity: aggregates.iter().filter(|r| r.capacity.is_none()).count(),
        realized_thresholds: realized_thresholds(cleaned, sigma),
    }
}

/// Overall band followed by one band per room category (first-seen order).
pub fn realized_thresholds(bookings: &[Booking], sigma: f64) -> Vec<RealizedThreshold> {
    let mut out = Vec::new();
    if let Some(t) = realized_threshold("all", bookings.iter(), sigma) {
        out.push(t);
    }
    for category in aggregator::unique(bookings, |b| b.room_category.clone()) {
        let slice = bookings.iter().filter(|b| b.room_category == category);
        if let Some(t) = realized_threshold(&category, slice, sigma) {
            out.push(t);
        }
    }
    out
}

fn realized_threshold<'a>(
    scope: &str,
    bookings: impl Iterator<Item = &'a Booking>,
    sigma: f64,
) -> Option<RealizedThreshold> {
    let values: Vec<f64> = bookings.map(|b| b.revenue_realized).collect();
    let bounds = SigmaBounds::from_values(&values, sigma)?;
    let threshold = bounds.upper();
    Some(RealizedThreshold {
        scope: scope.to_string(),
        mean: bounds.mean,
        std: bounds.std,
        threshold,
        above: values.iter().filter(|v| **v > threshold).count(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
