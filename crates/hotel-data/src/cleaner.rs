//! Cleaning rules for the booking fact tables.
//!
//! Every rule is a pure function: it takes a table by reference and returns a
//! new table together with the rows it rejected. Row rejections are
//! [`HotelError::InvalidRow`] values so they can be counted and reported.

use hotel_core::error::{HotelError, Result};
use hotel_core::models::{AggregatedBooking, Booking};
use hotel_core::settings::ZeroCapacityPolicy;
use hotel_core::stats::{self, SigmaBounds};
use tracing::{debug, info};

// ── Filtered ──────────────────────────────────────────────────────────────────

/// Output of a filtering stage: surviving rows plus one rejection per
/// dropped row.
#[derive(Debug, Default)]
pub struct Filtered<T> {
    pub rows: Vec<T>,
    pub rejected: Vec<HotelError>,
}

impl<T: Clone> Filtered<T> {
    /// Split `input` into kept rows and rejections using `rule`.
    ///
    /// `rule` returns `Err` with the rejection for rows that must go.
    pub fn partition(
        input: &[T],
        rule: impl Fn(&T) -> std::result::Result<(), HotelError>,
    ) -> Self {
        let mut out = Filtered {
            rows: Vec::new(),
            rejected: Vec::new(),
        };
        for row in input {
            match rule(row) {
                Ok(()) => out.rows.push(row.clone()),
                Err(reason) => {
                    debug!("Rejected: {}", reason);
                    out.rejected.push(reason);
                }
            }
        }
        out
    }
}

impl<T> Filtered<T> {
    /// Number of rows dropped by the stage.
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }
}

// ── Booking rules ─────────────────────────────────────────────────────────────

/// Drop bookings whose guest count is zero or negative.
pub fn filter_guest_count(bookings: &[Booking]) -> Filtered<Booking> {
    Filtered::partition(bookings, |b: &Booking| {
        if b.no_guests > 0 {
            Ok(())
        } else {
            Err(HotelError::invalid_row(
                b.key(),
                format!("no_guests {} is not positive", b.no_guests),
            ))
        }
    })
}

/// Mean ± k·σ band of `revenue_generated`; `None` with fewer than two rows.
pub fn revenue_bounds(bookings: &[Booking], k: f64) -> Option<SigmaBounds> {
    let values: Vec<f64> = bookings.iter().map(|b| b.revenue_generated).collect();
    SigmaBounds::from_values(&values, k)
}

/// Drop bookings whose `revenue_generated` reaches `mean + k·σ`.
///
/// Only the upper bound is enforced; revenue cannot be negative so the lower
/// bound is returned for reporting but never applied. When σ is undefined the
/// table is returned unchanged.
pub fn filter_revenue_outliers(
    bookings: &[Booking],
    k: f64,
) -> (Filtered<Booking>, Option<SigmaBounds>) {
    let Some(bounds) = revenue_bounds(bookings, k) else {
        debug!("Fewer than two bookings; revenue filter skipped");
        return (
            Filtered {
                rows: bookings.to_vec(),
                rejected: Vec::new(),
            },
            None,
        );
    };

    let threshold = bounds.upper();
    let filtered = Filtered::partition(bookings, |b: &Booking| {
        if b.revenue_generated < threshold {
            Ok(())
        } else {
            Err(HotelError::invalid_row(
                b.key(),
                format!(
                    "revenue_generated {} is at or above {:.2}",
                    b.revenue_generated, threshold
                ),
            ))
        }
    });
    (filtered, Some(bounds))
}

// ── Aggregated booking rules ──────────────────────────────────────────────────

/// Result of [`impute_capacity`].
#[derive(Debug, Clone)]
pub struct CapacityImputation {
    pub rows: Vec<AggregatedBooking>,
    /// Median of the non-null capacities, `None` for an empty table.
    pub median: Option<f64>,
    /// Number of rows whose capacity was filled in.
    pub imputed: usize,
}

/// Median of the non-null `capacity` values.
pub fn capacity_median(rows: &[AggregatedBooking]) -> Option<f64> {
    let values: Vec<f64> = rows.iter().filter_map(|r| r.capacity).collect();
    stats::median(&values)
}

/// Replace every missing capacity with the median of the present ones.
///
/// The median is taken once over the whole column before anything is
/// dropped. A table without gaps comes back unchanged. A column that has gaps
/// but no values at all is [`HotelError::EmptyColumn`].
pub fn impute_capacity(rows: &[AggregatedBooking]) -> Result<CapacityImputation> {
    let median = capacity_median(rows);
    let missing = rows.iter().filter(|r| r.capacity.is_none()).count();

    if missing == 0 {
        return Ok(CapacityImputation {
            rows: rows.to_vec(),
            median,
            imputed: 0,
        });
    }

    let fill = median.ok_or_else(|| HotelError::EmptyColumn("capacity".to_string()))?;
    let imputed_rows = rows
        .iter()
        .map(|r| AggregatedBooking {
            capacity: Some(r.capacity.unwrap_or(fill)),
            ..r.clone()
        })
        .collect();

    debug!("Imputed capacity {} into {} rows", fill, missing);
    Ok(CapacityImputation {
        rows: imputed_rows,
        median,
        imputed: missing,
    })
}

/// Drop rows that cannot be a valid measurement: missing capacity,
/// more successful bookings than capacity, and (under
/// [`ZeroCapacityPolicy::Drop`]) non-positive capacity.
pub fn filter_capacity(
    rows: &[AggregatedBooking],
    policy: ZeroCapacityPolicy,
) -> Filtered<AggregatedBooking> {
    Filtered::partition(rows, |r: &AggregatedBooking| {
        let Some(capacity) = r.capacity else {
            return Err(HotelError::invalid_row(r.key(), "capacity is missing"));
        };
        if f64::from(r.successful_bookings) > capacity {
            return Err(HotelError::invalid_row(
                r.key(),
                format!(
                    "successful_bookings {} exceeds capacity {}",
                    r.successful_bookings, capacity
                ),
            ));
        }
        if policy == ZeroCapacityPolicy::Drop && capacity <= 0.0 {
            return Err(HotelError::invalid_row(
                r.key(),
                format!("capacity {} is not positive", capacity),
            ));
        }
        Ok(())
    })
}

// ── Cleaner ───────────────────────────────────────────────────────────────────

/// Bookings after both booking rules.
#[derive(Debug, Default)]
pub struct CleanedBookings {
    pub rows: Vec<Booking>,
    pub guest_rejections: Vec<HotelError>,
    pub revenue_rejections: Vec<HotelError>,
    /// Band used by the revenue rule, `None` when it was skipped.
    pub revenue_bounds: Option<SigmaBounds>,
}

/// Aggregated bookings after imputation and the capacity rule.
#[derive(Debug, Default)]
pub struct CleanedAggregates {
    pub rows: Vec<AggregatedBooking>,
    pub capacity_median: Option<f64>,
    pub imputed: usize,
    pub capacity_rejections: Vec<HotelError>,
}

/// Applies the cleaning rules in their fixed order.
#[derive(Debug, Clone, Copy)]
pub struct Cleaner {
    /// Standard deviations used by the revenue rule.
    pub sigma: f64,
    pub zero_capacity: ZeroCapacityPolicy,
}

impl Default for Cleaner {
    fn default() -> Self {
        Self {
            sigma: 3.0,
            zero_capacity: ZeroCapacityPolicy::Drop,
        }
    }
}

impl Cleaner {
    pub fn new(sigma: f64, zero_capacity: ZeroCapacityPolicy) -> Self {
        Self {
            sigma,
            zero_capacity,
        }
    }

    /// Guest-count rule, then the revenue rule over the survivors.
    pub fn clean_bookings(&self, bookings: &[Booking]) -> CleanedBookings {
        let guests = filter_guest_count(bookings);
        let (revenue, bounds) = filter_revenue_outliers(&guests.rows, self.sigma);

        info!(
            "Bookings: {} in, {} after guest rule, {} after revenue rule",
            bookings.len(),
            guests.rows.len(),
            revenue.rows.len()
        );

        CleanedBookings {
            rows: revenue.rows,
            guest_rejections: guests.rejected,
            revenue_rejections: revenue.rejected,
            revenue_bounds: bounds,
        }
    }

    /// Capacity imputation, then the capacity rule.
    pub fn clean_aggregates(&self, rows: &[AggregatedBooking]) -> Result<CleanedAggregates> {
        let imputation = impute_capacity(rows)?;
        let filtered = filter_capacity(&imputation.rows, self.zero_capacity);

        info!(
            "Aggregated bookings: {} in, {} imputed, {} after capacity rule",
            rows.len(),
            imputation.imputed,
            filtered.rows.len()
        );

        Ok(CleanedAggregates {
            rows: filtered.rows,
            capacity_median: imputation.median,
            imputed: imputation.imputed,
            capacity_rejections: filtered.rejected,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
