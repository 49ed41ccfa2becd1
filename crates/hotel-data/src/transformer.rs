//! Occupancy derivation and the dimension join chain.

use std::collections::HashMap;
use std::hash::Hash;

use hotel_core::error::{HotelError, Result};
use hotel_core::models::{
    AggregatedBooking, Booking, DateDim, EnrichedBooking, EnrichedOccupancy, Hotel, HotelBooking,
    OccupancyRecord, Room,
};
use hotel_core::stats::round_to;
use tracing::{debug, info};

use crate::cleaner::Filtered;

pub const ROOMS_TABLE: &str = "dim_rooms";
pub const HOTELS_TABLE: &str = "dim_hotels";
pub const DATES_TABLE: &str = "dim_date";

// ── Occupancy ─────────────────────────────────────────────────────────────────

/// `round(100 * successful / capacity, 2)`.
///
/// A zero capacity is [`HotelError::DivisionByZero`] for the row `key`.
pub fn occupancy_pct(successful_bookings: u32, capacity: f64, key: &str) -> Result<f64> {
    if capacity == 0.0 {
        return Err(HotelError::DivisionByZero {
            key: key.to_string(),
        });
    }
    Ok(round_to(100.0 * f64::from(successful_bookings) / capacity, 2))
}

/// Derive the occupancy percentage for every cleaned aggregated row.
///
/// Fails on the first row with zero or missing capacity; rows are expected to
/// have been through the capacity rule already.
pub fn add_occupancy(rows: &[AggregatedBooking]) -> Result<Vec<OccupancyRecord>> {
    rows.iter()
        .map(|r| {
            let capacity = r
                .capacity
                .ok_or_else(|| HotelError::invalid_row(r.key(), "capacity is missing"))?;
            let occ_pct = occupancy_pct(r.successful_bookings, capacity, &r.key())?;
            Ok(OccupancyRecord {
                property_id: r.property_id,
                check_in_date: r.check_in_date,
                room_category: r.room_category.clone(),
                successful_bookings: r.successful_bookings,
                capacity,
                occ_pct,
            })
        })
        .collect()
}

// ── Joins ─────────────────────────────────────────────────────────────────────

/// Relational inner join of `left` with `right` on `left_key == right_key`.
///
/// Every matching right row produces one output row, in left-table order.
/// Left rows without a match become [`HotelError::UnjoinableRow`] rejections
/// naming `table`.
pub fn inner_join<'l, 'r, L, R, K, O>(
    left: &'l [L],
    right: &'r [R],
    left_key: impl Fn(&L) -> K,
    right_key: impl Fn(&R) -> K,
    table: &str,
    describe: impl Fn(&L) -> String,
    merge: impl Fn(&'l L, &'r R) -> O,
) -> Filtered<O>
where
    K: Eq + Hash,
{
    let mut index: HashMap<K, Vec<&'r R>> = HashMap::new();
    for row in right {
        index.entry(right_key(row)).or_default().push(row);
    }

    let mut out = Filtered {
        rows: Vec::with_capacity(left.len()),
        rejected: Vec::new(),
    };
    for row in left {
        match index.get(&left_key(row)) {
            Some(matches) => out.rows.extend(matches.iter().map(|m| merge(row, m))),
            None => {
                let err = HotelError::unjoinable(describe(row), table);
                debug!("Rejected: {}", err);
                out.rejected.push(err);
            }
        }
    }
    out
}

/// Output of [`enrich_occupancy`].
#[derive(Debug, Default)]
pub struct EnrichedOccupancyTable {
    pub rows: Vec<EnrichedOccupancy>,
    pub room_rejections: Vec<HotelError>,
    pub hotel_rejections: Vec<HotelError>,
    pub date_rejections: Vec<HotelError>,
}

/// Join room class, hotel attributes and date attributes onto `occupancy`.
pub fn enrich_occupancy(
    occupancy: &[OccupancyRecord],
    rooms: &[Room],
    hotels: &[Hotel],
    dates: &[DateDim],
) -> EnrichedOccupancyTable {
    let with_room = inner_join(
        occupancy,
        rooms,
        |o| o.room_category.clone(),
        |r| r.room_id.clone(),
        ROOMS_TABLE,
        |o| o.key(),
        |o, r| (o, r),
    );
    let with_hotel = inner_join(
        &with_room.rows,
        hotels,
        |(o, _)| o.property_id,
        |h| h.property_id,
        HOTELS_TABLE,
        |(o, _)| o.key(),
        |&(o, r), h| (o, r, h),
    );
    let enriched = inner_join(
        &with_hotel.rows,
        dates,
        |(o, _, _)| o.check_in_date,
        |d| d.date,
        DATES_TABLE,
        |(o, _, _)| o.key(),
        |&(o, r, h), d| EnrichedOccupancy {
            property_id: o.property_id,
            check_in_date: o.check_in_date,
            room_category: o.room_category.clone(),
            successful_bookings: o.successful_bookings,
            capacity: o.capacity,
            occ_pct: o.occ_pct,
            room_class: r.room_class.clone(),
            property_name: h.property_name.clone(),
            category: h.category.clone(),
            city: h.city.clone(),
            date: d.date,
            month_label: d.month_label.clone(),
            week_no: d.week_no.clone(),
            day_type: d.day_type,
        },
    );

    info!(
        "Occupancy join: {} in, {} after rooms, {} after hotels, {} after dates",
        occupancy.len(),
        with_room.rows.len(),
        with_hotel.rows.len(),
        enriched.rows.len()
    );

    EnrichedOccupancyTable {
        rows: enriched.rows,
        room_rejections: with_room.rejected,
        hotel_rejections: with_hotel.rejected,
        date_rejections: enriched.rejected,
    }
}

/// Output of [`enrich_bookings`].
#[derive(Debug, Default)]
pub struct EnrichedBookingTable {
    pub rows: Vec<EnrichedBooking>,
    /// Bookings after the hotel join, before the date join.
    pub with_hotels: Vec<HotelBooking>,
    pub hotel_rejections: Vec<HotelError>,
    pub date_rejections: Vec<HotelError>,
}

/// Join hotel attributes onto cleaned bookings.
pub fn join_hotels(bookings: &[Booking], hotels: &[Hotel]) -> Filtered<HotelBooking> {
    inner_join(
        bookings,
        hotels,
        |b| b.property_id,
        |h| h.property_id,
        HOTELS_TABLE,
        |b| b.key(),
        |b, h| HotelBooking {
            booking: b.clone(),
            property_name: h.property_name.clone(),
            category: h.category.clone(),
            city: h.city.clone(),
        },
    )
}

/// Join hotel attributes and date attributes onto cleaned bookings.
pub fn enrich_bookings(
    bookings: &[Booking],
    hotels: &[Hotel],
    dates: &[DateDim],
) -> EnrichedBookingTable {
    let with_hotel = join_hotels(bookings, hotels);
    let enriched = inner_join(
        &with_hotel.rows,
        dates,
        |hb| hb.booking.check_in_date,
        |d| d.date,
        DATES_TABLE,
        |hb| hb.booking.key(),
        |hb, d| EnrichedBooking {
            booking: hb.booking.clone(),
            property_name: hb.property_name.clone(),
            category: hb.category.clone(),
            city: hb.city.clone(),
            month_label: d.month_label.clone(),
            week_no: d.week_no.clone(),
            day_type: d.day_type,
        },
    );

    info!(
        "Booking join: {} in, {} after hotels, {} after dates",
        bookings.len(),
        with_hotel.rows.len(),
        enriched.rows.len()
    );

    EnrichedBookingTable {
        rows: enriched.rows,
        with_hotels: with_hotel.rows,
        hotel_rejections: with_hotel.rejected,
        date_rejections: enriched.rejected,
    }
}

/// Row-wise concatenation: `base` followed by `extra`, values untouched.
pub fn append(base: &[EnrichedOccupancy], extra: &[EnrichedOccupancy]) -> Vec<EnrichedOccupancy> {
    let mut combined = Vec::with_capacity(base.len() + extra.len());
    combined.extend_from_slice(base);
    combined.extend_from_slice(extra);
    combined
}

// ── Tests ─────────────────────────────────────────────────────────────────────
