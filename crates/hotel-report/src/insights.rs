//! The business questions answered over the cleaned and enriched tables.

use std::cmp::Ordering;

use hotel_core::dates::DateParser;
use hotel_core::models::{EnrichedBooking, EnrichedOccupancy, HotelBooking, OccupancyRecord};
use hotel_data::aggregator::{self, GroupStat};
use hotel_data::analysis::{PipelineMetadata, PipelineOutput, Rejections};
use hotel_data::profile::DataProfile;
use serde::Serialize;
use tracing::{debug, warn};

// ── Report types ──────────────────────────────────────────────────────────────

/// Row counts around the supplementary append.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AppendCounts {
    pub before: usize,
    pub supplementary: usize,
    pub after: usize,
}

/// Number of rows each stage dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RejectionCounts {
    pub guest_count: usize,
    pub revenue: usize,
    pub capacity: usize,
    pub occupancy_join: usize,
    pub booking_join: usize,
}

impl From<&Rejections> for RejectionCounts {
    fn from(r: &Rejections) -> Self {
        Self {
            guest_count: r.guest_count.len(),
            revenue: r.revenue.len(),
            capacity: r.capacity.len(),
            occupancy_join: r.occupancy_join.len(),
            booking_join: r.booking_join.len(),
        }
    }
}

/// Everything printed by the command line tool.
#[derive(Debug, Clone, Serialize)]
pub struct InsightReport {
    pub metadata: PipelineMetadata,
    pub rejections: RejectionCounts,
    pub profile: DataProfile,
    pub occupancy_by_room_category: Vec<GroupStat>,
    pub occupancy_by_room_class: Vec<GroupStat>,
    pub occupancy_by_city: Vec<GroupStat>,
    pub occupancy_by_day_type: Vec<GroupStat>,
    /// Month label the next field is restricted to.
    pub month: String,
    pub occupancy_by_city_for_month: Vec<GroupStat>,
    pub append_counts: AppendCounts,
    pub revenue_by_city: Vec<GroupStat>,
    pub revenue_by_month: Vec<GroupStat>,
    pub revenue_by_property: Vec<GroupStat>,
    pub rating_by_city: Vec<GroupStat>,
    pub revenue_by_platform: Vec<GroupStat>,
}

// ── Occupancy insights ────────────────────────────────────────────────────────

/// Mean occupancy per room category, before any dimension join.
pub fn occupancy_by_room_category(rows: &[OccupancyRecord]) -> Vec<GroupStat> {
    aggregator::mean_by(rows, |r| r.room_category.clone(), |r| r.occ_pct)
}

pub fn occupancy_by_room_class(rows: &[EnrichedOccupancy]) -> Vec<GroupStat> {
    aggregator::mean_by(rows, |r| r.room_class.clone(), |r| r.occ_pct)
}

pub fn occupancy_by_city(rows: &[EnrichedOccupancy]) -> Vec<GroupStat> {
    aggregator::mean_by(rows, |r| r.city.clone(), |r| r.occ_pct)
}

pub fn occupancy_by_day_type(rows: &[EnrichedOccupancy]) -> Vec<GroupStat> {
    aggregator::mean_by(rows, |r| r.day_type.to_string(), |r| r.occ_pct)
}

/// Mean occupancy per city within one month label, highest first.
///
/// An unknown month yields an empty result.
pub fn occupancy_by_city_for_month(rows: &[EnrichedOccupancy], month: &str) -> Vec<GroupStat> {
    let in_month: Vec<&EnrichedOccupancy> =
        rows.iter().filter(|r| r.month_label == month).collect();
    if in_month.is_empty() {
        let known = aggregator::unique(rows, |r| r.month_label.clone());
        warn!("No occupancy rows for {:?}; months present: {:?}", month, known);
    }
    let mut stats = aggregator::mean_by(&in_month, |r| r.city.clone(), |r| r.occ_pct);
    aggregator::sort_by_value_desc(&mut stats);
    stats
}

// ── Revenue insights ──────────────────────────────────────────────────────────

/// Realized revenue per city over bookings joined to hotels only, so a
/// check-in date missing from the date dimension still counts.
pub fn revenue_by_city(rows: &[HotelBooking]) -> Vec<GroupStat> {
    aggregator::sum_by(rows, |r| r.city.clone(), |r| r.booking.revenue_realized)
}

/// Realized revenue per month label in calendar order.
///
/// Labels that are not `mmm yy` sort after the dated ones, by name.
pub fn revenue_by_month(rows: &[EnrichedBooking]) -> Vec<GroupStat> {
    let mut stats =
        aggregator::sum_by(rows, |r| r.month_label.clone(), |r| r.booking.revenue_realized);
    stats.sort_by(|a, b| {
        let da = DateParser::parse_month_label(&a.key);
        let db = DateParser::parse_month_label(&b.key);
        match (da, db) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.key.cmp(&b.key),
        }
    });
    stats
}

/// Realized revenue per property name, smallest first.
pub fn revenue_by_property(rows: &[EnrichedBooking]) -> Vec<GroupStat> {
    let mut stats = aggregator::sum_by(
        rows,
        |r| r.property_name.clone(),
        |r| r.booking.revenue_realized,
    );
    aggregator::sort_by_value_asc(&mut stats);
    stats
}

/// Mean rating per city; unrated bookings are ignored.
pub fn rating_by_city(rows: &[EnrichedBooking]) -> Vec<GroupStat> {
    aggregator::mean_by_optional(rows, |r| r.city.clone(), |r| r.booking.ratings_given)
}

pub fn revenue_by_platform(rows: &[EnrichedBooking]) -> Vec<GroupStat> {
    aggregator::sum_by(
        rows,
        |r| r.booking.booking_platform.clone(),
        |r| r.booking.revenue_realized,
    )
}

// ── Report ────────────────────────────────────────────────────────────────────

/// Answer every question over `output`.
///
/// Occupancy insights use the joined table before the supplementary rows are
/// appended; revenue and rating insights use the enriched bookings.
pub fn build_report(output: &PipelineOutput, month: &str) -> InsightReport {
    let enriched = &output.enriched_occupancy;
    let bookings = &output.enriched_bookings;

    debug!(
        "Building report over {} occupancy rows and {} bookings",
        enriched.len(),
        bookings.len()
    );

    InsightReport {
        metadata: output.metadata.clone(),
        rejections: RejectionCounts::from(&output.rejections),
        profile: output.profile.clone(),
        occupancy_by_room_category: occupancy_by_room_category(&output.occupancy),
        occupancy_by_room_class: occupancy_by_room_class(enriched),
        occupancy_by_city: occupancy_by_city(enriched),
        occupancy_by_day_type: occupancy_by_day_type(enriched),
        month: month.to_string(),
        occupancy_by_city_for_month: occupancy_by_city_for_month(enriched, month),
        append_counts: AppendCounts {
            before: enriched.len(),
            supplementary: output.combined_occupancy.len() - enriched.len(),
            after: output.combined_occupancy.len(),
        },
        revenue_by_city: revenue_by_city(&output.hotel_bookings),
        revenue_by_month: revenue_by_month(bookings),
        revenue_by_property: revenue_by_property(bookings),
        rating_by_city: rating_by_city(bookings),
        revenue_by_platform: revenue_by_platform(bookings),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use hotel_core::models::{AggregatedBooking, Booking, DateDim, DayType, Hotel, Room};
    use hotel_data::analysis::{run_pipeline, PipelineOptions};
    use hotel_data::reader::RawTables;

    fn ymd(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, m, d).unwrap()
    }

    fn make_occ(city: &str, month: &str, day_type: DayType, occ_pct: f64) -> EnrichedOccupancy {
        EnrichedOccupancy {
            property_id: 16558,
            check_in_date: ymd(6, 1),
            room_category: "RT1".to_string(),
            successful_bookings: 10,
            capacity: 20.0,
            occ_pct,
            room_class: "Standard".to_string(),
            property_name: "Atliq Grands".to_string(),
            category: "Luxury".to_string(),
            city: city.to_string(),
            date: ymd(6, 1),
            month_label: month.to_string(),
            week_no: "W 23".to_string(),
            day_type,
        }
    }

    fn make_enriched_booking(
        city: &str,
        property: &str,
        month: &str,
        revenue: f64,
        rating: Option<f64>,
    ) -> EnrichedBooking {
        EnrichedBooking {
            booking: Booking {
                booking_id: format!("{property}{month}{revenue}"),
                property_id: 16558,
                booking_date: None,
                check_in_date: ymd(5, 1),
                checkout_date: None,
                no_guests: 2,
                room_category: "RT1".to_string(),
                booking_platform: if rating.is_some() { "logtrip" } else { "others" }.to_string(),
                ratings_given: rating,
                booking_status: None,
                revenue_generated: revenue,
                revenue_realized: revenue,
            },
            property_name: property.to_string(),
            category: "Luxury".to_string(),
            city: city.to_string(),
            month_label: month.to_string(),
            week_no: "W 19".to_string(),
            day_type: DayType::Weekday,
        }
    }

    fn to_hotel_booking(e: EnrichedBooking) -> HotelBooking {
        HotelBooking {
            booking: e.booking,
            property_name: e.property_name,
            category: e.category,
            city: e.city,
        }
    }

    fn sample_bookings() -> Vec<EnrichedBooking> {
        vec![
            make_enriched_booking("Delhi", "Atliq Grands", "Jul 22", 100.0, Some(4.0)),
            make_enriched_booking("Delhi", "Atliq Grands", "May 22", 200.0, None),
            make_enriched_booking("Mumbai", "Atliq Exotica", "Jun 22", 50.0, Some(2.0)),
            make_enriched_booking("Mumbai", "Atliq Exotica", "May 22", 25.0, Some(5.0)),
        ]
    }

    fn keys(stats: &[GroupStat]) -> Vec<&str> {
        stats.iter().map(|s| s.key.as_str()).collect()
    }

    // ── occupancy ────────────────────────────────────────────────────────────

    #[test]
    fn test_occupancy_by_day_type() {
        let rows = vec![
            make_occ("Delhi", "Jun 22", DayType::Weekday, 50.0),
            make_occ("Delhi", "Jun 22", DayType::Weekend, 70.0),
            make_occ("Delhi", "Jun 22", DayType::Weekday, 55.0),
        ];
        let stats = occupancy_by_day_type(&rows);
        assert_eq!(keys(&stats), vec!["weekday", "weekend"]);
        assert_eq!(stats[0].value, 52.5);
    }

    #[test]
    fn test_occupancy_by_city_for_month_sorted_desc() {
        let rows = vec![
            make_occ("Delhi", "Jun 22", DayType::Weekday, 50.0),
            make_occ("Mumbai", "Jun 22", DayType::Weekday, 60.0),
            make_occ("Delhi", "May 22", DayType::Weekday, 99.0),
            make_occ("Hyderabad", "Jun 22", DayType::Weekday, 55.0),
        ];
        let stats = occupancy_by_city_for_month(&rows, "Jun 22");
        assert_eq!(keys(&stats), vec!["Mumbai", "Hyderabad", "Delhi"]);
        assert_eq!(stats[2].value, 50.0);
    }

    #[test]
    fn test_occupancy_for_unknown_month_is_empty() {
        let rows = vec![make_occ("Delhi", "Jun 22", DayType::Weekday, 50.0)];
        assert!(occupancy_by_city_for_month(&rows, "Dec 99").is_empty());
    }

    // ── revenue ──────────────────────────────────────────────────────────────

    #[test]
    fn test_revenue_by_city() {
        let rows: Vec<HotelBooking> = sample_bookings().into_iter().map(to_hotel_booking).collect();
        let stats = revenue_by_city(&rows);
        assert_eq!(keys(&stats), vec!["Delhi", "Mumbai"]);
        assert_eq!(stats[0].value, 300.0);
        assert_eq!(stats[1].value, 75.0);
    }

    #[test]
    fn test_revenue_by_month_calendar_order() {
        let stats = revenue_by_month(&sample_bookings());
        assert_eq!(keys(&stats), vec!["May 22", "Jun 22", "Jul 22"]);
        assert_eq!(stats[0].value, 225.0);
    }

    #[test]
    fn test_revenue_by_property_ascending() {
        let stats = revenue_by_property(&sample_bookings());
        assert_eq!(keys(&stats), vec!["Atliq Exotica", "Atliq Grands"]);
    }

    #[test]
    fn test_rating_by_city_ignores_unrated() {
        let stats = rating_by_city(&sample_bookings());
        assert_eq!(stats[0].key, "Delhi");
        assert_eq!(stats[0].value, 4.0);
        assert_eq!(stats[0].count, 1);
        assert_eq!(stats[1].value, 3.5);
    }

    #[test]
    fn test_revenue_by_platform() {
        let stats = revenue_by_platform(&sample_bookings());
        assert_eq!(keys(&stats), vec!["logtrip", "others"]);
        assert_eq!(stats[0].value, 175.0);
    }

    // ── build_report ─────────────────────────────────────────────────────────

    fn make_tables() -> RawTables {
        let booking = Booking {
            booking_id: "Jun012216558RT11".to_string(),
            property_id: 16558,
            booking_date: None,
            check_in_date: ymd(6, 1),
            checkout_date: None,
            no_guests: 2,
            room_category: "RT1".to_string(),
            booking_platform: "logtrip".to_string(),
            ratings_given: Some(4.0),
            booking_status: None,
            revenue_generated: 9100.0,
            revenue_realized: 9100.0,
        };
        RawTables {
            bookings: vec![booking],
            aggregated_bookings: vec![AggregatedBooking {
                property_id: 16558,
                check_in_date: ymd(6, 1),
                room_category: "RT1".to_string(),
                successful_bookings: 40,
                capacity: Some(50.0),
            }],
            hotels: vec![Hotel {
                property_id: 16558,
                property_name: "Atliq Grands".to_string(),
                category: "Luxury".to_string(),
                city: "Delhi".to_string(),
            }],
            rooms: vec![Room {
                room_id: "RT1".to_string(),
                room_class: "Standard".to_string(),
            }],
            dates: vec![DateDim {
                date: ymd(6, 1),
                month_label: "Jun 22".to_string(),
                week_no: "W 23".to_string(),
                day_type: DayType::Weekday,
            }],
            supplementary: Some(vec![make_occ("Delhi", "Aug 22", DayType::Weekend, 90.0)]),
        }
    }

    #[test]
    fn test_build_report_from_pipeline() {
        let output = run_pipeline(&make_tables(), &PipelineOptions::default()).unwrap();
        let report = build_report(&output, "Jun 22");

        assert_eq!(report.occupancy_by_room_category[0].value, 80.0);
        assert_eq!(report.occupancy_by_room_class[0].key, "Standard");
        assert_eq!(report.occupancy_by_city_for_month.len(), 1);
        assert_eq!(
            report.append_counts,
            AppendCounts {
                before: 1,
                supplementary: 1,
                after: 2
            }
        );
        // Supplementary rows do not feed the occupancy insights.
        assert_eq!(report.occupancy_by_city[0].value, 80.0);
        assert_eq!(report.revenue_by_city[0].value, 9100.0);
        assert_eq!(report.rejections, RejectionCounts::default());
    }

    #[test]
    fn test_city_revenue_counts_bookings_outside_date_dimension() {
        let mut tables = make_tables();
        let mut late = tables.bookings[0].clone();
        late.booking_id = "Jun022216558RT11".to_string();
        late.check_in_date = ymd(6, 2);
        late.revenue_generated = 900.0;
        late.revenue_realized = 900.0;
        tables.bookings.push(late);

        let output = run_pipeline(&tables, &PipelineOptions::default()).unwrap();
        let report = build_report(&output, "Jun 22");

        assert_eq!(report.revenue_by_city[0].value, 10000.0);
        assert_eq!(report.revenue_by_month[0].value, 9100.0);
        assert_eq!(report.rejections.booking_join, 1);
    }
}
