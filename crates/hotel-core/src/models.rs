use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::dates::{
    deserialize_date, deserialize_optional_date, serialize_date, serialize_optional_date,
};

/// Weekday / weekend classification from the date dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DayType {
    Weekday,
    Weekend,
}

impl FromStr for DayType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The source export spells weekday as "weekeday".
        match s.trim().to_lowercase().as_str() {
            "weekday" | "weekeday" => Ok(DayType::Weekday),
            "weekend" => Ok(DayType::Weekend),
            other => Err(format!("Unknown day type: {other}")),
        }
    }
}

impl TryFrom<String> for DayType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DayType> for String {
    fn from(value: DayType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayType::Weekday => write!(f, "weekday"),
            DayType::Weekend => write!(f, "weekend"),
        }
    }
}

/// One row of `fact_bookings.csv`: a single guest booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique booking identifier, e.g. `May012216558RT11`.
    pub booking_id: String,
    pub property_id: u32,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_date",
        serialize_with = "serialize_optional_date"
    )]
    pub booking_date: Option<NaiveDate>,
    #[serde(deserialize_with = "deserialize_date", serialize_with = "serialize_date")]
    pub check_in_date: NaiveDate,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_date",
        serialize_with = "serialize_optional_date"
    )]
    pub checkout_date: Option<NaiveDate>,
    /// Number of guests; the raw export contains non-positive values.
    pub no_guests: i32,
    /// Room category code (`RT1`..`RT4`).
    pub room_category: String,
    pub booking_platform: String,
    /// Guests often skip the rating, so this is frequently empty.
    #[serde(default)]
    pub ratings_given: Option<f64>,
    #[serde(default)]
    pub booking_status: Option<String>,
    pub revenue_generated: f64,
    pub revenue_realized: f64,
}

impl Booking {
    /// Key used when reporting this row.
    pub fn key(&self) -> String {
        self.booking_id.clone()
    }
}

/// One row of `fact_aggregated_bookings.csv`: per property, day and room
/// category totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedBooking {
    pub property_id: u32,
    #[serde(deserialize_with = "deserialize_date", serialize_with = "serialize_date")]
    pub check_in_date: NaiveDate,
    pub room_category: String,
    pub successful_bookings: u32,
    /// Missing in a handful of source rows; imputed during cleaning.
    #[serde(default)]
    pub capacity: Option<f64>,
}

impl AggregatedBooking {
    /// `property/date/category`, e.g. `16558/2022-05-01/RT1`.
    pub fn key(&self) -> String {
        aggregate_key(self.property_id, self.check_in_date, &self.room_category)
    }
}

/// An aggregated booking with a known capacity and its occupancy percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyRecord {
    pub property_id: u32,
    #[serde(deserialize_with = "deserialize_date", serialize_with = "serialize_date")]
    pub check_in_date: NaiveDate,
    pub room_category: String,
    pub successful_bookings: u32,
    pub capacity: f64,
    /// `round(100 * successful_bookings / capacity, 2)`.
    pub occ_pct: f64,
}

impl OccupancyRecord {
    pub fn key(&self) -> String {
        aggregate_key(self.property_id, self.check_in_date, &self.room_category)
    }
}

/// One row of `dim_hotels.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    pub property_id: u32,
    pub property_name: String,
    /// `Luxury` or `Business`.
    pub category: String,
    pub city: String,
}

/// One row of `dim_rooms.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Matches [`AggregatedBooking::room_category`].
    pub room_id: String,
    pub room_class: String,
}

/// One row of `dim_date.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateDim {
    #[serde(deserialize_with = "deserialize_date", serialize_with = "serialize_date")]
    pub date: NaiveDate,
    /// Month label, e.g. `May 22`.
    #[serde(rename = "mmm yy")]
    pub month_label: String,
    /// Week label, e.g. `W 19`.
    #[serde(rename = "week no")]
    pub week_no: String,
    pub day_type: DayType,
}

/// An occupancy record joined with the room, hotel and date dimensions.
///
/// The supplementary monthly file uses exactly this layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedOccupancy {
    pub property_id: u32,
    #[serde(deserialize_with = "deserialize_date", serialize_with = "serialize_date")]
    pub check_in_date: NaiveDate,
    pub room_category: String,
    pub successful_bookings: u32,
    pub capacity: f64,
    pub occ_pct: f64,
    pub room_class: String,
    pub property_name: String,
    pub category: String,
    pub city: String,
    #[serde(deserialize_with = "deserialize_date", serialize_with = "serialize_date")]
    pub date: NaiveDate,
    #[serde(rename = "mmm yy")]
    pub month_label: String,
    #[serde(rename = "week no")]
    pub week_no: String,
    pub day_type: DayType,
}

impl EnrichedOccupancy {
    pub fn key(&self) -> String {
        aggregate_key(self.property_id, self.check_in_date, &self.room_category)
    }
}

/// A cleaned booking joined with the hotel dimension only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelBooking {
    pub booking: Booking,
    pub property_name: String,
    pub category: String,
    pub city: String,
}

/// A cleaned booking joined with the hotel and date dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedBooking {
    pub booking: Booking,
    pub property_name: String,
    pub category: String,
    pub city: String,
    pub month_label: String,
    pub week_no: String,
    pub day_type: DayType,
}

fn aggregate_key(property_id: u32, date: NaiveDate, room_category: &str) -> String {
    format!("{}/{}/{}", property_id, date.format("%Y-%m-%d"), room_category)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_type_parses_both_spellings() {
        assert_eq!("weekday".parse::<DayType>().unwrap(), DayType::Weekday);
        assert_eq!("weekeday".parse::<DayType>().unwrap(), DayType::Weekday);
        assert_eq!(" Weekend ".parse::<DayType>().unwrap(), DayType::Weekend);
        assert!("holiday".parse::<DayType>().is_err());
    }

    #[test]
    fn test_day_type_serde_uses_lowercase_strings() {
        let json = serde_json::to_string(&DayType::Weekend).unwrap();
        assert_eq!(json, "\"weekend\"");
        let back: DayType = serde_json::from_str("\"weekeday\"").unwrap();
        assert_eq!(back, DayType::Weekday);
    }

    #[test]
    fn test_aggregated_booking_key() {
        let row = AggregatedBooking {
            property_id: 16559,
            check_in_date: NaiveDate::from_ymd_opt(2022, 5, 1).unwrap(),
            room_category: "RT1".to_string(),
            successful_bookings: 25,
            capacity: Some(30.0),
        };
        assert_eq!(row.key(), "16559/2022-05-01/RT1");
    }

    #[test]
    fn test_date_dim_deserializes_renamed_columns() {
        let json = r#"{"date":"01-May-22","mmm yy":"May 22","week no":"W 19","day_type":"weekend"}"#;
        let dim: DateDim = serde_json::from_str(json).unwrap();
        assert_eq!(dim.date, NaiveDate::from_ymd_opt(2022, 5, 1).unwrap());
        assert_eq!(dim.month_label, "May 22");
        assert_eq!(dim.week_no, "W 19");
        assert_eq!(dim.day_type, DayType::Weekend);
    }

    #[test]
    fn test_booking_serializes_dates_as_iso() {
        let booking = Booking {
            booking_id: "May012216558RT11".to_string(),
            property_id: 16558,
            booking_date: None,
            check_in_date: NaiveDate::from_ymd_opt(2022, 5, 1).unwrap(),
            checkout_date: Some(NaiveDate::from_ymd_opt(2022, 5, 2).unwrap()),
            no_guests: 2,
            room_category: "RT1".to_string(),
            booking_platform: "direct online".to_string(),
            ratings_given: None,
            booking_status: Some("Checked Out".to_string()),
            revenue_generated: 10010.0,
            revenue_realized: 10010.0,
        };
        let value = serde_json::to_value(&booking).unwrap();
        assert_eq!(value["check_in_date"], "2022-05-01");
        assert_eq!(value["checkout_date"], "2022-05-02");
        assert!(value["booking_date"].is_null());
    }
}
