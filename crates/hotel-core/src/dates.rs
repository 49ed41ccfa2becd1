//! Calendar-date parsing for the layouts found in the booking exports.
//!
//! The fact and dimension files were exported by different tools, so the same
//! day shows up as `2022-05-01`, `01-May-22`, `1-May-22` or `1/5/2022`.
//! Everything is normalised to [`NaiveDate`].

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serializer};
use tracing::warn;

use crate::error::{HotelError, Result};

/// Day-first layouts with a two-digit year.
const DAY_FIRST_SHORT_YEAR: &[&str] = &["%d-%b-%y", "%d-%m-%y", "%d/%m/%y"];

/// Day-first layouts with a four-digit year. chrono's `%Y` also accepts two
/// digits, so these are only tried when the year field is four wide.
const DAY_FIRST_LONG_YEAR: &[&str] = &["%d-%b-%Y", "%d-%m-%Y", "%d/%m/%Y"];

/// Serialised layout for every date written back out.
pub const ISO_DATE: &str = "%Y-%m-%d";

// ── DateParser ────────────────────────────────────────────────────────────────

/// Parses the date strings found in the CSV exports.
pub struct DateParser;

impl DateParser {
    /// Parse `s` into a [`NaiveDate`].
    ///
    /// Returns [`HotelError::DateParse`] for empty strings or unknown layouts.
    pub fn parse(s: &str) -> Result<NaiveDate> {
        Self::parse_opt(s).ok_or_else(|| HotelError::DateParse(s.to_string()))
    }

    /// Like [`DateParser::parse`] but returns `None` instead of an error.
    pub fn parse_opt(s: &str) -> Option<NaiveDate> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        // ISO dates have a four-digit leading field; checking the shape first
        // keeps `%Y` from swallowing a two-digit day.
        let leading = s.split(['-', '/']).next().unwrap_or("");
        if leading.len() == 4 {
            return NaiveDate::parse_from_str(s, ISO_DATE).ok();
        }

        let trailing = s.rsplit(['-', '/']).next().unwrap_or("");
        let formats = if trailing.len() == 4 {
            DAY_FIRST_LONG_YEAR
        } else {
            DAY_FIRST_SHORT_YEAR
        };
        formats
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    }

    /// Parse a month label such as `"May 22"` into the first day of that month.
    pub fn parse_month_label(label: &str) -> Option<NaiveDate> {
        let label = label.trim();
        NaiveDate::parse_from_str(&format!("1 {label}"), "%d %b %y")
            .or_else(|_| NaiveDate::parse_from_str(&format!("1 {label}"), "%d %b %Y"))
            .ok()
    }
}

// ── Serde helpers ─────────────────────────────────────────────────────────────

/// Deserialize a required date column using [`DateParser`].
pub fn deserialize_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    DateParser::parse(&raw).map_err(serde::de::Error::custom)
}

/// Deserialize an optional date column; empty or unparsable cells become `None`.
pub fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        let parsed = DateParser::parse_opt(&s);
        if parsed.is_none() && !s.trim().is_empty() {
            warn!("Ignoring unparsable date \"{}\"", s);
        }
        parsed
    }))
}

/// Serialize a date as `YYYY-MM-DD`.
pub fn serialize_date<S>(date: &NaiveDate, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&date.format(ISO_DATE).to_string())
}

/// Serialize an optional date as `YYYY-MM-DD` or null.
pub fn serialize_optional_date<S>(
    date: &Option<NaiveDate>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match date {
        Some(d) => serializer.serialize_str(&d.format(ISO_DATE).to_string()),
        None => serializer.serialize_none(),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
