//! Data layer for the hotel booking analysis.
//!
//! Locates and reads the CSV exports, applies the cleaning rules, derives
//! occupancy, joins the dimension tables, profiles the raw data and runs the
//! whole chain as one pipeline.

pub mod aggregator;
pub mod analysis;
pub mod cleaner;
pub mod profile;
pub mod reader;
pub mod transformer;

pub use hotel_core as core;
