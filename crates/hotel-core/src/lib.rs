//! Shared building blocks for the hotel booking analysis.
//!
//! Holds the error type, the typed table records, date parsing, the small
//! amount of statistics the cleaning rules need, number formatting and the
//! command-line settings.

pub mod dates;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod stats;

pub use error::{HotelError, Result};
