#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Score ingest for the EcoPulse backend.
//!
//! Reads the three published CSV files (monthly scores, the quarterly
//! forecast, and daily observations) into a [`ScoreStore`], which answers
//! the aggregate queries the HTTP API serves and can also be used directly
//! as a score source.

pub mod paths;
pub mod records;
pub mod store;

use chrono::NaiveDate;
use thiserror::Error;

pub use records::{DailyObservation, ForecastRecord, MonthlyRecord};
pub use store::ScoreStore;

/// Errors that can occur while loading or querying score data.
#[derive(Debug, Error)]
pub enum IngestError {
    /// File could not be opened or read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is missing from the header row.
    #[error("Missing column '{column}'")]
    MissingColumn {
        /// The lower-cased column name.
        column: &'static str,
    },

    /// A row could not be converted into a record.
    #[error("Invalid row: {message}")]
    InvalidRow {
        /// Description of what went wrong.
        message: String,
    },

    /// The city has no data of any kind.
    #[error("City not found: {city}")]
    CityNotFound {
        /// The requested city.
        city: String,
    },

    /// The city is known but has no daily observation for the date.
    #[error("No data for {city} on {date}")]
    NoData {
        /// The requested city.
        city: String,
        /// The requested date.
        date: NaiveDate,
    },
}
