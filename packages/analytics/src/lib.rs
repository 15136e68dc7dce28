#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Score analytics for the EcoPulse map.
//!
//! Every function here is pure: it reads the data it is given and returns
//! a new value. `resolve` turns a year's dataset into the per-city scores
//! for a selection, `rank` and `percentile` order those scores, `compare`
//! measures a forecast against the current score, and `classify` buckets
//! a score into an ecological category.

pub mod classify;
pub mod forecast;
pub mod ranking;
pub mod resolve;

pub use classify::classify;
pub use forecast::{
    DEAD_BAND, ForecastComparison, QuarterComparison, compare, compare_for_month, compare_scores,
};
pub use ranking::{RankedCity, percentile, rank, rank_of, round_percentile};
pub use resolve::{resolve, resolve_dataset};
