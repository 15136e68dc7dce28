#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Selection handling for the EcoPulse map.
//!
//! [`Engine`] holds the data every view is computed from (the dataset
//! cache, the baseline scores, the forecast and the city registry) and
//! turns a [`Selection`] into a [`ScoreView`]. [`Session`] adds a single
//! user's selection state on top and publishes a new view after every
//! selection change.

pub mod engine;
pub mod session;
pub mod view;

use ecopulse_dataset::FetchError;
use ecopulse_score_models::DatasetShapeError;
use thiserror::Error;

pub use engine::Engine;
pub use session::{Publication, Session};
pub use view::{CityInsight, INITIAL_YEAR, MapEntry, ScoreView, Selection, compose_view};

/// Errors that can occur while starting or driving a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Startup data could not be fetched.
    #[error("Failed to load startup data: {0}")]
    Fetch(#[from] FetchError),

    /// The forecast source returned something other than a forecast.
    #[error("Invalid forecast dataset: {0}")]
    Shape(#[from] DatasetShapeError),

    /// The city is not on the map.
    #[error("Unknown city: {city}")]
    UnknownCity {
        /// The rejected city name.
        city: String,
    },
}
