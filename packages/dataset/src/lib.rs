#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Score sources and the per-year dataset cache.
//!
//! A [`ScoreSource`] knows how to produce the baseline yearly scores and
//! the detailed dataset for a year. The [`cache::DatasetCache`] sits in
//! front of a source and guarantees that each year is fetched at most
//! once at a time, no matter how many callers ask for it concurrently.

pub mod cache;
pub mod http;
pub mod retry;

use async_trait::async_trait;
use ecopulse_score_models::{Dataset, FORECAST_YEAR, YearlyScores};

pub use cache::{CacheError, DatasetCache};
pub use http::HttpScoreSource;

/// Errors that can occur while fetching score data.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Response status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The source has no data for the requested year.
    #[error("No score data for {year}")]
    NotFound {
        /// The requested year.
        year: i32,
    },

    /// Any other source-specific failure.
    #[error("Source error: {message}")]
    Source {
        /// Description of what went wrong.
        message: String,
    },
}

/// Trait that all score data providers implement.
#[async_trait]
pub trait ScoreSource: Send + Sync {
    /// Returns a human-readable name for log messages.
    fn name(&self) -> &str;

    /// Fetches the detailed dataset for `year`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the data cannot be retrieved.
    async fn fetch_year(&self, year: i32) -> Result<Dataset, FetchError>;

    /// Fetches the baseline annual scores for every year.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the data cannot be retrieved.
    async fn fetch_yearly(&self) -> Result<YearlyScores, FetchError>;

    /// Fetches the forecast dataset, stored under [`FORECAST_YEAR`].
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the data cannot be retrieved.
    async fn fetch_forecast(&self) -> Result<Dataset, FetchError> {
        self.fetch_year(FORECAST_YEAR).await
    }
}
