#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the EcoPulse server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the score model types so the wire contract can evolve
//! independently: monthly scores travel as objects keyed by month number
//! (`"1"`..`"12"`) and forecast scores as objects keyed by quarter id
//! (`"q1"`..`"q4"`).

use std::collections::BTreeMap;

use ecopulse_score_models::{
    CityScores, Dataset, ForecastScores, Month, MonthlyScores, MonthlySeries, Quarter,
    QuarterScores, Score,
};
use serde::{Deserialize, Serialize};

/// A year's dataset as returned by `GET /api/scores/{year}`.
///
/// Serialized as `{"type": "monthly", "scores": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "scores", rename_all = "lowercase")]
pub enum DatasetPayload {
    /// City -> month number -> score.
    Monthly(BTreeMap<String, BTreeMap<String, f64>>),
    /// City -> quarter id -> score.
    Forecast(BTreeMap<String, BTreeMap<String, f64>>),
    /// City -> score.
    Annual(BTreeMap<String, Option<f64>>),
}

impl DatasetPayload {
    /// Converts the payload into a typed [`Dataset`].
    ///
    /// Decoding is lenient: keys that are not a valid month or quarter and
    /// values that are not finite are dropped with a warning, leaving the
    /// affected entries absent.
    #[must_use]
    pub fn into_dataset(self) -> Dataset {
        match self {
            Self::Monthly(cities) => Dataset::Monthly(
                cities
                    .into_iter()
                    .map(|(city, months)| {
                        let series = decode_months(&city, months);
                        (city, series)
                    })
                    .collect(),
            ),
            Self::Forecast(cities) => Dataset::Forecast(
                cities
                    .into_iter()
                    .map(|(city, quarters)| {
                        let scores = decode_quarters(&city, quarters);
                        (city, scores)
                    })
                    .collect(),
            ),
            Self::Annual(cities) => Dataset::Annual(
                cities
                    .into_iter()
                    .map(|(city, value)| {
                        let score = value.and_then(|v| decode_score(&city, v));
                        (city, score)
                    })
                    .collect(),
            ),
        }
    }
}

impl From<&Dataset> for DatasetPayload {
    fn from(dataset: &Dataset) -> Self {
        match dataset {
            Dataset::Monthly(cities) => Self::Monthly(encode_monthly(cities)),
            Dataset::Forecast(cities) => Self::Forecast(encode_forecast(cities)),
            Dataset::Annual(scores) => Self::Annual(encode_annual(scores)),
        }
    }
}

fn encode_monthly(cities: &MonthlyScores) -> BTreeMap<String, BTreeMap<String, f64>> {
    cities
        .iter()
        .map(|(city, series)| {
            let months = series
                .iter()
                .map(|(month, score)| (month.number().to_string(), score.value()))
                .collect();
            (city.clone(), months)
        })
        .collect()
}

fn encode_forecast(cities: &ForecastScores) -> BTreeMap<String, BTreeMap<String, f64>> {
    cities
        .iter()
        .map(|(city, quarters)| {
            let quarters = quarters
                .iter()
                .map(|(quarter, score)| (quarter.to_string(), score.value()))
                .collect();
            (city.clone(), quarters)
        })
        .collect()
}

fn encode_annual(scores: &CityScores) -> BTreeMap<String, Option<f64>> {
    scores
        .iter()
        .map(|(city, score)| (city.to_string(), score.map(Score::value)))
        .collect()
}

fn decode_score(city: &str, value: f64) -> Option<Score> {
    match Score::new(value) {
        Ok(score) => Some(score),
        Err(e) => {
            log::warn!("Dropping score for {city}: {e}");
            None
        }
    }
}

fn decode_months(city: &str, months: BTreeMap<String, f64>) -> MonthlySeries {
    let mut series = MonthlySeries::default();
    for (key, value) in months {
        let Some(month) = key.trim().parse::<u8>().ok().and_then(|n| Month::new(n).ok()) else {
            log::warn!("Ignoring unknown month key '{key}' for {city}");
            continue;
        };
        if let Some(score) = decode_score(city, value) {
            series.set(month, score);
        }
    }
    series
}

fn decode_quarters(city: &str, quarters: BTreeMap<String, f64>) -> QuarterScores {
    let mut scores = QuarterScores::new();
    for (key, value) in quarters {
        let Ok(quarter) = key.trim().to_ascii_lowercase().parse::<Quarter>() else {
            log::warn!("Ignoring unknown quarter key '{key}' for {city}");
            continue;
        };
        if let Some(score) = decode_score(city, value) {
            scores.insert(quarter, score);
        }
    }
    scores
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Error or informational message body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMessage {
    /// Human-readable message.
    pub message: String,
}

impl ApiMessage {
    /// Creates a message body.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Query parameters for the view endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewQueryParams {
    /// Selected year. Defaults to the year a new session starts on.
    pub year: Option<i32>,
    /// `all` or a month number (`1`-`12`, optionally zero-padded).
    pub month: Option<String>,
    /// Selected city name.
    pub city: Option<String>,
    /// Display language (`tr` or `en`).
    pub lang: Option<String>,
}
