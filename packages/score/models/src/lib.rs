#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Score, calendar, and dataset types for the EcoPulse map.
//!
//! A [`Score`] is always a finite number; "no data" is modelled as
//! `Option<Score>` everywhere so that it can never be confused with a
//! score of zero.

pub mod calendar;
pub mod dataset;

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use calendar::{InvalidMonthError, Month, MonthSelector, ParseMonthSelectorError, Quarter};
pub use dataset::{
    Dataset, DatasetKind, DatasetShapeError, ForecastScores, MONTHS_PER_YEAR, MonthlyScores,
    MonthlySeries, QuarterScores,
};

/// The year whose detailed data is the quarterly forecast.
pub const FORECAST_YEAR: i32 = 2027;

/// An ecological score. Observed values fall in 0-100.
///
/// Ordering is total (scores are never `NaN`), so scores can be sorted
/// and compared directly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Score(f64);

impl Score {
    /// Creates a score.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is `NaN` or infinite.
    pub const fn new(value: f64) -> Result<Self, InvalidScoreError> {
        if value.is_finite() {
            // Adding positive zero turns `-0.0` into `0.0`.
            Ok(Self(value + 0.0))
        } else {
            Err(InvalidScoreError { value })
        }
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Rounds to two decimal places, the precision scores are published at.
    ///
    /// Values too large to scale by 100 have no fractional digits and are
    /// returned unchanged.
    #[must_use]
    pub fn round2(self) -> Self {
        Self::new((self.0 * 100.0).round() / 100.0).unwrap_or(self)
    }
}

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl TryFrom<f64> for Score {
    type Error = InvalidScoreError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Score> for f64 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Error returned when attempting to create a [`Score`] from a non-finite
/// value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidScoreError {
    /// The rejected value.
    pub value: f64,
}

impl std::fmt::Display for InvalidScoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid score {}: expected a finite number", self.value)
    }
}

impl std::error::Error for InvalidScoreError {}

/// Scores keyed by city name for a single (year, month) selection.
///
/// A city can be listed with an absent score (`None`): it is known to the
/// view but has no data for the period. Iteration order is the key order,
/// which is also the encounter order used to break ranking ties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CityScores(BTreeMap<String, Option<Score>>);

impl CityScores {
    /// Creates an empty view.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Sets a city's score (or marks it absent).
    pub fn insert(&mut self, city: impl Into<String>, score: Option<Score>) {
        self.0.insert(city.into(), score);
    }

    /// Returns the city's score. Unknown cities and absent scores both
    /// yield `None`.
    #[must_use]
    pub fn get(&self, city: &str) -> Option<Score> {
        self.0.get(city).copied().flatten()
    }

    /// Returns `true` if the city is listed, with or without a score.
    #[must_use]
    pub fn contains(&self, city: &str) -> bool {
        self.0.contains_key(city)
    }

    /// Number of listed cities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no city is listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over every listed city with its score-or-absent.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<Score>)> {
        self.0.iter().map(|(city, score)| (city.as_str(), *score))
    }

    /// Iterates over the listed city names.
    pub fn cities(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterates over cities that have a score.
    pub fn present(&self) -> impl Iterator<Item = (&str, Score)> {
        self.iter()
            .filter_map(|(city, score)| score.map(|s| (city, s)))
    }
}

impl FromIterator<(String, Option<Score>)> for CityScores {
    fn from_iter<T: IntoIterator<Item = (String, Option<Score>)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<(String, Option<Score>)> for CityScores {
    fn extend<T: IntoIterator<Item = (String, Option<Score>)>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

/// The baseline annual scores for every year, always available as the
/// fallback when a year's detailed dataset is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct YearlyScores(BTreeMap<i32, CityScores>);

impl YearlyScores {
    /// Creates an empty baseline.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns the baseline for `year`, if any.
    #[must_use]
    pub fn get(&self, year: i32) -> Option<&CityScores> {
        self.0.get(&year)
    }

    /// Returns the baseline for `year`, or an empty view for years with
    /// no baseline data.
    #[must_use]
    pub fn for_year(&self, year: i32) -> CityScores {
        self.0.get(&year).cloned().unwrap_or_default()
    }

    /// Sets the baseline for `year`.
    pub fn insert(&mut self, year: i32, scores: CityScores) {
        self.0.insert(year, scores);
    }

    /// Iterates over the years with baseline data, ascending.
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.keys().copied()
    }

    /// Returns `true` if no year has baseline data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(i32, CityScores)> for YearlyScores {
    fn from_iter<T: IntoIterator<Item = (i32, CityScores)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Three-tier ecological assessment of a score.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    /// Ecological danger (51 and below)
    Poor,
    /// Ecological stress (above 51, up to 55)
    Average,
    /// Ecological balance (above 55)
    Good,
}

/// Qualitative direction of a forecast relative to the current score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ForecastStatus {
    /// The forecast is higher than the current score.
    Better,
    /// The forecast is lower than the current score.
    Worse,
    /// The difference is inside the dead-band.
    Same,
}

/// Display language of the map.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Language {
    /// Turkish
    #[default]
    Tr,
    /// English
    En,
}

/// Lookup key for the canned advisory text shown for a selected city.
/// The text itself lives with the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryKey {
    /// Category of the city's current score.
    pub category: Category,
    /// Language to render the advisory in.
    pub language: Language,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_finite_scores() {
        assert!(Score::new(f64::NAN).is_err());
        assert!(Score::new(f64::INFINITY).is_err());
        assert!(Score::new(f64::NEG_INFINITY).is_err());
        assert_eq!(Score::new(0.0).unwrap().value(), 0.0);
    }

    #[test]
    fn score_round2() {
        assert_eq!(Score::new(55.004).unwrap().round2().value(), 55.0);
        assert_eq!(Score::new(52.456).unwrap().round2().value(), 52.46);
        assert_eq!(Score::new(48.0).unwrap().to_string(), "48.00");
    }

    #[test]
    fn round2_stays_finite_for_huge_scores() {
        let huge = Score::new(1.0e307).unwrap();
        let rounded = huge.round2();
        assert!(rounded.value().is_finite());
        assert_eq!(rounded, huge);
    }

    #[test]
    fn negative_zero_equals_zero() {
        let zero = Score::new(0.0).unwrap();
        let negative = Score::new(-0.0).unwrap();
        assert_eq!(negative, zero);
        assert!(negative.value().is_sign_positive());
        assert_eq!(Score::new(-0.001).unwrap().round2(), zero);
    }

    #[test]
    fn absent_is_not_zero() {
        let mut scores = CityScores::new();
        scores.insert("Adana", Some(Score::new(0.0).unwrap()));
        scores.insert("Bolu", None);

        assert_eq!(scores.get("Adana"), Some(Score::new(0.0).unwrap()));
        assert_eq!(scores.get("Bolu"), None);
        assert!(scores.contains("Bolu"));
        assert!(!scores.contains("Van"));
        assert_eq!(scores.present().count(), 1);
    }

    #[test]
    fn city_scores_json_shape() {
        let scores: CityScores = serde_json::from_str(r#"{"Adana": 52.5, "Bolu": null}"#).unwrap();
        assert_eq!(scores.get("Adana"), Some(Score::new(52.5).unwrap()));
        assert!(scores.contains("Bolu"));
        assert!(serde_json::from_str::<Score>("\"x\"").is_err());
    }

    #[test]
    fn yearly_scores_missing_year_is_empty() {
        let yearly: YearlyScores =
            serde_json::from_str(r#"{"2020": {"Adana": 52.5}, "2021": {}}"#).unwrap();
        assert_eq!(yearly.years().collect::<Vec<_>>(), vec![2020, 2021]);
        assert_eq!(yearly.for_year(2020).len(), 1);
        assert!(yearly.for_year(1999).is_empty());
    }

    #[test]
    fn language_parsing() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        assert_eq!(Language::default(), Language::Tr);
        assert_eq!(Category::Average.to_string(), "average");
    }
}
