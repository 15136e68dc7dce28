//! Per-year score datasets.
//!
//! A year's detailed data arrives in one of three shapes. The shape is
//! part of the type: code that needs a particular shape either matches on
//! [`Dataset`] or uses one of the `as_*` accessors, which fail with a
//! [`DatasetShapeError`] instead of handing back an empty value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::{CityScores, Month, Quarter, Score};

/// Number of entries in a complete [`MonthlySeries`].
pub const MONTHS_PER_YEAR: usize = 12;

/// One city's monthly scores for a year, in calendar order.
///
/// A series may be short (or have gaps) when the source data is
/// incomplete; missing months read back as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlySeries(Vec<Option<Score>>);

impl MonthlySeries {
    /// Creates a series from values in calendar order (January first).
    /// Entries past December are discarded.
    #[must_use]
    pub fn new(mut values: Vec<Option<Score>>) -> Self {
        values.truncate(MONTHS_PER_YEAR);
        Self(values)
    }

    /// Returns the score for `month`, or `None` if the series has no
    /// value there.
    #[must_use]
    pub fn get(&self, month: Month) -> Option<Score> {
        self.0.get(month.index()).copied().flatten()
    }

    /// Sets the score for `month`, extending the series as needed.
    pub fn set(&mut self, month: Month, score: Score) {
        let idx = month.index();
        if self.0.len() <= idx {
            self.0.resize(idx + 1, None);
        }
        self.0[idx] = Some(score);
    }

    /// Returns `true` if the series holds an entry for every month.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.0.len() == MONTHS_PER_YEAR && self.0.iter().all(Option::is_some)
    }

    /// Iterates over the months that have a score.
    pub fn iter(&self) -> impl Iterator<Item = (Month, Score)> + '_ {
        Month::all().filter_map(|month| self.get(month).map(|score| (month, score)))
    }
}

/// One city's forecast scores, keyed by quarter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuarterScores(BTreeMap<Quarter, Score>);

impl QuarterScores {
    /// Creates an empty set of quarter scores.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns the score for `quarter`, if present.
    #[must_use]
    pub fn get(&self, quarter: Quarter) -> Option<Score> {
        self.0.get(&quarter).copied()
    }

    /// Sets the score for `quarter`, replacing any previous value.
    pub fn insert(&mut self, quarter: Quarter, score: Score) {
        self.0.insert(quarter, score);
    }

    /// Number of quarters with a score.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no quarter has a score.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Arithmetic mean of the quarters that are present. The denominator
    /// is the number of present quarters, not four.
    #[must_use]
    pub fn mean(&self) -> Option<Score> {
        if self.0.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let count = self.0.len() as f64;
        // Dividing each term first keeps the sum finite.
        let mean: f64 = self.0.values().map(|s| s.value() / count).sum();
        Score::new(mean).ok()
    }

    /// Iterates over present quarters in calendar order.
    pub fn iter(&self) -> impl Iterator<Item = (Quarter, Score)> + '_ {
        self.0.iter().map(|(q, s)| (*q, *s))
    }
}

impl FromIterator<(Quarter, Score)> for QuarterScores {
    fn from_iter<T: IntoIterator<Item = (Quarter, Score)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Monthly-resolution scores keyed by city.
pub type MonthlyScores = BTreeMap<String, MonthlySeries>;

/// Quarterly forecast scores keyed by city.
pub type ForecastScores = BTreeMap<String, QuarterScores>;

/// Which shape a [`Dataset`] has.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DatasetKind {
    /// Twelve scores per city.
    Monthly,
    /// Up to four quarterly scores per city.
    Forecast,
    /// One score per city.
    Annual,
}

/// One year's detailed score data.
#[derive(Debug, Clone, PartialEq)]
pub enum Dataset {
    /// Monthly-resolution historical data.
    Monthly(MonthlyScores),
    /// Quarterly forecast data.
    Forecast(ForecastScores),
    /// Plain yearly figures.
    Annual(CityScores),
}

impl Dataset {
    /// Returns the shape of this dataset.
    #[must_use]
    pub const fn kind(&self) -> DatasetKind {
        match self {
            Self::Monthly(_) => DatasetKind::Monthly,
            Self::Forecast(_) => DatasetKind::Forecast,
            Self::Annual(_) => DatasetKind::Annual,
        }
    }

    /// Returns the monthly scores.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetShapeError`] if this is not a monthly dataset.
    pub const fn as_monthly(&self) -> Result<&MonthlyScores, DatasetShapeError> {
        match self {
            Self::Monthly(scores) => Ok(scores),
            _ => Err(self.shape_error(DatasetKind::Monthly)),
        }
    }

    /// Returns the quarterly forecast scores.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetShapeError`] if this is not a forecast dataset.
    pub const fn as_forecast(&self) -> Result<&ForecastScores, DatasetShapeError> {
        match self {
            Self::Forecast(scores) => Ok(scores),
            _ => Err(self.shape_error(DatasetKind::Forecast)),
        }
    }

    /// Returns the annual scores.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetShapeError`] if this is not an annual dataset.
    pub const fn as_annual(&self) -> Result<&CityScores, DatasetShapeError> {
        match self {
            Self::Annual(scores) => Ok(scores),
            _ => Err(self.shape_error(DatasetKind::Annual)),
        }
    }

    /// Number of cities with an entry in this dataset.
    #[must_use]
    pub fn city_count(&self) -> usize {
        match self {
            Self::Monthly(scores) => scores.len(),
            Self::Forecast(scores) => scores.len(),
            Self::Annual(scores) => scores.len(),
        }
    }

    const fn shape_error(&self, expected: DatasetKind) -> DatasetShapeError {
        DatasetShapeError {
            expected,
            actual: self.kind(),
        }
    }
}

/// Error returned when a [`Dataset`] is read as the wrong shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetShapeError {
    /// The shape the caller asked for.
    pub expected: DatasetKind,
    /// The shape the dataset actually has.
    pub actual: DatasetKind,
}

impl std::fmt::Display for DatasetShapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "expected a {} dataset but found a {} dataset",
            self.expected, self.actual
        )
    }
}

impl std::error::Error for DatasetShapeError {}
