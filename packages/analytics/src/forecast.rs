//! Compares a city's current score with its forecast.

use ecopulse_score_models::{Dataset, ForecastStatus, MonthSelector, Quarter, Score};
use serde::{Deserialize, Serialize};

/// Width of the "no change" band around zero. Deltas within
/// `[-DEAD_BAND, DEAD_BAND]` are reported as [`ForecastStatus::Same`].
pub const DEAD_BAND: f64 = 0.1;

/// Result of comparing a forecast with the current score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastComparison {
    /// `forecast - current`.
    pub delta: f64,
    /// Qualitative direction of `delta`.
    pub status: ForecastStatus,
}

impl ForecastComparison {
    /// Size of the change, without its sign.
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.delta.abs()
    }
}

/// A forecast comparison for the quarter a selected month falls in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterComparison {
    /// The forecast quarter compared against.
    pub quarter: Quarter,
    /// The forecast score for that quarter.
    pub forecast: Score,
    /// Delta and status.
    #[serde(flatten)]
    pub comparison: ForecastComparison,
}

/// Compares `forecast` against `current`.
#[must_use]
pub fn compare(current: Score, forecast: Score) -> ForecastComparison {
    let delta = forecast.value() - current.value();
    let status = if delta > DEAD_BAND {
        ForecastStatus::Better
    } else if delta < -DEAD_BAND {
        ForecastStatus::Worse
    } else {
        ForecastStatus::Same
    };
    ForecastComparison { delta, status }
}

/// Compares two optional scores; `None` (not applicable) if either is
/// absent.
#[must_use]
pub fn compare_scores(current: Option<Score>, forecast: Option<Score>) -> Option<ForecastComparison> {
    Some(compare(current?, forecast?))
}

/// Compares `city`'s current score with its forecast for the quarter of
/// the selected month.
///
/// Returns `None` when the whole year is selected, the current score is
/// absent, `forecast` is not a forecast dataset, or it has no score for
/// the city in that quarter.
#[must_use]
pub fn compare_for_month(
    current: Option<Score>,
    forecast: &Dataset,
    city: &str,
    month: MonthSelector,
) -> Option<QuarterComparison> {
    let quarter = month.month()?.quarter();
    let forecast_score = forecast.as_forecast().ok()?.get(city)?.get(quarter)?;
    let comparison = compare_scores(current, Some(forecast_score))?;

    Some(QuarterComparison {
        quarter,
        forecast: forecast_score,
        comparison,
    })
}
