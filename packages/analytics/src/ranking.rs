//! Rankings and percentiles over a resolved score view.

use ecopulse_score_models::{CityScores, Score};
use serde::{Deserialize, Serialize};

/// One row of the ranking table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCity {
    /// 1-based position.
    pub rank: usize,
    /// City name.
    pub city: String,
    /// The city's score.
    pub score: Score,
}

/// Ranks cities with a score from highest to lowest.
///
/// Cities without a score are left out. Equal scores keep the order in
/// which `scores` lists them.
#[must_use]
pub fn rank(scores: &CityScores) -> Vec<RankedCity> {
    let mut present: Vec<(&str, Score)> = scores.present().collect();
    // `sort_by` is stable, which is the tie-break.
    present.sort_by(|a, b| b.1.cmp(&a.1));

    present
        .into_iter()
        .enumerate()
        .map(|(i, (city, score))| RankedCity {
            rank: i + 1,
            city: city.to_string(),
            score,
        })
        .collect()
}

/// Returns the 1-based rank of `city`, or `None` if it has no score.
#[must_use]
pub fn rank_of(ranking: &[RankedCity], city: &str) -> Option<usize> {
    ranking.iter().find(|r| r.city == city).map(|r| r.rank)
}

/// Percentage of cities with a score strictly lower than `city`'s.
///
/// Returns `None` if `city` has no score. The denominator is the number
/// of cities with a score, the target included; tied cities do not count
/// as lower.
#[must_use]
pub fn percentile(scores: &CityScores, city: &str) -> Option<f64> {
    let target = scores.get(city)?;

    let (total, lower) = scores
        .present()
        .fold((0usize, 0usize), |(total, lower), (_, score)| {
            (total + 1, lower + usize::from(score < target))
        });

    #[allow(clippy::cast_precision_loss)]
    Some(lower as f64 / total as f64 * 100.0)
}

/// Rounds a percentile to the nearest whole number for display.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn round_percentile(percentile: f64) -> u8 {
    percentile.round().clamp(0.0, 100.0) as u8
}
