//! Three-tier ecological category of a score.

use ecopulse_score_models::{Category, Score};

/// Highest score still classified as [`Category::Poor`].
pub const POOR_MAX: f64 = 51.0;

/// Highest score still classified as [`Category::Average`].
pub const AVERAGE_MAX: f64 = 55.0;

/// Classifies a score: `<= 51` poor, `<= 55` average, above that good.
#[must_use]
pub fn classify(score: Score) -> Category {
    let value = score.value();
    if value <= POOR_MAX {
        Category::Poor
    } else if value <= AVERAGE_MAX {
        Category::Average
    } else {
        Category::Good
    }
}
