//! The published view for a selection.

use ecopulse_analytics::{
    QuarterComparison, RankedCity, classify, compare_for_month, percentile, rank, rank_of,
    round_percentile,
};
use ecopulse_geography::CityRegistry;
use ecopulse_score_models::{
    AdvisoryKey, Category, CityScores, Dataset, FORECAST_YEAR, Language, MonthSelector, Score,
};
use serde::Serialize;

/// Year shown when a session starts.
pub const INITIAL_YEAR: i32 = 2020;

/// What the user has selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// Selected year.
    pub year: i32,
    /// Selected month, or the whole year.
    pub month: MonthSelector,
    /// City shown in the insight panel.
    pub city: Option<String>,
    /// Display language.
    pub language: Language,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            year: INITIAL_YEAR,
            month: MonthSelector::All,
            city: None,
            language: Language::default(),
        }
    }
}

/// Fill for one city on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapEntry {
    /// City name.
    pub city: String,
    /// The city's score, or `None` without data.
    pub score: Option<Score>,
    /// `None` when the score is absent.
    pub category: Option<Category>,
}

/// Details for the selected city.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityInsight {
    /// City name.
    pub city: String,
    /// The city's score, or `None` without data.
    pub score: Option<Score>,
    /// 1-based position in the ranking.
    pub rank: Option<usize>,
    /// Whole-number percentile among cities with a score.
    pub percentile: Option<u8>,
    /// Category of the score. `None` when the score is absent.
    pub category: Option<Category>,
    /// Only present for a specific month of a historical year.
    pub forecast: Option<QuarterComparison>,
    /// Key for the canned advisory text. Absent without a score.
    pub advisory: Option<AdvisoryKey>,
}

/// Everything published after a selection change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreView {
    /// The selection this view was computed for.
    pub selection: Selection,
    /// Resolved score for every listed city.
    pub scores: CityScores,
    /// Cities with a score, best first.
    pub ranking: Vec<RankedCity>,
    /// Fill for every city on the map.
    pub map: Vec<MapEntry>,
    /// Details for the selected city, if any.
    pub insight: Option<CityInsight>,
}

/// Builds the view for `selection` from its resolved `scores`.
///
/// The map lists every registry city (score or absent); without a
/// registry it lists the cities in `scores`. `forecast` is the forecast
/// dataset used for the selected city's quarter comparison.
#[must_use]
pub fn compose_view(
    selection: Selection,
    scores: CityScores,
    forecast: Option<&Dataset>,
    registry: Option<&CityRegistry>,
) -> ScoreView {
    let ranking = rank(&scores);

    let map = registry.map_or_else(
        || {
            scores
                .iter()
                .map(|(city, score)| map_entry(city, score))
                .collect()
        },
        |registry| {
            registry
                .iter()
                .map(|city| map_entry(city, scores.get(city)))
                .collect()
        },
    );

    let insight = selection
        .city
        .as_deref()
        .map(|city| city_insight(&selection, city, &scores, &ranking, forecast));

    ScoreView {
        selection,
        scores,
        ranking,
        map,
        insight,
    }
}

fn map_entry(city: &str, score: Option<Score>) -> MapEntry {
    MapEntry {
        city: city.to_string(),
        score,
        category: score.map(classify),
    }
}

fn city_insight(
    selection: &Selection,
    city: &str,
    scores: &CityScores,
    ranking: &[RankedCity],
    forecast: Option<&Dataset>,
) -> CityInsight {
    let score = scores.get(city);
    let category = score.map(classify);

    let forecast = if selection.year < FORECAST_YEAR {
        forecast.and_then(|dataset| compare_for_month(score, dataset, city, selection.month))
    } else {
        None
    };

    CityInsight {
        city: city.to_string(),
        score,
        rank: rank_of(ranking, city),
        percentile: percentile(scores, city).map(round_percentile),
        category,
        forecast,
        advisory: category.map(|category| AdvisoryKey {
            category,
            language: selection.language,
        }),
    }
}

#[cfg(test)]
mod tests {
    use ecopulse_score_models::{ForecastScores, ForecastStatus, Month, Quarter, QuarterScores};

    use super::*;

    fn score(v: f64) -> Score {
        Score::new(v).unwrap()
    }

    fn scores(entries: &[(&str, Option<f64>)]) -> CityScores {
        entries
            .iter()
            .map(|(city, v)| ((*city).to_string(), v.map(score)))
            .collect()
    }

    fn forecast() -> Dataset {
        let mut cities = ForecastScores::new();
        cities.insert(
            "Adana".to_string(),
            [(Quarter::Q1, score(54.0)), (Quarter::Q3, score(50.0))]
                .into_iter()
                .collect::<QuarterScores>(),
        );
        Dataset::Forecast(cities)
    }

    fn selection(year: i32, month: MonthSelector, city: Option<&str>) -> Selection {
        Selection {
            year,
            month,
            city: city.map(str::to_string),
            language: Language::En,
        }
    }

    #[test]
    fn default_selection() {
        let selection = Selection::default();
        assert_eq!(selection.year, 2020);
        assert!(selection.month.is_all());
        assert_eq!(selection.city, None);
        assert_eq!(selection.language, Language::Tr);
    }

    #[test]
    fn map_lists_every_registry_city() {
        let registry = CityRegistry::new(["Adana", "Bolu", "Van"]);
        let view = compose_view(
            Selection::default(),
            scores(&[("Adana", Some(52.0)), ("Bolu", None)]),
            None,
            Some(&registry),
        );

        assert_eq!(view.map.len(), 3);
        assert_eq!(view.map[0].category, Some(Category::Average));
        assert_eq!(view.map[1].score, None);
        assert_eq!(view.map[2].city, "Van");
        assert_eq!(view.map[2].category, None);
        assert_eq!(view.ranking.len(), 1);
        assert!(view.insight.is_none());
    }

    #[test]
    fn map_without_registry_uses_score_keys() {
        let view = compose_view(
            Selection::default(),
            scores(&[("Adana", Some(52.0)), ("Bolu", None)]),
            None,
            None,
        );
        assert_eq!(
            view.map.iter().map(|e| e.city.as_str()).collect::<Vec<_>>(),
            vec!["Adana", "Bolu"]
        );
    }

    #[test]
    fn insight_for_month_of_historical_year() {
        let month = MonthSelector::Month(Month::new(2).unwrap());
        let forecast = forecast();
        let view = compose_view(
            selection(2021, month, Some("Adana")),
            scores(&[("Adana", Some(52.0)), ("Bolu", Some(60.0)), ("Van", Some(45.0))]),
            Some(&forecast),
            None,
        );

        let insight = view.insight.unwrap();
        assert_eq!(insight.rank, Some(2));
        // One of three cities is strictly lower.
        assert_eq!(insight.percentile, Some(33));
        assert_eq!(insight.category, Some(Category::Average));
        assert_eq!(
            insight.advisory,
            Some(AdvisoryKey {
                category: Category::Average,
                language: Language::En
            })
        );

        let comparison = insight.forecast.unwrap();
        assert_eq!(comparison.quarter, Quarter::Q1);
        assert_eq!(comparison.comparison.status, ForecastStatus::Better);
    }

    #[test]
    fn no_forecast_comparison_for_whole_year_or_forecast_year() {
        let forecast = forecast();
        let current = scores(&[("Adana", Some(52.0))]);

        let whole_year = compose_view(
            selection(2021, MonthSelector::All, Some("Adana")),
            current.clone(),
            Some(&forecast),
            None,
        );
        assert!(whole_year.insight.unwrap().forecast.is_none());

        let forecast_year = compose_view(
            selection(
                FORECAST_YEAR,
                MonthSelector::Month(Month::new(1).unwrap()),
                Some("Adana"),
            ),
            current,
            Some(&forecast),
            None,
        );
        assert!(forecast_year.insight.unwrap().forecast.is_none());
    }

    #[test]
    fn city_without_score_has_no_category_or_advisory() {
        let view = compose_view(
            selection(2021, MonthSelector::All, Some("Bolu")),
            scores(&[("Adana", Some(52.0)), ("Bolu", None)]),
            None,
            None,
        );
        let insight = view.insight.unwrap();
        assert_eq!(insight.score, None);
        assert_eq!(insight.rank, None);
        assert_eq!(insight.percentile, None);
        assert_eq!(insight.category, None);
        assert_eq!(insight.advisory, None);
    }

    #[test]
    fn view_json_shape() {
        let view = compose_view(
            selection(2021, MonthSelector::All, Some("Adana")),
            scores(&[("Adana", Some(56.0))]),
            None,
            None,
        );
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["selection"]["month"], "all");
        assert_eq!(json["selection"]["language"], "en");
        assert_eq!(json["ranking"][0]["rank"], 1);
        assert_eq!(json["map"][0]["category"], "good");
        assert_eq!(json["insight"]["advisory"]["category"], "good");
    }
}
