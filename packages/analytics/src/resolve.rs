//! Resolves the scores shown on the map for a (year, month) selection.
//!
//! The baseline annual scores are the fallback at every step: a year
//! without a cached dataset, the whole-year view of a monthly dataset,
//! and any month a city has no monthly value for all fall back to the
//! city's baseline score.

use ecopulse_dataset::DatasetCache;
use ecopulse_score_models::{
    CityScores, Dataset, ForecastScores, Month, MonthSelector, MonthlyScores, YearlyScores,
};

/// Resolves the scores for `year` and `month` from whatever is cached.
///
/// Reads the cache without fetching; years that are not cached resolve
/// to their baseline scores.
#[must_use]
pub fn resolve(
    year: i32,
    month: MonthSelector,
    cache: &DatasetCache,
    baseline: &YearlyScores,
) -> CityScores {
    let dataset = cache.get(year);
    resolve_dataset(dataset.as_deref(), month, &baseline.for_year(year))
}

/// Resolves the scores for one year given its (optional) detailed
/// dataset and the year's baseline scores.
///
/// Every baseline city appears in the result, except for the whole-year
/// view of a forecast, which lists only forecast cities with at least one
/// quarter.
#[must_use]
pub fn resolve_dataset(
    dataset: Option<&Dataset>,
    month: MonthSelector,
    baseline: &CityScores,
) -> CityScores {
    let Some(dataset) = dataset else {
        return baseline.clone();
    };

    match (dataset, month) {
        (Dataset::Annual(scores), _) => scores.clone(),
        (Dataset::Monthly(_), MonthSelector::All) => baseline.clone(),
        (Dataset::Monthly(cities), MonthSelector::Month(month)) => {
            monthly_scores(cities, month, baseline)
        }
        (Dataset::Forecast(cities), MonthSelector::All) => forecast_year_scores(cities),
        (Dataset::Forecast(cities), MonthSelector::Month(month)) => {
            forecast_quarter_scores(cities, month, baseline)
        }
    }
}

fn monthly_scores(cities: &MonthlyScores, month: Month, baseline: &CityScores) -> CityScores {
    baseline
        .iter()
        .map(|(city, fallback)| {
            let score = cities
                .get(city)
                .and_then(|series| series.get(month))
                .or(fallback);
            (city.to_string(), score)
        })
        .collect()
}

/// Mean of the quarters each city has, rounded to two decimals. Cities
/// with no quarters are left out.
fn forecast_year_scores(cities: &ForecastScores) -> CityScores {
    cities
        .iter()
        .filter_map(|(city, quarters)| {
            quarters
                .mean()
                .map(|mean| (city.clone(), Some(mean.round2())))
        })
        .collect()
}

fn forecast_quarter_scores(
    cities: &ForecastScores,
    month: Month,
    baseline: &CityScores,
) -> CityScores {
    let quarter = month.quarter();
    let mut scores: CityScores = baseline
        .cities()
        .map(|city| (city.to_string(), None))
        .collect();
    scores.extend(
        cities
            .iter()
            .map(|(city, quarters)| (city.clone(), quarters.get(quarter))),
    );
    scores
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use ecopulse_dataset::{FetchError, ScoreSource};
    use ecopulse_score_models::{MonthlySeries, Quarter, QuarterScores, Score};

    use super::*;

    fn score(v: f64) -> Score {
        Score::new(v).unwrap()
    }

    fn month(n: u8) -> MonthSelector {
        MonthSelector::Month(Month::new(n).unwrap())
    }

    fn city_scores(entries: &[(&str, Option<f64>)]) -> CityScores {
        entries
            .iter()
            .map(|(city, v)| ((*city).to_string(), v.map(score)))
            .collect()
    }

    fn all_selectors() -> impl Iterator<Item = MonthSelector> {
        std::iter::once(MonthSelector::All).chain(Month::all().map(MonthSelector::Month))
    }

    fn baseline() -> CityScores {
        city_scores(&[
            ("Adana", Some(50.0)),
            ("Bolu", Some(58.0)),
            ("Van", Some(53.0)),
        ])
    }

    fn monthly() -> Dataset {
        let mut adana = MonthlySeries::default();
        adana.set(Month::new(1).unwrap(), score(44.0));
        adana.set(Month::new(2).unwrap(), score(0.0));

        // Bolu's series stops after March.
        let bolu = MonthlySeries::new(vec![Some(score(60.0)), Some(score(61.0)), Some(score(62.0))]);

        Dataset::Monthly(
            [("Adana".to_string(), adana), ("Bolu".to_string(), bolu)]
                .into_iter()
                .collect(),
        )
    }

    fn forecast() -> Dataset {
        let adana: QuarterScores = [(Quarter::Q1, score(50.0)), (Quarter::Q2, score(60.0))]
            .into_iter()
            .collect();
        let bolu: QuarterScores = Quarter::ALL
            .into_iter()
            .map(|q| (q, score(52.0)))
            .collect();
        Dataset::Forecast(
            [
                ("Adana".to_string(), adana),
                ("Bolu".to_string(), bolu),
                ("Kars".to_string(), QuarterScores::new()),
            ]
            .into_iter()
            .collect(),
        )
    }

    #[test]
    fn missing_dataset_returns_baseline_for_every_month() {
        for selector in all_selectors() {
            assert_eq!(resolve_dataset(None, selector, &baseline()), baseline());
        }
    }

    #[test]
    fn annual_dataset_ignores_month() {
        let annual = city_scores(&[("Adana", Some(49.0)), ("Rize", None)]);
        let dataset = Dataset::Annual(annual.clone());
        for selector in all_selectors() {
            assert_eq!(resolve_dataset(Some(&dataset), selector, &baseline()), annual);
        }
    }

    #[test]
    fn monthly_whole_year_is_baseline() {
        assert_eq!(
            resolve_dataset(Some(&monthly()), MonthSelector::All, &baseline()),
            baseline()
        );
    }

    #[test]
    fn monthly_specific_month_selects_index() {
        let scores = resolve_dataset(Some(&monthly()), month(1), &baseline());
        assert_eq!(scores.get("Adana"), Some(score(44.0)));
        assert_eq!(scores.get("Bolu"), Some(score(60.0)));
        // Van has no monthly series at all.
        assert_eq!(scores.get("Van"), Some(score(53.0)));
        assert_eq!(scores.len(), 3);
    }

    #[test]
    fn monthly_zero_is_kept_not_replaced() {
        let scores = resolve_dataset(Some(&monthly()), month(2), &baseline());
        assert_eq!(scores.get("Adana"), Some(score(0.0)));
    }

    #[test]
    fn monthly_missing_index_falls_back_to_baseline() {
        let dataset = monthly();
        for m in 4..=12 {
            let scores = resolve_dataset(Some(&dataset), month(m), &baseline());
            assert_eq!(scores.get("Adana"), Some(score(50.0)), "month {m}");
            assert_eq!(scores.get("Bolu"), Some(score(58.0)), "month {m}");
            assert_eq!(scores.get("Van"), Some(score(53.0)), "month {m}");
        }
    }

    #[test]
    fn monthly_cities_outside_baseline_are_not_added() {
        let mut extra = MonthlySeries::default();
        extra.set(Month::new(1).unwrap(), score(70.0));
        let dataset = Dataset::Monthly([("Izmir".to_string(), extra)].into_iter().collect());

        let scores = resolve_dataset(Some(&dataset), month(1), &baseline());
        assert!(!scores.contains("Izmir"));
        assert_eq!(scores.len(), 3);
    }

    #[test]
    fn forecast_whole_year_averages_present_quarters() {
        let scores = resolve_dataset(Some(&forecast()), MonthSelector::All, &CityScores::new());
        assert_eq!(scores.get("Adana"), Some(score(55.0)));
        assert_eq!(scores.get("Bolu"), Some(score(52.0)));
        // No quarters at all: omitted entirely.
        assert!(!scores.contains("Kars"));
    }

    #[test]
    fn forecast_whole_year_mean_is_rounded() {
        let quarters: QuarterScores = [
            (Quarter::Q1, score(50.0)),
            (Quarter::Q2, score(50.0)),
            (Quarter::Q3, score(50.01)),
        ]
        .into_iter()
        .collect();
        let dataset = Dataset::Forecast([("Rize".to_string(), quarters)].into_iter().collect());

        let scores = resolve_dataset(Some(&dataset), MonthSelector::All, &CityScores::new());
        assert_eq!(scores.get("Rize"), Some(score(50.0)));
    }

    #[test]
    fn forecast_whole_year_keeps_cities_with_huge_quarters() {
        let quarters: QuarterScores = [(Quarter::Q1, score(1.0e308)), (Quarter::Q2, score(1.0e308))]
            .into_iter()
            .collect();
        let dataset = Dataset::Forecast([("Adana".to_string(), quarters)].into_iter().collect());

        let scores = resolve_dataset(Some(&dataset), MonthSelector::All, &CityScores::new());
        let adana = scores.get("Adana").unwrap();
        assert!(adana.value().is_finite());
        assert_eq!(adana, score(1.0e308));
    }

    #[test]
    fn forecast_month_selects_quarter() {
        let dataset = forecast();

        let may = resolve_dataset(Some(&dataset), month(5), &CityScores::new());
        assert_eq!(may.get("Adana"), Some(score(60.0)));
        assert_eq!(may.get("Bolu"), Some(score(52.0)));

        let august = resolve_dataset(Some(&dataset), month(8), &CityScores::new());
        assert!(august.contains("Adana"));
        assert_eq!(august.get("Adana"), None);
        assert!(august.contains("Kars"));
        assert_eq!(august.get("Kars"), None);
    }

    #[test]
    fn forecast_month_keeps_baseline_cities() {
        let scores = resolve_dataset(Some(&forecast()), month(1), &baseline());
        assert!(scores.contains("Van"));
        assert_eq!(scores.get("Van"), None);
        assert_eq!(scores.get("Adana"), Some(score(50.0)));
    }

    struct NoSource;

    #[async_trait]
    impl ScoreSource for NoSource {
        fn name(&self) -> &str {
            "none"
        }

        async fn fetch_year(&self, year: i32) -> Result<Dataset, FetchError> {
            Err(FetchError::NotFound { year })
        }

        async fn fetch_yearly(&self) -> Result<YearlyScores, FetchError> {
            Ok(YearlyScores::new())
        }
    }

    #[test]
    fn resolve_reads_the_cache_for_the_year() {
        let cache = DatasetCache::new(Arc::new(NoSource));
        cache.insert(2021, monthly());
        let yearly: YearlyScores = [(2020, baseline()), (2021, baseline())]
            .into_iter()
            .collect();

        assert_eq!(
            resolve(2021, month(1), &cache, &yearly).get("Adana"),
            Some(score(44.0))
        );
        // 2020 is not cached: baseline regardless of month.
        assert_eq!(resolve(2020, month(1), &cache, &yearly), baseline());
        // No baseline and no dataset: empty view.
        assert!(resolve(1999, MonthSelector::All, &cache, &yearly).is_empty());
    }
}
