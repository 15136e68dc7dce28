//! In-memory score store and its aggregate queries.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDate;
use ecopulse_dataset::{FetchError, ScoreSource};
use ecopulse_score_models::{
    CityScores, Dataset, FORECAST_YEAR, ForecastScores, MonthlyScores, Score, YearlyScores,
};

use crate::records::{self, DailyObservation, ForecastRecord, MonthlyRecord};
use crate::{IngestError, paths};

/// All loaded score records.
#[derive(Debug, Clone, Default)]
pub struct ScoreStore {
    monthly: Vec<MonthlyRecord>,
    forecast: Vec<ForecastRecord>,
    daily: BTreeMap<String, BTreeMap<NaiveDate, DailyObservation>>,
    cities: BTreeSet<String>,
}

impl ScoreStore {
    /// Builds a store from already-parsed records.
    #[must_use]
    pub fn new(
        monthly: Vec<MonthlyRecord>,
        forecast: Vec<ForecastRecord>,
        daily: Vec<DailyObservation>,
    ) -> Self {
        let mut cities: BTreeSet<String> = monthly.iter().map(|r| r.city.clone()).collect();
        cities.extend(forecast.iter().map(|r| r.city.clone()));

        let mut by_city: BTreeMap<String, BTreeMap<NaiveDate, DailyObservation>> = BTreeMap::new();
        for observation in daily {
            cities.insert(observation.city.clone());
            by_city
                .entry(observation.city.clone())
                .or_default()
                .insert(observation.date, observation);
        }

        Self {
            monthly,
            forecast,
            daily: by_city,
            cities,
        }
    }

    /// Loads the three score files from `dir`.
    ///
    /// Each file is loaded independently: one that is missing or
    /// unreadable is logged and skipped, and the store is built from the
    /// rest.
    #[must_use]
    pub fn load(dir: &Path) -> Self {
        let monthly = load_file(&paths::monthly_csv(dir), records::read_monthly);
        let forecast = load_file(&paths::forecast_csv(dir), records::read_forecast);
        let daily = load_file(&paths::daily_csv(dir), records::read_daily);

        let store = Self::new(monthly, forecast, daily);
        log::info!(
            "Loaded {} monthly, {} forecast and {} daily records for {} cities from {}",
            store.monthly.len(),
            store.forecast.len(),
            store.daily.values().map(BTreeMap::len).sum::<usize>(),
            store.cities.len(),
            dir.display()
        );
        store
    }

    /// Iterates over every city that appears in any file.
    pub fn cities(&self) -> impl Iterator<Item = &str> {
        self.cities.iter().map(String::as_str)
    }

    /// Baseline annual scores: for each (city, year) the mean of all of
    /// that year's monthly rows, rounded to two decimals.
    #[must_use]
    pub fn yearly_averages(&self) -> YearlyScores {
        let mut sums: BTreeMap<i32, BTreeMap<&str, (f64, u32)>> = BTreeMap::new();
        for record in &self.monthly {
            let entry = sums
                .entry(record.year)
                .or_default()
                .entry(record.city.as_str())
                .or_insert((0.0, 0));
            entry.0 += record.score.value();
            entry.1 += 1;
        }

        sums.into_iter()
            .map(|(year, cities)| {
                let scores: CityScores = cities
                    .into_iter()
                    .map(|(city, (sum, count))| {
                        let mean = Score::new(sum / f64::from(count)).ok().map(Score::round2);
                        (city.to_string(), mean)
                    })
                    .collect();
                (year, scores)
            })
            .collect()
    }

    /// The detailed dataset for `year`: the quarterly forecast from
    /// [`FORECAST_YEAR`] on, monthly scores before that. A duplicated
    /// month or quarter keeps the last row. Years without rows yield an
    /// empty dataset of the matching shape.
    #[must_use]
    pub fn dataset_for_year(&self, year: i32) -> Dataset {
        if year >= FORECAST_YEAR {
            let mut scores = ForecastScores::new();
            for record in self.forecast.iter().filter(|r| r.year == year) {
                scores
                    .entry(record.city.clone())
                    .or_default()
                    .insert(record.quarter, record.score);
            }
            Dataset::Forecast(scores)
        } else {
            let mut scores = MonthlyScores::new();
            for record in self.monthly.iter().filter(|r| r.year == year) {
                scores
                    .entry(record.city.clone())
                    .or_default()
                    .set(record.month, record.score);
            }
            Dataset::Monthly(scores)
        }
    }

    /// Returns the city's observation for `date`.
    ///
    /// # Errors
    ///
    /// * [`IngestError::CityNotFound`] if the city appears in no file
    /// * [`IngestError::NoData`] if the city has no observation that day
    pub fn daily_for(&self, city: &str, date: NaiveDate) -> Result<&DailyObservation, IngestError> {
        if !self.cities.contains(city) {
            return Err(IngestError::CityNotFound {
                city: city.to_string(),
            });
        }
        self.daily
            .get(city)
            .and_then(|days| days.get(&date))
            .ok_or_else(|| IngestError::NoData {
                city: city.to_string(),
                date,
            })
    }
}

#[async_trait]
impl ScoreSource for ScoreStore {
    fn name(&self) -> &str {
        "local CSV store"
    }

    async fn fetch_year(&self, year: i32) -> Result<Dataset, FetchError> {
        let dataset = self.dataset_for_year(year);
        if dataset.city_count() == 0 {
            return Err(FetchError::NotFound { year });
        }
        Ok(dataset)
    }

    async fn fetch_yearly(&self) -> Result<YearlyScores, FetchError> {
        Ok(self.yearly_averages())
    }
}

fn load_file<T>(
    path: &Path,
    read: fn(BufReader<File>) -> Result<Vec<T>, IngestError>,
) -> Vec<T> {
    let result = File::open(path)
        .map_err(IngestError::from)
        .and_then(|file| read(BufReader::new(file)));
    match result {
        Ok(records) => records,
        Err(e) => {
            log::warn!("Skipping {}: {e}", path.display());
            Vec::new()
        }
    }
}
